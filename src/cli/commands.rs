pub(crate) use clap::Parser;
use std::path::PathBuf;

use chrono::NaiveDate;
use coin_ledger::{parse_date, Operation};

#[derive(Parser, Debug)]
#[command(
    name = "coin-ledger",
    author,
    version,
    about = "A ledger-backed loyalty coin transfer engine",
    long_about = None,
    after_help = "OPERATIONS:\n    initialize TOTAL_POINTS TOTAL_COINS POINT_UNIT COIN_UNIT FIAT_UNIT\n    set-exchange-rate POINT_UNIT COIN_UNIT FIAT_UNIT\n    get-exchange-rate\n    quote-exchange POINTS\n    register-customer ID\n    register-merchant ID COIN_BALANCE\n    exchange-points SERIAL CUSTOMER_ID POINTS\n    gift-transfer SERIAL FROM_ID FROM_TYPE TO_ID TO_TYPE AMOUNT\n    purchase-trade SERIAL CUSTOMER_ID AMOUNT MERCHANT_ID PRODUCT_ID\n    issue-coins SERIAL AMOUNT YYYYMMDD\n    get-customer ID\n    get-merchant ID\n    get-bank-pool\n    query-transactions-by-serials ACCOUNT/SERIAL...\n    query-transactions-by-range ACCOUNT_ID START_YYYYMMDD END_YYYYMMDD\n\nOUTPUT:\n    Records and quotes are printed to stdout as JSON, transaction lists as CSV:\n\n    coin-ledger query-transactions-by-range C1 20240101 20240131 > history.csv"
)]
pub struct Args {
    /// Ledger snapshot to read and update
    #[arg(
        long,
        value_name = "PATH",
        env = "COIN_LEDGER_PATH",
        default_value = "coin-ledger.json"
    )]
    pub ledger: PathBuf,

    /// Date stamped on exchange, gift and purchase records instead of today
    #[arg(long, value_name = "YYYYMMDD", value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Operation to run, e.g. exchange-points
    #[arg(index = 1, value_name = "OPERATION")]
    pub operation: Operation,

    /// Positional arguments of the operation
    #[arg(
        index = 2,
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}
