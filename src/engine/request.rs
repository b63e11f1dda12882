mod exchange;
mod gift;
mod issue;
mod purchase;
mod query;
mod rate;
mod register;

pub use exchange::ExchangePoints;
pub use gift::GiftTransfer;
pub use issue::IssueCoins;
pub use purchase::PurchaseTrade;
pub use query::RangeQuery;
pub use rate::{Initialize, QuoteExchange, SetExchangeRate};
pub use register::{RegisterCustomer, RegisterMerchant};

use serde::Serialize;

use crate::engine::account::{BankPool, CustomerAccount, MerchantAccount};
use crate::engine::error::ValidationError;
use crate::engine::exchange_rate::{Conversion, ExchangeRate};
use crate::engine::key_codec::validate_account_id;
use crate::engine::transaction_log::{TransactionRecord, TransactionRef};

/// The closed set of operations the engine serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    SetExchangeRate,
    GetExchangeRate,
    QuoteExchange,
    RegisterCustomer,
    RegisterMerchant,
    ExchangePoints,
    GiftTransfer,
    PurchaseTrade,
    IssueCoins,
    GetCustomer,
    GetMerchant,
    GetBankPool,
    QueryTransactionsBySerials,
    QueryTransactionsByRange,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::Initialize,
        Operation::SetExchangeRate,
        Operation::GetExchangeRate,
        Operation::QuoteExchange,
        Operation::RegisterCustomer,
        Operation::RegisterMerchant,
        Operation::ExchangePoints,
        Operation::GiftTransfer,
        Operation::PurchaseTrade,
        Operation::IssueCoins,
        Operation::GetCustomer,
        Operation::GetMerchant,
        Operation::GetBankPool,
        Operation::QueryTransactionsBySerials,
        Operation::QueryTransactionsByRange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::SetExchangeRate => "set-exchange-rate",
            Operation::GetExchangeRate => "get-exchange-rate",
            Operation::QuoteExchange => "quote-exchange",
            Operation::RegisterCustomer => "register-customer",
            Operation::RegisterMerchant => "register-merchant",
            Operation::ExchangePoints => "exchange-points",
            Operation::GiftTransfer => "gift-transfer",
            Operation::PurchaseTrade => "purchase-trade",
            Operation::IssueCoins => "issue-coins",
            Operation::GetCustomer => "get-customer",
            Operation::GetMerchant => "get-merchant",
            Operation::GetBankPool => "get-bank-pool",
            Operation::QueryTransactionsBySerials => "query-transactions-by-serials",
            Operation::QueryTransactionsByRange => "query-transactions-by-range",
        }
    }

    /// Whether the operation writes to the ledger.
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Operation::Initialize
                | Operation::SetExchangeRate
                | Operation::RegisterCustomer
                | Operation::RegisterMerchant
                | Operation::ExchangePoints
                | Operation::GiftTransfer
                | Operation::PurchaseTrade
                | Operation::IssueCoins
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Operation {
    type Err = ValidationError;

    /// Accepts `exchange-points`, `exchange_points` and `exchangePoints` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Operation::ALL
            .into_iter()
            .find(|op| op.name().replace('-', "") == wanted)
            .ok_or_else(|| ValidationError::UnknownOperation(s.to_string()))
    }
}

/// An operation name with its unparsed positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub operation: Operation,
    pub args: Vec<String>,
}

impl RawRequest {
    pub fn new<I, S>(operation: Operation, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for RawRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.operation, self.args)
    }
}

/// A validated request ready for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Initialize(Initialize),
    SetExchangeRate(SetExchangeRate),
    GetExchangeRate,
    QuoteExchange(QuoteExchange),
    RegisterCustomer(RegisterCustomer),
    RegisterMerchant(RegisterMerchant),
    ExchangePoints(ExchangePoints),
    GiftTransfer(GiftTransfer),
    PurchaseTrade(PurchaseTrade),
    IssueCoins(IssueCoins),
    GetCustomer { id: String },
    GetMerchant { id: String },
    GetBankPool,
    QueryTransactionsBySerials(Vec<TransactionRef>),
    QueryTransactionsByRange(RangeQuery),
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Initialize(_) => Operation::Initialize,
            Request::SetExchangeRate(_) => Operation::SetExchangeRate,
            Request::GetExchangeRate => Operation::GetExchangeRate,
            Request::QuoteExchange(_) => Operation::QuoteExchange,
            Request::RegisterCustomer(_) => Operation::RegisterCustomer,
            Request::RegisterMerchant(_) => Operation::RegisterMerchant,
            Request::ExchangePoints(_) => Operation::ExchangePoints,
            Request::GiftTransfer(_) => Operation::GiftTransfer,
            Request::PurchaseTrade(_) => Operation::PurchaseTrade,
            Request::IssueCoins(_) => Operation::IssueCoins,
            Request::GetCustomer { .. } => Operation::GetCustomer,
            Request::GetMerchant { .. } => Operation::GetMerchant,
            Request::GetBankPool => Operation::GetBankPool,
            Request::QueryTransactionsBySerials(_) => Operation::QueryTransactionsBySerials,
            Request::QueryTransactionsByRange(_) => Operation::QueryTransactionsByRange,
        }
    }
}

impl TryFrom<RawRequest> for Request {
    type Error = ValidationError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let args = raw.args.as_slice();
        let request = match raw.operation {
            Operation::Initialize => Request::Initialize(Initialize::try_from(args)?),
            Operation::SetExchangeRate => Request::SetExchangeRate(SetExchangeRate::try_from(args)?),
            Operation::GetExchangeRate => {
                expect_args(Operation::GetExchangeRate, args, 0)?;
                Request::GetExchangeRate
            }
            Operation::QuoteExchange => Request::QuoteExchange(QuoteExchange::try_from(args)?),
            Operation::RegisterCustomer => {
                Request::RegisterCustomer(RegisterCustomer::try_from(args)?)
            }
            Operation::RegisterMerchant => {
                Request::RegisterMerchant(RegisterMerchant::try_from(args)?)
            }
            Operation::ExchangePoints => Request::ExchangePoints(ExchangePoints::try_from(args)?),
            Operation::GiftTransfer => Request::GiftTransfer(GiftTransfer::try_from(args)?),
            Operation::PurchaseTrade => Request::PurchaseTrade(PurchaseTrade::try_from(args)?),
            Operation::IssueCoins => Request::IssueCoins(IssueCoins::try_from(args)?),
            Operation::GetCustomer => Request::GetCustomer {
                id: single_account_id(Operation::GetCustomer, args)?,
            },
            Operation::GetMerchant => Request::GetMerchant {
                id: single_account_id(Operation::GetMerchant, args)?,
            },
            Operation::GetBankPool => {
                expect_args(Operation::GetBankPool, args, 0)?;
                Request::GetBankPool
            }
            Operation::QueryTransactionsBySerials => Request::QueryTransactionsBySerials(
                args.iter()
                    .map(|arg| arg.parse())
                    .collect::<Result<_, _>>()?,
            ),
            Operation::QueryTransactionsByRange => {
                Request::QueryTransactionsByRange(RangeQuery::try_from(args)?)
            }
        };
        Ok(request)
    }
}

/// What an operation hands back. Transfers return `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Done,
    Rate(ExchangeRate),
    Quote(Conversion),
    Customer(CustomerAccount),
    Merchant(MerchantAccount),
    BankPool(BankPool),
    Transactions(Vec<TransactionRecord>),
}

// =============================================================================
// Argument parsing helpers
// =============================================================================

pub(crate) fn expect_args(
    operation: Operation,
    args: &[String],
    expected: usize,
) -> Result<(), ValidationError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ValidationError::ArgumentCount {
            operation: operation.name(),
            expected,
            got: args.len(),
        })
    }
}

pub(crate) fn parse_int(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    value.trim().parse().map_err(|_| ValidationError::NotANumber {
        field,
        value: value.to_string(),
    })
}

pub(crate) fn positive(field: &'static str, value: i64) -> Result<i64, ValidationError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}

pub(crate) fn non_negative(field: &'static str, value: i64) -> Result<i64, ValidationError> {
    if value >= 0 {
        Ok(value)
    } else {
        Err(ValidationError::Negative { field, value })
    }
}

fn single_account_id(operation: Operation, args: &[String]) -> Result<String, ValidationError> {
    expect_args(operation, args, 1)?;
    validate_account_id(&args[0])?;
    Ok(args[0].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn test_operation_accepts_camel_case() {
        assert_eq!("giftTransfer".parse::<Operation>(), Ok(Operation::GiftTransfer));
        assert_eq!(
            "queryTransactionsBySerials".parse::<Operation>(),
            Ok(Operation::QueryTransactionsBySerials)
        );
        assert_eq!(
            "transfer".parse::<Operation>(),
            Err(ValidationError::UnknownOperation("transfer".to_string()))
        );
    }

    #[test]
    fn test_raw_request_to_exchange() {
        let raw = RawRequest::new(Operation::ExchangePoints, ["S1", "C1", "5000"]);
        let request = Request::try_from(raw).unwrap();
        assert_eq!(request.operation(), Operation::ExchangePoints);
        assert!(matches!(request, Request::ExchangePoints(ref e) if e.points() == 5000));
    }

    #[test]
    fn test_wrong_argument_count() {
        let raw = RawRequest::new(Operation::GetBankPool, ["extra"]);
        assert_eq!(
            Request::try_from(raw),
            Err(ValidationError::ArgumentCount {
                operation: "get-bank-pool",
                expected: 0,
                got: 1
            })
        );
    }

    #[test]
    fn test_get_customer_validates_id() {
        let raw = RawRequest::new(Operation::GetCustomer, ["bad id"]);
        assert_eq!(
            Request::try_from(raw),
            Err(ValidationError::AccountId("bad id".to_string()))
        );
    }

    #[test]
    fn test_query_transactions_parses_references() {
        let raw = RawRequest::new(Operation::QueryTransactionsBySerials, ["C1/S2", "M1/S2"]);
        let Request::QueryTransactionsBySerials(refs) = Request::try_from(raw).unwrap() else {
            panic!("expected QueryTransactions");
        };
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].account_id, "M1");
    }

    #[test]
    fn test_query_transactions_rejects_bad_reference() {
        let raw = RawRequest::new(Operation::QueryTransactionsBySerials, ["C1-S2"]);
        assert_eq!(
            Request::try_from(raw),
            Err(ValidationError::Reference("C1-S2".to_string()))
        );
    }

    #[test]
    fn test_mutating_operations() {
        assert!(Operation::GiftTransfer.is_mutating());
        assert!(!Operation::GetCustomer.is_mutating());
        assert!(!Operation::QuoteExchange.is_mutating());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_int("x", " 42 "), Ok(42));
        assert!(parse_int("x", "4.2").is_err());
        assert!(parse_int("x", "").is_err());
        assert_eq!(positive("x", 0), Err(ValidationError::NotPositive { field: "x", value: 0 }));
        assert_eq!(non_negative("x", 0), Ok(0));
        assert!(non_negative("x", -1).is_err());
    }
}
