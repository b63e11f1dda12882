//! Coin ledger engine module.
//!
//! This module contains the core bookkeeping logic including:
//! - `TransferEngine` - Orchestrates exchange, gift, purchase and issue
//! - `AccountLedger` - Customer, merchant and bank pool balance records
//! - `ExchangeRateStore` - The points to coin to fiat ratio and conversion
//! - `TransactionLog` - Mirrored, range-queryable transaction history
//! - `key_codec` - Fixed-width, order-preserving store keys
//! - `ledger` - The store contract plus in-memory, file and batch stores
//! - `Request` types - Typed, validated operation requests
//! - `Error` types - Validation and processing errors

mod account;
mod clock;
mod error;
mod exchange_rate;
mod key_codec;
pub mod ledger;
mod logger;
mod request;
mod transaction_log;
mod transfer_engine;

/// Coin amounts and balances. Integer-denominated; fractional coin is never awarded.
pub type Coin = i64;

/// Loyalty points.
pub type Points = i64;

pub use account::{
    Account, AccountLedger, AccountType, BankPool, CustomerAccount, MerchantAccount,
};
pub use clock::{format_date, parse_date, Clock, FixedClock, SystemClock};
pub use error::{Entity, Error, ValidationError};
pub use exchange_rate::{Conversion, ExchangeRate, ExchangeRateStore};
pub use key_codec::{compose_serial, zero_pad, ACCOUNT_KEY_WIDTH, BANK_POOL_ACCOUNT, PAD_CHAR};
pub use logger::Logger;
pub use request::{
    ExchangePoints, GiftTransfer, Initialize, IssueCoins, Operation, PurchaseTrade,
    QuoteExchange, RangeQuery, RawRequest, RegisterCustomer, RegisterMerchant, Request,
    Response, SetExchangeRate,
};
pub use transaction_log::{
    export_transactions, TransactionKind, TransactionLog, TransactionRange, TransactionRecord,
    TransactionRef,
};
pub use transfer_engine::TransferEngine;
