//! Coin ledger library.
//!
//! A bookkeeping engine for a closed-loop loyalty coin economy. Customers
//! exchange points for coin, gift coin to other customers or merchants and
//! spend coin on purchases; the bank issues new supply into a pool. Every
//! movement is written to an append-only transaction log keyed so that an
//! account's history can be scanned by date without a secondary index.
//!
//! The engine runs against any store implementing [`Ledger`]. Each
//! operation stages its writes in a [`WriteBatch`] and commits them only
//! when the whole operation succeeded.

pub mod engine;

pub use engine::ledger::{FileLedger, Ledger, MemoryLedger, StoreError, WriteBatch};
pub use engine::{
    compose_serial, export_transactions, format_date, parse_date, zero_pad, Account,
    AccountType, BankPool, Clock, Coin, Conversion, CustomerAccount, Entity, Error,
    ExchangePoints, ExchangeRate, FixedClock, GiftTransfer, Initialize, IssueCoins, Logger,
    MerchantAccount, Operation, Points, PurchaseTrade, QuoteExchange, RangeQuery, RawRequest,
    RegisterCustomer, RegisterMerchant, Request, Response, SetExchangeRate, SystemClock,
    TransactionKind, TransactionRecord, TransactionRef, TransferEngine, ValidationError,
    BANK_POOL_ACCOUNT,
};
