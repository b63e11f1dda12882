use crate::engine::ledger::StoreError;
use crate::engine::Coin;

/// Kinds of persisted record, used to say what was missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customer,
    Merchant,
    BankPool,
    ExchangeRate,
    Transaction,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Customer => write!(f, "customer"),
            Entity::Merchant => write!(f, "merchant"),
            Entity::BankPool => write!(f, "bank pool"),
            Entity::ExchangeRate => write!(f, "exchange rate"),
            Entity::Transaction => write!(f, "transaction"),
        }
    }
}

/// Top-level error type for the coin ledger engine.
///
/// Every variant fails the whole operation; nothing is retried and no
/// write of a failed operation reaches the store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },

    #[error("{entity} {id} already exists")]
    AlreadyExists { entity: Entity, id: String },

    #[error(
        "Insufficient balance: account {account} has amount {amount}, avail {avail}, requested {requested}"
    )]
    InsufficientBalance {
        account: String,
        amount: Coin,
        avail: Coin,
        requested: Coin,
    },

    #[error("Invalid {entity} record under key {key}: {source}")]
    Format {
        entity: Entity,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Balance overflow on {0}")]
    Overflow(String),
}

/// Errors while turning raw arguments into a typed request (hard errors).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown operation {0:?}")]
    UnknownOperation(String),

    #[error("{operation} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        operation: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{field} must be an integer, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("Account type must be Customer or Merchant, got {0:?}")]
    AccountType(String),

    #[error("Date must be YYYYMMDD, got {0:?}")]
    Date(String),

    #[error("Invalid account id {0:?}")]
    AccountId(String),

    #[error("Invalid serial {0:?}")]
    Serial(String),

    #[error("Serial sequence {0} does not fit in 12 digits")]
    Sequence(u64),

    #[error("Invalid transaction reference {0:?}, expected ACCOUNT/SERIAL")]
    Reference(String),

    #[error("Account id {0} is reserved")]
    ReservedAccountId(String),

    #[error("Cannot transfer between accounts sharing id {0}")]
    SelfTransfer(String),
}
