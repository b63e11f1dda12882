use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::engine::error::{Entity, Error, ValidationError};
use crate::engine::key_codec::{
    range_end_key, range_start_key, transaction_key, validate_account_id, validate_serial,
};
use crate::engine::ledger::{decode_record, read_record, write_record, Ledger};
use crate::engine::logger::Logger;
use crate::engine::Coin;

/// What moved coin. Stored as the two-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Points exchanged for coin out of the bank pool
    #[serde(rename = "EX")]
    Exchange,
    #[serde(rename = "GC")]
    GiftToCustomer,
    #[serde(rename = "GM")]
    GiftToMerchant,
    /// Customer buying a product from a merchant
    #[serde(rename = "BU")]
    Purchase,
    /// New coin supply issued into the bank pool
    #[serde(rename = "SI")]
    Issue,
}

impl TransactionKind {
    pub fn code(self) -> &'static str {
        match self {
            TransactionKind::Exchange => "EX",
            TransactionKind::GiftToCustomer => "GC",
            TransactionKind::GiftToMerchant => "GM",
            TransactionKind::Purchase => "BU",
            TransactionKind::Issue => "SI",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One leg of a coin movement, stored under the key of `cash_in_account`.
///
/// `amount` is positive on the receiving leg and negative on the paying leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub serial: String,
    pub cash_out_account: String,
    pub cash_in_account: String,
    pub kind: TransactionKind,
    pub amount: Coin,
    pub cash_out_balance_after: Coin,
    pub cash_in_balance_after: Coin,
    pub date: String,
    pub product_id: String,
    pub memo: String,
}

impl TransactionRecord {
    /// The opposite leg: accounts and balances swapped, amount negated.
    pub fn mirrored(&self) -> Self {
        Self {
            serial: self.serial.clone(),
            cash_out_account: self.cash_in_account.clone(),
            cash_in_account: self.cash_out_account.clone(),
            kind: self.kind,
            amount: -self.amount,
            cash_out_balance_after: self.cash_in_balance_after,
            cash_in_balance_after: self.cash_out_balance_after,
            date: self.date.clone(),
            product_id: self.product_id.clone(),
            memo: self.memo.clone(),
        }
    }

    fn key(&self) -> String {
        transaction_key(&self.cash_in_account, &self.serial)
    }
}

impl std::fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] serial={} {} -> {} amount={}",
            self.kind, self.serial, self.cash_out_account, self.cash_in_account, self.amount
        )
    }
}

/// Address of one stored leg: the account it is filed under and its serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRef {
    pub account_id: String,
    pub serial: String,
}

impl TransactionRef {
    pub fn new(account_id: &str, serial: &str) -> Result<Self, ValidationError> {
        validate_account_id(account_id)?;
        validate_serial(serial)?;
        Ok(Self {
            account_id: account_id.to_string(),
            serial: serial.to_string(),
        })
    }
}

impl std::str::FromStr for TransactionRef {
    type Err = ValidationError;

    /// Parses `ACCOUNT/SERIAL`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (account_id, serial) = s
            .split_once('/')
            .ok_or_else(|| ValidationError::Reference(s.to_string()))?;
        TransactionRef::new(account_id, serial).map_err(|_| ValidationError::Reference(s.to_string()))
    }
}

/// Append-only transaction history.
pub struct TransactionLog<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    log: Logger,
}

impl<'a, L: Ledger + ?Sized> TransactionLog<'a, L> {
    pub fn new(ledger: &'a L, log: Logger) -> Self {
        Self { ledger, log }
    }

    /// Write one leg under its receiving account's key.
    /// Legs are never overwritten: a serial already filed for the account is rejected.
    pub fn append(&self, record: &TransactionRecord) -> Result<(), Error> {
        let key = record.key();
        if self.ledger.get(&key)?.is_some() {
            log::warn!(target: self.log.target(), "[append] {key} already written");
            return Err(Error::AlreadyExists {
                entity: Entity::Transaction,
                id: format!("{}/{}", record.cash_in_account, record.serial),
            });
        }
        write_record(
            self.ledger,
            &self.log,
            &key,
            Entity::Transaction,
            record,
        )?;
        log::debug!(target: self.log.target(), "[append] {record}");
        Ok(())
    }

    /// Write the receiving leg and its mirror under the paying account.
    pub fn append_mirrored(&self, record: &TransactionRecord) -> Result<(), Error> {
        self.append(record)?;
        self.append(&record.mirrored())
    }

    pub fn get(&self, reference: &TransactionRef) -> Result<TransactionRecord, Error> {
        let key = transaction_key(&reference.account_id, &reference.serial);
        read_record(self.ledger, &self.log, &key, Entity::Transaction)?.ok_or_else(|| {
            Error::NotFound {
                entity: Entity::Transaction,
                id: format!("{}/{}", reference.account_id, reference.serial),
            }
        })
    }

    /// Fetch each referenced leg, in the order given.
    pub fn get_many(&self, references: &[TransactionRef]) -> Result<Vec<TransactionRecord>, Error> {
        references.iter().map(|r| self.get(r)).collect()
    }

    /// History of `account_id` between two `YYYYMMDD` dates, inclusive.
    pub fn range_query(&self, account_id: &str, start_date: &str, end_date: &str) -> TransactionRange<'a, L> {
        TransactionRange {
            ledger: self.ledger,
            log: self.log.clone(),
            start_key: range_start_key(account_id, start_date),
            end_key: range_end_key(account_id, end_date),
        }
    }
}

/// A key range over the transaction log.
///
/// Each call to [`TransactionRange::scan`] starts a fresh scan, so the range
/// can be walked any number of times. Records are decoded lazily.
pub struct TransactionRange<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    log: Logger,
    start_key: String,
    end_key: String,
}

impl<'a, L: Ledger + ?Sized> TransactionRange<'a, L> {
    pub fn start_key(&self) -> &str {
        &self.start_key
    }

    pub fn end_key(&self) -> &str {
        &self.end_key
    }

    pub fn scan(&self) -> Result<impl Iterator<Item = Result<TransactionRecord, Error>> + 'a, Error> {
        log::debug!(
            target: self.log.target(),
            "[range] {} ..= {}",
            self.start_key,
            self.end_key
        );
        let entries = self.ledger.range_query(&self.start_key, &self.end_key)?;
        Ok(entries.map(decode_entry))
    }

    /// Scan the range and collect every record, failing on the first undecodable one.
    pub fn to_vec(&self) -> Result<Vec<TransactionRecord>, Error> {
        self.scan()?.collect()
    }
}

fn decode_entry((key, value): (String, Vec<u8>)) -> Result<TransactionRecord, Error> {
    decode_record(&key, &value, Entity::Transaction)
}

/// Column names of the CSV export, in field order.
const CSV_HEADER: [&str; 10] = [
    "serial",
    "cashOutAccount",
    "cashInAccount",
    "kind",
    "amount",
    "cashOutBalanceAfter",
    "cashInBalanceAfter",
    "date",
    "productId",
    "memo",
];

/// Write records as CSV (header + one row per leg) to any sink.
/// The header is written even when there are no records.
/// The CSV writer is buffered, so `writer` does not need its own buffer.
pub fn export_transactions<W: Write>(records: &[TransactionRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
