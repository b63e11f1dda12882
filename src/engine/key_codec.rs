//! Store key layout.
//!
//! Balance records live under short prefixed keys. Transaction legs live
//! under `trade:` + the account id padded to a fixed width + the serial, so
//! a lexicographic range scan over one account's keys walks its history in
//! serial order. Serials conventionally start with `YYYYMMDDHHMMSS`, which
//! makes that order chronological and lets a date range become a key range.

use chrono::NaiveDateTime;

use crate::engine::error::ValidationError;
use crate::engine::transaction_log::TransactionKind;

/// Width every account id is padded or truncated to inside transaction keys.
pub const ACCOUNT_KEY_WIDTH: usize = 30;

/// Left-pad character. Sorts below every character allowed in an account id.
pub const PAD_CHAR: char = '!';

/// Pseudo-account id of the bank pool in transaction records.
pub const BANK_POOL_ACCOUNT: &str = "BANK_POOL";

pub(crate) const BANK_POOL_KEY: &str = "bank_pool";
pub(crate) const RATE_KEY: &str = "rate";
const CUSTOMER_PREFIX: &str = "customer:";
const MERCHANT_PREFIX: &str = "merchant:";
const TRADE_PREFIX: &str = "trade:";

const SEQUENCE_LIMIT: u64 = 999_999_999_999;

/// Fit `id` to exactly `width` characters.
///
/// Shorter ids are left-padded with [`PAD_CHAR`]. Longer ids keep only their
/// last `width` characters. Two ids sharing the same trailing `width`
/// characters therefore collide in the transaction log; ids are expected to
/// stay within the width.
pub fn zero_pad(id: &str, width: usize) -> String {
    let len = id.chars().count();
    if len < width {
        let mut padded: String = std::iter::repeat(PAD_CHAR).take(width - len).collect();
        padded.push_str(id);
        padded
    } else {
        id.chars().skip(len - width).collect()
    }
}

/// Build a serial in the conventional layout:
/// `YYYYMMDDHHMMSS` + 12-digit sequence + 2-character kind code.
pub fn compose_serial(
    timestamp: NaiveDateTime,
    sequence: u64,
    kind: TransactionKind,
) -> Result<String, ValidationError> {
    if sequence > SEQUENCE_LIMIT {
        return Err(ValidationError::Sequence(sequence));
    }
    Ok(format!(
        "{}{sequence:012}{}",
        timestamp.format("%Y%m%d%H%M%S"),
        kind.code()
    ))
}

pub(crate) fn customer_key(id: &str) -> String {
    format!("{CUSTOMER_PREFIX}{id}")
}

pub(crate) fn merchant_key(id: &str) -> String {
    format!("{MERCHANT_PREFIX}{id}")
}

pub(crate) fn transaction_key(account_id: &str, serial: &str) -> String {
    format!(
        "{TRADE_PREFIX}{}{serial}",
        zero_pad(account_id, ACCOUNT_KEY_WIDTH)
    )
}

/// Lowest possible key for `account_id` on `date` (`YYYYMMDD`).
pub(crate) fn range_start_key(account_id: &str, date: &str) -> String {
    transaction_key(account_id, &format!("{date}000000000000000000AA"))
}

/// Highest possible key for `account_id` on `date` (`YYYYMMDD`).
pub(crate) fn range_end_key(account_id: &str, date: &str) -> String {
    transaction_key(account_id, &format!("{date}999999999999999999ZZ"))
}

/// Account ids: non-empty ASCII alphanumerics plus `-`, `_` and `.`.
pub(crate) fn validate_account_id(id: &str) -> Result<(), ValidationError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::AccountId(id.to_string()))
    }
}

/// Serials: non-empty printable ASCII without `/` (the reference separator).
pub(crate) fn validate_serial(serial: &str) -> Result<(), ValidationError> {
    let valid = !serial.is_empty() && serial.chars().all(|c| c.is_ascii_graphic() && c != '/');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::Serial(serial.to_string()))
    }
}
