use chrono::NaiveDate;

use crate::engine::{
    clock::parse_date,
    error::ValidationError,
    key_codec::validate_serial,
    request::{expect_args, parse_int, positive, Operation},
    Coin,
};

/// A validated issuance of new coin into the bank pool, dated by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCoins {
    serial: String,
    amount: Coin,
    date: NaiveDate,
}

impl IssueCoins {
    pub fn new(serial: &str, amount: Coin, date: NaiveDate) -> Result<Self, ValidationError> {
        validate_serial(serial)?;
        Ok(Self {
            serial: serial.to_string(),
            amount: positive("amount", amount)?,
            date,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn amount(&self) -> Coin {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// `SERIAL AMOUNT YYYYMMDD`
impl TryFrom<&[String]> for IssueCoins {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::IssueCoins, args, 3)?;
        IssueCoins::new(&args[0], parse_int("amount", &args[1])?, parse_date(&args[2])?)
    }
}
