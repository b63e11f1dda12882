use chrono::NaiveDate;

use crate::engine::{
    clock::parse_date,
    error::ValidationError,
    key_codec::validate_account_id,
    request::{expect_args, Operation},
};

/// One account's history between two dates, inclusive.
/// A start date after the end date is valid and matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    account_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl RangeQuery {
    pub fn new(
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        validate_account_id(account_id)?;
        Ok(Self {
            account_id: account_id.to_string(),
            start_date,
            end_date,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

/// `ACCOUNT_ID START_YYYYMMDD END_YYYYMMDD`
impl TryFrom<&[String]> for RangeQuery {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::QueryTransactionsByRange, args, 3)?;
        RangeQuery::new(&args[0], parse_date(&args[1])?, parse_date(&args[2])?)
    }
}
