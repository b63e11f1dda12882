use crate::engine::{
    error::ValidationError,
    key_codec::{validate_account_id, validate_serial},
    request::{expect_args, non_negative, parse_int, Operation},
    Points,
};

/// A validated points-for-coin exchange.
///
/// The customer receives `points * coin_unit / point_unit` coin (truncated)
/// out of the bank pool, which takes the points in return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangePoints {
    serial: String,
    customer_id: String,
    points: Points,
}

impl ExchangePoints {
    pub fn new(serial: &str, customer_id: &str, points: Points) -> Result<Self, ValidationError> {
        validate_serial(serial)?;
        validate_account_id(customer_id)?;
        Ok(Self {
            serial: serial.to_string(),
            customer_id: customer_id.to_string(),
            points: non_negative("points", points)?,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn points(&self) -> Points {
        self.points
    }
}

/// `SERIAL CUSTOMER_ID POINTS`
impl TryFrom<&[String]> for ExchangePoints {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::ExchangePoints, args, 3)?;
        ExchangePoints::new(&args[0], &args[1], parse_int("points", &args[2])?)
    }
}
