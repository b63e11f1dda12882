use crate::engine::{
    error::ValidationError,
    exchange_rate::ExchangeRate,
    request::{expect_args, non_negative, parse_int, Operation},
    Coin, Points,
};

fn parse_rate(args: &[String]) -> Result<ExchangeRate, ValidationError> {
    ExchangeRate::new(
        parse_int("pointUnit", &args[0])?,
        parse_int("coinUnit", &args[1])?,
        parse_int("fiatUnit", &args[2])?,
    )
}

/// Replace the current exchange rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetExchangeRate {
    rate: ExchangeRate,
}

impl SetExchangeRate {
    pub fn new(rate: ExchangeRate) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> ExchangeRate {
        self.rate
    }
}

/// `POINT_UNIT COIN_UNIT FIAT_UNIT`
impl TryFrom<&[String]> for SetExchangeRate {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::SetExchangeRate, args, 3)?;
        Ok(SetExchangeRate::new(parse_rate(args)?))
    }
}

/// Price a number of points without moving anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteExchange {
    points: Points,
}

impl QuoteExchange {
    pub fn new(points: Points) -> Result<Self, ValidationError> {
        Ok(Self {
            points: non_negative("points", points)?,
        })
    }

    pub fn points(&self) -> Points {
        self.points
    }
}

/// `POINTS`
impl TryFrom<&[String]> for QuoteExchange {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::QuoteExchange, args, 1)?;
        QuoteExchange::new(parse_int("points", &args[0])?)
    }
}

/// Seed the bank pool totals and the exchange rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initialize {
    total_points: Points,
    total_coins: Coin,
    rate: ExchangeRate,
}

impl Initialize {
    pub fn new(
        total_points: Points,
        total_coins: Coin,
        rate: ExchangeRate,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            total_points: non_negative("totalPoints", total_points)?,
            total_coins: non_negative("totalCoins", total_coins)?,
            rate,
        })
    }

    pub fn total_points(&self) -> Points {
        self.total_points
    }

    pub fn total_coins(&self) -> Coin {
        self.total_coins
    }

    pub fn rate(&self) -> ExchangeRate {
        self.rate
    }
}

/// `TOTAL_POINTS TOTAL_COINS POINT_UNIT COIN_UNIT FIAT_UNIT`
impl TryFrom<&[String]> for Initialize {
    type Error = ValidationError;

    fn try_from(args: &[String]) -> Result<Self, Self::Error> {
        expect_args(Operation::Initialize, args, 5)?;
        Initialize::new(
            parse_int("totalPoints", &args[0])?,
            parse_int("totalCoins", &args[1])?,
            parse_rate(&args[2..])?,
        )
    }
}
