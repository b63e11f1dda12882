use serde::{Deserialize, Serialize};

use crate::engine::error::{Entity, Error, ValidationError};
use crate::engine::key_codec::RATE_KEY;
use crate::engine::ledger::{read_record, write_record, Ledger};
use crate::engine::logger::Logger;
use crate::engine::{Coin, Points};

/// The current conversion ratio: `point_unit` points are worth `coin_unit`
/// coin and `fiat_unit` units of fiat. All parts are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawExchangeRate")]
pub struct ExchangeRate {
    point_unit: i64,
    coin_unit: i64,
    fiat_unit: i64,
}

/// Wire shape, checked through `ExchangeRate::new` on the way in so a
/// stored zero divisor surfaces as a format error instead of a panic.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExchangeRate {
    point_unit: i64,
    coin_unit: i64,
    fiat_unit: i64,
}

impl TryFrom<RawExchangeRate> for ExchangeRate {
    type Error = ValidationError;

    fn try_from(raw: RawExchangeRate) -> Result<Self, Self::Error> {
        ExchangeRate::new(raw.point_unit, raw.coin_unit, raw.fiat_unit)
    }
}

/// Result of converting a number of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub points: Points,
    pub coin: Coin,
    pub fiat: i64,
}

impl ExchangeRate {
    pub fn new(point_unit: i64, coin_unit: i64, fiat_unit: i64) -> Result<Self, ValidationError> {
        for (field, value) in [
            ("pointUnit", point_unit),
            ("coinUnit", coin_unit),
            ("fiatUnit", fiat_unit),
        ] {
            if value <= 0 {
                return Err(ValidationError::NotPositive { field, value });
            }
        }
        Ok(Self {
            point_unit,
            coin_unit,
            fiat_unit,
        })
    }

    pub fn point_unit(&self) -> i64 {
        self.point_unit
    }

    pub fn coin_unit(&self) -> i64 {
        self.coin_unit
    }

    pub fn fiat_unit(&self) -> i64 {
        self.fiat_unit
    }

    /// Convert `points` to coin and fiat.
    ///
    /// `coin = points * coin_unit / point_unit`, computed exactly in 128 bits
    /// and truncated toward zero: fractional coin is never awarded.
    pub fn convert(&self, points: Points) -> Result<Conversion, Error> {
        if points == 0 {
            return Ok(Conversion {
                points,
                coin: 0,
                fiat: 0,
            });
        }
        Ok(Conversion {
            points,
            coin: self.scale(points, self.coin_unit, "coin")?,
            fiat: self.scale(points, self.fiat_unit, "fiat")?,
        })
    }

    fn scale(&self, points: Points, unit: i64, what: &str) -> Result<i64, Error> {
        let wide = i128::from(points) * i128::from(unit) / i128::from(self.point_unit);
        i64::try_from(wide).map_err(|_| Error::Overflow(format!("{what} for {points} points")))
    }
}

/// Reads and replaces the single exchange rate record.
pub struct ExchangeRateStore<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    log: Logger,
}

impl<'a, L: Ledger + ?Sized> ExchangeRateStore<'a, L> {
    pub fn new(ledger: &'a L, log: Logger) -> Self {
        Self { ledger, log }
    }

    pub fn set_rate(&self, rate: ExchangeRate) -> Result<ExchangeRate, Error> {
        write_record(self.ledger, &self.log, RATE_KEY, Entity::ExchangeRate, &rate)?;
        log::info!(
            target: self.log.target(),
            "[rate] set {} points = {} coin = {} fiat",
            rate.point_unit,
            rate.coin_unit,
            rate.fiat_unit
        );
        Ok(rate)
    }

    pub fn get_rate(&self) -> Result<ExchangeRate, Error> {
        read_record(self.ledger, &self.log, RATE_KEY, Entity::ExchangeRate)?.ok_or_else(|| {
            Error::NotFound {
                entity: Entity::ExchangeRate,
                id: RATE_KEY.to_string(),
            }
        })
    }

    /// Convert with the current rate. Zero points need no rate.
    pub fn convert(&self, points: Points) -> Result<Conversion, Error> {
        if points == 0 {
            return Ok(Conversion {
                points,
                coin: 0,
                fiat: 0,
            });
        }
        let rate = self.get_rate()?;
        let conversion = rate.convert(points)?;
        log::debug!(
            target: self.log.target(),
            "[rate] {points} points @ {}/{}/{} -> coin={} fiat={}",
            rate.point_unit,
            rate.coin_unit,
            rate.fiat_unit,
            conversion.coin,
            conversion.fiat
        );
        Ok(conversion)
    }
}
