//! Futures fee schedule.
//!
//! Schedule JSON:
//!
//! ```json
//! {
//!   "commodities": {
//!     "ru": { "price_tick": "5", "volume_multiple": 10,
//!             "long_margin_ratio": 0.09, "short_margin_ratio": 0.09,
//!             "open_by_money": 0.000045, "close_by_money": 0.000045 }
//!   },
//!   "instruments": {
//!     "shfe.ru1901": { "price_tick": "5", "volume_multiple": 10, "open_by_volume": "3.00" }
//!   }
//! }
//! ```
//!
//! Money fields (`price_tick`, `*_by_volume`) are decimal strings so they
//! reach the fixed-point boundary without float drift; ratios are plain
//! numbers.  Instrument entries override commodity entries; commodity keys
//! are case-insensitive.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use simx_calendar::Instrument;
use simx_price::{parse_price, Price};
use tracing::info;

use crate::{FeeError, FeeEvaluator, FeeQuote, OffsetFlag, Side};

// ---------------------------------------------------------------------------
// Schedule model
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeeRates {
    #[serde(with = "decimal")]
    pub price_tick: Price,
    #[serde(default = "one")]
    pub volume_multiple: i64,
    #[serde(default)]
    pub long_margin_ratio: f64,
    #[serde(default)]
    pub short_margin_ratio: f64,
    #[serde(default)]
    pub open_by_money: f64,
    #[serde(default, with = "decimal")]
    pub open_by_volume: Price,
    #[serde(default)]
    pub close_by_money: f64,
    #[serde(default, with = "decimal")]
    pub close_by_volume: Price,
    /// Falls back to `close_by_money` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_today_by_money: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal_opt")]
    pub close_today_by_volume: Option<Price>,
}

fn one() -> i64 {
    1
}

impl FeeRates {
    fn commission_rates(&self, offset: OffsetFlag) -> (f64, Price) {
        match offset {
            OffsetFlag::Open => (self.open_by_money, self.open_by_volume),
            OffsetFlag::CloseToday => (
                self.close_today_by_money.unwrap_or(self.close_by_money),
                self.close_today_by_volume.unwrap_or(self.close_by_volume),
            ),
            OffsetFlag::Close | OffsetFlag::CloseYesterday => {
                (self.close_by_money, self.close_by_volume)
            }
        }
    }

    fn margin_ratio(&self, side: Side) -> f64 {
        match side {
            Side::Buy => self.long_margin_ratio,
            Side::Sell => self.short_margin_ratio,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeeSchedule {
    #[serde(default)]
    pub commodities: BTreeMap<String, FeeRates>,
    #[serde(default)]
    pub instruments: BTreeMap<String, FeeRates>,
}

impl FeeSchedule {
    pub fn from_json_str(text: &str) -> Result<Self, FeeError> {
        let raw: FeeSchedule =
            serde_json::from_str(text).map_err(|e| FeeError::Malformed(e.to_string()))?;
        raw.normalized()
    }

    /// Lower-case commodity keys, canonical instrument keys, sanity checks.
    fn normalized(self) -> Result<Self, FeeError> {
        let mut out = FeeSchedule::default();
        for (k, rates) in self.commodities {
            check_rates(&k, &rates)?;
            out.commodities.insert(k.to_ascii_lowercase(), rates);
        }
        for (k, rates) in self.instruments {
            check_rates(&k, &rates)?;
            let instrument: Instrument = k
                .parse()
                .map_err(|_| FeeError::Malformed(format!("instrument key '{k}'")))?;
            out.instruments.insert(instrument.to_string(), rates);
        }
        Ok(out)
    }

    pub fn rates_for(&self, instrument: &Instrument) -> Result<&FeeRates, FeeError> {
        self.instruments
            .get(&instrument.to_string())
            .or_else(|| {
                self.commodities
                    .get(&instrument.commodity().to_ascii_lowercase())
            })
            .ok_or_else(|| FeeError::UnknownInstrument(instrument.to_string()))
    }
}

fn check_rates(key: &str, rates: &FeeRates) -> Result<(), FeeError> {
    if rates.price_tick <= Price::ZERO {
        return Err(FeeError::Malformed(format!("{key}: price_tick must be positive")));
    }
    if rates.volume_multiple <= 0 {
        return Err(FeeError::Malformed(format!("{key}: volume_multiple must be positive")));
    }
    let ratios = [
        rates.long_margin_ratio,
        rates.short_margin_ratio,
        rates.open_by_money,
        rates.close_by_money,
        rates.close_today_by_money.unwrap_or(0.0),
    ];
    if ratios.iter().any(|r| !r.is_finite() || *r < 0.0) {
        return Err(FeeError::Malformed(format!("{key}: ratios must be finite and non-negative")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FutureFeeEvaluator
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct FutureFeeEvaluator {
    schedule: FeeSchedule,
}

impl FutureFeeEvaluator {
    pub fn new(schedule: FeeSchedule) -> Self {
        Self { schedule }
    }

    pub fn from_json_str(text: &str) -> Result<Self, FeeError> {
        FeeSchedule::from_json_str(text).map(Self::new)
    }

    /// Read and parse a commissions file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read commissions file failed: {}", path.display()))?;
        let evaluator = Self::from_json_str(&text)
            .with_context(|| format!("parse commissions file failed: {}", path.display()))?;
        info!(
            path = %path.display(),
            commodities = evaluator.schedule.commodities.len(),
            instruments = evaluator.schedule.instruments.len(),
            "fee schedule loaded"
        );
        Ok(evaluator)
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }
}

/// `amount × ratio`, rounded to the nearest fixed-point unit.
fn apply_ratio(instrument: &Instrument, amount: Price, ratio: f64) -> Result<Price, FeeError> {
    let scaled = (amount.raw() as f64 * ratio).round();
    if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
        return Err(FeeError::Overflow(instrument.to_string()));
    }
    Ok(Price::new(scaled as i64))
}

impl FeeEvaluator for FutureFeeEvaluator {
    fn price_tick(&self, instrument: &Instrument) -> Result<Price, FeeError> {
        Ok(self.schedule.rates_for(instrument)?.price_tick)
    }

    fn volume_multiple(&self, instrument: &Instrument) -> Result<i64, FeeError> {
        Ok(self.schedule.rates_for(instrument)?.volume_multiple)
    }

    fn compute(
        &self,
        instrument: &Instrument,
        volume: i64,
        price: Price,
        side: Side,
        offset: OffsetFlag,
    ) -> Result<FeeQuote, FeeError> {
        if volume <= 0 {
            return Err(FeeError::InvalidVolume(volume));
        }
        let rates = self.schedule.rates_for(instrument)?;
        let overflow = || FeeError::Overflow(instrument.to_string());

        let units = volume
            .checked_mul(rates.volume_multiple)
            .ok_or_else(overflow)?;
        let turnover = price.checked_mul_volume(units).ok_or_else(overflow)?;

        let margin = if offset.is_open() {
            apply_ratio(instrument, turnover, rates.margin_ratio(side))?
        } else {
            Price::ZERO
        };

        let (by_money, by_volume) = rates.commission_rates(offset);
        let commission = apply_ratio(instrument, turnover, by_money)?
            .raw()
            .checked_add(by_volume.checked_mul_volume(volume).ok_or_else(overflow)?.raw())
            .map(Price::new)
            .ok_or_else(overflow)?;

        Ok(FeeQuote { margin, commission })
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.schedule).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Decimal-string serde for Price fields
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Text(String),
    Number(f64),
}

fn decimal_to_price<E: serde::de::Error>(repr: DecimalRepr) -> Result<Price, E> {
    match repr {
        DecimalRepr::Text(s) => match parse_price(&s) {
            Ok(Some(p)) => Ok(p),
            Ok(None) => Err(E::custom("N/A is not a valid fee amount")),
            Err(e) => Err(E::custom(e)),
        },
        DecimalRepr::Number(n) => Price::from_f64(n).map_err(E::custom),
    }
}

mod decimal {
    use super::*;

    pub fn serialize<S: Serializer>(p: &Price, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(p)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Price, D::Error> {
        decimal_to_price(DecimalRepr::deserialize(d)?)
    }
}

mod decimal_opt {
    use super::*;

    pub fn serialize<S: Serializer>(p: &Option<Price>, s: S) -> Result<S::Ok, S::Error> {
        match p {
            Some(p) => s.collect_str(p),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Price>, D::Error> {
        match Option::<DecimalRepr>::deserialize(d)? {
            Some(repr) => decimal_to_price(repr).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE: &str = r#"{
        "commodities": {
            "RU": {
                "price_tick": "5", "volume_multiple": 10,
                "long_margin_ratio": 0.09, "short_margin_ratio": 0.10,
                "open_by_money": 0.000045, "close_by_money": 0.000045,
                "close_today_by_money": 0.0
            },
            "cu": {
                "price_tick": "10", "volume_multiple": 5,
                "long_margin_ratio": 0.08, "short_margin_ratio": 0.08,
                "open_by_volume": "3.00", "close_by_volume": "3.00",
                "close_today_by_volume": "6.00"
            }
        },
        "instruments": {
            "shfe.ru1901": { "price_tick": "5", "volume_multiple": 10, "long_margin_ratio": 0.2 }
        }
    }"#;

    fn eval() -> FutureFeeEvaluator {
        FutureFeeEvaluator::from_json_str(SCHEDULE).unwrap()
    }

    fn ins(s: &str) -> Instrument {
        s.parse().unwrap()
    }

    #[test]
    fn commodity_lookup_is_case_insensitive() {
        let e = eval();
        assert_eq!(e.price_tick(&ins("shfe.ru1905")).unwrap(), Price::units(5));
        assert_eq!(e.volume_multiple(&ins("shfe.RU1905")).unwrap(), 10);
        assert!(matches!(
            e.price_tick(&ins("shfe.zn1905")),
            Err(FeeError::UnknownInstrument(_))
        ));
    }

    #[test]
    fn instrument_entry_overrides_commodity() {
        let e = eval();
        let q = e
            .compute(&ins("shfe.ru1901"), 1, Price::units(10_000), Side::Buy, OffsetFlag::Open)
            .unwrap();
        // 10_000 × 10 × 0.2
        assert_eq!(q.margin, Price::units(20_000));
        assert_eq!(q.commission, Price::ZERO);
    }

    #[test]
    fn margin_by_side_and_commission_by_money() {
        let e = eval();
        let buy = e
            .compute(&ins("shfe.ru1905"), 2, Price::units(12_000), Side::Buy, OffsetFlag::Open)
            .unwrap();
        // turnover = 12_000 × 2 × 10 = 240_000
        assert_eq!(buy.margin, Price::units(21_600));
        assert_eq!(buy.commission, Price::new(108_000)); // 10.80
        let sell = e
            .compute(&ins("shfe.ru1905"), 2, Price::units(12_000), Side::Sell, OffsetFlag::Open)
            .unwrap();
        assert_eq!(sell.margin, Price::units(24_000));
    }

    #[test]
    fn close_orders_need_no_margin() {
        let e = eval();
        let q = e
            .compute(&ins("shfe.cu1905"), 2, Price::units(50_000), Side::Sell, OffsetFlag::Close)
            .unwrap();
        assert_eq!(q.margin, Price::ZERO);
        assert_eq!(q.commission, Price::units(6));
        let today = e
            .compute(&ins("shfe.cu1905"), 2, Price::units(50_000), Side::Sell, OffsetFlag::CloseToday)
            .unwrap();
        assert_eq!(today.commission, Price::units(12));
        let ru_today = e
            .compute(&ins("shfe.ru1905"), 1, Price::units(12_000), Side::Sell, OffsetFlag::CloseToday)
            .unwrap();
        assert_eq!(ru_today.commission, Price::ZERO);
    }

    #[test]
    fn rejects_non_positive_volume_and_overflow() {
        let e = eval();
        assert_eq!(
            e.compute(&ins("shfe.cu1905"), 0, Price::units(1), Side::Buy, OffsetFlag::Open),
            Err(FeeError::InvalidVolume(0))
        );
        assert!(matches!(
            e.compute(&ins("shfe.cu1905"), i64::MAX, Price::units(1), Side::Buy, OffsetFlag::Open),
            Err(FeeError::Overflow(_))
        ));
    }

    #[test]
    fn malformed_schedules_rejected() {
        assert!(FutureFeeEvaluator::from_json_str(r#"{"commodities":{"x":{"price_tick":"0"}}}"#).is_err());
        assert!(FutureFeeEvaluator::from_json_str(r#"{"commodities":{"x":{"price_tick":"1","bogus":1}}}"#).is_err());
        assert!(FutureFeeEvaluator::from_json_str(r#"{"instruments":{"ru1901":{"price_tick":"1"}}}"#).is_err());
        assert!(FutureFeeEvaluator::from_json_str("not json").is_err());
    }

    #[test]
    fn to_json_prints_decimal_strings() {
        let json = eval().to_json();
        assert_eq!(json["commodities"]["cu"]["open_by_volume"], "3.00");
        assert_eq!(json["commodities"]["ru"]["volume_multiple"], 10);
    }
}
