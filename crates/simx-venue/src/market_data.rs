//! Market-data boundary.
//!
//! The session never pulls from a feed.  Ticks are pushed in by the driver
//! (registry fan-out); the session only asks [`MarketDataSource`] for the
//! latest snapshot of an instrument when it validates a new order.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use simx_calendar::Instrument;
use simx_price::Price;

/// One market-data snapshot for one instrument.
///
/// Price limits are optional: `None` means the venue publishes no bound on
/// that side (the "unbounded" case), never an in-band sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub instrument: Instrument,
    pub trading_day: NaiveDate,
    pub last_price: Price,
    pub upper_limit: Option<Price>,
    pub lower_limit: Option<Price>,
    pub update_time: NaiveDateTime,
}

impl Tick {
    /// `true` when `price` lies inside `[lower_limit, upper_limit]`.
    pub fn within_limits(&self, price: Price) -> bool {
        self.lower_limit.map_or(true, |lo| price >= lo)
            && self.upper_limit.map_or(true, |hi| price <= hi)
    }
}

pub trait MarketDataSource: Send + Sync {
    /// Most recent tick seen for `instrument`, if any.
    fn last_data(&self, instrument: &Instrument) -> Option<Tick>;
}

/// Latest-tick cache shared by every session of a registry.
#[derive(Debug, Default)]
pub struct TickCache {
    latest: RwLock<BTreeMap<Instrument, Tick>>,
}

impl TickCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tick` as the latest for its instrument.
    pub fn update(&self, tick: Tick) {
        let mut guard = self.latest.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(tick.instrument.clone(), tick);
    }

    pub fn len(&self) -> usize {
        self.latest.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MarketDataSource for TickCache {
    fn last_data(&self, instrument: &Instrument) -> Option<Tick> {
        self.latest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(instrument)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(last: i64, lo: Option<i64>, hi: Option<i64>) -> Tick {
        let day = NaiveDate::from_ymd_opt(2018, 12, 10).unwrap();
        Tick {
            instrument: Instrument::new("shfe", "ru1901"),
            trading_day: day,
            last_price: Price::units(last),
            upper_limit: hi.map(Price::units),
            lower_limit: lo.map(Price::units),
            update_time: day.and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn limits_are_inclusive_and_optional() {
        let t = tick(100, Some(90), Some(110));
        assert!(t.within_limits(Price::units(90)));
        assert!(t.within_limits(Price::units(110)));
        assert!(!t.within_limits(Price::units(111)));
        assert!(!t.within_limits(Price::units(89)));

        let open = tick(100, None, None);
        assert!(open.within_limits(Price::units(1_000_000)));
    }

    #[test]
    fn cache_keeps_latest_per_instrument() {
        let cache = TickCache::new();
        assert!(cache.is_empty());
        cache.update(tick(100, None, None));
        cache.update(tick(101, None, None));
        assert_eq!(cache.len(), 1);
        let ru = Instrument::new("shfe", "ru1901");
        assert_eq!(cache.last_data(&ru).unwrap().last_price, Price::units(101));
        assert!(cache.last_data(&Instrument::new("shfe", "cu1901")).is_none());
    }
}
