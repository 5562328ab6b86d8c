//! Simulated trading clock.
//!
//! The clock only moves when the driver says so.  Each advance is the signal
//! sessions use to flush their queued responses.

use std::sync::RwLock;

use chrono::{NaiveDate, NaiveDateTime};

pub trait ClockSource: Send + Sync {
    /// `(trading_day, exchange-local instant)` of the last advance.
    fn now(&self) -> Option<(NaiveDate, NaiveDateTime)>;

    fn market_time(&self) -> Option<NaiveDateTime> {
        self.now().map(|(_, t)| t)
    }

    fn trading_day(&self) -> Option<NaiveDate> {
        self.now().map(|(d, _)| d)
    }
}

#[derive(Debug, Default)]
pub struct SimClock {
    now: RwLock<Option<(NaiveDate, NaiveDateTime)>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `(trading_day, instant)`.  Returns `false` (and keeps the
    /// current reading) when `instant` is earlier than the current one.
    pub fn advance(&self, trading_day: NaiveDate, instant: NaiveDateTime) -> bool {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        if matches!(*guard, Some((_, cur)) if instant < cur) {
            return false;
        }
        *guard = Some((trading_day, instant));
        true
    }
}

impl ClockSource for SimClock {
    fn now(&self) -> Option<(NaiveDate, NaiveDateTime)> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_never_moves_backwards() {
        let day = NaiveDate::from_ymd_opt(2018, 12, 10).unwrap();
        let t0 = day.and_hms_opt(9, 0, 0).unwrap();
        let t1 = day.and_hms_opt(9, 0, 1).unwrap();

        let clock = SimClock::new();
        assert_eq!(clock.now(), None);
        assert!(clock.advance(day, t1));
        assert!(!clock.advance(day, t0));
        assert_eq!(clock.market_time(), Some(t1));
        assert!(clock.advance(day, t1));
        assert_eq!(clock.trading_day(), Some(day));
    }
}
