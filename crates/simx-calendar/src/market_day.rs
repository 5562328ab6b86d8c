//! Market-day oracle.
//!
//! Deterministic, pure logic. No IO, no wall-clock.
//!
//! The venue only needs three questions answered about a calendar date: is
//! it a market day, and which market day comes immediately before / after
//! it.  [`MarketDayOracle`] is that seam; [`WeekdayCalendar`] is the stock
//! implementation (Monday–Friday minus a holiday set).

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Longest run of consecutive non-market days searched before giving up.
pub const MAX_MARKET_DAY_SEARCH: i64 = 366;

pub trait MarketDayOracle: Send + Sync {
    fn is_market_day(&self, date: NaiveDate) -> bool;

    /// First market day strictly after `date`.
    fn next_market_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        step_market_day(self, date, 1)
    }

    /// Last market day strictly before `date`.
    fn prev_market_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        step_market_day(self, date, -1)
    }
}

fn step_market_day<O: MarketDayOracle + ?Sized>(
    oracle: &O,
    date: NaiveDate,
    direction: i64,
) -> Option<NaiveDate> {
    let mut d = date;
    for _ in 0..MAX_MARKET_DAY_SEARCH {
        d = d.checked_add_signed(Duration::days(direction))?;
        if oracle.is_market_day(d) {
            return Some(d);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// WeekdayCalendar
// ---------------------------------------------------------------------------

/// Monday–Friday, excluding an explicit holiday set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Mainland China exchange closures (SSE/SZSE/SHFE/DCE/CZCE/CFFEX/INE
    /// share one calendar).  Hardcoded for 2018–2019. Extend as needed.
    pub fn china_exchanges() -> Self {
        const HOLIDAYS: &[(i32, u32, u32)] = &[
            // ── 2018 ─────────────────────────────────────────────────────
            (2018, 1, 1),   // New Year
            (2018, 2, 15),  // Spring Festival
            (2018, 2, 16),
            (2018, 2, 19),
            (2018, 2, 20),
            (2018, 2, 21),
            (2018, 4, 5),   // Qingming
            (2018, 4, 6),
            (2018, 4, 30),  // Labour Day
            (2018, 5, 1),
            (2018, 6, 18),  // Dragon Boat
            (2018, 9, 24),  // Mid-Autumn
            (2018, 10, 1),  // National Day
            (2018, 10, 2),
            (2018, 10, 3),
            (2018, 10, 4),
            (2018, 10, 5),
            (2018, 12, 31), // New Year (observed)
            // ── 2019 ─────────────────────────────────────────────────────
            (2019, 1, 1),   // New Year
            (2019, 2, 4),   // Spring Festival
            (2019, 2, 5),
            (2019, 2, 6),
            (2019, 2, 7),
            (2019, 2, 8),
            (2019, 4, 5),   // Qingming
            (2019, 5, 1),   // Labour Day
            (2019, 5, 2),
            (2019, 5, 3),
            (2019, 6, 7),   // Dragon Boat
            (2019, 9, 13),  // Mid-Autumn
            (2019, 10, 1),  // National Day
            (2019, 10, 2),
            (2019, 10, 3),
            (2019, 10, 4),
            (2019, 10, 7),
        ];
        Self::new(
            HOLIDAYS
                .iter()
                .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        )
    }

    pub fn holidays(&self) -> impl Iterator<Item = &NaiveDate> {
        self.holidays.iter()
    }
}

impl MarketDayOracle for WeekdayCalendar {
    fn is_market_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}
