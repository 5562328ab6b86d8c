//! Session monotonicity
//!
//! GREEN when:
//! - for every instrument family in the shipped catalog and every market day
//!   across a holiday-heavy window, the resolved boundaries are strictly
//!   increasing.
//! - a prior-day stage always begins strictly before the first stage anchored
//!   on the nominal trading day.

use chrono::{Duration, NaiveDate};
use simx_calendar::{ExchangeCatalog, Instrument};

const INSTRUMENTS: &[&str] = &[
    "shfe.ru1905",
    "shfe.cu1905",
    "shfe.au1906",
    "shfe.wr1905",
    "ine.sc1906",
    "dce.m1909",
    "dce.i1909",
    "dce.c1909",
    "czce.SR905",
    "czce.AP910",
    "cffex.IF1903",
    "cffex.TF1906",
    "sse.600000",
    "szse.000001",
];

#[test]
fn boundaries_strictly_increase_every_market_day() {
    let catalog = ExchangeCatalog::builtin().unwrap();
    let start = NaiveDate::from_ymd_opt(2018, 12, 20).unwrap();

    let mut resolved = 0;
    for id in INSTRUMENTS {
        let instrument: Instrument = id.parse().unwrap();
        for offset in 0..120 {
            let day = start + Duration::days(offset);
            let Some(times) = catalog.trading_times(&instrument, day) else {
                continue;
            };
            resolved += 1;
            let mt = times.market_times();
            assert!(
                mt.windows(2).all(|w| w[0] < w[1]),
                "{id} on {day}: boundaries not strictly increasing: {mt:?}"
            );
        }
    }
    assert!(resolved > 500, "expected most days to resolve, got {resolved}");
}

#[test]
fn prior_day_stage_precedes_trading_day() {
    let catalog = ExchangeCatalog::builtin().unwrap();
    let ru: Instrument = "shfe.ru1905".parse().unwrap();
    let start = NaiveDate::from_ymd_opt(2019, 1, 2).unwrap();

    for offset in 0..60 {
        let day = start + Duration::days(offset);
        let Some(times) = catalog.trading_times(&ru, day) else {
            continue;
        };
        let begins = times.stage_begins();
        assert_eq!(begins.len(), 3);
        assert!(begins[0].date() < day, "night stage must anchor before {day}");
        assert_eq!(begins[1].date(), day);
        assert!(begins[0] < begins[1]);
    }
}
