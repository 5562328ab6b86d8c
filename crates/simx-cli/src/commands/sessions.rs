//! `simx sessions`: print an instrument's trading-time boundaries.

use std::fmt::Write;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use simx_calendar::{ExchangeCatalog, Instrument};

pub fn render(catalog: &ExchangeCatalog, instrument: &str, day: &str) -> Result<String> {
    let instrument: Instrument = instrument
        .parse()
        .with_context(|| format!("bad instrument '{instrument}'"))?;
    let day = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .with_context(|| format!("bad trading day '{day}'"))?;

    let times = catalog
        .trading_times(&instrument, day)
        .ok_or_else(|| anyhow!("no trading times for {instrument} on {day}"))?;

    let begins = times.stage_begins();
    let mut out = String::new();
    writeln!(
        out,
        "instrument={} trading_day={} stages={}",
        times.instrument(),
        times.trading_day(),
        times.stage_count()
    )?;
    for (i, t) in times.market_times().iter().enumerate() {
        let kind = if i % 2 == 0 { "open" } else { "close" };
        let marker = if begins.contains(t) { " stage_begin" } else { "" };
        writeln!(out, "{} {}{}", t.format("%Y-%m-%d %H:%M:%S"), kind, marker)?;
    }
    Ok(out)
}
