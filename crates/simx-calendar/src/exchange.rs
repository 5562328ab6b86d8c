//! Exchanges, contract session templates and the immutable exchange catalog.
//!
//! # Resolution
//!
//! An instrument code is matched to a [`Contract`] in this order:
//!
//! 1. exact code (`TF1810`)
//! 2. commodity prefix upper-cased (`TF`)
//! 3. commodity prefix lower-cased (`ru`)
//! 4. the `*` catch-all
//!
//! Security exchanges only ever use the `*` entry.
//!
//! # Overnight sessions
//!
//! A stage flagged `prior_day` is anchored on the market day before the
//! nominal trading day (the Friday-night session that trades for Monday).
//! Inside a stage, a boundary earlier than the one before it rolls into the
//! next calendar day (a 21:00–01:00 night session).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::instrument::commodity_prefix;
use crate::market_day::{MarketDayOracle, WeekdayCalendar};
use crate::{CalendarError, Instrument, TradingTimes};

/// Key of the catch-all contract.
pub const WILDCARD: &str = "*";

const BUILTIN_CATALOG_JSON: &str = include_str!("../data/exchanges.json");

// ---------------------------------------------------------------------------
// Contract model
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Future,
    Security,
}

/// One contiguous run of open/close boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeStage {
    pub frames: Vec<NaiveTime>,
    /// Stage belongs to the previous market day's calendar evening.
    pub prior_day: bool,
}

/// A session template that applies from `effective_from` (inclusive) until
/// superseded by a later record.  `None` means "since forever".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketTimeRecord {
    pub effective_from: Option<NaiveDate>,
    pub stages: Vec<TimeStage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contract {
    commodities: Vec<String>,
    /// Sorted ascending by `effective_from`, `None` first.
    records: Vec<MarketTimeRecord>,
}

impl Contract {
    pub fn commodities(&self) -> &[String] {
        &self.commodities
    }

    /// Latest record effective on or before `day`.
    pub fn record_for(&self, day: NaiveDate) -> Option<&MarketTimeRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.effective_from.map_or(true, |from| from <= day))
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

pub struct Exchange {
    name: String,
    kind: ExchangeKind,
    zone: Tz,
    /// Regular daytime open and close, ignoring breaks and night stages.
    day_session: (NaiveTime, NaiveTime),
    contracts: BTreeMap<String, Arc<Contract>>,
    oracle: Arc<dyn MarketDayOracle>,
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("zone", &self.zone)
            .field("day_session", &self.day_session)
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Exchange {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }

    pub fn is_future(&self) -> bool {
        self.kind == ExchangeKind::Future
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn day_session(&self) -> (NaiveTime, NaiveTime) {
        self.day_session
    }

    /// `true` when `time` lies inside the regular daytime window (inclusive).
    pub fn in_day_session(&self, time: NaiveTime) -> bool {
        let (open, close) = self.day_session;
        open <= time && time <= close
    }

    pub fn oracle(&self) -> &dyn MarketDayOracle {
        self.oracle.as_ref()
    }

    /// Stored casing of a commodity key, or the input unchanged when unknown.
    pub fn canonical_commodity<'a>(&'a self, commodity: &'a str) -> &'a str {
        self.contracts
            .keys()
            .find(|k| k.eq_ignore_ascii_case(commodity))
            .map(String::as_str)
            .unwrap_or(commodity)
    }

    pub fn match_contract(&self, code: &str) -> Option<&Arc<Contract>> {
        if self.kind == ExchangeKind::Security {
            return self.contracts.get(WILDCARD);
        }
        if let Some(c) = self.contracts.get(code).or_else(|| {
            self.contracts
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(code))
                .map(|(_, c)| c)
        }) {
            return Some(c);
        }
        let prefix = commodity_prefix(code);
        self.contracts
            .get(&prefix.to_ascii_uppercase())
            .or_else(|| self.contracts.get(&prefix.to_ascii_lowercase()))
            .or_else(|| self.contracts.get(WILDCARD))
    }

    /// Every contract key except the catch-all.
    pub fn contract_names(&self) -> Vec<&str> {
        self.contracts
            .keys()
            .filter(|k| k.as_str() != WILDCARD)
            .map(String::as_str)
            .collect()
    }

    /// Session boundaries of `instrument` for `trading_day`.
    ///
    /// `None` when the day is not a market day, no contract matches, or a
    /// prior-day stage has no preceding market day inside the search window.
    pub fn trading_times(&self, instrument: &Instrument, trading_day: NaiveDate) -> Option<TradingTimes> {
        if !self.oracle.is_market_day(trading_day) {
            return None;
        }
        let contract = self.match_contract(instrument.code())?;
        let record = contract.record_for(trading_day)?;

        let mut times: Vec<NaiveDateTime> = Vec::new();
        let mut spans = Vec::with_capacity(record.stages.len());
        for stage in &record.stages {
            let anchor = if stage.prior_day {
                self.oracle.prev_market_day(trading_day)?
            } else {
                trading_day
            };
            let start = times.len();
            for frame in &stage.frames {
                let t = match times.get(start..).and_then(|s| s.last()) {
                    Some(prev) => {
                        let t = prev.date().and_time(*frame);
                        if t < *prev {
                            t + Duration::days(1)
                        } else {
                            t
                        }
                    }
                    None => anchor.and_time(*frame),
                };
                times.push(t);
            }
            spans.push((start, times.len()));
        }
        if times.is_empty() {
            return None;
        }
        Some(TradingTimes::new(instrument.clone(), trading_day, times, spans))
    }

    /// The trading day whose session covers `instant`.
    ///
    /// Tries the calendar date of `instant` first; when that day has no
    /// session or the session does not contain `instant`, falls through to
    /// the next market day (evening ticks belong to tomorrow's night
    /// session).
    pub fn detect_trading_times(&self, instrument: &Instrument, instant: NaiveDateTime) -> Option<TradingTimes> {
        let date = instant.date();
        if let Some(times) = self.trading_times(instrument, date) {
            if times.contains(instant) {
                return Some(times);
            }
        }
        let next = self.oracle.next_market_day(date)?;
        self.trading_times(instrument, next)
    }

    /// Exchange-local wall time → epoch milliseconds.  Ambiguous local times
    /// take the earlier instant; non-existent ones (DST gap) yield `None`.
    pub fn to_epoch_millis(&self, local: NaiveDateTime) -> Option<i64> {
        self.zone
            .from_local_datetime(&local)
            .earliest()
            .map(|t| t.timestamp_millis())
    }
}

// ---------------------------------------------------------------------------
// Serde definitions
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeDef {
    pub name: String,
    pub kind: ExchangeKind,
    #[serde(default = "default_zone")]
    pub zone: String,
    #[serde(default)]
    pub holidays: HolidaysDef,
    /// `[open, close]`; defaults by kind when absent.
    #[serde(default)]
    pub day_session: Option<[String; 2]>,
    pub contracts: Vec<ContractDef>,
}

fn default_zone() -> String {
    "Asia/Shanghai".to_string()
}

/// Either a named preset (`"china"`) or an explicit list of closure dates.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum HolidaysDef {
    Preset(String),
    Dates(Vec<NaiveDate>),
}

impl Default for HolidaysDef {
    fn default() -> Self {
        HolidaysDef::Dates(Vec::new())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractDef {
    pub commodities: Vec<String>,
    pub records: Vec<RecordDef>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordDef {
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
    pub stages: Vec<StageDef>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageDef {
    /// `HH:MM` or `HH:MM:SS`.
    pub frames: Vec<String>,
    #[serde(default)]
    pub prior_day: bool,
}

fn parse_frame(exchange: &str, raw: &str) -> Result<NaiveTime, CalendarError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| CalendarError::BadTimeFrame {
            exchange: exchange.to_string(),
            frame: raw.to_string(),
        })
}

impl ExchangeDef {
    pub fn build(self) -> Result<Exchange, CalendarError> {
        let name = self.name.to_ascii_lowercase();
        let zone: Tz = self.zone.parse().map_err(|_| CalendarError::UnknownZone {
            exchange: name.clone(),
            zone: self.zone.clone(),
        })?;
        let oracle: Arc<dyn MarketDayOracle> = match self.holidays {
            HolidaysDef::Preset(p) if p.eq_ignore_ascii_case("china") => {
                Arc::new(WeekdayCalendar::china_exchanges())
            }
            HolidaysDef::Preset(p) => {
                return Err(CalendarError::UnknownHolidayPreset {
                    exchange: name,
                    preset: p,
                })
            }
            HolidaysDef::Dates(dates) => Arc::new(WeekdayCalendar::new(dates)),
        };

        let day_session = match &self.day_session {
            Some([open, close]) => (parse_frame(&name, open)?, parse_frame(&name, close)?),
            None => default_day_session(self.kind),
        };

        let mut contracts = BTreeMap::new();
        for def in self.contracts {
            let contract = Arc::new(build_contract(&name, def)?);
            for commodity in contract.commodities() {
                if contracts
                    .insert(commodity.clone(), Arc::clone(&contract))
                    .is_some()
                {
                    return Err(CalendarError::DuplicateCommodity {
                        exchange: name,
                        commodity: commodity.clone(),
                    });
                }
            }
        }
        debug!(exchange = %name, contracts = contracts.len(), "exchange loaded");

        Ok(Exchange {
            name,
            kind: self.kind,
            zone,
            day_session,
            contracts,
            oracle,
        })
    }
}

fn default_day_session(kind: ExchangeKind) -> (NaiveTime, NaiveTime) {
    let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
    match kind {
        ExchangeKind::Future => (hm(9, 0), hm(15, 0)),
        ExchangeKind::Security => (hm(9, 30), hm(15, 0)),
    }
}

fn build_contract(exchange: &str, def: ContractDef) -> Result<Contract, CalendarError> {
    if def.commodities.is_empty() || def.records.is_empty() {
        return Err(CalendarError::EmptyContract {
            exchange: exchange.to_string(),
        });
    }
    let mut records = Vec::with_capacity(def.records.len());
    for r in def.records {
        let mut stages = Vec::with_capacity(r.stages.len());
        for s in r.stages {
            let frames = s
                .frames
                .iter()
                .map(|f| parse_frame(exchange, f))
                .collect::<Result<Vec<_>, _>>()?;
            if frames.is_empty() || frames.windows(2).any(|w| w[0] == w[1]) {
                return Err(CalendarError::EmptyContract {
                    exchange: exchange.to_string(),
                });
            }
            stages.push(TimeStage {
                frames,
                prior_day: s.prior_day,
            });
        }
        if stages.is_empty() {
            return Err(CalendarError::EmptyContract {
                exchange: exchange.to_string(),
            });
        }
        records.push(MarketTimeRecord {
            effective_from: r.effective_from,
            stages,
        });
    }
    records.sort_by_key(|r| r.effective_from);
    Ok(Contract {
        commodities: def.commodities,
        records,
    })
}

// ---------------------------------------------------------------------------
// ExchangeCatalog
// ---------------------------------------------------------------------------

/// Immutable set of exchanges, built once at start-up and shared by `Arc`.
#[derive(Debug, Default)]
pub struct ExchangeCatalog {
    exchanges: BTreeMap<String, Arc<Exchange>>,
}

/// Lower-cases and applies the short-name aliases (`SH`, `SZ`, `sze`).
pub fn canonical_exchange_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.as_str() {
        "sh" => "sse".to_string(),
        "sz" | "sze" => "szse".to_string(),
        _ => lower,
    }
}

impl ExchangeCatalog {
    pub fn from_defs(defs: Vec<ExchangeDef>) -> Result<Self, CalendarError> {
        let mut exchanges = BTreeMap::new();
        for def in defs {
            let ex = def.build()?;
            let key = ex.name().to_string();
            if exchanges.insert(key.clone(), Arc::new(ex)).is_some() {
                return Err(CalendarError::DuplicateExchange(key));
            }
        }
        Ok(Self { exchanges })
    }

    pub fn from_json(text: &str) -> Result<Self, CalendarError> {
        let defs: Vec<ExchangeDef> =
            serde_json::from_str(text).map_err(|e| CalendarError::Json(e.to_string()))?;
        Self::from_defs(defs)
    }

    /// Mainland China exchanges shipped with the crate.
    pub fn builtin() -> Result<Self, CalendarError> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }

    pub fn exchange(&self, name: &str) -> Option<&Arc<Exchange>> {
        self.exchanges.get(&canonical_exchange_name(name))
    }

    pub fn exchange_of(&self, instrument: &Instrument) -> Option<&Arc<Exchange>> {
        self.exchange(instrument.exchange())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exchanges.keys().map(String::as_str)
    }

    pub fn trading_times(&self, instrument: &Instrument, trading_day: NaiveDate) -> Option<TradingTimes> {
        self.exchange_of(instrument)?
            .trading_times(instrument, trading_day)
    }

    pub fn detect_trading_times(&self, instrument: &Instrument, instant: NaiveDateTime) -> Option<TradingTimes> {
        self.exchange_of(instrument)?
            .detect_trading_times(instrument, instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dt(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
        d(y, m, day).and_hms_opt(h, min, 0).unwrap()
    }

    fn catalog() -> ExchangeCatalog {
        ExchangeCatalog::builtin().unwrap()
    }

    #[test]
    fn aliases_resolve() {
        let c = catalog();
        assert_eq!(c.exchange("SH").unwrap().name(), "sse");
        assert_eq!(c.exchange("sze").unwrap().name(), "szse");
        assert_eq!(c.exchange("SZ").unwrap().name(), "szse");
        assert_eq!(c.exchange("SHFE").unwrap().name(), "shfe");
        assert!(c.exchange("nyse").is_none());
    }

    #[test]
    fn day_session_defaults_by_kind() {
        let c = catalog();
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(c.exchange("shfe").unwrap().day_session(), (t(9, 0), t(15, 0)));
        assert_eq!(c.exchange("sse").unwrap().day_session(), (t(9, 30), t(15, 0)));
        let cffex = c.exchange("cffex").unwrap();
        assert_eq!(cffex.day_session(), (t(9, 15), t(15, 15)));
        assert!(cffex.in_day_session(t(15, 15)));
        assert!(!cffex.in_day_session(t(9, 0)));
    }

    #[test]
    fn contract_resolution_order() {
        let c = catalog();
        let cffex = c.exchange("cffex").unwrap();
        // Upper-case prefix.
        let tf = cffex.match_contract("tf1810").unwrap();
        assert!(tf.commodities().iter().any(|k| k == "TF"));
        // Lower-case prefix.
        let shfe = c.exchange("shfe").unwrap();
        let ru = shfe.match_contract("RU1901").unwrap();
        assert!(ru.commodities().iter().any(|k| k == "ru"));
        // Catch-all.
        let other = shfe.match_contract("zz1901").unwrap();
        assert!(other.commodities().iter().any(|k| k == WILDCARD));
    }

    #[test]
    fn exact_contract_key_matches_any_case() {
        let c = ExchangeCatalog::from_json(
            r#"[{
                "name": "demo",
                "kind": "future",
                "contracts": [
                    { "commodities": ["*"], "records": [{ "stages": [{ "frames": ["09:00", "15:00"] }] }] },
                    { "commodities": ["TF1810"], "records": [{ "stages": [{ "frames": ["09:15", "15:15"] }] }] }
                ]
            }]"#,
        )
        .unwrap();
        let demo = c.exchange("demo").unwrap();
        for code in ["TF1810", "tf1810", "Tf1810"] {
            let contract = demo.match_contract(code).unwrap();
            assert_eq!(contract.commodities(), ["TF1810".to_string()], "{code}");
        }
        // A sibling month falls through to the catch-all.
        let other = demo.match_contract("tf1812").unwrap();
        assert_eq!(other.commodities(), [WILDCARD.to_string()]);
    }

    #[test]
    fn securities_use_only_wildcard() {
        let c = catalog();
        let sse = c.exchange("sse").unwrap();
        let contract = sse.match_contract("600000").unwrap();
        assert_eq!(contract.commodities(), [WILDCARD.to_string()]);
        assert!(sse.contract_names().is_empty());
    }

    #[test]
    fn canonical_commodity_returns_stored_case() {
        let c = catalog();
        let shfe = c.exchange("shfe").unwrap();
        assert_eq!(shfe.canonical_commodity("RU"), "ru");
        assert_eq!(shfe.canonical_commodity("xx"), "xx");
    }

    #[test]
    fn non_market_day_has_no_session() {
        let c = catalog();
        let ru: Instrument = "shfe.ru1901".parse().unwrap();
        assert!(c.trading_times(&ru, d(2018, 12, 8)).is_none()); // Saturday
    }

    #[test]
    fn night_session_crosses_midnight() {
        let c = catalog();
        let cu: Instrument = "shfe.cu1901".parse().unwrap();
        // Monday trading day: night session is Friday 21:00 → Saturday 01:00.
        let t = c.trading_times(&cu, d(2018, 12, 10)).unwrap();
        assert_eq!(t.first(), dt(2018, 12, 7, 21, 0));
        assert_eq!(t.market_times()[1], dt(2018, 12, 8, 1, 0));
        assert_eq!(t.last(), dt(2018, 12, 10, 15, 0));
    }

    #[test]
    fn detect_moves_evening_to_next_trading_day() {
        let c = catalog();
        let ru: Instrument = "shfe.ru1901".parse().unwrap();
        let day = c.detect_trading_times(&ru, dt(2018, 12, 10, 10, 0)).unwrap();
        assert_eq!(day.trading_day(), d(2018, 12, 10));
        let night = c.detect_trading_times(&ru, dt(2018, 12, 10, 21, 30)).unwrap();
        assert_eq!(night.trading_day(), d(2018, 12, 11));
        assert!(night.in_market(dt(2018, 12, 10, 21, 30)));
    }

    #[test]
    fn detect_saturday_morning_falls_through_to_monday() {
        let c = catalog();
        let cu: Instrument = "shfe.cu1901".parse().unwrap();
        let t = c.detect_trading_times(&cu, dt(2018, 12, 8, 0, 30)).unwrap();
        assert_eq!(t.trading_day(), d(2018, 12, 10));
        assert!(t.in_market(dt(2018, 12, 8, 0, 30)));
    }

    #[test]
    fn effective_records_switch_by_day() {
        let c = catalog();
        let m: Instrument = "dce.m1909".parse().unwrap();
        let before = c.trading_times(&m, d(2019, 3, 28)).unwrap();
        let after = c.trading_times(&m, d(2019, 4, 1)).unwrap();
        assert_eq!(before.market_times()[1], dt(2019, 3, 27, 23, 30));
        assert_eq!(after.market_times()[1], dt(2019, 3, 29, 23, 0));
    }

    #[test]
    fn epoch_millis_uses_exchange_zone() {
        let c = catalog();
        let shfe = c.exchange("shfe").unwrap();
        // 2018-12-10 09:00 +08:00 == 2018-12-10 01:00Z.
        assert_eq!(
            shfe.to_epoch_millis(dt(2018, 12, 10, 9, 0)),
            Some(1_544_403_600_000)
        );
    }

    #[test]
    fn bad_definitions_rejected() {
        let bad_zone = r#"[{"name":"x","kind":"future","zone":"Mars/Base","contracts":[]}]"#;
        assert!(matches!(
            ExchangeCatalog::from_json(bad_zone),
            Err(CalendarError::UnknownZone { .. })
        ));
        let bad_frame = r#"[{"name":"x","kind":"future","contracts":[
            {"commodities":["*"],"records":[{"stages":[{"frames":["25:00","26:00"]}]}]}]}]"#;
        assert!(matches!(
            ExchangeCatalog::from_json(bad_frame),
            Err(CalendarError::BadTimeFrame { .. })
        ));
        let dup = r#"[{"name":"x","kind":"future","contracts":[]},{"name":"X","kind":"future","contracts":[]}]"#;
        assert!(matches!(
            ExchangeCatalog::from_json(dup),
            Err(CalendarError::DuplicateExchange(_))
        ));
    }
}
