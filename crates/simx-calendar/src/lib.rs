//! simx-calendar
//!
//! Instrument identity, market-day oracle, per-contract session templates and
//! the resolver that turns (instrument, trading day) into concrete session
//! boundaries.
//!
//! Deterministic, pure logic. No IO beyond parsing an already-read catalog,
//! no wall-clock.

use std::fmt;

mod exchange;
mod instrument;
mod market_day;
mod trading_times;

pub use exchange::{
    canonical_exchange_name, Contract, ContractDef, Exchange, ExchangeCatalog, ExchangeDef,
    ExchangeKind, HolidaysDef, MarketTimeRecord, RecordDef, StageDef, TimeStage, WILDCARD,
};
pub use instrument::{commodity_prefix, Instrument};
pub use market_day::{MarketDayOracle, WeekdayCalendar, MAX_MARKET_DAY_SEARCH};
pub use trading_times::TradingTimes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    MalformedInstrument(String),
    UnknownZone { exchange: String, zone: String },
    UnknownHolidayPreset { exchange: String, preset: String },
    BadTimeFrame { exchange: String, frame: String },
    /// A contract with no commodities, no records, or a stage with no
    /// (or repeated) boundaries.
    EmptyContract { exchange: String },
    DuplicateCommodity { exchange: String, commodity: String },
    DuplicateExchange(String),
    Json(String),
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::MalformedInstrument(s) => {
                write!(f, "malformed instrument '{s}' (expected exchange.code)")
            }
            CalendarError::UnknownZone { exchange, zone } => {
                write!(f, "exchange {exchange}: unknown time zone '{zone}'")
            }
            CalendarError::UnknownHolidayPreset { exchange, preset } => {
                write!(f, "exchange {exchange}: unknown holiday preset '{preset}'")
            }
            CalendarError::BadTimeFrame { exchange, frame } => {
                write!(f, "exchange {exchange}: bad time frame '{frame}'")
            }
            CalendarError::EmptyContract { exchange } => {
                write!(f, "exchange {exchange}: contract has an empty or degenerate session template")
            }
            CalendarError::DuplicateCommodity { exchange, commodity } => {
                write!(f, "exchange {exchange}: commodity '{commodity}' defined twice")
            }
            CalendarError::DuplicateExchange(name) => write!(f, "exchange '{name}' defined twice"),
            CalendarError::Json(msg) => write!(f, "exchange catalog json: {msg}"),
        }
    }
}

impl std::error::Error for CalendarError {}
