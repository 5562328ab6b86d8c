//! simx-fees
//!
//! Order vocabulary (side, offset flag) and the fee evaluator seam the
//! matching session consults for tick size, margin and commission.
//!
//! # Wiring
//! The venue only ever sees `dyn FeeEvaluator`.  [`FutureFeeEvaluator`] is
//! the stock implementation, built from a JSON schedule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use simx_calendar::Instrument;
use simx_price::Price;

mod future;

pub use future::{FeeRates, FeeSchedule, FutureFeeEvaluator};

// ---------------------------------------------------------------------------
// Order vocabulary
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" => Ok(Side::Buy),
            "sell" | "s" => Ok(Side::Sell),
            other => Err(FeeError::Malformed(format!("unknown side '{other}'"))),
        }
    }
}

/// Whether an order opens a new position or closes an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetFlag {
    Open,
    Close,
    CloseToday,
    CloseYesterday,
}

impl OffsetFlag {
    pub fn is_open(&self) -> bool {
        matches!(self, OffsetFlag::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetFlag::Open => "open",
            OffsetFlag::Close => "close",
            OffsetFlag::CloseToday => "close_today",
            OffsetFlag::CloseYesterday => "close_yesterday",
        }
    }
}

impl fmt::Display for OffsetFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OffsetFlag {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(OffsetFlag::Open),
            "close" => Ok(OffsetFlag::Close),
            "close_today" | "closetoday" => Ok(OffsetFlag::CloseToday),
            "close_yesterday" | "closeyesterday" => Ok(OffsetFlag::CloseYesterday),
            other => Err(FeeError::Malformed(format!("unknown offset flag '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator seam
// ---------------------------------------------------------------------------

/// Margin and commission required for one order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FeeQuote {
    pub margin: Price,
    pub commission: Price,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    /// No schedule entry covers the instrument.
    UnknownInstrument(String),
    /// Volume must be strictly positive.
    InvalidVolume(i64),
    /// Turnover or fee overflowed the fixed-point range.
    Overflow(String),
    Malformed(String),
}

impl fmt::Display for FeeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeError::UnknownInstrument(i) => write!(f, "no fee schedule for {i}"),
            FeeError::InvalidVolume(v) => write!(f, "invalid volume {v}"),
            FeeError::Overflow(i) => write!(f, "fee overflow for {i}"),
            FeeError::Malformed(msg) => write!(f, "malformed fee schedule: {msg}"),
        }
    }
}

impl std::error::Error for FeeError {}

/// Read-only after construction; shared across sessions.
pub trait FeeEvaluator: Send + Sync {
    /// Minimum price increment.
    fn price_tick(&self, instrument: &Instrument) -> Result<Price, FeeError>;

    /// Contract multiplier (units of underlying per lot).
    fn volume_multiple(&self, instrument: &Instrument) -> Result<i64, FeeError>;

    fn compute(
        &self,
        instrument: &Instrument,
        volume: i64,
        price: Price,
        side: Side,
        offset: OffsetFlag,
    ) -> Result<FeeQuote, FeeError>;

    /// Schedule as JSON, for the session's fee query.
    fn to_json(&self) -> serde_json::Value;
}
