//! Instrument identity: `<exchange>.<code>`, e.g. `shfe.ru1901`, `sse.600000`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CalendarError;

/// A tradable instrument on a named exchange.
///
/// The exchange name is stored lower-case; the code keeps its listing case
/// (`ru1901`, `TF1810`, `600000`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instrument {
    exchange: String,
    code: String,
}

impl Instrument {
    pub fn new(exchange: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into().to_ascii_lowercase(),
            code: code.into(),
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// The commodity prefix: the code up to its first digit (`ru1901` → `ru`).
    pub fn commodity(&self) -> &str {
        commodity_prefix(&self.code)
    }
}

/// Leading non-digit run of an instrument code.
pub fn commodity_prefix(code: &str) -> &str {
    let end = code
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(code.len());
    &code[..end]
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.exchange, self.code)
    }
}

impl FromStr for Instrument {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        match t.split_once('.') {
            Some((ex, code)) if !ex.is_empty() && !code.is_empty() => Ok(Instrument::new(ex, code)),
            _ => Err(CalendarError::MalformedInstrument(s.to_string())),
        }
    }
}

impl Serialize for Instrument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Instrument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
