use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::Instrument;

/// One trading day's resolved session layout for one instrument.
///
/// `market_times` is the flattened, strictly increasing list of every stage
/// boundary (open, close, open, close, ...).  Each stage is a contiguous run
/// of that list; `stage_spans` records the `[start, end)` index range of each.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TradingTimes {
    instrument: Instrument,
    trading_day: NaiveDate,
    market_times: Vec<NaiveDateTime>,
    #[serde(skip)]
    stage_spans: Vec<(usize, usize)>,
}

impl TradingTimes {
    /// Callers guarantee `market_times` is non-empty and every span is a
    /// non-empty in-bounds range; `Exchange::trading_times` is the only
    /// constructor outside tests.
    pub(crate) fn new(
        instrument: Instrument,
        trading_day: NaiveDate,
        market_times: Vec<NaiveDateTime>,
        stage_spans: Vec<(usize, usize)>,
    ) -> Self {
        Self {
            instrument,
            trading_day,
            market_times,
            stage_spans,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn trading_day(&self) -> NaiveDate {
        self.trading_day
    }

    pub fn market_times(&self) -> &[NaiveDateTime] {
        &self.market_times
    }

    /// First boundary of each stage.
    pub fn stage_begins(&self) -> Vec<NaiveDateTime> {
        self.stage_spans
            .iter()
            .map(|&(start, _)| self.market_times[start])
            .collect()
    }

    pub fn stage_count(&self) -> usize {
        self.stage_spans.len()
    }

    pub fn first(&self) -> NaiveDateTime {
        self.market_times[0]
    }

    pub fn last(&self) -> NaiveDateTime {
        self.market_times[self.market_times.len() - 1]
    }

    /// `first() <= instant <= last()`.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.first() && instant <= self.last()
    }

    /// Index of the stage whose first..last boundary covers `instant`.
    pub fn stage_of(&self, instant: NaiveDateTime) -> Option<usize> {
        self.stage_spans.iter().position(|&(start, end)| {
            instant >= self.market_times[start] && instant <= self.market_times[end - 1]
        })
    }

    /// `true` when `instant` falls inside an open/close pair, i.e. the market
    /// is actually trading rather than on an intra-stage break.
    pub fn in_market(&self, instant: NaiveDateTime) -> bool {
        self.stage_spans.iter().any(|&(start, end)| {
            self.market_times[start..end]
                .chunks(2)
                .any(|pair| match pair {
                    [open, close] => instant >= *open && instant <= *close,
                    _ => false,
                })
        })
    }
}
