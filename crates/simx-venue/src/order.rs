//! Simulated orders and transactions.
//!
//! # State diagram
//!
//! ```text
//!   submit ──► Invalid (term.)          rejected by validation
//!     │
//!     └─────► Placed ──fill──► Completed (term.)
//!               │
//!               └──cancel──► Canceled (term.)
//! ```
//!
//! There is no partial-fill state: an order trades its whole volume at once
//! or not at all.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use simx_calendar::Instrument;
use simx_fees::{OffsetFlag, Side};
use simx_price::Price;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimOrderState {
    /// Rejected before acceptance. **Terminal.**
    Invalid,
    /// Accepted and resting against future ticks.
    Placed,
    /// **Terminal.**
    Canceled,
    /// Fully filled. **Terminal.**
    Completed,
}

impl SimOrderState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SimOrderState::Placed)
    }
}

/// Returned when an order is driven through an illegal transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub order_ref: String,
    pub from: SimOrderState,
    pub to: SimOrderState,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal order transition for {}: {:?} -> {:?}",
            self.order_ref, self.from, self.to
        )
    }
}

impl std::error::Error for TransitionError {}

/// What the strategy asks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_ref: String,
    pub instrument: Instrument,
    pub side: Side,
    pub offset: OffsetFlag,
    pub limit_price: Price,
    pub volume: i64,
}

/// An order as the venue tracks it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimOrder {
    pub order_ref: String,
    /// Venue-assigned id, present once the order is accepted.
    pub sys_id: Option<String>,
    pub instrument: Instrument,
    pub side: Side,
    pub offset: OffsetFlag,
    pub limit_price: Price,
    pub volume: i64,
    pub state: SimOrderState,
    pub reason: Option<String>,
    pub submit_time: Option<NaiveDateTime>,
    /// Amounts reserved at acceptance; released exactly on fill or cancel.
    pub frozen_margin: Price,
    pub frozen_commission: Price,
}

impl SimOrder {
    pub(crate) fn from_request(req: OrderRequest, submit_time: Option<NaiveDateTime>) -> Self {
        Self {
            order_ref: req.order_ref,
            sys_id: None,
            instrument: req.instrument,
            side: req.side,
            offset: req.offset,
            limit_price: req.limit_price,
            volume: req.volume,
            state: SimOrderState::Placed,
            reason: None,
            submit_time,
            frozen_margin: Price::ZERO,
            frozen_commission: Price::ZERO,
        }
    }

    pub(crate) fn reject(&mut self, reason: impl Into<String>) {
        self.state = SimOrderState::Invalid;
        self.reason = Some(reason.into());
    }

    fn transition(&mut self, to: SimOrderState) -> Result<(), TransitionError> {
        if self.state != SimOrderState::Placed {
            return Err(TransitionError {
                order_ref: self.order_ref.clone(),
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    pub(crate) fn cancel(&mut self) -> Result<(), TransitionError> {
        self.transition(SimOrderState::Canceled)
    }

    pub(crate) fn complete(&mut self) -> Result<(), TransitionError> {
        self.transition(SimOrderState::Completed)
    }

    /// Fill rule against the latest trade: buys trade when the limit is at or
    /// above the last price, sells when at or below.  A non-positive last
    /// price (no trade yet) never crosses.
    pub fn crosses(&self, last_price: Price) -> bool {
        if last_price <= Price::ZERO {
            return false;
        }
        match self.side {
            Side::Buy => self.limit_price >= last_price,
            Side::Sell => self.limit_price <= last_price,
        }
    }

    pub(crate) fn attrs(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        if let Some(id) = &self.sys_id {
            attrs.insert("sys_id".to_string(), id.clone());
        }
        attrs
    }
}

/// Immutable record of a fill.  One per completed order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimTxn {
    pub id: String,
    pub order_ref: String,
    pub instrument: Instrument,
    pub side: Side,
    pub offset: OffsetFlag,
    pub price: Price,
    pub volume: i64,
    pub time: NaiveDateTime,
    pub margin: Price,
    pub commission: Price,
}
