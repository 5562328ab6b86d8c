//! Listener contract and the deferred response queue.
//!
//! Order and trade events are not delivered when they happen.  They are
//! queued (each tagged with its instrument and kind) and flushed to the
//! listener, in arrival order, on the next clock advance.  Events carry a
//! copy of the order as it was when queued, so a placement followed by a
//! fill within one clock step is reported as two distinct transitions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use simx_calendar::Instrument;
use simx_fees::{OffsetFlag, Side};
use simx_price::Price;

use crate::order::{SimOrder, SimOrderState, SimTxn};

/// Reason reported when a cancel names no resting order.
pub const REASON_NO_MATCHING_ORDER: &str = "no matching order";

// ---------------------------------------------------------------------------
// Listener contract
// ---------------------------------------------------------------------------

/// Order status as the strategy sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Submitted,
    Canceled,
    Complete,
    Failed,
}

/// Which request the status change answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitState {
    InsertSubmitted,
    InsertRejected,
    CancelSubmitted,
    CancelRejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderStateChange {
    pub account_id: String,
    pub order_ref: String,
    pub status: OrderStatus,
    pub sub_state: SubmitState,
    /// Epoch milliseconds of the clock reading at flush time.
    pub timestamp_ms: i64,
    pub trading_day: Option<NaiveDate>,
    pub reason: Option<String>,
    pub attrs: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionCreated {
    pub account_id: String,
    pub txn_id: String,
    pub order_ref: String,
    pub instrument: Instrument,
    pub side: Side,
    pub offset: OffsetFlag,
    pub price: Price,
    pub volume: i64,
    pub timestamp_ms: i64,
    pub trading_day: Option<NaiveDate>,
}

/// Strategy-facing callbacks.  Bound when the session is constructed and
/// never rebound.
pub trait TxnSessionListener: Send + Sync {
    fn on_order_state_changed(&self, change: &OrderStateChange);
    fn on_transaction_created(&self, txn: &TransactionCreated);
}

/// Listener that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl TxnSessionListener for NullListener {
    fn on_order_state_changed(&self, _change: &OrderStateChange) {}
    fn on_transaction_created(&self, _txn: &TransactionCreated) {}
}

// ---------------------------------------------------------------------------
// Pending queue
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    InsertRejected,
    CancelRejected,
    OrderReturn,
    TradeReturn,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PendingResponse {
    InsertRejected(SimOrder),
    CancelRejected { instrument: Instrument, order_ref: String },
    OrderReturn(SimOrder),
    TradeReturn(SimTxn),
}

impl PendingResponse {
    pub(crate) fn instrument(&self) -> &Instrument {
        match self {
            PendingResponse::InsertRejected(o) | PendingResponse::OrderReturn(o) => &o.instrument,
            PendingResponse::CancelRejected { instrument, .. } => instrument,
            PendingResponse::TradeReturn(t) => &t.instrument,
        }
    }

    pub(crate) fn kind(&self) -> ResponseKind {
        match self {
            PendingResponse::InsertRejected(_) => ResponseKind::InsertRejected,
            PendingResponse::CancelRejected { .. } => ResponseKind::CancelRejected,
            PendingResponse::OrderReturn(_) => ResponseKind::OrderReturn,
            PendingResponse::TradeReturn(_) => ResponseKind::TradeReturn,
        }
    }
}

/// Stamp applied to every response in one flush.
pub(crate) struct Stamp<'a> {
    pub account_id: &'a str,
    pub timestamp_ms: i64,
    pub trading_day: Option<NaiveDate>,
}

/// Translate one queued response into its listener callback.
pub(crate) fn deliver(listener: &dyn TxnSessionListener, response: PendingResponse, stamp: &Stamp<'_>) {
    match response {
        PendingResponse::InsertRejected(order) => {
            listener.on_order_state_changed(&OrderStateChange {
                account_id: stamp.account_id.to_string(),
                order_ref: order.order_ref,
                status: OrderStatus::Failed,
                sub_state: SubmitState::InsertRejected,
                timestamp_ms: stamp.timestamp_ms,
                trading_day: stamp.trading_day,
                reason: order.reason,
                attrs: BTreeMap::new(),
            });
        }
        PendingResponse::CancelRejected { order_ref, .. } => {
            listener.on_order_state_changed(&OrderStateChange {
                account_id: stamp.account_id.to_string(),
                order_ref,
                status: OrderStatus::Failed,
                sub_state: SubmitState::CancelRejected,
                timestamp_ms: stamp.timestamp_ms,
                trading_day: stamp.trading_day,
                reason: Some(REASON_NO_MATCHING_ORDER.to_string()),
                attrs: BTreeMap::new(),
            });
        }
        PendingResponse::OrderReturn(order) => {
            let (status, sub_state) = match order.state {
                SimOrderState::Placed => (OrderStatus::Submitted, SubmitState::InsertSubmitted),
                SimOrderState::Canceled => (OrderStatus::Canceled, SubmitState::CancelSubmitted),
                // Filled: the cancel side is closed too.
                SimOrderState::Completed => (OrderStatus::Complete, SubmitState::CancelSubmitted),
                SimOrderState::Invalid => (OrderStatus::Failed, SubmitState::InsertRejected),
            };
            let attrs = order.attrs();
            listener.on_order_state_changed(&OrderStateChange {
                account_id: stamp.account_id.to_string(),
                order_ref: order.order_ref,
                status,
                sub_state,
                timestamp_ms: stamp.timestamp_ms,
                trading_day: stamp.trading_day,
                reason: order.reason,
                attrs,
            });
        }
        PendingResponse::TradeReturn(txn) => {
            listener.on_transaction_created(&TransactionCreated {
                account_id: stamp.account_id.to_string(),
                txn_id: txn.id,
                order_ref: txn.order_ref,
                instrument: txn.instrument,
                side: txn.side,
                offset: txn.offset,
                price: txn.price,
                volume: txn.volume,
                timestamp_ms: stamp.timestamp_ms,
                trading_day: stamp.trading_day,
            });
        }
    }
}
