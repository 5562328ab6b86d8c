//! simx-venue
//!
//! Simulated trading venue for one account at a time: order validation,
//! fund and position freezing, fill-on-tick matching against the last
//! price, the account money ledger, and deferred delivery of order and
//! trade responses to a listener.
//!
//! Pure deterministic state.  No IO apart from reading the account's
//! commissions file on connect.

use std::fmt;

pub mod clock;
pub mod ledger;
pub mod market_data;
pub mod order;
pub mod position;
pub mod response;
pub mod session;

pub use clock::{ClockSource, SimClock};
pub use ledger::{Ledger, MoneyBucket, FUNDS_BUFFER};
pub use market_data::{MarketDataSource, Tick, TickCache};
pub use order::{OrderRequest, SimOrder, SimOrderState, SimTxn, TransitionError};
pub use position::{SideBook, SimPosition};
pub use response::{
    NullListener, OrderStateChange, OrderStatus, ResponseKind, SubmitState, TransactionCreated,
    TxnSessionListener, REASON_NO_MATCHING_ORDER,
};
pub use session::{ConnState, OrderEvent, SessionContext, SimTxnSession, TxnSession, SIM_PROVIDER};

use simx_fees::FeeError;

/// Faults raised while applying a tick.  Validation failures are not
/// errors; they become rejected orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    NotConnected,
    Fee(FeeError),
    Transition(TransitionError),
    /// Fixed-point arithmetic left the representable range.
    Overflow(String),
    InsufficientPosition {
        instrument: String,
        held: i64,
        closing: i64,
    },
    UnknownOrderIndex(usize),
}

impl fmt::Display for VenueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VenueError::NotConnected => write!(f, "session not connected"),
            VenueError::Fee(e) => write!(f, "fee evaluation failed: {e}"),
            VenueError::Transition(e) => write!(f, "{e}"),
            VenueError::Overflow(what) => write!(f, "arithmetic overflow: {what}"),
            VenueError::InsufficientPosition {
                instrument,
                held,
                closing,
            } => write!(
                f,
                "insufficient position for {instrument}: held={held} closing={closing}"
            ),
            VenueError::UnknownOrderIndex(i) => write!(f, "resting order index {i} out of range"),
        }
    }
}

impl std::error::Error for VenueError {}

impl From<FeeError> for VenueError {
    fn from(e: FeeError) -> Self {
        VenueError::Fee(e)
    }
}

impl From<TransitionError> for VenueError {
    fn from(e: TransitionError) -> Self {
        VenueError::Transition(e)
    }
}
