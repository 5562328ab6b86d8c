//! Simulated transaction session: one account's connection to the venue.
//!
//! # Order flow
//!
//! `submit` validates in a fixed order and stops at the first failure:
//!
//! 1. session connected
//! 2. volume > 0
//! 3. a tick exists for the instrument
//! 4. limit price inside the tick's `[lower, upper]` limits
//! 5. limit price is a multiple of the instrument's price tick
//! 6. available ≥ margin + commission + [`FUNDS_BUFFER`]
//! 7. close orders: enough unfrozen volume on the side being closed
//!
//! A rejected order is recorded as `Invalid` with a reason; nothing in the
//! ledger moves.  An accepted order freezes its margin and commission.
//!
//! # Tick flow
//!
//! For the tick's instrument only: every resting order whose limit crosses
//! the last price fills in full at the last price, then the position is
//! marked to market and the ledger recomputed.  A tick whose last price is
//! not positive carries no trade and leaves the position alone.  The whole
//! book is checkpointed first and restored if anything in the tick fails
//! (including arithmetic overflow), so a faulting tick leaves the account
//! exactly as it was, trading day included.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use simx_calendar::{ExchangeCatalog, Instrument};
use simx_config::AccountConfig;
use simx_fees::{FeeEvaluator, FutureFeeEvaluator};
use simx_price::Price;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::ClockSource;
use crate::ledger::{Ledger, FUNDS_BUFFER};
use crate::market_data::{MarketDataSource, Tick};
use crate::order::{OrderRequest, SimOrder, SimOrderState, SimTxn};
use crate::position::SimPosition;
use crate::response::{deliver, PendingResponse, Stamp, TxnSessionListener, REASON_NO_MATCHING_ORDER};
use crate::VenueError;

/// Provider name this session registers under.
pub const SIM_PROVIDER: &str = "simtxn";

pub const REASON_NOT_CONNECTED: &str = "not connected";
pub const REASON_INVALID_VOLUME: &str = "invalid volume";
pub const REASON_NO_MARKET_DATA: &str = "no market data";
pub const REASON_OUT_OF_QUOTE_RANGE: &str = "out of quote range";
pub const REASON_TICK_SIZE_MISMATCH: &str = "tick size mismatch";
pub const REASON_INSUFFICIENT_FUNDS: &str = "insufficient funds";
pub const REASON_INSUFFICIENT_POSITION: &str = "insufficient position";

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnState {
    Initialized,
    Connecting,
    Connected,
    /// **Terminal.** Setup failed; the session accepts no orders.
    ConnectFailed,
    Disconnected,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Immediate result of a submit or cancel.  The same outcome also reaches
/// the listener on the next clock advance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_ref: String, sys_id: String },
    Rejected { order_ref: String, reason: String },
    Canceled { order_ref: String },
    CancelRejected { order_ref: String, reason: String },
}

impl OrderEvent {
    pub fn order_ref(&self) -> &str {
        match self {
            OrderEvent::Placed { order_ref, .. }
            | OrderEvent::Rejected { order_ref, .. }
            | OrderEvent::Canceled { order_ref }
            | OrderEvent::CancelRejected { order_ref, .. } => order_ref,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, OrderEvent::Rejected { .. } | OrderEvent::CancelRejected { .. })
    }
}

// ---------------------------------------------------------------------------
// Session seam
// ---------------------------------------------------------------------------

/// Shared, read-only collaborators every session is built with.
#[derive(Clone)]
pub struct SessionContext {
    pub catalog: Arc<ExchangeCatalog>,
    pub market_data: Arc<dyn MarketDataSource>,
    pub clock: Arc<dyn ClockSource>,
}

/// An account's trading connection, whatever provider backs it.
pub trait TxnSession: Send {
    fn account_id(&self) -> &str;
    fn provider(&self) -> &str;
    fn state(&self) -> ConnState;
    fn trading_day(&self) -> Option<NaiveDate>;

    fn connect(&mut self);
    fn close(&mut self);

    fn submit(&mut self, request: OrderRequest) -> OrderEvent;
    fn cancel(&mut self, instrument: &Instrument, order_ref: &str) -> OrderEvent;

    /// Per-tick update.  An `Err` means the tick was not applied; the
    /// session's state is as it was before the call.
    fn on_market_data(&mut self, tick: &Tick) -> Result<(), VenueError>;

    /// Clock advance: flush queued responses to the listener.
    fn on_time_changed(&mut self, trading_day: NaiveDate, instant: NaiveDateTime);

    fn money(&self) -> Ledger;
    fn orders(&self) -> &[SimOrder];
    fn transactions(&self) -> &[SimTxn];
    fn positions(&self) -> Vec<&SimPosition>;
    fn positions_json(&self) -> serde_json::Value;
    fn fee_schedule_json(&self) -> Option<serde_json::Value>;
}

// ---------------------------------------------------------------------------
// SimTxnSession
// ---------------------------------------------------------------------------

/// Everything a tick may mutate.  Cloned as the rollback checkpoint.
#[derive(Clone, Debug, Default)]
struct SessionBook {
    ledger: Ledger,
    positions: BTreeMap<Instrument, SimPosition>,
    orders: Vec<SimOrder>,
    txns: Vec<SimTxn>,
    pending: Vec<PendingResponse>,
    seq: u64,
}

impl SessionBook {
    fn next_id(&mut self, account_id: &str, kind: &str, key: &str) -> String {
        self.seq += 1;
        let data = format!("simx-venue.{kind}.v1|{account_id}|{key}|{}", self.seq);
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, data.as_bytes()).to_string()
    }

    fn recompute(&mut self) -> Result<(), VenueError> {
        self.ledger.recompute(self.positions.values())
    }
}

pub struct SimTxnSession {
    account: AccountConfig,
    ctx: SessionContext,
    listener: Arc<dyn TxnSessionListener>,
    state: ConnState,
    fee_evaluator: Option<Arc<dyn FeeEvaluator>>,
    trading_day: Option<NaiveDate>,
    book: SessionBook,
}

impl SimTxnSession {
    pub fn new(account: AccountConfig, ctx: SessionContext, listener: Arc<dyn TxnSessionListener>) -> Self {
        Self {
            account,
            ctx,
            listener,
            state: ConnState::Initialized,
            fee_evaluator: None,
            trading_day: None,
            book: SessionBook::default(),
        }
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    /// Connect with an already-built fee evaluator instead of reading the
    /// account's commissions file.
    pub fn connect_with(&mut self, evaluator: Arc<dyn FeeEvaluator>) {
        if self.state != ConnState::Initialized {
            return;
        }
        self.state = ConnState::Connecting;
        match self.account.init_money() {
            Ok(balance) => self.finish_connect(balance, evaluator),
            Err(e) => self.fail_connect(e),
        }
    }

    fn load_connection(&self) -> anyhow::Result<(Price, Arc<dyn FeeEvaluator>)> {
        let balance = self.account.init_money()?;
        let path = self
            .account
            .commissions_file
            .as_ref()
            .with_context(|| format!("account {}: commissions_file not configured", self.account.id))?;
        let evaluator = FutureFeeEvaluator::from_file(path)?;
        Ok((balance, Arc::new(evaluator)))
    }

    fn finish_connect(&mut self, balance: Price, evaluator: Arc<dyn FeeEvaluator>) {
        self.book.ledger = Ledger::new(balance);
        self.fee_evaluator = Some(evaluator);
        self.state = ConnState::Connected;
        info!(account_id = %self.account.id, balance = %balance, "session connected");
    }

    fn fail_connect(&mut self, e: anyhow::Error) {
        error!(account_id = %self.account.id, error = %format!("{e:#}"), "session connect failed");
        self.state = ConnState::ConnectFailed;
    }

    fn now(&self) -> Option<NaiveDateTime> {
        self.ctx.clock.market_time()
    }

    /// Run the validation chain.  `Ok` carries the accepted order with its
    /// reservation filled in; `Err` carries the rejection reason.
    fn check_new_order(&self, order: &mut SimOrder) -> Result<(), String> {
        if self.state != ConnState::Connected {
            return Err(REASON_NOT_CONNECTED.to_string());
        }
        let evaluator = self
            .fee_evaluator
            .as_ref()
            .ok_or_else(|| REASON_NOT_CONNECTED.to_string())?;
        if order.volume <= 0 {
            return Err(REASON_INVALID_VOLUME.to_string());
        }
        let tick = self
            .ctx
            .market_data
            .last_data(&order.instrument)
            .ok_or_else(|| REASON_NO_MARKET_DATA.to_string())?;
        if !tick.within_limits(order.limit_price) {
            return Err(REASON_OUT_OF_QUOTE_RANGE.to_string());
        }
        let price_tick = evaluator
            .price_tick(&order.instrument)
            .map_err(|e| e.to_string())?;
        if !order.limit_price.is_multiple_of(price_tick) {
            return Err(REASON_TICK_SIZE_MISMATCH.to_string());
        }
        let quote = evaluator
            .compute(
                &order.instrument,
                order.volume,
                order.limit_price,
                order.side,
                order.offset,
            )
            .map_err(|e| e.to_string())?;
        let required = quote
            .margin
            .checked_add(quote.commission)
            .and_then(|v| v.checked_add(FUNDS_BUFFER));
        if required.map_or(true, |required| self.book.ledger.available < required) {
            return Err(REASON_INSUFFICIENT_FUNDS.to_string());
        }
        if !order.offset.is_open() {
            let closable = self
                .book
                .positions
                .get(&order.instrument)
                .map_or(0, |p| p.closable(order.side));
            if closable < order.volume {
                return Err(REASON_INSUFFICIENT_POSITION.to_string());
            }
        }
        order.frozen_margin = quote.margin;
        order.frozen_commission = quote.commission;
        Ok(())
    }

    /// Book a validated order: assign its sys id, freeze its reservation and
    /// recompute.  The caller restores the book on `Err`.
    fn place(&mut self, order: &mut SimOrder) -> Result<String, VenueError> {
        let sys_id = self
            .book
            .next_id(&self.account.id, "order", &order.order_ref);
        order.sys_id = Some(sys_id.clone());

        let volume_multiple = self
            .fee_evaluator
            .as_ref()
            .and_then(|e| e.volume_multiple(&order.instrument).ok())
            .unwrap_or(1);
        let index = self.book.orders.len();
        let last = self.ctx.market_data.last_data(&order.instrument);
        let pos = self
            .book
            .positions
            .entry(order.instrument.clone())
            .or_insert_with(|| SimPosition::new(order.instrument.clone(), volume_multiple));
        pos.freeze(order, index);
        if let Some(tick) = last.filter(|t| t.last_price > Price::ZERO) {
            if let Err(e) = pos.mark_to_market(tick.last_price) {
                warn!(account_id = %self.account.id, error = %e, "mark-to-market skipped");
            }
        }

        self.book.orders.push(order.clone());
        self.book.pending.push(PendingResponse::OrderReturn(order.clone()));
        self.book.recompute()?;
        Ok(sys_id)
    }

    fn apply_tick(&mut self, tick: &Tick) -> Result<(), VenueError> {
        let now = self.now().unwrap_or(tick.update_time);
        let account_id = self.account.id.as_str();
        let evaluator = self.fee_evaluator.as_ref().ok_or(VenueError::NotConnected)?;
        let book = &mut self.book;

        if tick.last_price <= Price::ZERO {
            return Ok(());
        }
        if let Some(pos) = book.positions.get_mut(&tick.instrument) {
            for index in pos.resting().to_vec() {
                let order = book
                    .orders
                    .get(index)
                    .ok_or(VenueError::UnknownOrderIndex(index))?;
                if order.state != SimOrderState::Placed || !order.crosses(tick.last_price) {
                    continue;
                }
                let actual = evaluator.compute(
                    &order.instrument,
                    order.volume,
                    tick.last_price,
                    order.side,
                    order.offset,
                )?;

                book.seq += 1;
                let txn_id = Uuid::new_v5(
                    &Uuid::NAMESPACE_DNS,
                    format!("simx-venue.txn.v1|{account_id}|{}|{}", order.order_ref, book.seq).as_bytes(),
                )
                .to_string();

                let order = book
                    .orders
                    .get_mut(index)
                    .ok_or(VenueError::UnknownOrderIndex(index))?;
                order.complete()?;
                let txn = SimTxn {
                    id: txn_id,
                    order_ref: order.order_ref.clone(),
                    instrument: order.instrument.clone(),
                    side: order.side,
                    offset: order.offset,
                    price: tick.last_price,
                    volume: order.volume,
                    time: now,
                    margin: actual.margin,
                    commission: actual.commission,
                };
                pos.apply_fill(order, index, &txn, actual)?;
                debug!(
                    account_id = %account_id,
                    instrument = %txn.instrument,
                    order_ref = %txn.order_ref,
                    price = %txn.price,
                    volume = txn.volume,
                    "order filled"
                );
                book.pending.push(PendingResponse::TradeReturn(txn.clone()));
                book.pending.push(PendingResponse::OrderReturn(order.clone()));
                book.txns.push(txn);
            }
            pos.mark_to_market(tick.last_price)?;
        }
        book.recompute()
    }

    fn stamp_for<'a>(&'a self, instrument: &Instrument, trading_day: NaiveDate, instant: NaiveDateTime) -> Stamp<'a> {
        let exchange = self.ctx.catalog.exchange_of(instrument);
        let timestamp_ms = exchange
            .and_then(|ex| ex.to_epoch_millis(instant))
            .unwrap_or_else(|| instant.and_utc().timestamp_millis());
        let resolved_day = exchange
            .and_then(|ex| ex.detect_trading_times(instrument, instant))
            .map(|t| t.trading_day())
            .unwrap_or(trading_day);
        Stamp {
            account_id: &self.account.id,
            timestamp_ms,
            trading_day: Some(resolved_day),
        }
    }
}

impl TxnSession for SimTxnSession {
    fn account_id(&self) -> &str {
        &self.account.id
    }

    fn provider(&self) -> &str {
        SIM_PROVIDER
    }

    fn state(&self) -> ConnState {
        self.state
    }

    fn trading_day(&self) -> Option<NaiveDate> {
        self.trading_day
    }

    fn connect(&mut self) {
        if self.state != ConnState::Initialized {
            return;
        }
        self.state = ConnState::Connecting;
        match self.load_connection() {
            Ok((balance, evaluator)) => self.finish_connect(balance, evaluator),
            Err(e) => self.fail_connect(e),
        }
    }

    fn close(&mut self) {
        if self.state == ConnState::Connected {
            info!(account_id = %self.account.id, "session closed");
            self.state = ConnState::Disconnected;
        }
    }

    fn submit(&mut self, request: OrderRequest) -> OrderEvent {
        let mut order = SimOrder::from_request(request, self.now());

        if let Err(reason) = self.check_new_order(&mut order) {
            debug!(
                account_id = %self.account.id,
                order_ref = %order.order_ref,
                instrument = %order.instrument,
                reason = %reason,
                "order rejected"
            );
            order.reject(reason.clone());
            let order_ref = order.order_ref.clone();
            self.book.orders.push(order.clone());
            self.book.pending.push(PendingResponse::InsertRejected(order));
            return OrderEvent::Rejected { order_ref, reason };
        }

        let checkpoint = self.book.clone();
        match self.place(&mut order) {
            Ok(sys_id) => {
                let order_ref = order.order_ref.clone();
                OrderEvent::Placed { order_ref, sys_id }
            }
            Err(e) => {
                self.book = checkpoint;
                warn!(
                    account_id = %self.account.id,
                    order_ref = %order.order_ref,
                    error = %e,
                    "order placement failed; session book rolled back"
                );
                let reason = e.to_string();
                order.sys_id = None;
                order.frozen_margin = Price::ZERO;
                order.frozen_commission = Price::ZERO;
                order.reject(reason.clone());
                let order_ref = order.order_ref.clone();
                self.book.orders.push(order.clone());
                self.book.pending.push(PendingResponse::InsertRejected(order));
                OrderEvent::Rejected { order_ref, reason }
            }
        }
    }

    fn cancel(&mut self, instrument: &Instrument, order_ref: &str) -> OrderEvent {
        let found = self.book.positions.get(instrument).and_then(|pos| {
            pos.resting()
                .iter()
                .copied()
                .find(|&i| self.book.orders.get(i).map_or(false, |o| o.order_ref == order_ref))
        });

        let Some(index) = found else {
            debug!(account_id = %self.account.id, order_ref = %order_ref, "cancel: no matching order");
            self.book.pending.push(PendingResponse::CancelRejected {
                instrument: instrument.clone(),
                order_ref: order_ref.to_string(),
            });
            return OrderEvent::CancelRejected {
                order_ref: order_ref.to_string(),
                reason: REASON_NO_MATCHING_ORDER.to_string(),
            };
        };

        let checkpoint = self.book.clone();
        let book = &mut self.book;
        if let (Some(order), Some(pos)) = (book.orders.get_mut(index), book.positions.get_mut(instrument)) {
            if order.cancel().is_ok() {
                pos.unfreeze(order, index);
                book.pending.push(PendingResponse::OrderReturn(order.clone()));
            }
        }
        if let Err(e) = book.recompute() {
            self.book = checkpoint;
            warn!(
                account_id = %self.account.id,
                order_ref = %order_ref,
                error = %e,
                "cancel failed; session book rolled back"
            );
            self.book.pending.push(PendingResponse::CancelRejected {
                instrument: instrument.clone(),
                order_ref: order_ref.to_string(),
            });
            return OrderEvent::CancelRejected {
                order_ref: order_ref.to_string(),
                reason: e.to_string(),
            };
        }
        OrderEvent::Canceled {
            order_ref: order_ref.to_string(),
        }
    }

    fn on_market_data(&mut self, tick: &Tick) -> Result<(), VenueError> {
        if self.state != ConnState::Connected {
            return Ok(());
        }

        let checkpoint = self.book.clone();
        match self.apply_tick(tick) {
            Ok(()) => {
                self.trading_day = Some(tick.trading_day);
                Ok(())
            }
            Err(e) => {
                self.book = checkpoint;
                warn!(
                    account_id = %self.account.id,
                    instrument = %tick.instrument,
                    error = %e,
                    "tick failed; session book rolled back"
                );
                Err(e)
            }
        }
    }

    fn on_time_changed(&mut self, trading_day: NaiveDate, instant: NaiveDateTime) {
        if self.book.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.book.pending);
        for response in pending {
            let stamp = self.stamp_for(response.instrument(), trading_day, instant);
            debug!(account_id = %self.account.id, kind = ?response.kind(), "deliver response");
            deliver(self.listener.as_ref(), response, &stamp);
        }
    }

    fn money(&self) -> Ledger {
        self.book.ledger.clone()
    }

    fn orders(&self) -> &[SimOrder] {
        &self.book.orders
    }

    fn transactions(&self) -> &[SimTxn] {
        &self.book.txns
    }

    fn positions(&self) -> Vec<&SimPosition> {
        self.book.positions.values().collect()
    }

    fn positions_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for (instrument, pos) in &self.book.positions {
            out.insert(
                instrument.to_string(),
                serde_json::to_value(pos).unwrap_or_default(),
            );
        }
        serde_json::Value::Object(out)
    }

    fn fee_schedule_json(&self) -> Option<serde_json::Value> {
        self.fee_evaluator.as_ref().map(|e| e.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;
    use crate::market_data::TickCache;
    use crate::response::NullListener;
    use simx_fees::{OffsetFlag, Side};

    const SCHEDULE: &str = r#"{ "commodities": { "ru": {
        "price_tick": "1", "volume_multiple": 10,
        "long_margin_ratio": 0.05, "short_margin_ratio": 0.05 } } }"#;

    fn session() -> SimTxnSession {
        let cache = Arc::new(TickCache::new());
        let day = NaiveDate::from_ymd_opt(2018, 12, 10).unwrap();
        cache.update(Tick {
            instrument: Instrument::new("shfe", "ru1901"),
            trading_day: day,
            last_price: Price::units(4000),
            upper_limit: None,
            lower_limit: None,
            update_time: day.and_hms_opt(9, 0, 0).unwrap(),
        });
        let ctx = SessionContext {
            catalog: Arc::new(ExchangeCatalog::builtin().unwrap()),
            market_data: cache,
            clock: Arc::new(SimClock::new()),
        };
        let mut s = SimTxnSession::new(AccountConfig::new("acct-1"), ctx, Arc::new(NullListener));
        s.connect_with(Arc::new(FutureFeeEvaluator::from_json_str(SCHEDULE).unwrap()));
        s
    }

    fn buy(order_ref: &str) -> OrderRequest {
        OrderRequest {
            order_ref: order_ref.into(),
            instrument: Instrument::new("shfe", "ru1901"),
            side: Side::Buy,
            offset: OffsetFlag::Open,
            limit_price: Price::units(3990),
            volume: 1,
        }
    }

    fn sys_id(ev: OrderEvent) -> String {
        match ev {
            OrderEvent::Placed { sys_id, .. } => sys_id,
            other => panic!("expected placement, got {other:?}"),
        }
    }

    #[test]
    fn sys_ids_are_deterministic_and_distinct() {
        let mut a = session();
        let mut b = session();
        let a1 = sys_id(a.submit(buy("o-1")));
        let a2 = sys_id(a.submit(buy("o-1")));
        let b1 = sys_id(b.submit(buy("o-1")));
        assert_eq!(a1, b1);
        assert_ne!(a1, a2);
    }

    #[test]
    fn connect_with_is_one_shot_and_close_disconnects() {
        let mut s = session();
        assert_eq!(s.state(), ConnState::Connected);
        assert_eq!(s.money().balance, Price::units(50_000));
        assert!(s.fee_schedule_json().is_some());

        s.close();
        assert_eq!(s.state(), ConnState::Disconnected);
        s.connect();
        assert_eq!(s.state(), ConnState::Disconnected);
        let ev = s.submit(buy("late"));
        assert_eq!(
            ev,
            OrderEvent::Rejected {
                order_ref: "late".into(),
                reason: REASON_NOT_CONNECTED.into()
            }
        );
    }

    #[test]
    fn trading_day_follows_every_tick() {
        let mut s = session();
        assert_eq!(s.trading_day(), None);
        let day = NaiveDate::from_ymd_opt(2018, 12, 11).unwrap();
        let tick = Tick {
            instrument: Instrument::new("shfe", "ru1901"),
            trading_day: day,
            last_price: Price::units(4000),
            upper_limit: None,
            lower_limit: None,
            update_time: day.and_hms_opt(9, 0, 0).unwrap(),
        };
        s.on_market_data(&tick).unwrap();
        assert_eq!(s.trading_day(), Some(day));
    }

    #[test]
    fn zero_last_price_tick_does_not_trade() {
        let mut s = session();
        s.submit(buy("o-1"));
        let money = s.money();
        let day = NaiveDate::from_ymd_opt(2018, 12, 10).unwrap();
        let mut tick = Tick {
            instrument: Instrument::new("shfe", "ru1901"),
            trading_day: day,
            last_price: Price::ZERO,
            upper_limit: None,
            lower_limit: None,
            update_time: day.and_hms_opt(9, 0, 1).unwrap(),
        };
        s.on_market_data(&tick).unwrap();
        assert_eq!(s.orders()[0].state, SimOrderState::Placed);
        assert!(s.transactions().is_empty());
        assert_eq!(s.money(), money);
        assert_eq!(s.positions()[0].last_price(), Some(Price::units(4000)));

        tick.last_price = Price::units(3990);
        s.on_market_data(&tick).unwrap();
        assert_eq!(s.orders()[0].state, SimOrderState::Completed);
        assert_eq!(s.transactions()[0].price, Price::units(3990));
    }

    #[test]
    fn positions_json_is_keyed_by_instrument() {
        let mut s = session();
        s.submit(buy("o-1"));
        let json = s.positions_json();
        assert_eq!(json["shfe.ru1901"]["frozen_margin"], 19_950_000);
    }
}
