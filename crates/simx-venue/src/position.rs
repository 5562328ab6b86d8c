//! Per-instrument position book.
//!
//! A position tracks both sides independently (long and short are never
//! netted), the volume reserved by resting close orders, and the money that
//! feeds the account ledger: used margin, frozen margin and commission,
//! realised commission, mark-to-market profit and realised close profit.
//!
//! Costs are kept as total notional (`price × volume × multiple`) so that
//! average cost never needs a division until a close realises part of it.

use serde::Serialize;
use simx_calendar::Instrument;
use simx_fees::{FeeQuote, Side};
use simx_price::Price;

use crate::order::{SimOrder, SimTxn};
use crate::VenueError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SideBook {
    pub volume: i64,
    /// Volume reserved by resting close orders.
    pub frozen: i64,
    /// Total open notional of `volume`.
    pub open_cost: Price,
    pub use_margin: Price,
}

impl SideBook {
    pub fn available(&self) -> i64 {
        self.volume - self.frozen
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimPosition {
    instrument: Instrument,
    volume_multiple: i64,
    long: SideBook,
    short: SideBook,
    frozen_margin: Price,
    frozen_commission: Price,
    commission: Price,
    position_profit: Price,
    close_profit: Price,
    last_price: Option<Price>,
    /// Indices of resting (placed) orders in the session's order list.
    #[serde(skip)]
    resting: Vec<usize>,
}

fn overflow(instrument: &Instrument, what: &str) -> VenueError {
    VenueError::Overflow(format!("{instrument}: {what}"))
}

fn checked(value: Option<Price>, instrument: &Instrument, what: &str) -> Result<Price, VenueError> {
    value.ok_or_else(|| overflow(instrument, what))
}

impl SimPosition {
    pub fn new(instrument: Instrument, volume_multiple: i64) -> Self {
        Self {
            instrument,
            volume_multiple,
            long: SideBook::default(),
            short: SideBook::default(),
            frozen_margin: Price::ZERO,
            frozen_commission: Price::ZERO,
            commission: Price::ZERO,
            position_profit: Price::ZERO,
            close_profit: Price::ZERO,
            last_price: None,
            resting: Vec::new(),
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn long(&self) -> &SideBook {
        &self.long
    }

    pub fn short(&self) -> &SideBook {
        &self.short
    }

    pub fn use_margin(&self) -> Price {
        self.long.use_margin + self.short.use_margin
    }

    pub fn frozen_margin(&self) -> Price {
        self.frozen_margin
    }

    pub fn frozen_commission(&self) -> Price {
        self.frozen_commission
    }

    pub fn commission(&self) -> Price {
        self.commission
    }

    pub fn position_profit(&self) -> Price {
        self.position_profit
    }

    pub fn close_profit(&self) -> Price {
        self.close_profit
    }

    pub fn resting(&self) -> &[usize] {
        &self.resting
    }

    /// Volume a close order on `side` may still take.
    ///
    /// Selling closes the long side; buying closes the short side.
    pub fn closable(&self, side: Side) -> i64 {
        self.closed_side(side).available()
    }

    fn closed_side(&self, side: Side) -> &SideBook {
        match side {
            Side::Sell => &self.long,
            Side::Buy => &self.short,
        }
    }

    fn closed_side_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Sell => &mut self.long,
            Side::Buy => &mut self.short,
        }
    }

    fn opened_side(&self, side: Side) -> &SideBook {
        match side {
            Side::Buy => &self.long,
            Side::Sell => &self.short,
        }
    }

    fn opened_side_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Buy => &mut self.long,
            Side::Sell => &mut self.short,
        }
    }

    fn notional(&self, price: Price, volume: i64) -> Result<Price, VenueError> {
        volume
            .checked_mul(self.volume_multiple)
            .and_then(|units| price.checked_mul_volume(units))
            .ok_or_else(|| overflow(&self.instrument, "notional"))
    }

    /// Reserve funds (and, for a close, volume) for a newly accepted order.
    pub(crate) fn freeze(&mut self, order: &SimOrder, index: usize) {
        self.frozen_margin += order.frozen_margin;
        self.frozen_commission += order.frozen_commission;
        if !order.offset.is_open() {
            self.closed_side_mut(order.side).frozen += order.volume;
        }
        self.resting.push(index);
    }

    /// Undo [`freeze`](Self::freeze) for an order that leaves the book.
    pub(crate) fn unfreeze(&mut self, order: &SimOrder, index: usize) {
        self.frozen_margin -= order.frozen_margin;
        self.frozen_commission -= order.frozen_commission;
        if !order.offset.is_open() {
            self.closed_side_mut(order.side).frozen -= order.volume;
        }
        self.resting.retain(|&i| i != index);
    }

    /// Apply a fill: release the order's reservation, charge actual
    /// commission, then open or close volume at the fill price.
    pub(crate) fn apply_fill(
        &mut self,
        order: &SimOrder,
        index: usize,
        txn: &SimTxn,
        actual: FeeQuote,
    ) -> Result<(), VenueError> {
        if !order.offset.is_open() && self.closed_side(order.side).volume < txn.volume {
            return Err(VenueError::InsufficientPosition {
                instrument: self.instrument.to_string(),
                held: self.closed_side(order.side).volume,
                closing: txn.volume,
            });
        }
        let notional = self.notional(txn.price, txn.volume)?;
        let instrument = self.instrument.clone();
        let commission = checked(self.commission.checked_add(actual.commission), &instrument, "commission")?;

        if order.offset.is_open() {
            let side = self.opened_side(order.side);
            let volume = side
                .volume
                .checked_add(txn.volume)
                .ok_or_else(|| overflow(&instrument, "volume"))?;
            let open_cost = checked(side.open_cost.checked_add(notional), &instrument, "open cost")?;
            let use_margin = checked(side.use_margin.checked_add(actual.margin), &instrument, "used margin")?;

            self.unfreeze(order, index);
            self.commission = commission;
            let side = self.opened_side_mut(order.side);
            side.volume = volume;
            side.open_cost = open_cost;
            side.use_margin = use_margin;
            return Ok(());
        }

        let side = self.closed_side(order.side);
        let (cost_released, margin_released) = if side.volume == txn.volume {
            (side.open_cost, side.use_margin)
        } else {
            (
                proportional(side.open_cost, txn.volume, side.volume)
                    .ok_or_else(|| overflow(&instrument, "cost release"))?,
                proportional(side.use_margin, txn.volume, side.volume)
                    .ok_or_else(|| overflow(&instrument, "margin release"))?,
            )
        };

        // Selling closes a long: profit = proceeds − cost.  Buying closes a
        // short: profit = cost − outlay.
        let profit = match order.side {
            Side::Sell => notional.checked_sub(cost_released),
            Side::Buy => cost_released.checked_sub(notional),
        };
        let profit = checked(profit, &instrument, "close profit")?;
        let close_profit = checked(self.close_profit.checked_add(profit), &instrument, "close profit")?;

        self.unfreeze(order, index);
        self.commission = commission;
        self.close_profit = close_profit;
        let side = self.closed_side_mut(order.side);
        side.volume -= txn.volume;
        side.open_cost -= cost_released;
        side.use_margin -= margin_released;
        Ok(())
    }

    /// Recompute position profit of both sides at `last_price`.
    pub(crate) fn mark_to_market(&mut self, last_price: Price) -> Result<(), VenueError> {
        let long_value = self.notional(last_price, self.long.volume)?;
        let short_value = self.notional(last_price, self.short.volume)?;
        let profit = long_value
            .checked_sub(self.long.open_cost)
            .zip(self.short.open_cost.checked_sub(short_value))
            .and_then(|(long, short)| long.checked_add(short));
        self.position_profit = checked(profit, &self.instrument, "position profit")?;
        self.last_price = Some(last_price);
        Ok(())
    }

    pub fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    pub fn is_flat(&self) -> bool {
        self.long.volume == 0 && self.short.volume == 0 && self.resting.is_empty()
    }
}

/// `amount × part / whole`, truncated toward zero.
fn proportional(amount: Price, part: i64, whole: i64) -> Option<Price> {
    if whole == 0 {
        return Some(Price::ZERO);
    }
    let v = (amount.raw() as i128) * (part as i128) / (whole as i128);
    i64::try_from(v).ok().map(Price::new)
}
