//! Account money ledger.
//!
//! # Buckets
//! `balance` is the only independent input (the opening balance).  Every
//! other bucket is written by [`Ledger::recompute`] from the positions:
//!
//! ```text
//! curr_margin = balance − commission + Σ position_profit + close_profit
//! available   = curr_margin − Σ use_margin − Σ frozen_margin − Σ frozen_commission
//! ```
//!
//! # Determinism
//! Integer fixed-point arithmetic only.  Recomputing twice over the same
//! positions yields identical buckets.

use std::fmt;

use serde::Serialize;
use simx_price::Price;

use crate::position::SimPosition;
use crate::VenueError;

/// Minimum headroom kept on top of margin + commission when accepting an
/// order.
pub const FUNDS_BUFFER: Price = Price::units(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyBucket {
    Balance,
    Available,
    Commission,
    CloseProfit,
    FrozenMargin,
    CurrMargin,
    FrozenCommission,
    PositionProfit,
}

impl MoneyBucket {
    pub const ALL: [MoneyBucket; 8] = [
        MoneyBucket::Balance,
        MoneyBucket::Available,
        MoneyBucket::Commission,
        MoneyBucket::CloseProfit,
        MoneyBucket::FrozenMargin,
        MoneyBucket::CurrMargin,
        MoneyBucket::FrozenCommission,
        MoneyBucket::PositionProfit,
    ];
}

impl fmt::Display for MoneyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoneyBucket::Balance => "balance",
            MoneyBucket::Available => "available",
            MoneyBucket::Commission => "commission",
            MoneyBucket::CloseProfit => "close_profit",
            MoneyBucket::FrozenMargin => "frozen_margin",
            MoneyBucket::CurrMargin => "curr_margin",
            MoneyBucket::FrozenCommission => "frozen_commission",
            MoneyBucket::PositionProfit => "position_profit",
        };
        f.write_str(s)
    }
}

/// Per-account money buckets.  Cloned as the public money snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Ledger {
    pub balance: Price,
    pub available: Price,
    pub commission: Price,
    pub close_profit: Price,
    pub frozen_margin: Price,
    pub curr_margin: Price,
    pub frozen_commission: Price,
    pub position_profit: Price,
    /// Σ used margin over positions.  Not a bucket of its own, kept so the
    /// available identity can be checked from a snapshot alone.
    pub use_margin: Price,
}

impl Ledger {
    /// Fresh ledger: everything in `balance`, all of it available.
    pub fn new(balance: Price) -> Self {
        Self {
            balance,
            available: balance,
            curr_margin: balance,
            ..Self::default()
        }
    }

    pub fn get(&self, bucket: MoneyBucket) -> Price {
        match bucket {
            MoneyBucket::Balance => self.balance,
            MoneyBucket::Available => self.available,
            MoneyBucket::Commission => self.commission,
            MoneyBucket::CloseProfit => self.close_profit,
            MoneyBucket::FrozenMargin => self.frozen_margin,
            MoneyBucket::CurrMargin => self.curr_margin,
            MoneyBucket::FrozenCommission => self.frozen_commission,
            MoneyBucket::PositionProfit => self.position_profit,
        }
    }

    fn bucket_mut(&mut self, bucket: MoneyBucket) -> &mut Price {
        match bucket {
            MoneyBucket::Balance => &mut self.balance,
            MoneyBucket::Available => &mut self.available,
            MoneyBucket::Commission => &mut self.commission,
            MoneyBucket::CloseProfit => &mut self.close_profit,
            MoneyBucket::FrozenMargin => &mut self.frozen_margin,
            MoneyBucket::CurrMargin => &mut self.curr_margin,
            MoneyBucket::FrozenCommission => &mut self.frozen_commission,
            MoneyBucket::PositionProfit => &mut self.position_profit,
        }
    }

    /// `true` for the buckets only [`recompute`](Self::recompute) may write.
    pub fn is_derived_only(bucket: MoneyBucket) -> bool {
        matches!(bucket, MoneyBucket::Available | MoneyBucket::CurrMargin)
    }

    /// Move `amount` from one bucket to another.
    ///
    /// Returns `false` without touching either bucket when either end is
    /// `available` or `curr_margin`, `from` holds less than `amount`,
    /// `amount` is negative, or `to` would overflow.  Buckets other than
    /// `balance` are overwritten by the next [`recompute`](Self::recompute).
    pub fn transfer(&mut self, from: MoneyBucket, to: MoneyBucket, amount: Price) -> bool {
        if Self::is_derived_only(from) || Self::is_derived_only(to) {
            return false;
        }
        if amount.is_negative() || self.get(from) < amount {
            return false;
        }
        if from == to {
            return true;
        }
        let Some(credited) = self.get(to).checked_add(amount) else {
            return false;
        };
        *self.bucket_mut(from) -= amount;
        *self.bucket_mut(to) = credited;
        true
    }

    /// The single writer of every derived bucket.
    ///
    /// All-or-nothing: on overflow the ledger is left as it was.
    pub fn recompute<'a>(
        &mut self,
        positions: impl IntoIterator<Item = &'a SimPosition>,
    ) -> Result<(), VenueError> {
        let mut use_margin = Price::ZERO;
        let mut frozen_margin = Price::ZERO;
        let mut frozen_commission = Price::ZERO;
        let mut position_profit = Price::ZERO;
        let mut commission = Price::ZERO;
        let mut close_profit = Price::ZERO;
        for p in positions {
            use_margin = sum(use_margin, p.use_margin(), "use_margin")?;
            frozen_margin = sum(frozen_margin, p.frozen_margin(), "frozen_margin")?;
            frozen_commission =
                sum(frozen_commission, p.frozen_commission(), "frozen_commission")?;
            position_profit = sum(position_profit, p.position_profit(), "position_profit")?;
            commission = sum(commission, p.commission(), "commission")?;
            close_profit = sum(close_profit, p.close_profit(), "close_profit")?;
        }

        let curr_margin = self
            .balance
            .checked_sub(commission)
            .and_then(|v| v.checked_add(position_profit))
            .and_then(|v| v.checked_add(close_profit))
            .ok_or_else(|| overflow("curr_margin"))?;
        let available = curr_margin
            .checked_sub(use_margin)
            .and_then(|v| v.checked_sub(frozen_margin))
            .and_then(|v| v.checked_sub(frozen_commission))
            .ok_or_else(|| overflow("available"))?;

        self.commission = commission;
        self.close_profit = close_profit;
        self.position_profit = position_profit;
        self.frozen_margin = frozen_margin;
        self.frozen_commission = frozen_commission;
        self.use_margin = use_margin;
        self.curr_margin = curr_margin;
        self.available = available;
        Ok(())
    }

    /// `true` when the available identity holds for this snapshot.
    pub fn is_consistent(&self) -> bool {
        let curr_margin = self
            .balance
            .checked_sub(self.commission)
            .and_then(|v| v.checked_add(self.position_profit))
            .and_then(|v| v.checked_add(self.close_profit));
        let available = self
            .curr_margin
            .checked_sub(self.use_margin)
            .and_then(|v| v.checked_sub(self.frozen_margin))
            .and_then(|v| v.checked_sub(self.frozen_commission));
        curr_margin == Some(self.curr_margin) && available == Some(self.available)
    }
}

fn overflow(what: &str) -> VenueError {
    VenueError::Overflow(format!("ledger: {what}"))
}

fn sum(acc: Price, add: Price, what: &str) -> Result<Price, VenueError> {
    acc.checked_add(add).ok_or_else(|| overflow(what))
}
