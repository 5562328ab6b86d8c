//! simx-price
//!
//! Fixed-point price type shared by every money path in the venue.
//!
//! # Scale
//!
//! 1 unit = `Price(10_000)`.  Prices, margins, commissions and profits all use
//! this four-decimal scale so that ledger arithmetic is exact integer math.
//!
//! # Unbounded / not available
//!
//! There is no in-band sentinel.  A price that may be missing (an unbounded
//! limit, an unquoted field) is an `Option<Price>`; its text form is `"N/A"`.
//!
//! # Conversions
//!
//! `f64` and decimal text only cross this boundary in [`Price::from_f64`],
//! [`parse_price`] and the formatting helpers.  Nothing downstream should
//! carry floating-point prices.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Scale factor: 1 price unit = 10_000 raw units (4 decimal places).
pub const PRICE_SCALE: i64 = 10_000;

/// Text form of a missing / unbounded price.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// PricingError
// ---------------------------------------------------------------------------

/// Errors returned when external input cannot be represented as a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Input was `NaN` or infinite.
    NotFinite,
    /// Input overflows `i64` after scaling.
    OutOfRange,
    /// Text input is not a decimal number.
    Malformed(String),
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::NotFinite => write!(f, "price: non-finite input (NaN or Inf)"),
            PricingError::OutOfRange => write!(f, "price: out of i64 range after scaling"),
            PricingError::Malformed(raw) => write!(f, "price: cannot parse '{raw}'"),
        }
    }
}

impl std::error::Error for PricingError {}

// ---------------------------------------------------------------------------
// Price newtype
// ---------------------------------------------------------------------------

/// A fixed-point amount at 1e-4 scale.
///
/// There is intentionally no `From<i64>`: callers must say [`Price::new`]
/// when a raw integer is known to be a scaled amount.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Construct from raw scaled units.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Price(raw)
    }

    /// Construct from whole units (e.g. `Price::units(50_000)` = 50,000.00).
    #[inline]
    pub const fn units(units: i64) -> Self {
        Price(units * PRICE_SCALE)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Convert a decimal value into a price.
    ///
    /// The value is scaled to five decimals and truncated, then the fifth
    /// digit is rounded half-up (away from zero for negatives).  Truncating
    /// first absorbs binary representation error such as
    /// `1.2345 * 100000 = 123449.99999`.
    pub fn from_f64(value: f64) -> Result<Price, PricingError> {
        if !value.is_finite() {
            return Err(PricingError::NotFinite);
        }
        let scaled = value.abs() * (PRICE_SCALE * 10) as f64;
        if scaled >= i64::MAX as f64 {
            return Err(PricingError::OutOfRange);
        }
        let truncated = scaled as i64;
        let rounded = (truncated + 5) / 10;
        Ok(Price(if value < 0.0 { -rounded } else { rounded }))
    }

    /// Decimal value of this price.  Wire/display boundary only.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    /// Snap to the nearest 0.01; ties round toward positive infinity.
    pub fn round_to_cent(self) -> Price {
        Price((self.0 + 50).div_euclid(100) * 100)
    }

    /// `true` when this price is an exact multiple of `tick`.
    ///
    /// A non-positive tick accepts every price.
    pub fn is_multiple_of(self, tick: Price) -> bool {
        tick.0 <= 0 || self.0 % tick.0 == 0
    }

    /// Multiply a per-unit price by an integer volume (shares, lots, or
    /// lots × contract multiple).  `None` on overflow.
    #[inline]
    pub fn checked_mul_volume(self, volume: i64) -> Option<Price> {
        self.0.checked_mul(volume).map(Price)
    }

    #[inline]
    pub fn checked_add(self, rhs: Price) -> Option<Price> {
        self.0.checked_add(rhs.0).map(Price)
    }

    #[inline]
    pub fn checked_sub(self, rhs: Price) -> Option<Price> {
        self.0.checked_sub(rhs.0).map(Price)
    }

    #[inline]
    pub fn saturating_add(self, rhs: Price) -> Price {
        Price(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Price) -> Price {
        Price(self.0.saturating_sub(rhs.0))
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn abs(self) -> Price {
        Price(self.0.saturating_abs())
    }
}

impl Add for Price {
    type Output = Price;
    #[inline]
    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Price;
    #[inline]
    fn sub(self, rhs: Price) -> Price {
        Price(self.0 - rhs.0)
    }
}

impl Neg for Price {
    type Output = Price;
    #[inline]
    fn neg(self) -> Price {
        Price(-self.0)
    }
}

impl AddAssign for Price {
    #[inline]
    fn add_assign(&mut self, rhs: Price) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Price {
    #[inline]
    fn sub_assign(&mut self, rhs: Price) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::ZERO, |acc, p| acc + p)
    }
}

// ---------------------------------------------------------------------------
// Text conversion
// ---------------------------------------------------------------------------

/// Display form: four fractional digits, then at most two trailing zeros
/// trimmed.  `12.5` prints as `12.50`, `12` as `12.00`, `1.2345` unchanged.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / PRICE_SCALE as u64;
        let mut frac = format!("{:04}", abs % PRICE_SCALE as u64);
        for _ in 0..2 {
            if frac.ends_with('0') {
                frac.pop();
            }
        }
        write!(f, "{sign}{whole}.{frac}")
    }
}

impl std::str::FromStr for Price {
    type Err = PricingError;

    /// Parses a decimal price.  `"N/A"` is rejected here; use [`parse_price`]
    /// where an unbounded value is legal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_price(s)? {
            Some(p) => Ok(p),
            None => Err(PricingError::Malformed(s.to_string())),
        }
    }
}

/// Parse price text.
///
/// - `""` → `Some(Price::ZERO)`
/// - `"N/A"` → `None`
/// - otherwise a decimal number, rounded per [`Price::from_f64`].
pub fn parse_price(text: &str) -> Result<Option<Price>, PricingError> {
    let t = text.trim();
    if t.is_empty() {
        return Ok(Some(Price::ZERO));
    }
    if t == NOT_AVAILABLE {
        return Ok(None);
    }
    let v: f64 = t
        .parse()
        .map_err(|_| PricingError::Malformed(t.to_string()))?;
    Price::from_f64(v).map(Some)
}

/// Display a possibly-missing price.
pub fn format_price(price: Option<Price>) -> String {
    match price {
        Some(p) => p.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Format with exactly `scale` fractional digits, rounding half-up (ties
/// away from zero) when `scale < 4`.
pub fn format_price_scaled(price: Option<Price>, scale: u32) -> String {
    let p = match price {
        Some(p) => p,
        None => return NOT_AVAILABLE.to_string(),
    };
    let negative = p.0 < 0;
    let abs = p.0.unsigned_abs() as u128;

    // Re-express |p| at `scale` decimals.
    let (units, denom) = if scale >= 4 {
        (abs * 10u128.pow(scale - 4), 10u128.pow(scale))
    } else {
        let drop = 10u128.pow(4 - scale);
        ((abs + drop / 2) / drop, 10u128.pow(scale))
    };

    let sign = if negative && units != 0 { "-" } else { "" };
    let whole = units / denom;
    if scale == 0 {
        return format!("{sign}{whole}");
    }
    let frac = units % denom;
    format!("{sign}{whole}.{frac:0width$}", width = scale as usize)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
