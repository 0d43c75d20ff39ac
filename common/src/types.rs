//! Scalar types shared across the replay pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-precision price. The raw value is a signed 64-bit integer scaled by
/// 10^8, so prices from 4-decimal feeds convert exactly and finer-grained
/// sources still fit. Ordering, equality and hashing are defined on the raw
/// integer.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Price(i64);

impl Price {
    /// Number of implied decimal places.
    pub const DECIMALS: u32 = 8;
    /// Multiplier between the raw integer and the decimal value.
    pub const SCALE: i64 = 100_000_000;
    /// Smallest representable price.
    pub const MIN: Self = Self(i64::MIN);
    /// Largest representable price.
    pub const MAX: Self = Self(i64::MAX);

    /// Build a price from a floating point value, rounding half away from
    /// zero to the nearest representable raw value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(px: f64) -> Self {
        Self((px * 1e8).round() as i64)
    }

    /// Build a price from an already-scaled raw integer.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Build a price from a raw integer carrying `decimals` implied decimal
    /// places (`decimals <= 8`). Feed prices with 4 decimals rescale exactly.
    #[must_use]
    pub const fn from_scaled(raw: i64, decimals: u32) -> Self {
        assert!(decimals <= Self::DECIMALS);
        Self(raw * 10_i64.pow(Self::DECIMALS - decimals))
    }

    /// The raw scaled integer.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// The price as a floating point value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 1e8
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.as_f64())
    }
}

/// Order quantity in shares. Positive for active orders; zero only in the
/// window between unlink and destroy.
pub type Quantity = i64;

/// Feed-assigned 64-bit order identifier, unique within a trading day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceNum(pub u64);

impl fmt::Display for ReferenceNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense integer index naming a symbol within the engine. Assigned
/// contiguously from 0 by [`crate::CIndex`]; -1 is the invalid sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cid(pub i32);

impl Cid {
    /// The invalid sentinel.
    pub const INVALID: Self = Self(-1);

    /// True for assigned cids.
    #[must_use]
    pub const fn valid(self) -> bool {
        self.0 >= 0
    }

    /// The cid as an array index. Must be valid.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn index(self) -> usize {
        debug_assert!(self.valid());
        self.0 as usize
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Book side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side.
    Bid = 0,
    /// Sell side.
    Ask = 1,
}

impl Side {
    /// Side as an index into per-side arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bid => "Bid",
            Self::Ask => "Ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Nanoseconds since the Unix epoch. `Timestamp::MAX` doubles as the
/// end-of-stream sentinel for data sources.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// End-of-stream sentinel.
    pub const MAX: Self = Self(u64::MAX);

    /// Build from nanoseconds since the epoch.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Nanoseconds since the epoch.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Add a nanosecond offset, saturating at the sentinel.
    #[must_use]
    pub const fn saturating_add_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// Opaque identifier of one book aggregate, passed through to listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(pub i32);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
