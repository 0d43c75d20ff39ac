//! Per-day mapping between feed locate codes and engine cids

use common::Cid;
use rustc_hash::FxHashMap;
use std::fmt;

/// Feed-local 16-bit symbol locate code. Zero is reserved invalid. The
/// feed's per-day locate assignment is arbitrary, so the engine keeps its
/// own dense cids and maps between the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StockLocate(pub u16);

impl StockLocate {
    /// The invalid sentinel.
    pub const INVALID: Self = Self(0);

    /// True for assigned locate codes.
    #[must_use]
    pub const fn valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for StockLocate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bidirectional map between locate codes and cids, rebuilt each trading
/// day. Constant-time lookup in either direction; unlike the symbol table it
/// does not allocate cids itself.
#[derive(Debug, Default)]
pub struct StockLocateMap {
    locate2cid: FxHashMap<StockLocate, Cid>,
    cid2locate: Vec<StockLocate>,
}

impl StockLocateMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `locate` with `cid`. Both must be valid. Returns false when
    /// the locate is already mapped.
    pub fn insert(&mut self, locate: StockLocate, cid: Cid) -> bool {
        debug_assert!(locate.valid() && cid.valid());
        if self.locate2cid.contains_key(&locate) {
            return false;
        }
        self.locate2cid.insert(locate, cid);
        let index = cid.index();
        if index >= self.cid2locate.len() {
            self.cid2locate.resize(index + 1, StockLocate::INVALID);
        }
        self.cid2locate[index] = locate;
        true
    }

    /// The cid mapped to `locate`, or [`Cid::INVALID`].
    #[must_use]
    pub fn cid(&self, locate: StockLocate) -> Cid {
        self.locate2cid.get(&locate).copied().unwrap_or(Cid::INVALID)
    }

    /// The locate mapped to `cid`, or [`StockLocate::INVALID`].
    #[must_use]
    pub fn locate(&self, cid: Cid) -> StockLocate {
        if cid.valid() && cid.index() < self.cid2locate.len() {
            self.cid2locate[cid.index()]
        } else {
            StockLocate::INVALID
        }
    }

    /// Number of mapped locates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locate2cid.len()
    }

    /// True when nothing is mapped yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locate2cid.is_empty()
    }

    /// Hint expected capacity.
    pub fn reserve(&mut self, n: usize) {
        self.locate2cid.reserve(n);
        self.cid2locate.reserve(n);
    }
}
