//! Fixed-width symbol names and the dense symbol table

use crate::types::Cid;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A stock symbol: at most 8 bytes, NUL-padded on the right. Equality is
/// byte-wise; the hash reinterprets the 8 bytes as a 64-bit integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol([u8; 8]);

impl Symbol {
    /// Maximum name length in bytes.
    pub const LEN: usize = 8;
    /// Sentinel for lookups that miss.
    pub const INVALID: Self = Self(*b"<INVALD>");

    /// Build a symbol from a name, truncating to 8 bytes and padding with
    /// NULs.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut value = [0_u8; Self::LEN];
        let bytes = name.as_bytes();
        let len = bytes.len().min(Self::LEN);
        value[..len].copy_from_slice(&bytes[..len]);
        Self(value)
    }

    /// The name without padding.
    #[must_use]
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(Self::LEN);
        std::str::from_utf8(&self.0[..end]).unwrap_or("<INVALD>")
    }

    /// False only for the invalid sentinel.
    #[must_use]
    pub fn valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(u64::from_ne_bytes(self.0));
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bidirectional map between symbols and dense cids. Cids are assigned
/// contiguously from 0 in first-seen order; there are no deletions.
#[derive(Debug)]
pub struct CIndex {
    cid2symbol: Vec<Symbol>,
    symbol2cid: FxHashMap<Symbol, Cid>,
    limit: usize,
}

impl CIndex {
    /// An empty table covering the full cid range.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn new() -> Self {
        Self::with_limit(i32::MAX as usize)
    }

    /// An empty table that stops allocating once `limit` symbols are
    /// admitted; later inserts of unseen symbols return [`Cid::INVALID`] and
    /// leave the table unchanged.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            cid2symbol: Vec::new(),
            symbol2cid: FxHashMap::default(),
            limit,
        }
    }

    /// Return the cid for `symbol`, assigning the next contiguous cid on
    /// first sight.
    pub fn find_or_insert(&mut self, symbol: Symbol) -> Cid {
        if let Some(&cid) = self.symbol2cid.get(&symbol) {
            return cid;
        }
        if self.cid2symbol.len() >= self.limit {
            return Cid::INVALID;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let cid = Cid(self.cid2symbol.len() as i32);
        self.cid2symbol.push(symbol);
        self.symbol2cid.insert(symbol, cid);
        cid
    }

    /// The symbol for `cid`, or [`Symbol::INVALID`] on miss.
    #[must_use]
    pub fn symbol(&self, cid: Cid) -> Symbol {
        if cid.valid() && cid.index() < self.cid2symbol.len() {
            self.cid2symbol[cid.index()]
        } else {
            Symbol::INVALID
        }
    }

    /// The cid for `symbol`, or [`Cid::INVALID`] on miss.
    #[must_use]
    pub fn cid(&self, symbol: Symbol) -> Cid {
        self.symbol2cid.get(&symbol).copied().unwrap_or(Cid::INVALID)
    }

    /// Hint expected capacity.
    pub fn reserve(&mut self, n: usize) {
        self.cid2symbol.reserve(n);
        self.symbol2cid.reserve(n);
    }

    /// Number of admitted symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cid2symbol.len()
    }

    /// True when no symbol has been admitted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cid2symbol.is_empty()
    }
}

impl Default for CIndex {
    fn default() -> Self {
        Self::new()
    }
}
