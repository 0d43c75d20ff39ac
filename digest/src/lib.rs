//! Streaming SHA-256 digest
//!
//! Thin wrapper used by the golden replay tests to fingerprint a stream of
//! serialized book updates.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Incrementally hashes byte chunks; [`Sha256Digest::finish`] consumes the
/// hasher, so a finished digest cannot be fed further by construction.
#[derive(Clone, Default)]
pub struct Sha256Digest {
    hasher: Sha256,
}

impl Sha256Digest {
    /// A fresh digest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalize and return the digest as lowercase hex.
    #[must_use]
    pub fn finish(self) -> String {
        let bytes = self.hasher.finalize();
        let mut hex = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            let _ = write!(hex, "{byte:02x}");
        }
        hex
    }
}
