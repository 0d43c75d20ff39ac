//! Source trait and the name-keyed construction registry

use crate::itch_file::ItchHistSource;
use common::Timestamp;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures surfaced while constructing or selecting a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The capture file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path of the capture file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The capture file could not be memory-mapped.
    #[error("failed to mmap {path}: {source}")]
    Map {
        /// Path of the capture file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The date is not a valid YYYYMMDD calendar day.
    #[error("invalid date {0}")]
    BadDate(u32),
    /// No creator is registered under the requested name.
    #[error("unknown data source {0:?}")]
    UnknownSource(String),
}

/// A forward-only stream of framed feed messages with reconstructed
/// timestamps. End-of-stream is `next_time() == Timestamp::MAX` with an
/// empty message; [`HistSource::has_message`] is the canonical predicate.
pub trait HistSource {
    /// Timestamp of the pending message, or [`Timestamp::MAX`] at
    /// end-of-stream.
    fn next_time(&self) -> Timestamp;

    /// The pending message payload; empty at end-of-stream.
    fn next_message(&self) -> &[u8];

    /// True while a message is pending.
    fn has_message(&self) -> bool {
        !self.next_message().is_empty()
    }

    /// Advance until `next_time() >= time` or end-of-stream. The source
    /// never rewinds.
    fn seek(&mut self, time: Timestamp) -> Timestamp;

    /// Step past the pending message and publish the next one. Returns the
    /// new `next_time()`.
    fn advance(&mut self) -> Timestamp;
}

type Creator = Box<dyn Fn(&Path, u32) -> Result<Box<dyn HistSource>, SourceError>>;

/// Registry pairing source names with constructors. Selection by name
/// happens outside the replay core; the core only exports its constant name
/// and constructor.
#[derive(Default)]
pub struct SourceFactory {
    creators: FxHashMap<String, Creator>,
}

impl SourceFactory {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a creator under `name`. Returns false when the name is
    /// already taken.
    pub fn register(
        &mut self,
        name: &str,
        creator: impl Fn(&Path, u32) -> Result<Box<dyn HistSource>, SourceError> + 'static,
    ) -> bool {
        if self.creators.contains_key(name) {
            return false;
        }
        self.creators.insert(name.to_owned(), Box::new(creator));
        true
    }

    /// Construct the source registered under `name` for one trading day.
    ///
    /// # Errors
    /// [`SourceError::UnknownSource`] when no creator is registered under
    /// `name`; otherwise whatever the creator reports.
    pub fn create(
        &self,
        name: &str,
        root: &Path,
        date: u32,
    ) -> Result<Box<dyn HistSource>, SourceError> {
        let creator = self
            .creators
            .get(name)
            .ok_or_else(|| SourceError::UnknownSource(name.to_owned()))?;
        creator(root, date)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.creators.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Register the sources this crate ships with.
pub fn register_builtin(factory: &mut SourceFactory) {
    factory.register(ItchHistSource::NAME, |root, date| {
        Ok(Box::new(ItchHistSource::open(root, date)?))
    });
}
