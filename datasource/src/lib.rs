//! Historical market data sources
//!
//! A [`HistSource`] hands out framed feed messages in file order with
//! reconstructed absolute timestamps. The ITCH implementation memory-maps
//! one day's capture file and releases completed chunks back to the OS as
//! the cursor advances, so resident memory stays bounded over
//! multi-gigabyte replays.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![allow(unsafe_code)] // mmap and madvise require it
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

pub mod itch_file;
pub mod source;

pub use itch_file::ItchHistSource;
pub use source::{register_builtin, HistSource, SourceError, SourceFactory};
