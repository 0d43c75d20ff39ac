//! Common types for the bookline replay engine

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
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

pub mod symbol;
pub mod types;

pub use symbol::{CIndex, Symbol};
pub use types::{BookId, Cid, Price, Quantity, ReferenceNum, Side, Timestamp};
