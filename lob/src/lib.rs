//! Multi-symbol limit order book engine
//!
//! Orders rest in price levels; levels hang off per-symbol half books kept in
//! price-priority order. Every mutation notifies registered listeners inline.

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

pub mod arena;
pub mod book;
pub mod listener;
pub mod printer;

pub use arena::Arena;
pub use book::{ExecInfo, Level, Order, OrderBook};
pub use listener::BookListener;
pub use printer::{infer_print_params, print_levels, print_levels_with, PrintParams};
