//! NASDAQ ITCH 5.0 message handling
//!
//! Zero-copy record views over framed feed bytes, a typed parse/dispatch
//! entry point, the per-day stock-locate map, and the glue handlers that
//! turn parsed records into order book operations.

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

pub mod fields;
pub mod handlers;
pub mod locate;
pub mod parser;
pub mod records;

pub use handlers::{QuoteHandler, SymbolHandler};
pub use locate::{StockLocate, StockLocateMap};
pub use parser::{parse_message, ItchHandler, ParseResult};
pub use records::CommonHeader;
