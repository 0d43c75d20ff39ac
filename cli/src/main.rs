//! bookline - replay NASDAQ ITCH captures into per-symbol order books

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

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use chrono_tz::America::New_York;
use clap::{Parser, Subcommand};
use common::{BookId, CIndex, Cid, Price, Quantity, Symbol, Timestamp};
use datasource::{HistSource, ItchHistSource};
use itch::records::{
    AddOrder, AddOrderMpid, BrokenTrade, CrossTrade, DirectListing, LuldAuctionCollar,
    MarketParticipantPosition, MwcbDeclineLevel, MwcbStatus, Noii, OperationalHalt, OrderCancel,
    OrderDelete, OrderExecuted, OrderExecutedWithPrice, OrderReplace, QuotingPeriodUpdate,
    RegShoRestriction, Rpii, StockDirectory, StockTradingAction, SystemEvent, Trade,
};
use itch::{
    parse_message, CommonHeader, ItchHandler, ParseResult, QuoteHandler, StockLocateMap,
    SymbolHandler,
};
use lob::{print_levels_with, BookListener, ExecInfo, Order, OrderBook, PrintParams};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "bookline")]
#[command(about = "Replay NASDAQ ITCH 5.0 captures into per-symbol order books")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild books for a trading day and print updates
    Book {
        /// Directory holding nasdaq_itch.<date>.dat captures
        #[arg(long, default_value = "/opt/data")]
        root: PathBuf,
        /// Trading day as YYYYMMDD
        #[arg(long)]
        date: u32,
        /// Symbols to replay; empty replays everything
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        /// Ladder depth printed after each update; 0 disables the ladder
        #[arg(long, default_value_t = 0)]
        depth: usize,
        /// Start of the printing window, HH:MM:SS[.frac] New York time
        #[arg(long, default_value = "00:00:00")]
        start_time: String,
        /// End of the replay, HH:MM:SS[.frac] New York time
        #[arg(long, default_value = "23:59:59")]
        end_time: String,
        /// Print book updates
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        print_updates: bool,
        /// Print trades and other non-book updates
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        print_other: bool,
    },
    /// Dump every record of a capture in arrival order
    Raw {
        /// Directory holding nasdaq_itch.<date>.dat captures
        #[arg(long, default_value = "/opt/data")]
        root: PathBuf,
        /// Trading day as YYYYMMDD
        #[arg(long)]
        date: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Book {
            root,
            date,
            symbols,
            depth,
            start_time,
            end_time,
            print_updates,
            print_other,
        } => run_book(
            &root,
            date,
            &symbols,
            depth,
            &start_time,
            &end_time,
            print_updates,
            print_other,
        ),
        Commands::Raw { root, date } => run_raw(&root, date),
    }
}

/// Parse `HH:MM:SS[.frac]` into nanoseconds since midnight.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_time_of_day(text: &str) -> Result<u64> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        bail!("invalid time of day {text:?}, expected HH:MM:SS[.frac]");
    }
    let hours: u64 = parts[0].parse().context("hours")?;
    let minutes: u64 = parts[1].parse().context("minutes")?;
    let seconds: f64 = parts[2].parse().context("seconds")?;
    if hours >= 24 || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        bail!("time of day {text:?} out of range");
    }
    Ok((hours * 3600 + minutes * 60) * 1_000_000_000 + (seconds * 1e9).round() as u64)
}

/// Format an absolute timestamp as New York local time.
fn ny_time(ts: Timestamp) -> String {
    if ts == Timestamp::MAX {
        return "end-of-stream".to_owned();
    }
    #[allow(clippy::cast_possible_wrap)]
    let utc = DateTime::from_timestamp_nanos(ts.as_nanos() as i64);
    utc.with_timezone(&New_York)
        .format("%Y%m%d %H:%M:%S%.9f")
        .to_string()
}

/// Prints one line per book mutation and, optionally, the top of the ladder.
struct PrintingListener {
    cindex: Rc<RefCell<CIndex>>,
    start: Timestamp,
    depth: usize,
}

impl PrintingListener {
    fn symbol(&self, cid: Cid) -> Symbol {
        self.cindex.borrow().symbol(cid)
    }

    fn print_ladder(&self, book: &OrderBook, cid: Cid) {
        if self.depth > 0 {
            let params = PrintParams {
                order_width: 4,
                quantity_width: 6,
                price_width: 10,
                price_precision: 4,
                bid_ask_spaces: 3,
            };
            for line in print_levels_with(book, cid, self.depth, &params) {
                println!("{line}");
            }
        }
    }
}

impl BookListener for PrintingListener {
    fn on_new_order(&mut self, book: &OrderBook, order: &Order) {
        if order.create_time >= self.start {
            println!(
                "{} {} onNewOrder {}",
                ny_time(order.create_time),
                self.symbol(order.cid),
                order
            );
            self.print_ladder(book, order.cid);
        }
    }

    fn on_delete_order(&mut self, book: &OrderBook, order: &Order, old_quantity: Quantity) {
        if order.update_time >= self.start {
            println!(
                "{} {} onDeleteOrder {} origsz={}",
                ny_time(order.update_time),
                self.symbol(order.cid),
                order,
                old_quantity
            );
            self.print_ladder(book, order.cid);
        }
    }

    fn on_replace_order(&mut self, book: &OrderBook, old: &Order, new: &Order) {
        if new.update_time >= self.start {
            println!(
                "{} {} onReplaceOrder new: {} orig: {}",
                ny_time(new.update_time),
                self.symbol(new.cid),
                new,
                old
            );
            self.print_ladder(book, new.cid);
        }
    }

    fn on_exec_order(
        &mut self,
        book: &OrderBook,
        order: &Order,
        old_quantity: Quantity,
        fill_quantity: Quantity,
        exec: &ExecInfo,
    ) {
        if order.update_time >= self.start {
            println!(
                "{} {} onExecOrder {} {} origsz={} fillsz={}",
                ny_time(order.update_time),
                self.symbol(order.cid),
                order,
                exec,
                old_quantity,
                fill_quantity
            );
            self.print_ladder(book, order.cid);
        }
    }

    fn on_update_order(
        &mut self,
        book: &OrderBook,
        order: &Order,
        old_quantity: Quantity,
        old_price: Price,
    ) {
        if order.update_time >= self.start {
            println!(
                "{} {} onUpdateOrder {} origsz={} origpx={}",
                ny_time(order.update_time),
                self.symbol(order.cid),
                order,
                old_quantity,
                old_price
            );
            self.print_ladder(book, order.cid);
        }
    }
}

/// Prints updates that do not modify the book: trades, crosses, imbalance
/// indicators, trading state changes.
struct OtherUpdatePrinter<'a> {
    cindex: Rc<RefCell<CIndex>>,
    lindex: &'a StockLocateMap,
    midnight: Timestamp,
    start: Timestamp,
    print_no_symbol: bool,
}

impl OtherUpdatePrinter<'_> {
    fn timestamp(&self, header: CommonHeader<'_>) -> Timestamp {
        self.midnight.saturating_add_nanos(header.timestamp_nanos())
    }

    /// The symbol for a header's locate when it passes the print filter.
    fn filtered(&self, header: CommonHeader<'_>) -> Option<(Timestamp, Symbol)> {
        let ts = self.timestamp(header);
        if ts < self.start {
            return None;
        }
        let cid = self.lindex.cid(header.stock_locate());
        cid.valid().then(|| (ts, self.cindex.borrow().symbol(cid)))
    }
}

impl ItchHandler for OtherUpdatePrinter<'_> {
    fn on_trade(&mut self, msg: &Trade<'_>) {
        if let Some((ts, symbol)) = self.filtered(msg.header()) {
            println!(
                "{} {} onTrade refnum={} side={} sz={} px={} matchnum={}",
                ny_time(ts),
                symbol,
                msg.order_reference_number(),
                msg.buy_sell_indicator() as char,
                msg.shares(),
                msg.price(),
                msg.match_number()
            );
        }
    }

    fn on_cross_trade(&mut self, msg: &CrossTrade<'_>) {
        if let Some((ts, symbol)) = self.filtered(msg.header()) {
            println!(
                "{} {} onCrossTrade type={} sz={} px={} matchnum={}",
                ny_time(ts),
                symbol,
                msg.cross_type() as char,
                msg.shares(),
                msg.cross_price(),
                msg.match_number()
            );
        }
    }

    fn on_noii(&mut self, msg: &Noii<'_>) {
        if let Some((ts, symbol)) = self.filtered(msg.header()) {
            println!(
                "{} {} onNOII type={} dir={} paired={} imbal={} refpx={} nearpx={} farpx={} \
                 pxvar={}",
                ny_time(ts),
                symbol,
                msg.cross_type() as char,
                msg.imbalance_direction() as char,
                msg.paired_shares(),
                msg.imbalance_shares(),
                msg.current_reference_price(),
                msg.near_price(),
                msg.far_price(),
                msg.price_variation_indicator() as char
            );
        }
    }

    fn on_stock_trading_action(&mut self, msg: &StockTradingAction<'_>) {
        if let Some((ts, symbol)) = self.filtered(msg.header()) {
            println!(
                "{} {} onStockTradingAction state={} reason={}",
                ny_time(ts),
                symbol,
                msg.trading_state() as char,
                msg.reason()
            );
        }
    }

    fn on_reg_sho_restriction(&mut self, msg: &RegShoRestriction<'_>) {
        if let Some((ts, symbol)) = self.filtered(msg.header()) {
            println!(
                "{} {} onRegShoRestriction action={}",
                ny_time(ts),
                symbol,
                msg.reg_sho_action() as char
            );
        }
    }

    fn on_system_event(&mut self, msg: &SystemEvent<'_>) {
        if self.print_no_symbol {
            let ts = self.timestamp(msg.header());
            if ts >= self.start {
                println!(
                    "{} onSystemEvent event={}",
                    ny_time(ts),
                    msg.event_code() as char
                );
            }
        }
    }
}

/// Prints every record's display line.
struct RawPrinter;

impl ItchHandler for RawPrinter {
    fn on_system_event(&mut self, msg: &SystemEvent<'_>) {
        println!("{msg}");
    }
    fn on_stock_directory(&mut self, msg: &StockDirectory<'_>) {
        println!("{msg}");
    }
    fn on_stock_trading_action(&mut self, msg: &StockTradingAction<'_>) {
        println!("{msg}");
    }
    fn on_reg_sho_restriction(&mut self, msg: &RegShoRestriction<'_>) {
        println!("{msg}");
    }
    fn on_market_participant_position(&mut self, msg: &MarketParticipantPosition<'_>) {
        println!("{msg}");
    }
    fn on_mwcb_decline_level(&mut self, msg: &MwcbDeclineLevel<'_>) {
        println!("{msg}");
    }
    fn on_mwcb_status(&mut self, msg: &MwcbStatus<'_>) {
        println!("{msg}");
    }
    fn on_quoting_period_update(&mut self, msg: &QuotingPeriodUpdate<'_>) {
        println!("{msg}");
    }
    fn on_luld_auction_collar(&mut self, msg: &LuldAuctionCollar<'_>) {
        println!("{msg}");
    }
    fn on_operational_halt(&mut self, msg: &OperationalHalt<'_>) {
        println!("{msg}");
    }
    fn on_add_order(&mut self, msg: &AddOrder<'_>) {
        println!("{msg}");
    }
    fn on_add_order_mpid(&mut self, msg: &AddOrderMpid<'_>) {
        println!("{msg}");
    }
    fn on_order_executed(&mut self, msg: &OrderExecuted<'_>) {
        println!("{msg}");
    }
    fn on_order_executed_with_price(&mut self, msg: &OrderExecutedWithPrice<'_>) {
        println!("{msg}");
    }
    fn on_order_cancel(&mut self, msg: &OrderCancel<'_>) {
        println!("{msg}");
    }
    fn on_order_delete(&mut self, msg: &OrderDelete<'_>) {
        println!("{msg}");
    }
    fn on_order_replace(&mut self, msg: &OrderReplace<'_>) {
        println!("{msg}");
    }
    fn on_trade(&mut self, msg: &Trade<'_>) {
        println!("{msg}");
    }
    fn on_cross_trade(&mut self, msg: &CrossTrade<'_>) {
        println!("{msg}");
    }
    fn on_broken_trade(&mut self, msg: &BrokenTrade<'_>) {
        println!("{msg}");
    }
    fn on_noii(&mut self, msg: &Noii<'_>) {
        println!("{msg}");
    }
    fn on_rpii(&mut self, msg: &Rpii<'_>) {
        println!("{msg}");
    }
    fn on_direct_listing(&mut self, msg: &DirectListing<'_>) {
        println!("{msg}");
    }
}

#[allow(clippy::too_many_arguments)]
fn run_book(
    root: &std::path::Path,
    date: u32,
    symbols: &[String],
    depth: usize,
    start_time: &str,
    end_time: &str,
    print_updates: bool,
    print_other: bool,
) -> Result<()> {
    let midnight = ItchHistSource::midnight_ny(date)?;
    let start = midnight.saturating_add_nanos(parse_time_of_day(start_time)?);
    let end = midnight.saturating_add_nanos(parse_time_of_day(end_time)?);
    info!("replaying {date}, window {} .. {}", ny_time(start), ny_time(end));

    let mut book = OrderBook::new(BookId(0));
    book.reserve(65_535, 4 << 20, 2 << 19);
    book.resize(Cid(65_535));

    let cindex = Rc::new(RefCell::new(CIndex::new()));
    for symbol in symbols {
        cindex.borrow_mut().find_or_insert(Symbol::new(symbol));
    }
    let add_all = cindex.borrow().is_empty();
    let mut lindex = StockLocateMap::new();
    if add_all {
        cindex.borrow_mut().reserve(16_384);
        lindex.reserve(16_384);
    }

    let listener = Rc::new(RefCell::new(PrintingListener {
        cindex: cindex.clone(),
        start,
        depth,
    }));
    if print_updates {
        book.add_listener(listener);
    }

    let mut source =
        ItchHistSource::open(root, date).context("failed to create the data source")?;
    source.set_end_time(end);

    while source.has_message() {
        let frame = source.next_message();
        let result = {
            let mut cindex_mut = cindex.borrow_mut();
            let mut symbol_handler = SymbolHandler::new(&mut cindex_mut, &mut lindex, add_all);
            parse_message(frame, &mut [&mut symbol_handler])
        };
        if result == ParseResult::Success {
            let mut quote_handler = QuoteHandler::new(&mut book, &lindex, midnight, add_all);
            let mut other_printer = OtherUpdatePrinter {
                cindex: cindex.clone(),
                lindex: &lindex,
                midnight,
                start: if print_other { start } else { Timestamp::MAX },
                print_no_symbol: add_all,
            };
            parse_message(frame, &mut [&mut quote_handler, &mut other_printer]);
        } else {
            error!(
                "error parsing message: {result} at file offset {} time {}",
                source.current_offset(),
                ny_time(source.next_time())
            );
            break;
        }
        source.advance();
    }

    info!(
        "done processing book, remaining orders={} remaining levels={}",
        book.num_orders(),
        book.num_levels()
    );
    info!(
        "max orders={} max levels={}",
        book.max_num_orders(),
        book.max_num_levels()
    );
    Ok(())
}

fn run_raw(root: &std::path::Path, date: u32) -> Result<()> {
    let mut source =
        ItchHistSource::open(root, date).context("failed to create the data source")?;
    let mut printer = RawPrinter;
    while source.has_message() {
        let result = parse_message(source.next_message(), &mut [&mut printer]);
        if result != ParseResult::Success {
            error!(
                "error parsing message: {result} at file offset {} time {}",
                source.current_offset(),
                ny_time(source.next_time())
            );
            break;
        }
        source.advance();
    }
    Ok(())
}
