//! Glue handlers translating parsed records into engine operations

use crate::locate::{StockLocate, StockLocateMap};
use crate::parser::ItchHandler;
use crate::records::{
    AddOrder, AddOrderMpid, CommonHeader, CrossTrade, DirectListing, LuldAuctionCollar,
    MarketParticipantPosition, Noii, OperationalHalt, OrderCancel, OrderDelete, OrderExecuted,
    OrderExecutedWithPrice, OrderReplace, QuotingPeriodUpdate, RegShoRestriction, Rpii,
    StockDirectory, StockTradingAction, Trade,
};
use common::{CIndex, Quantity, ReferenceNum, Side, Symbol, Timestamp};
use lob::{ExecInfo, OrderBook};
use tracing::warn;

/// Populates the symbol table and locate map from records that carry a
/// symbol name. In add-all mode every new locate admits a new cid; in
/// filter mode only locates whose symbol is already in the table are
/// admitted, and the handler stops probing once every filtered symbol has
/// its locate.
pub struct SymbolHandler<'a> {
    cindex: &'a mut CIndex,
    lindex: &'a mut StockLocateMap,
    add_all: bool,
}

impl<'a> SymbolHandler<'a> {
    /// Build a handler over the day's symbol table and locate map.
    pub fn new(cindex: &'a mut CIndex, lindex: &'a mut StockLocateMap, add_all: bool) -> Self {
        Self {
            cindex,
            lindex,
            add_all,
        }
    }

    fn handle_symbol(&mut self, stock: &str, locate: StockLocate) {
        if self.add_all {
            if locate.valid() && !self.lindex.cid(locate).valid() {
                let cid = self.cindex.find_or_insert(Symbol::new(stock));
                if cid.valid() {
                    self.lindex.insert(locate, cid);
                } else {
                    warn!("symbol table full, unable to add symbol {}", stock);
                }
            }
        } else if self.lindex.len() < self.cindex.len() {
            let cid = self.cindex.cid(Symbol::new(stock));
            if cid.valid() {
                self.lindex.insert(locate, cid);
            }
        }
    }
}

impl ItchHandler for SymbolHandler<'_> {
    fn on_stock_directory(&mut self, msg: &StockDirectory<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_stock_trading_action(&mut self, msg: &StockTradingAction<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_reg_sho_restriction(&mut self, msg: &RegShoRestriction<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_market_participant_position(&mut self, msg: &MarketParticipantPosition<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_quoting_period_update(&mut self, msg: &QuotingPeriodUpdate<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_luld_auction_collar(&mut self, msg: &LuldAuctionCollar<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_operational_halt(&mut self, msg: &OperationalHalt<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_add_order(&mut self, msg: &AddOrder<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_add_order_mpid(&mut self, msg: &AddOrderMpid<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_trade(&mut self, msg: &Trade<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_cross_trade(&mut self, msg: &CrossTrade<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_noii(&mut self, msg: &Noii<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_rpii(&mut self, msg: &Rpii<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }

    fn on_direct_listing(&mut self, msg: &DirectListing<'_>) {
        self.handle_symbol(msg.stock(), msg.header().stock_locate());
    }
}

/// Translates order-flow records into book operations. Adds require the
/// locate to resolve to a cid; modifies pass when running in add-all mode or
/// when the locate is mapped. In filter mode, records for unmapped locates
/// are silently ignored.
pub struct QuoteHandler<'a> {
    book: &'a mut OrderBook,
    lindex: &'a StockLocateMap,
    midnight: Timestamp,
    add_all: bool,
}

impl<'a> QuoteHandler<'a> {
    /// Build a handler feeding `book`, resolving locates through `lindex`.
    /// `midnight` anchors the feed's nanoseconds-since-midnight timestamps.
    pub fn new(
        book: &'a mut OrderBook,
        lindex: &'a StockLocateMap,
        midnight: Timestamp,
        add_all: bool,
    ) -> Self {
        Self {
            book,
            lindex,
            midnight,
            add_all,
        }
    }

    fn timestamp(&self, header: CommonHeader<'_>) -> Timestamp {
        self.midnight.saturating_add_nanos(header.timestamp_nanos())
    }

    fn wants(&self, locate: StockLocate) -> bool {
        self.add_all || self.lindex.cid(locate).valid()
    }

    fn side_of(indicator: u8) -> Side {
        if indicator == b'B' {
            Side::Bid
        } else {
            Side::Ask
        }
    }
}

impl ItchHandler for QuoteHandler<'_> {
    fn on_add_order(&mut self, msg: &AddOrder<'_>) {
        let cid = self.lindex.cid(msg.header().stock_locate());
        if cid.valid() {
            self.book.new_order(
                ReferenceNum(msg.order_reference_number()),
                cid,
                Self::side_of(msg.buy_sell_indicator()),
                Quantity::from(msg.shares()),
                msg.price().to_price(),
                self.timestamp(msg.header()),
            );
        }
    }

    fn on_add_order_mpid(&mut self, msg: &AddOrderMpid<'_>) {
        let cid = self.lindex.cid(msg.header().stock_locate());
        if cid.valid() {
            self.book.new_order(
                ReferenceNum(msg.order_reference_number()),
                cid,
                Self::side_of(msg.buy_sell_indicator()),
                Quantity::from(msg.shares()),
                msg.price().to_price(),
                self.timestamp(msg.header()),
            );
        }
    }

    fn on_order_executed(&mut self, msg: &OrderExecuted<'_>) {
        if self.wants(msg.header().stock_locate()) {
            let exec = ExecInfo {
                match_num: msg.match_number(),
                printable: true,
                price: None,
            };
            self.book.execute_order(
                ReferenceNum(msg.order_reference_number()),
                Quantity::from(msg.executed_shares()),
                &exec,
                self.timestamp(msg.header()),
            );
        }
    }

    fn on_order_executed_with_price(&mut self, msg: &OrderExecutedWithPrice<'_>) {
        if self.wants(msg.header().stock_locate()) {
            let exec = ExecInfo {
                match_num: msg.match_number(),
                printable: msg.printable() == b'Y',
                price: Some(msg.execution_price().to_price()),
            };
            self.book.execute_order(
                ReferenceNum(msg.order_reference_number()),
                Quantity::from(msg.executed_shares()),
                &exec,
                self.timestamp(msg.header()),
            );
        }
    }

    fn on_order_cancel(&mut self, msg: &OrderCancel<'_>) {
        if self.wants(msg.header().stock_locate()) {
            self.book.reduce_order_by(
                ReferenceNum(msg.order_reference_number()),
                Quantity::from(msg.canceled_shares()),
                self.timestamp(msg.header()),
            );
        }
    }

    fn on_order_delete(&mut self, msg: &OrderDelete<'_>) {
        if self.wants(msg.header().stock_locate()) {
            self.book.delete_order(
                ReferenceNum(msg.order_reference_number()),
                self.timestamp(msg.header()),
            );
        }
    }

    fn on_order_replace(&mut self, msg: &OrderReplace<'_>) {
        if self.wants(msg.header().stock_locate()) {
            let old_ref = ReferenceNum(msg.original_order_reference_number());
            // the record carries no side, so an unknown old order cannot be
            // re-added
            if self.book.find_order(old_ref).is_none() {
                warn!("order with refnum {} not found in replace, ignored", old_ref);
            } else {
                self.book.replace_order(
                    old_ref,
                    ReferenceNum(msg.new_order_reference_number()),
                    Quantity::from(msg.shares()),
                    msg.price().to_price(),
                    self.timestamp(msg.header()),
                );
            }
        }
    }
}
