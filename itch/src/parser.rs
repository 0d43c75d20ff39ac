//! Parse and dispatch
//!
//! [`parse_message`] reads the type tag of one framed message, checks that
//! the frame covers the record's static size, and hands the typed view to
//! every handler in turn. Frames larger than the static size are accepted as
//! forward-compatible extensions. The record views alias the frame; nothing
//! is allocated or copied.

use crate::records::{
    AddOrder, AddOrderMpid, BrokenTrade, CrossTrade, DirectListing, LuldAuctionCollar,
    MarketParticipantPosition, MwcbDeclineLevel, MwcbStatus, Noii, OperationalHalt, OrderCancel,
    OrderDelete, OrderExecuted, OrderExecutedWithPrice, OrderReplace, QuotingPeriodUpdate,
    RegShoRestriction, Rpii, StockDirectory, StockTradingAction, SystemEvent, Trade,
};
use std::fmt;

/// Outcome of parsing one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// The frame carried a known record and every handler saw it.
    Success,
    /// The type tag is unknown.
    BadMsgType,
    /// The tag is known but the frame is smaller than the record's static
    /// size; no handler was invoked.
    BadSize,
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "Success",
            Self::BadMsgType => "BadMsgType",
            Self::BadSize => "BadSize",
        })
    }
}

/// Typed message callbacks. Every method defaults to a no-op, so a handler
/// implements only the record types it cares about and silently ignores the
/// rest.
#[allow(unused_variables)]
pub trait ItchHandler {
    /// `S` system event.
    fn on_system_event(&mut self, msg: &SystemEvent<'_>) {}
    /// `R` stock directory.
    fn on_stock_directory(&mut self, msg: &StockDirectory<'_>) {}
    /// `H` stock trading action.
    fn on_stock_trading_action(&mut self, msg: &StockTradingAction<'_>) {}
    /// `Y` Reg SHO restriction.
    fn on_reg_sho_restriction(&mut self, msg: &RegShoRestriction<'_>) {}
    /// `L` market participant position.
    fn on_market_participant_position(&mut self, msg: &MarketParticipantPosition<'_>) {}
    /// `V` MWCB decline levels.
    fn on_mwcb_decline_level(&mut self, msg: &MwcbDeclineLevel<'_>) {}
    /// `W` MWCB status.
    fn on_mwcb_status(&mut self, msg: &MwcbStatus<'_>) {}
    /// `K` IPO quoting period update.
    fn on_quoting_period_update(&mut self, msg: &QuotingPeriodUpdate<'_>) {}
    /// `J` LULD auction collar.
    fn on_luld_auction_collar(&mut self, msg: &LuldAuctionCollar<'_>) {}
    /// `h` operational halt.
    fn on_operational_halt(&mut self, msg: &OperationalHalt<'_>) {}
    /// `A` add order.
    fn on_add_order(&mut self, msg: &AddOrder<'_>) {}
    /// `F` add order with MPID.
    fn on_add_order_mpid(&mut self, msg: &AddOrderMpid<'_>) {}
    /// `E` order executed.
    fn on_order_executed(&mut self, msg: &OrderExecuted<'_>) {}
    /// `C` order executed with price.
    fn on_order_executed_with_price(&mut self, msg: &OrderExecutedWithPrice<'_>) {}
    /// `X` order cancel.
    fn on_order_cancel(&mut self, msg: &OrderCancel<'_>) {}
    /// `D` order delete.
    fn on_order_delete(&mut self, msg: &OrderDelete<'_>) {}
    /// `U` order replace.
    fn on_order_replace(&mut self, msg: &OrderReplace<'_>) {}
    /// `P` trade.
    fn on_trade(&mut self, msg: &Trade<'_>) {}
    /// `Q` cross trade.
    fn on_cross_trade(&mut self, msg: &CrossTrade<'_>) {}
    /// `B` broken trade.
    fn on_broken_trade(&mut self, msg: &BrokenTrade<'_>) {}
    /// `I` net order imbalance indicator.
    fn on_noii(&mut self, msg: &Noii<'_>) {}
    /// `N` retail price improvement indicator.
    fn on_rpii(&mut self, msg: &Rpii<'_>) {}
    /// `O` direct listing price discovery.
    fn on_direct_listing(&mut self, msg: &DirectListing<'_>) {}
}

/// Parse one framed message and fan it out to `handlers` in order.
pub fn parse_message(frame: &[u8], handlers: &mut [&mut dyn ItchHandler]) -> ParseResult {
    let Some(&tag) = frame.first() else {
        return ParseResult::BadSize;
    };

    macro_rules! dispatch {
        ($record:ident, $method:ident) => {{
            // a larger frame is a forward-compatible extension
            if frame.len() < $record::SIZE {
                return ParseResult::BadSize;
            }
            let msg = $record::new(frame);
            for handler in handlers.iter_mut() {
                handler.$method(&msg);
            }
            ParseResult::Success
        }};
    }

    match tag {
        b'S' => dispatch!(SystemEvent, on_system_event),
        b'R' => dispatch!(StockDirectory, on_stock_directory),
        b'H' => dispatch!(StockTradingAction, on_stock_trading_action),
        b'Y' => dispatch!(RegShoRestriction, on_reg_sho_restriction),
        b'L' => dispatch!(MarketParticipantPosition, on_market_participant_position),
        b'V' => dispatch!(MwcbDeclineLevel, on_mwcb_decline_level),
        b'W' => dispatch!(MwcbStatus, on_mwcb_status),
        b'K' => dispatch!(QuotingPeriodUpdate, on_quoting_period_update),
        b'J' => dispatch!(LuldAuctionCollar, on_luld_auction_collar),
        b'h' => dispatch!(OperationalHalt, on_operational_halt),
        b'A' => dispatch!(AddOrder, on_add_order),
        b'F' => dispatch!(AddOrderMpid, on_add_order_mpid),
        b'E' => dispatch!(OrderExecuted, on_order_executed),
        b'C' => dispatch!(OrderExecutedWithPrice, on_order_executed_with_price),
        b'X' => dispatch!(OrderCancel, on_order_cancel),
        b'D' => dispatch!(OrderDelete, on_order_delete),
        b'U' => dispatch!(OrderReplace, on_order_replace),
        b'P' => dispatch!(Trade, on_trade),
        b'Q' => dispatch!(CrossTrade, on_cross_trade),
        b'B' => dispatch!(BrokenTrade, on_broken_trade),
        b'I' => dispatch!(Noii, on_noii),
        b'N' => dispatch!(Rpii, on_rpii),
        b'O' => dispatch!(DirectListing, on_direct_listing),
        _ => ParseResult::BadMsgType,
    }
}
