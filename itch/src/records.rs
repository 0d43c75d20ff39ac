//! ITCH 5.0 record definitions
//!
//! Each record is a zero-copy view over one framed message, identified by a
//! one-byte type and laid out per the NASDAQ TotalView-ITCH 5.0
//! specification: byte-aligned, no padding, all multi-byte integers
//! big-endian. Views may be backed by frames larger than their static size
//! (forward-compatible extensions); accessors only touch the known prefix.
//!
//! <https://www.nasdaqtrader.com/content/technicalsupport/specifications/dataproducts/NQTVITCHSpecification.pdf>

use crate::fields::{alpha, be_u16, be_u32, be_u48, be_u64, stock_name};
use crate::locate::StockLocate;
use common::Price;
use std::fmt;

/// A raw 4-decimal feed price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Price4(pub u32);

impl Price4 {
    /// Convert to the engine's 8-decimal price, exactly.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn to_price(self) -> Price {
        Price::from_scaled(self.0 as i64, 4)
    }
}

impl fmt::Display for Price4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / 10_000, self.0 % 10_000)
    }
}

/// A raw 8-decimal feed price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Price8(pub u64);

impl Price8 {
    /// Convert to the engine's 8-decimal price.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_price(self) -> Price {
        Price::from_raw(self.0 as i64)
    }
}

impl fmt::Display for Price8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:08}", self.0 / 100_000_000, self.0 % 100_000_000)
    }
}

/// Format a nanoseconds-since-midnight timestamp as `HH:MM:SS:nnnnnnnnn`.
fn timestamp_string(nanos: u64) -> String {
    let hours = nanos / 3_600_000_000_000;
    let minutes = (nanos / 60_000_000_000) % 60;
    let seconds = (nanos / 1_000_000_000) % 60;
    let nanoseconds = nanos % 1_000_000_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}:{nanoseconds:09}")
}

/// The 11-byte header every ITCH record starts with.
#[derive(Clone, Copy)]
pub struct CommonHeader<'a>(&'a [u8]);

impl<'a> CommonHeader<'a> {
    /// Header size in bytes.
    pub const SIZE: usize = 11;

    /// View the header of a frame. The frame must hold at least
    /// [`Self::SIZE`] bytes.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        debug_assert!(buf.len() >= Self::SIZE);
        Self(buf)
    }

    /// The message type byte.
    #[must_use]
    pub fn msg_type(self) -> u8 {
        self.0[0]
    }

    /// Feed-local symbol locate code.
    #[must_use]
    pub fn stock_locate(self) -> StockLocate {
        StockLocate(be_u16(self.0, 1))
    }

    /// Exchange-internal tracking number.
    #[must_use]
    pub fn tracking_number(self) -> u16 {
        be_u16(self.0, 3)
    }

    /// Nanoseconds since midnight, 48-bit big-endian.
    #[must_use]
    pub fn timestamp_nanos(self) -> u64 {
        be_u48(self.0, 5)
    }
}

impl fmt::Display for CommonHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "messageType={} stockLocate={} trackingNumber={}",
            self.msg_type() as char,
            self.stock_locate().0,
            self.tracking_number()
        )
    }
}

macro_rules! record {
    ($(#[$doc:meta])* $name:ident, $tag:literal, $size:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy)]
        pub struct $name<'a>(&'a [u8]);

        impl<'a> $name<'a> {
            /// Message type byte.
            pub const TYPE: u8 = $tag;
            /// Record size fixed by the NASDAQ specification.
            pub const SIZE: usize = $size;

            /// View a frame as this record. The frame must carry the record's
            /// type byte and at least [`Self::SIZE`] bytes.
            #[must_use]
            pub fn new(buf: &'a [u8]) -> Self {
                debug_assert!(buf.len() >= Self::SIZE);
                debug_assert_eq!(buf[0], Self::TYPE);
                Self(buf)
            }

            /// The common header.
            #[must_use]
            pub fn header(self) -> CommonHeader<'a> {
                CommonHeader::new(self.0)
            }
        }
    };
}

record!(
    /// `S` system event.
    SystemEvent, b'S', 12
);

impl SystemEvent<'_> {
    /// System event code.
    #[must_use]
    pub fn event_code(self) -> u8 {
        self.0[11]
    }
}

impl fmt::Display for SystemEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} SystemEvent {} eventCode={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.event_code() as char
        )
    }
}

record!(
    /// `R` stock directory entry.
    StockDirectory, b'R', 39
);

impl<'a> StockDirectory<'a> {
    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[11..19])
    }

    /// Listing market category.
    #[must_use]
    pub fn market_category(self) -> u8 {
        self.0[19]
    }

    /// Financial status indicator.
    #[must_use]
    pub fn financial_status_indicator(self) -> u8 {
        self.0[20]
    }

    /// Round lot size in shares.
    #[must_use]
    pub fn round_lot_size(self) -> u32 {
        be_u32(self.0, 21)
    }

    /// Whether only round lots are accepted.
    #[must_use]
    pub fn round_lots_only(self) -> u8 {
        self.0[25]
    }

    /// Issue classification.
    #[must_use]
    pub fn issue_classification(self) -> u8 {
        self.0[26]
    }

    /// Issue sub-type, two alpha bytes.
    #[must_use]
    pub fn issue_sub_type(self) -> &'a str {
        alpha(&self.0[27..29])
    }

    /// Authenticity flag (production vs test).
    #[must_use]
    pub fn authenticity(self) -> u8 {
        self.0[29]
    }

    /// Short-sale threshold indicator.
    #[must_use]
    pub fn short_sale_threshold_indicator(self) -> u8 {
        self.0[30]
    }

    /// IPO flag.
    #[must_use]
    pub fn ipo_flag(self) -> u8 {
        self.0[31]
    }

    /// LULD reference price tier.
    #[must_use]
    pub fn luld_reference_price_tier(self) -> u8 {
        self.0[32]
    }

    /// ETP flag.
    #[must_use]
    pub fn etp_flag(self) -> u8 {
        self.0[33]
    }

    /// ETP leverage factor.
    #[must_use]
    pub fn etp_leverage_factor(self) -> u32 {
        be_u32(self.0, 34)
    }

    /// Inverse ETP indicator.
    #[must_use]
    pub fn inverse_indicator(self) -> u8 {
        self.0[38]
    }
}

impl fmt::Display for StockDirectory<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} StockDirectory {} stock={} marketCategory={} financialStatusIndicator={} \
             roundLotSize={} roundLotsOnly={} issueClassification={} issueSubType={} \
             authenticity={} shortSaleThresholdIndicator={} ipoFlag={} \
             luldReferencePriceTier={} etpFlag={} etpLeverageFactor={} inverseIndicator={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.stock(),
            self.market_category() as char,
            self.financial_status_indicator() as char,
            self.round_lot_size(),
            self.round_lots_only() as char,
            self.issue_classification() as char,
            self.issue_sub_type(),
            self.authenticity() as char,
            self.short_sale_threshold_indicator() as char,
            self.ipo_flag() as char,
            self.luld_reference_price_tier() as char,
            self.etp_flag() as char,
            self.etp_leverage_factor(),
            self.inverse_indicator() as char
        )
    }
}

record!(
    /// `H` stock trading action.
    StockTradingAction, b'H', 25
);

impl<'a> StockTradingAction<'a> {
    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[11..19])
    }

    /// Trading state code.
    #[must_use]
    pub fn trading_state(self) -> u8 {
        self.0[19]
    }

    /// Reserved byte.
    #[must_use]
    pub fn reserved(self) -> u8 {
        self.0[20]
    }

    /// Trading action reason, four alpha bytes.
    #[must_use]
    pub fn reason(self) -> &'a str {
        alpha(&self.0[21..25])
    }
}

impl fmt::Display for StockTradingAction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} StockTradingAction {} stock={} tradingState={} reserved={} reason={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.stock(),
            self.trading_state() as char,
            self.reserved() as char,
            self.reason()
        )
    }
}

record!(
    /// `Y` Reg SHO short-sale restriction.
    RegShoRestriction, b'Y', 20
);

impl<'a> RegShoRestriction<'a> {
    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[11..19])
    }

    /// Reg SHO action code.
    #[must_use]
    pub fn reg_sho_action(self) -> u8 {
        self.0[19]
    }
}

impl fmt::Display for RegShoRestriction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} RegShoRestriction {} stock={} regSHOAction={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.stock(),
            self.reg_sho_action() as char
        )
    }
}

record!(
    /// `L` market participant position.
    MarketParticipantPosition, b'L', 26
);

impl<'a> MarketParticipantPosition<'a> {
    /// Market participant identifier, four alpha bytes.
    #[must_use]
    pub fn mpid(self) -> &'a str {
        alpha(&self.0[11..15])
    }

    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[15..23])
    }

    /// Primary market maker flag.
    #[must_use]
    pub fn primary_market_maker(self) -> u8 {
        self.0[23]
    }

    /// Market maker mode.
    #[must_use]
    pub fn market_maker_mode(self) -> u8 {
        self.0[24]
    }

    /// Market participant state.
    #[must_use]
    pub fn market_participant_state(self) -> u8 {
        self.0[25]
    }
}

impl fmt::Display for MarketParticipantPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} MarketParticipantPosition {} mpid={} stock={} primaryMarketMaker={} \
             marketMakerMode={} marketParticipantState={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.mpid(),
            self.stock(),
            self.primary_market_maker() as char,
            self.market_maker_mode() as char,
            self.market_participant_state() as char
        )
    }
}

record!(
    /// `V` market-wide circuit breaker decline levels.
    MwcbDeclineLevel, b'V', 35
);

impl MwcbDeclineLevel<'_> {
    /// Level 1 breach price.
    #[must_use]
    pub fn level1(self) -> Price8 {
        Price8(be_u64(self.0, 11))
    }

    /// Level 2 breach price.
    #[must_use]
    pub fn level2(self) -> Price8 {
        Price8(be_u64(self.0, 19))
    }

    /// Level 3 breach price.
    #[must_use]
    pub fn level3(self) -> Price8 {
        Price8(be_u64(self.0, 27))
    }
}

impl fmt::Display for MwcbDeclineLevel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} MWCBDeclineLevel {} level1={} level2={} level3={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.level1(),
            self.level2(),
            self.level3()
        )
    }
}

record!(
    /// `W` market-wide circuit breaker status.
    MwcbStatus, b'W', 12
);

impl MwcbStatus<'_> {
    /// Breached level.
    #[must_use]
    pub fn breach_level(self) -> u8 {
        self.0[11]
    }
}

impl fmt::Display for MwcbStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} MWCBStatus {} breachLevel={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.breach_level() as char
        )
    }
}

record!(
    /// `K` IPO quoting period update.
    QuotingPeriodUpdate, b'K', 28
);

impl<'a> QuotingPeriodUpdate<'a> {
    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[11..19])
    }

    /// Quotation release time, seconds since midnight.
    #[must_use]
    pub fn ipo_quotation_release_time(self) -> u32 {
        be_u32(self.0, 19)
    }

    /// Quotation release qualifier.
    #[must_use]
    pub fn ipo_quotation_release_qualifier(self) -> u8 {
        self.0[23]
    }

    /// IPO price.
    #[must_use]
    pub fn ipo_price(self) -> Price4 {
        Price4(be_u32(self.0, 24))
    }
}

impl fmt::Display for QuotingPeriodUpdate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release = self.ipo_quotation_release_time();
        write!(
            f,
            "{} QuotingPeriodUpdate {} stock={} ipoQuotationReleaseTime={:02}:{:02}:{:02} \
             ipoQuotationReleaseQualifier={} ipoPrice={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.stock(),
            release / 3600,
            (release / 60) % 60,
            release % 60,
            self.ipo_quotation_release_qualifier() as char,
            self.ipo_price()
        )
    }
}

record!(
    /// `J` LULD auction collar.
    LuldAuctionCollar, b'J', 35
);

impl<'a> LuldAuctionCollar<'a> {
    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[11..19])
    }

    /// Auction collar reference price.
    #[must_use]
    pub fn auction_collar_reference_price(self) -> Price4 {
        Price4(be_u32(self.0, 19))
    }

    /// Upper auction collar price.
    #[must_use]
    pub fn upper_auction_collar_price(self) -> Price4 {
        Price4(be_u32(self.0, 23))
    }

    /// Lower auction collar price.
    #[must_use]
    pub fn lower_auction_collar_price(self) -> Price4 {
        Price4(be_u32(self.0, 27))
    }

    /// Number of collar extensions.
    #[must_use]
    pub fn auction_collar_extension(self) -> u32 {
        be_u32(self.0, 31)
    }
}

impl fmt::Display for LuldAuctionCollar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} LULDAuctionCollar {} stock={} auctionCollarReferencePrice={} \
             upperAuctionCollarPrice={} lowerAuctionCollarPrice={} auctionCollarExtension={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.stock(),
            self.auction_collar_reference_price(),
            self.upper_auction_collar_price(),
            self.lower_auction_collar_price(),
            self.auction_collar_extension()
        )
    }
}

record!(
    /// `h` operational halt.
    OperationalHalt, b'h', 21
);

impl<'a> OperationalHalt<'a> {
    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[11..19])
    }

    /// Market code.
    #[must_use]
    pub fn market_code(self) -> u8 {
        self.0[19]
    }

    /// Halt action code.
    #[must_use]
    pub fn operational_halt_action(self) -> u8 {
        self.0[20]
    }
}

impl fmt::Display for OperationalHalt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} OperationalHalt {} stock={} marketCode={} operationalHaltAction={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.stock(),
            self.market_code() as char,
            self.operational_halt_action() as char
        )
    }
}

record!(
    /// `A` add order without MPID attribution.
    AddOrder, b'A', 36
);

impl<'a> AddOrder<'a> {
    /// Feed-assigned order reference number.
    #[must_use]
    pub fn order_reference_number(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// `B` for buy, `S` for sell.
    #[must_use]
    pub fn buy_sell_indicator(self) -> u8 {
        self.0[19]
    }

    /// Displayed shares.
    #[must_use]
    pub fn shares(self) -> u32 {
        be_u32(self.0, 20)
    }

    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[24..32])
    }

    /// Limit price.
    #[must_use]
    pub fn price(self) -> Price4 {
        Price4(be_u32(self.0, 32))
    }
}

impl fmt::Display for AddOrder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} AddOrder {} refnum={} side={} shares={} stock={} price={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.order_reference_number(),
            self.buy_sell_indicator() as char,
            self.shares(),
            self.stock(),
            self.price()
        )
    }
}

record!(
    /// `F` add order with MPID attribution.
    AddOrderMpid, b'F', 40
);

impl<'a> AddOrderMpid<'a> {
    /// Feed-assigned order reference number.
    #[must_use]
    pub fn order_reference_number(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// `B` for buy, `S` for sell.
    #[must_use]
    pub fn buy_sell_indicator(self) -> u8 {
        self.0[19]
    }

    /// Displayed shares.
    #[must_use]
    pub fn shares(self) -> u32 {
        be_u32(self.0, 20)
    }

    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[24..32])
    }

    /// Limit price.
    #[must_use]
    pub fn price(self) -> Price4 {
        Price4(be_u32(self.0, 32))
    }

    /// Attributed market participant, four alpha bytes.
    #[must_use]
    pub fn attribution(self) -> &'a str {
        alpha(&self.0[36..40])
    }
}

impl fmt::Display for AddOrderMpid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} AddOrderMPID {} refnum={} side={} shares={} stock={} price={} attribution={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.order_reference_number(),
            self.buy_sell_indicator() as char,
            self.shares(),
            self.stock(),
            self.price(),
            self.attribution()
        )
    }
}

record!(
    /// `E` order executed at its resting price.
    OrderExecuted, b'E', 31
);

impl OrderExecuted<'_> {
    /// Feed-assigned order reference number.
    #[must_use]
    pub fn order_reference_number(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// Executed shares.
    #[must_use]
    pub fn executed_shares(self) -> u32 {
        be_u32(self.0, 19)
    }

    /// Exchange-assigned match number.
    #[must_use]
    pub fn match_number(self) -> u64 {
        be_u64(self.0, 23)
    }
}

impl fmt::Display for OrderExecuted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} OrderExecuted {} refnum={} shares={} matchnum={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.order_reference_number(),
            self.executed_shares(),
            self.match_number()
        )
    }
}

record!(
    /// `C` order executed at a price different from its resting price.
    OrderExecutedWithPrice, b'C', 36
);

impl OrderExecutedWithPrice<'_> {
    /// Feed-assigned order reference number.
    #[must_use]
    pub fn order_reference_number(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// Executed shares.
    #[must_use]
    pub fn executed_shares(self) -> u32 {
        be_u32(self.0, 19)
    }

    /// Exchange-assigned match number.
    #[must_use]
    pub fn match_number(self) -> u64 {
        be_u64(self.0, 23)
    }

    /// `Y` when the execution prints to the tape.
    #[must_use]
    pub fn printable(self) -> u8 {
        self.0[31]
    }

    /// Execution price.
    #[must_use]
    pub fn execution_price(self) -> Price4 {
        Price4(be_u32(self.0, 32))
    }
}

impl fmt::Display for OrderExecutedWithPrice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} OrderExecutedWithPrice {} refnum={} shares={} matchnum={} printable={} price={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.order_reference_number(),
            self.executed_shares(),
            self.match_number(),
            self.printable() as char,
            self.execution_price()
        )
    }
}

record!(
    /// `X` order partially cancelled.
    OrderCancel, b'X', 23
);

impl OrderCancel<'_> {
    /// Feed-assigned order reference number.
    #[must_use]
    pub fn order_reference_number(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// Cancelled shares.
    #[must_use]
    pub fn canceled_shares(self) -> u32 {
        be_u32(self.0, 19)
    }
}

impl fmt::Display for OrderCancel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} OrderCancel {} refnum={} shares={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.order_reference_number(),
            self.canceled_shares()
        )
    }
}

record!(
    /// `D` order deleted.
    OrderDelete, b'D', 19
);

impl OrderDelete<'_> {
    /// Feed-assigned order reference number.
    #[must_use]
    pub fn order_reference_number(self) -> u64 {
        be_u64(self.0, 11)
    }
}

impl fmt::Display for OrderDelete<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} OrderDelete {} refnum={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.order_reference_number()
        )
    }
}

record!(
    /// `U` order replaced.
    OrderReplace, b'U', 35
);

impl OrderReplace<'_> {
    /// Reference number of the replaced order.
    #[must_use]
    pub fn original_order_reference_number(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// Reference number of the replacement order.
    #[must_use]
    pub fn new_order_reference_number(self) -> u64 {
        be_u64(self.0, 19)
    }

    /// Displayed shares of the replacement.
    #[must_use]
    pub fn shares(self) -> u32 {
        be_u32(self.0, 27)
    }

    /// Limit price of the replacement.
    #[must_use]
    pub fn price(self) -> Price4 {
        Price4(be_u32(self.0, 31))
    }
}

impl fmt::Display for OrderReplace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} OrderReplace {} origrefnum={} newrefnum={} shares={} price={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.original_order_reference_number(),
            self.new_order_reference_number(),
            self.shares(),
            self.price()
        )
    }
}

record!(
    /// `P` non-cross trade against a non-displayed order.
    Trade, b'P', 44
);

impl<'a> Trade<'a> {
    /// Feed-assigned order reference number.
    #[must_use]
    pub fn order_reference_number(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// `B` for buy, `S` for sell.
    #[must_use]
    pub fn buy_sell_indicator(self) -> u8 {
        self.0[19]
    }

    /// Traded shares.
    #[must_use]
    pub fn shares(self) -> u32 {
        be_u32(self.0, 20)
    }

    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[24..32])
    }

    /// Trade price.
    #[must_use]
    pub fn price(self) -> Price4 {
        Price4(be_u32(self.0, 32))
    }

    /// Exchange-assigned match number.
    #[must_use]
    pub fn match_number(self) -> u64 {
        be_u64(self.0, 36)
    }
}

impl fmt::Display for Trade<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Trade {} refnum={} side={} shares={} stock={} price={} matchnum={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.order_reference_number(),
            self.buy_sell_indicator() as char,
            self.shares(),
            self.stock(),
            self.price(),
            self.match_number()
        )
    }
}

record!(
    /// `Q` cross trade.
    CrossTrade, b'Q', 40
);

impl<'a> CrossTrade<'a> {
    /// Crossed shares.
    #[must_use]
    pub fn shares(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[19..27])
    }

    /// Cross price.
    #[must_use]
    pub fn cross_price(self) -> Price4 {
        Price4(be_u32(self.0, 27))
    }

    /// Exchange-assigned match number.
    #[must_use]
    pub fn match_number(self) -> u64 {
        be_u64(self.0, 31)
    }

    /// Cross type code.
    #[must_use]
    pub fn cross_type(self) -> u8 {
        self.0[39]
    }
}

impl fmt::Display for CrossTrade<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} CrossTrade {} shares={} stock={} price={} matchnum={} crossType={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.shares(),
            self.stock(),
            self.cross_price(),
            self.match_number(),
            self.cross_type() as char
        )
    }
}

record!(
    /// `B` broken trade.
    BrokenTrade, b'B', 19
);

impl BrokenTrade<'_> {
    /// Match number of the broken execution.
    #[must_use]
    pub fn match_number(self) -> u64 {
        be_u64(self.0, 11)
    }
}

impl fmt::Display for BrokenTrade<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} BrokenTrade {} matchnum={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.match_number()
        )
    }
}

record!(
    /// `I` net order imbalance indicator.
    Noii, b'I', 50
);

impl<'a> Noii<'a> {
    /// Paired shares.
    #[must_use]
    pub fn paired_shares(self) -> u64 {
        be_u64(self.0, 11)
    }

    /// Imbalance shares.
    #[must_use]
    pub fn imbalance_shares(self) -> u64 {
        be_u64(self.0, 19)
    }

    /// Imbalance direction code.
    #[must_use]
    pub fn imbalance_direction(self) -> u8 {
        self.0[27]
    }

    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[28..36])
    }

    /// Far indicative clearing price.
    #[must_use]
    pub fn far_price(self) -> Price4 {
        Price4(be_u32(self.0, 36))
    }

    /// Near indicative clearing price.
    #[must_use]
    pub fn near_price(self) -> Price4 {
        Price4(be_u32(self.0, 40))
    }

    /// Current reference price.
    #[must_use]
    pub fn current_reference_price(self) -> Price4 {
        Price4(be_u32(self.0, 44))
    }

    /// Cross type code.
    #[must_use]
    pub fn cross_type(self) -> u8 {
        self.0[48]
    }

    /// Price variation indicator.
    #[must_use]
    pub fn price_variation_indicator(self) -> u8 {
        self.0[49]
    }
}

impl fmt::Display for Noii<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} NOII {} pairedShares={} imbalanceShares={} imbalanceDirection={} stock={} \
             farPrice={} nearPrice={} currentReferencePrice={} crossType={} \
             priceVariationIndicator={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.paired_shares(),
            self.imbalance_shares(),
            self.imbalance_direction() as char,
            self.stock(),
            self.far_price(),
            self.near_price(),
            self.current_reference_price(),
            self.cross_type() as char,
            self.price_variation_indicator() as char
        )
    }
}

record!(
    /// `N` retail price improvement indicator.
    Rpii, b'N', 20
);

impl<'a> Rpii<'a> {
    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[11..19])
    }

    /// Interest flag.
    #[must_use]
    pub fn interest_flag(self) -> u8 {
        self.0[19]
    }
}

impl fmt::Display for Rpii<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} RPII {} stock={} interestFlag={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.stock(),
            self.interest_flag() as char
        )
    }
}

record!(
    /// `O` direct listing with capital raise price discovery.
    DirectListing, b'O', 48
);

impl<'a> DirectListing<'a> {
    /// Symbol name, space padding stripped.
    #[must_use]
    pub fn stock(self) -> &'a str {
        stock_name(&self.0[11..19])
    }

    /// Open eligibility status.
    #[must_use]
    pub fn open_eligibility_status(self) -> u8 {
        self.0[19]
    }

    /// Minimum allowed price.
    #[must_use]
    pub fn minimum_allowed_price(self) -> Price4 {
        Price4(be_u32(self.0, 20))
    }

    /// Maximum allowed price.
    #[must_use]
    pub fn maximum_allowed_price(self) -> Price4 {
        Price4(be_u32(self.0, 24))
    }

    /// Near execution price.
    #[must_use]
    pub fn near_execution_price(self) -> Price4 {
        Price4(be_u32(self.0, 28))
    }

    /// Near execution time, nanoseconds since midnight.
    #[must_use]
    pub fn near_execution_time(self) -> u64 {
        be_u64(self.0, 32)
    }

    /// Lower price range collar.
    #[must_use]
    pub fn lower_price_range_collar(self) -> Price4 {
        Price4(be_u32(self.0, 40))
    }

    /// Upper price range collar.
    #[must_use]
    pub fn upper_price_range_collar(self) -> Price4 {
        Price4(be_u32(self.0, 44))
    }
}

impl fmt::Display for DirectListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} DirectListing {} stock={} openEligibilityStatus={} minimumAllowedPrice={} \
             maximumAllowedPrice={} nearExecutionPrice={} nearExecutionTime={} \
             lowerPriceRangeCollar={} upperPriceRangeCollar={}",
            timestamp_string(self.header().timestamp_nanos()),
            self.header(),
            self.stock(),
            self.open_eligibility_status() as char,
            self.minimum_allowed_price(),
            self.maximum_allowed_price(),
            self.near_execution_price(),
            self.near_execution_time(),
            self.lower_price_range_collar(),
            self.upper_price_range_collar()
        )
    }
}

// record sizes are fixed by the NASDAQ specification
const _: () = {
    assert!(CommonHeader::SIZE == 11);
    assert!(SystemEvent::SIZE == 12);
    assert!(StockDirectory::SIZE == 39);
    assert!(StockTradingAction::SIZE == 25);
    assert!(RegShoRestriction::SIZE == 20);
    assert!(MarketParticipantPosition::SIZE == 26);
    assert!(MwcbDeclineLevel::SIZE == 35);
    assert!(MwcbStatus::SIZE == 12);
    assert!(QuotingPeriodUpdate::SIZE == 28);
    assert!(LuldAuctionCollar::SIZE == 35);
    assert!(OperationalHalt::SIZE == 21);
    assert!(AddOrder::SIZE == 36);
    assert!(AddOrderMpid::SIZE == 40);
    assert!(OrderExecuted::SIZE == 31);
    assert!(OrderExecutedWithPrice::SIZE == 36);
    assert!(OrderCancel::SIZE == 23);
    assert!(OrderDelete::SIZE == 19);
    assert!(OrderReplace::SIZE == 35);
    assert!(Trade::SIZE == 44);
    assert!(CrossTrade::SIZE == 40);
    assert!(BrokenTrade::SIZE == 19);
    assert!(Noii::SIZE == 50);
    assert!(Rpii::SIZE == 20);
    assert!(DirectListing::SIZE == 48);
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::build_header;

    #[test]
    fn price4_converts_exactly() {
        let px = Price4(1_000_123);
        assert_eq!(px.to_price(), Price::from_f64(100.0123));
        assert_eq!(px.to_string(), "100.0123");
        assert_eq!(Price4(99).to_string(), "0.0099");
    }

    #[test]
    fn price8_display() {
        assert_eq!(Price8(12_345_678_901).to_string(), "123.45678901");
    }

    #[test]
    fn timestamp_formatting() {
        // 09:30:01.000000002
        let nanos = (9 * 3600 + 30 * 60 + 1) * 1_000_000_000 + 2;
        assert_eq!(timestamp_string(nanos), "09:30:01:000000002");
    }

    #[test]
    fn header_fields() {
        let mut buf = build_header(b'S', 7, 34_200_000_000_000);
        buf.push(b'O');
        let header = CommonHeader::new(&buf);
        assert_eq!(header.msg_type(), b'S');
        assert_eq!(header.stock_locate(), StockLocate(7));
        assert_eq!(header.timestamp_nanos(), 34_200_000_000_000);
    }

    #[test]
    fn add_order_fields() {
        let mut buf = build_header(b'A', 3, 1);
        buf.extend_from_slice(&42_u64.to_be_bytes());
        buf.push(b'B');
        buf.extend_from_slice(&100_u32.to_be_bytes());
        buf.extend_from_slice(b"AAPL    ");
        buf.extend_from_slice(&1_000_400_u32.to_be_bytes());
        assert_eq!(buf.len(), AddOrder::SIZE);

        let msg = AddOrder::new(&buf);
        assert_eq!(msg.order_reference_number(), 42);
        assert_eq!(msg.buy_sell_indicator(), b'B');
        assert_eq!(msg.shares(), 100);
        assert_eq!(msg.stock(), "AAPL");
        assert_eq!(msg.price(), Price4(1_000_400));
        assert!(msg.to_string().contains("stock=AAPL"));
        assert!(msg.to_string().contains("price=100.0400"));
    }

    #[test]
    fn order_replace_fields() {
        let mut buf = build_header(b'U', 3, 1);
        buf.extend_from_slice(&10_u64.to_be_bytes());
        buf.extend_from_slice(&11_u64.to_be_bytes());
        buf.extend_from_slice(&50_u32.to_be_bytes());
        buf.extend_from_slice(&999_900_u32.to_be_bytes());
        assert_eq!(buf.len(), OrderReplace::SIZE);

        let msg = OrderReplace::new(&buf);
        assert_eq!(msg.original_order_reference_number(), 10);
        assert_eq!(msg.new_order_reference_number(), 11);
        assert_eq!(msg.shares(), 50);
        assert_eq!(msg.price(), Price4(999_900));
    }

    #[test]
    fn cross_trade_fields() {
        let mut buf = build_header(b'Q', 5, 2);
        buf.extend_from_slice(&5_000_u64.to_be_bytes());
        buf.extend_from_slice(b"MSFT    ");
        buf.extend_from_slice(&2_000_000_u32.to_be_bytes());
        buf.extend_from_slice(&77_u64.to_be_bytes());
        buf.push(b'O');
        assert_eq!(buf.len(), CrossTrade::SIZE);

        let msg = CrossTrade::new(&buf);
        assert_eq!(msg.shares(), 5_000);
        assert_eq!(msg.stock(), "MSFT");
        assert_eq!(msg.cross_price(), Price4(2_000_000));
        assert_eq!(msg.match_number(), 77);
        assert_eq!(msg.cross_type(), b'O');
    }
}
