//! Depth-ladder formatting
//!
//! Renders the top `depth` levels of a book as one string per row:
//! `(bid_orders) bid_quantity bid_price   ask_price ask_quantity (ask_orders)`

use crate::book::OrderBook;
use common::{Cid, Side};

/// Column layout for the ladder. Zero widths in the minimum are grown to fit
/// the data by [`infer_print_params`].
#[derive(Clone, Copy, Debug)]
pub struct PrintParams {
    /// Width of the order-count column.
    pub order_width: usize,
    /// Width of the quantity column.
    pub quantity_width: usize,
    /// Width of the price column.
    pub price_width: usize,
    /// Decimal places printed for prices.
    pub price_precision: usize,
    /// Spaces between the bid and ask blocks.
    pub bid_ask_spaces: usize,
}

impl Default for PrintParams {
    fn default() -> Self {
        Self {
            order_width: 0,
            quantity_width: 0,
            price_width: 0,
            price_precision: 0,
            bid_ask_spaces: 3,
        }
    }
}

fn integer_width(value: u64) -> usize {
    let mut width = 1;
    let mut v = value / 10;
    while v > 0 {
        width += 1;
        v /= 10;
    }
    width
}

/// Column width and fraction digits needed to print `value` exactly (up to
/// the 16 significant decimal digits a double carries).
fn floating_point_width(value: f64) -> (usize, usize) {
    const EPSILON: f64 = 1e-10;
    let absv = value.abs();
    let residual = if (absv - absv.round()).abs() > EPSILON {
        absv - absv.floor()
    } else {
        0.0
    };

    let mut nleft = 1_usize;
    let mut v = absv;
    while v >= 10.0 {
        v /= 10.0;
        nleft += 1;
    }

    let mut nfrac = 0_usize;
    let mut scale = 10.0_f64;
    let mut remaining = residual;
    while (nfrac + nleft) < 17 && remaining.abs() > EPSILON {
        remaining = residual - (residual * scale).round() / scale;
        scale *= 10.0;
        nfrac += 1;
    }

    let width = nleft + nfrac + usize::from(nfrac > 0) + usize::from(value < 0.0);
    (width, nfrac)
}

/// Grow `min_params` so every column fits the top `depth` levels of both
/// halves of `cid`.
#[must_use]
pub fn infer_print_params(
    book: &OrderBook,
    cid: Cid,
    depth: usize,
    min_params: PrintParams,
) -> PrintParams {
    let mut params = min_params;
    for side in [Side::Bid, Side::Ask] {
        for level in book.level_iter(cid, side).take(depth) {
            #[allow(clippy::cast_possible_truncation)]
            let orders = level.num_orders() as u64;
            params.order_width = params.order_width.max(integer_width(orders));
            params.quantity_width = params
                .quantity_width
                .max(integer_width(level.total_shares().unsigned_abs()));
            let (width, frac) = floating_point_width(level.price().as_f64());
            params.price_width = params.price_width.max(width);
            params.price_precision = params.price_precision.max(frac);
        }
    }
    params
}

/// Render the ladder with inferred column widths.
#[must_use]
pub fn print_levels(book: &OrderBook, cid: Cid, depth: usize) -> Vec<String> {
    let params = infer_print_params(book, cid, depth, PrintParams::default());
    print_levels_with(book, cid, depth, &params)
}

/// Render the ladder with the given column layout. Produces at most `depth`
/// rows and stops once both halves are exhausted.
#[must_use]
pub fn print_levels_with(
    book: &OrderBook,
    cid: Cid,
    depth: usize,
    params: &PrintParams,
) -> Vec<String> {
    let mut bids = book.level_iter(cid, Side::Bid);
    let mut asks = book.level_iter(cid, Side::Ask).peekable();

    let mut lines = Vec::with_capacity(depth);
    for _ in 0..depth {
        let mut line = String::new();
        if let Some(bid) = bids.next() {
            line.push_str(&format!(
                "({:>ow$}) {:>qw$} {:>pw$}",
                bid.num_orders(),
                bid.total_shares(),
                format!("{:.prec$}", bid.price().as_f64(), prec = params.price_precision),
                ow = params.order_width,
                qw = params.quantity_width,
                pw = params.price_width,
            ));
        } else if asks.peek().is_some() {
            line.push_str(&" ".repeat(
                params.order_width + params.quantity_width + params.price_width + 4,
            ));
        }
        if let Some(ask) = asks.next() {
            line.push_str(&" ".repeat(params.bid_ask_spaces));
            line.push_str(&format!(
                "{:<pw$} {:<qw$} ({:<ow$})",
                format!("{:.prec$}", ask.price().as_f64(), prec = params.price_precision),
                ask.total_shares(),
                ask.num_orders(),
                ow = params.order_width,
                qw = params.quantity_width,
                pw = params.price_width,
            ));
        }
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }
    lines
}
