//! Listener interface for book mutations

use crate::book::{ExecInfo, Order, OrderBook};
use common::{Price, Quantity};

/// Receives every book mutation, synchronously and inline with the mutating
/// call. Callbacks borrow the book and the affected orders for the duration
/// of the call only; the storage behind them may be recycled immediately
/// afterwards. A listener must not mutate the book and must not register or
/// remove listeners from inside a callback.
pub trait BookListener {
    /// A new order was linked into the book.
    fn on_new_order(&mut self, book: &OrderBook, order: &Order);

    /// An order was removed. `old_quantity` is the quantity before the call.
    fn on_delete_order(&mut self, book: &OrderBook, order: &Order, old_quantity: Quantity);

    /// An order was atomically replaced. `old` is the replaced order as it
    /// was at the time of the call, `new` the order that took its place.
    fn on_replace_order(&mut self, book: &OrderBook, old: &Order, new: &Order);

    /// An order was (partially) filled. `fill_quantity` is the reported fill
    /// even when it exceeds the outstanding quantity.
    fn on_exec_order(
        &mut self,
        book: &OrderBook,
        order: &Order,
        old_quantity: Quantity,
        fill_quantity: Quantity,
        exec: &ExecInfo,
    );

    /// An order's quantity changed in place. The order's `quantity` is zero
    /// when the reduction removed it entirely.
    fn on_update_order(
        &mut self,
        book: &OrderBook,
        order: &Order,
        old_quantity: Quantity,
        old_price: Price,
    );
}
