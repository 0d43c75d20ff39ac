//! The order book engine
//!
//! An [`OrderBook`] aggregates the books of all cids. Orders are held in a
//! hashmap keyed by reference number; for each cid there are two half books,
//! one per side. A half keeps its price levels both in a doubly-linked list
//! sorted by price aggressiveness (best price at the front) and in an ordered
//! map with the same comparator, so top-of-book is O(1) and price insertion
//! is O(log n). Each level is a FIFO of the orders resting at its price.
//! Orders and levels live in slab arenas and are addressed by index; the two
//! linked structures store those indices rather than pointers.

use crate::arena::{Arena, NIL};
use crate::listener::BookListener;
use common::{BookId, Cid, Price, Quantity, ReferenceNum, Side, Timestamp};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::ops::Bound::{Excluded, Unbounded};
use std::rc::Rc;
use tracing::{error, warn};

/// Execution details reported with a fill.
#[derive(Clone, Copy, Debug)]
pub struct ExecInfo {
    /// Exchange-assigned match number.
    pub match_num: u64,
    /// Whether the execution prints to the tape.
    pub printable: bool,
    /// Execution price when it differs from the resting order's price.
    pub price: Option<Price>,
}

impl Default for ExecInfo {
    fn default() -> Self {
        Self {
            match_num: 0,
            printable: true,
            price: None,
        }
    }
}

impl fmt::Display for ExecInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matchnum={} printable={}",
            self.match_num,
            if self.printable { 'Y' } else { 'N' }
        )?;
        if let Some(px) = self.price {
            write!(f, " price={px}")?;
        }
        Ok(())
    }
}

/// A resting order. Data fields are public for listeners and tests; linkage
/// is engine-owned.
#[derive(Clone, Debug)]
pub struct Order {
    /// Feed-assigned reference number.
    pub ref_num: ReferenceNum,
    /// Symbol index.
    pub cid: Cid,
    /// Book side.
    pub side: Side,
    /// Outstanding shares. Zero only between unlink and destroy.
    pub quantity: Quantity,
    /// Limit price.
    pub price: Price,
    /// Time the order entered the book.
    pub create_time: Timestamp,
    /// Time of the last mutation.
    pub update_time: Timestamp,

    level: u32,
    prev: u32,
    next: u32,
}

impl Order {
    fn new(
        ref_num: ReferenceNum,
        cid: Cid,
        side: Side,
        quantity: Quantity,
        price: Price,
        tm: Timestamp,
    ) -> Self {
        Self {
            ref_num,
            cid,
            side,
            quantity,
            price,
            create_time: tm,
            update_time: tm,
            level: NIL,
            prev: NIL,
            next: NIL,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "refnum={} side={} size={} price={}",
            self.ref_num, self.side, self.quantity, self.price
        )
    }
}

/// All orders resting at one `(cid, side, price)`, FIFO by arrival. A level
/// exists only while it has at least one order.
#[derive(Debug)]
pub struct Level {
    price: Price,
    total_shares: Quantity,
    cid: Cid,
    side: Side,
    num_orders: usize,
    head: u32,
    tail: u32,
    prev: u32,
    next: u32,
}

impl Level {
    fn new(cid: Cid, side: Side, price: Price) -> Self {
        Self {
            price,
            total_shares: 0,
            cid,
            side,
            num_orders: 0,
            head: NIL,
            tail: NIL,
            prev: NIL,
            next: NIL,
        }
    }

    /// The level's price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Sum of the quantities of all resting orders.
    #[must_use]
    pub const fn total_shares(&self) -> Quantity {
        self.total_shares
    }

    /// The owning symbol index.
    #[must_use]
    pub const fn cid(&self) -> Cid {
        self.cid
    }

    /// The owning side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Number of resting orders.
    #[must_use]
    pub const fn num_orders(&self) -> usize {
        self.num_orders
    }
}

/// Key for the level-by-price hashmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct LevelKey {
    cid: Cid,
    side: Side,
    price: Price,
}

/// Map key ordering levels best-first: ask prices ascend, bid prices are
/// negated so the highest bid sorts first.
const fn priority_key(side: Side, price: Price) -> i64 {
    match side {
        Side::Ask => price.raw(),
        Side::Bid => -price.raw(),
    }
}

#[derive(Debug)]
struct Half {
    head: u32,
    tail: u32,
    len: usize,
    sorted: std::collections::BTreeMap<i64, u32>,
}

impl Half {
    fn new() -> Self {
        Self {
            head: NIL,
            tail: NIL,
            len: 0,
            sorted: std::collections::BTreeMap::new(),
        }
    }
}

struct PerCidBook {
    halves: [Half; 2],
}

impl PerCidBook {
    fn new() -> Self {
        Self {
            halves: [Half::new(), Half::new()],
        }
    }
}

type ListenerHandle = Rc<RefCell<dyn BookListener>>;

/// The aggregate book over all cids. See the module docs for the structure.
pub struct OrderBook {
    id: BookId,
    books: Vec<PerCidBook>,
    listeners: Vec<ListenerHandle>,

    // orders currently linked in price levels; excludes orders that are
    // unlinked but kept alive for a listener callback
    order_count: usize,
    max_order_count: usize,
    max_level_count: usize,

    orders_by_ref: FxHashMap<ReferenceNum, u32>,
    levels_by_key: FxHashMap<LevelKey, u32>,

    orders: Arena<Order>,
    levels: Arena<Level>,
}

impl OrderBook {
    /// An empty book with no cids; call [`Self::resize`] before adding
    /// orders.
    #[must_use]
    pub fn new(id: BookId) -> Self {
        Self {
            id,
            books: Vec::new(),
            listeners: Vec::new(),
            order_count: 0,
            max_order_count: 0,
            max_level_count: 0,
            orders_by_ref: FxHashMap::default(),
            levels_by_key: FxHashMap::default(),
            orders: Arena::new(),
            levels: Arena::new(),
        }
    }

    /// Grow or shrink the cid range. `max_cid` is exclusive: passing 10
    /// makes cids 0-9 addressable. Shrinking clears the dropped cids without
    /// notifying listeners.
    pub fn resize(&mut self, max_cid: Cid) {
        let ubound = max_cid.index();
        if ubound < self.books.len() {
            for i in ubound..self.books.len() {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                self.clear_cid(Cid(i as i32), false);
            }
            self.books.truncate(ubound);
        } else {
            while self.books.len() < ubound {
                self.books.push(PerCidBook::new());
            }
        }
    }

    /// Pre-size the maps and arenas to avoid rehashing at runtime.
    pub fn reserve(&mut self, cid_size: usize, order_map_size: usize, level_map_size: usize) {
        self.books.reserve(cid_size);
        self.orders_by_ref.reserve(order_map_size);
        self.levels_by_key.reserve(level_map_size);
        self.orders.reserve(order_map_size);
        self.levels.reserve(level_map_size);
    }

    /// Register a listener. Listeners are invoked in registration order.
    pub fn add_listener(&mut self, listener: ListenerHandle) {
        self.listeners.push(listener);
    }

    /// Remove a previously registered listener.
    pub fn remove_listener(&mut self, listener: &ListenerHandle) {
        self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    /// The book identifier passed to listeners.
    #[must_use]
    pub const fn id(&self) -> BookId {
        self.id
    }

    /// Number of active (linked) orders.
    #[must_use]
    pub const fn num_orders(&self) -> usize {
        self.order_count
    }

    /// Number of live price levels.
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.levels_by_key.len()
    }

    /// High-water mark of [`Self::num_orders`], for sizing.
    #[must_use]
    pub const fn max_num_orders(&self) -> usize {
        self.max_order_count
    }

    /// High-water mark of [`Self::num_levels`], for sizing.
    #[must_use]
    pub const fn max_num_levels(&self) -> usize {
        self.max_level_count
    }

    /// Look up an order by reference number.
    #[must_use]
    pub fn find_order(&self, ref_num: ReferenceNum) -> Option<&Order> {
        self.orders_by_ref.get(&ref_num).map(|&idx| self.orders.get(idx))
    }

    /// Add an order, creating its level if needed and linking it at the tail
    /// of the level FIFO. If `ref_num` is already present the existing
    /// holder is first deleted (listeners see `on_delete_order`). Notifies
    /// listeners via `on_new_order`.
    pub fn new_order(
        &mut self,
        ref_num: ReferenceNum,
        cid: Cid,
        side: Side,
        quantity: Quantity,
        price: Price,
        tm: Timestamp,
    ) -> &Order {
        debug_assert!(cid.index() < self.books.len());
        let idx = self.create_order(ref_num, cid, side, quantity, price, tm);
        self.link_order(idx);
        self.notify_new(idx);
        self.orders.get(idx)
    }

    /// Reduce an order's quantity by `change_quantity`. A change of at least
    /// the outstanding quantity removes the order; listeners then see a
    /// single `on_update_order` with the order's quantity already zero.
    /// Warns when the change exceeds the outstanding quantity.
    pub fn reduce_order_by(
        &mut self,
        ref_num: ReferenceNum,
        change_quantity: Quantity,
        tm: Timestamp,
    ) {
        if let Some(&idx) = self.orders_by_ref.get(&ref_num) {
            self.reduce_by_idx(idx, change_quantity, tm);
        } else {
            warn!("order with refnum {} not found in reduce_by", ref_num);
        }
    }

    /// Set an order's quantity to `new_quantity`. Zero is equivalent to
    /// [`Self::delete_order`]. Warns when the new quantity exceeds the old
    /// one, but honors it.
    pub fn reduce_order_to(
        &mut self,
        ref_num: ReferenceNum,
        new_quantity: Quantity,
        tm: Timestamp,
    ) {
        let Some(&idx) = self.orders_by_ref.get(&ref_num) else {
            warn!("order with refnum {} not found in reduce_to", ref_num);
            return;
        };
        if new_quantity == 0 {
            self.delete_idx(idx, tm);
            return;
        }
        let old_quantity = self.orders.get(idx).quantity;
        if old_quantity < new_quantity {
            warn!(
                "order with refnum {} has less remaining quantity ({}) than reduce_to \
                 quantity ({}), increasing to new quantity",
                ref_num, old_quantity, new_quantity
            );
        }
        let lidx = self.orders.get(idx).level;
        {
            let order = self.orders.get_mut(idx);
            order.quantity = new_quantity;
            order.update_time = tm;
        }
        self.levels.get_mut(lidx).total_shares -= old_quantity - new_quantity;
        let old_price = self.orders.get(idx).price;
        self.notify_update(idx, old_quantity, old_price);
    }

    /// Delete an order. Listeners see `on_delete_order` with the pre-call
    /// quantity.
    pub fn delete_order(&mut self, ref_num: ReferenceNum, tm: Timestamp) {
        if let Some(&idx) = self.orders_by_ref.get(&ref_num) {
            self.delete_idx(idx, tm);
        } else {
            warn!("order with refnum {} not found in delete_order", ref_num);
        }
    }

    /// (Partially) fill an order. Quantity accounting matches
    /// [`Self::reduce_order_by`], but listeners see `on_exec_order` with the
    /// reported fill quantity, even when it exceeds the outstanding
    /// quantity. A full fill destroys the order after the callback.
    pub fn execute_order(
        &mut self,
        ref_num: ReferenceNum,
        quantity: Quantity,
        exec: &ExecInfo,
        tm: Timestamp,
    ) {
        let Some(&idx) = self.orders_by_ref.get(&ref_num) else {
            warn!("order with refnum {} not found in execute_order", ref_num);
            return;
        };
        let old_quantity = self.orders.get(idx).quantity;
        if old_quantity <= quantity {
            self.unlink_order(idx);
            if old_quantity < quantity {
                warn!(
                    "order with refnum {} has less remaining quantity ({}) than execute \
                     quantity ({})",
                    ref_num, old_quantity, quantity
                );
            }
            // listeners still get the reported fill quantity despite the
            // shortfall
            self.orders.get_mut(idx).quantity = 0;
        } else {
            let lidx = self.orders.get(idx).level;
            self.levels.get_mut(lidx).total_shares -= quantity;
            self.orders.get_mut(idx).quantity -= quantity;
        }
        self.orders.get_mut(idx).update_time = tm;
        self.notify_exec(idx, old_quantity, quantity, exec);
        if self.orders.get(idx).quantity == 0 {
            self.destroy_order(idx);
        }
    }

    /// Atomically replace an order. The new order inherits the old one's cid
    /// and side, is re-inserted at the tail of its (possibly new) level, and
    /// listeners see exactly one `on_replace_order`. When `new_ref_num`
    /// equals the old reference number the storage slot is salvaged. Returns
    /// the new order, or `None` (with a warning) when `old_ref_num` is
    /// unknown.
    pub fn replace_order(
        &mut self,
        old_ref_num: ReferenceNum,
        new_ref_num: ReferenceNum,
        new_quantity: Quantity,
        new_price: Price,
        tm: Timestamp,
    ) -> Option<&Order> {
        let Some(&old_idx) = self.orders_by_ref.get(&old_ref_num) else {
            warn!("order with refnum {} not found in replace_order", old_ref_num);
            return None;
        };
        self.orders.get_mut(old_idx).update_time = tm;
        self.unlink_order(old_idx);
        let (cid, side) = {
            let o = self.orders.get(old_idx);
            (o.cid, o.side)
        };

        let new_idx = if new_ref_num == old_ref_num {
            // salvage the slot: keep a copy of the old order for the
            // callback and rebuild the new one in place
            let old_copy = self.orders.get(old_idx).clone();
            *self.orders.get_mut(old_idx) =
                Order::new(new_ref_num, cid, side, new_quantity, new_price, tm);
            self.link_order(old_idx);
            self.notify_replace(&old_copy, old_idx);
            old_idx
        } else {
            let new_idx = self.create_order(new_ref_num, cid, side, new_quantity, new_price, tm);
            self.link_order(new_idx);
            let old = self.orders.get(old_idx);
            for listener in &self.listeners {
                listener
                    .borrow_mut()
                    .on_replace_order(self, old, self.orders.get(new_idx));
            }
            self.destroy_order(old_idx);
            new_idx
        };
        Some(self.orders.get(new_idx))
    }

    /// Drop all orders under `cid`, notifying listeners per order. Deletion
    /// order within a half is unspecified.
    pub fn clear_book(&mut self, cid: Cid) {
        self.clear_cid(cid, true);
    }

    /// Drop all orders of all cids in cid order, optionally notifying
    /// listeners.
    pub fn clear(&mut self, call_listeners: bool) {
        for i in 0..self.books.len() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            self.clear_cid(Cid(i as i32), call_listeners);
        }
    }

    /// The best level for `cid`/`side`, or `None` when the half is empty.
    #[must_use]
    pub fn top_level(&self, cid: Cid, side: Side) -> Option<&Level> {
        let head = self.half(cid, side).head;
        (head != NIL).then(|| self.levels.get(head))
    }

    /// The n-th best level (n == 0 is the best), walking the half's list.
    #[must_use]
    pub fn nth_level(&self, cid: Cid, side: Side, n: usize) -> Option<&Level> {
        self.level_iter(cid, side).nth(n)
    }

    /// The level at exactly `price`, if one exists.
    #[must_use]
    pub fn get_level(&self, cid: Cid, side: Side, price: Price) -> Option<&Level> {
        self.levels_by_key
            .get(&LevelKey { cid, side, price })
            .map(|&idx| self.levels.get(idx))
    }

    /// Number of levels on one half.
    #[must_use]
    pub fn depth(&self, cid: Cid, side: Side) -> usize {
        self.half(cid, side).len
    }

    /// Iterate the levels of a half from the best price outwards.
    #[must_use]
    pub fn level_iter(&self, cid: Cid, side: Side) -> LevelIter<'_> {
        LevelIter {
            book: self,
            cur: self.half(cid, side).head,
        }
    }

    /// Iterate a level's orders in FIFO (time-priority) order.
    #[must_use]
    pub fn order_iter<'a>(&'a self, level: &Level) -> OrderIter<'a> {
        OrderIter {
            book: self,
            cur: level.head,
        }
    }

    /// Full consistency check: list ordering, totals, back-references,
    /// count agreement. O(orders + levels); every violation is logged.
    /// Intended for tests and debugging.
    #[must_use]
    pub fn validate(&self) -> bool {
        let mut success = true;
        for i in 0..self.books.len() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let cid = Cid(i as i32);
            success &= self.validate_cid(cid);
        }
        // all orders are linked between public calls
        if self.order_count != self.orders_by_ref.len() {
            error!(
                "order count mismatch, order_count={} orders_map_size={}",
                self.order_count,
                self.orders_by_ref.len()
            );
            success = false;
        }
        for (&ref_num, &idx) in &self.orders_by_ref {
            if self.orders.get(idx).level == NIL {
                error!("order with refnum {} is not linked", ref_num);
                success = false;
            }
        }
        for &lidx in self.levels_by_key.values() {
            if self.levels.get(lidx).num_orders == 0 {
                error!("level is empty, {}", self.level_string(lidx));
                success = false;
            }
        }
        let mut total_levels = 0_usize;
        let mut total_orders = 0_usize;
        for i in 0..self.books.len() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let cid = Cid(i as i32);
            for side in [Side::Bid, Side::Ask] {
                total_levels += self.depth(cid, side);
                for level in self.level_iter(cid, side) {
                    total_orders += level.num_orders;
                }
            }
        }
        if total_levels != self.levels_by_key.len() {
            error!(
                "level count mismatch, counted={} levels_map_size={}",
                total_levels,
                self.levels_by_key.len()
            );
            success = false;
        }
        if total_orders != self.orders_by_ref.len() || total_orders != self.order_count {
            error!(
                "order count mismatch, counted={} order_count={} orders_map_size={}",
                total_orders,
                self.order_count,
                self.orders_by_ref.len()
            );
            success = false;
        }
        success
    }

    /// Consistency check for a single cid.
    #[must_use]
    pub fn validate_cid(&self, cid: Cid) -> bool {
        let mut success = true;
        for side in [Side::Bid, Side::Ask] {
            let mut last_price: Option<Price> = None;
            for level in self.level_iter(cid, side) {
                if let Some(last) = last_price {
                    let ordered = match side {
                        Side::Bid => last > level.price,
                        Side::Ask => last < level.price,
                    };
                    if !ordered {
                        error!(
                            "levels are not ordered by price priority, cid={} side={} \
                             prev={} next={}",
                            cid, side, last, level.price
                        );
                        success = false;
                    }
                }
                last_price = Some(level.price);

                if level.num_orders == 0 {
                    error!("level is empty, cid={} side={} price={}", cid, side, level.price);
                    success = false;
                }
                if level.cid != cid || level.side != side {
                    error!(
                        "level half mismatch, level cid={} side={} in half cid={} side={}",
                        level.cid, level.side, cid, side
                    );
                    success = false;
                }

                let mut total_shares: Quantity = 0;
                for order in self.order_iter(level) {
                    if order.cid != cid || order.side != side || order.price != level.price {
                        error!(
                            "order level mismatch, order: {} level: cid={} side={} price={}",
                            order, cid, side, level.price
                        );
                        success = false;
                    }
                    if order.quantity <= 0 {
                        error!("order quantity is non-positive, order: {}", order);
                        success = false;
                    }
                    match self.orders_by_ref.get(&order.ref_num) {
                        None => {
                            error!("order not found in orders map, {}", order);
                            success = false;
                        }
                        Some(&idx) => {
                            if !std::ptr::eq(self.orders.get(idx), order) {
                                error!("order identity mismatch in orders map, {}", order);
                                success = false;
                            }
                        }
                    }
                    total_shares += order.quantity;
                }
                if level.total_shares != total_shares {
                    error!(
                        "level total_shares mismatch, level={} sum_of_orders={} cid={} \
                         side={} price={}",
                        level.total_shares, total_shares, cid, side, level.price
                    );
                    success = false;
                }
            }
        }
        success
    }

    // ---- internals ----

    fn half(&self, cid: Cid, side: Side) -> &Half {
        &self.books[cid.index()].halves[side.index()]
    }

    /// Create the order object and map entry. An existing holder of the same
    /// reference number is unlinked, reported deleted, and its slot reused.
    fn create_order(
        &mut self,
        ref_num: ReferenceNum,
        cid: Cid,
        side: Side,
        quantity: Quantity,
        price: Price,
        tm: Timestamp,
    ) -> u32 {
        if let Some(&idx) = self.orders_by_ref.get(&ref_num) {
            warn!(
                "order with refnum {} already exists, deleting old one and creating new one",
                ref_num
            );
            self.unlink_order(idx);
            let old_quantity = self.orders.get(idx).quantity;
            self.notify_delete(idx, old_quantity);
            *self.orders.get_mut(idx) = Order::new(ref_num, cid, side, quantity, price, tm);
            idx
        } else {
            let idx = self
                .orders
                .insert(Order::new(ref_num, cid, side, quantity, price, tm));
            self.orders_by_ref.insert(ref_num, idx);
            idx
        }
    }

    fn destroy_order(&mut self, idx: u32) {
        let ref_num = self.orders.get(idx).ref_num;
        self.orders_by_ref.remove(&ref_num);
        self.orders.remove(idx);
    }

    /// Insert the order at the tail of its level's FIFO, creating the level
    /// if needed. Does not notify.
    fn link_order(&mut self, idx: u32) {
        let (cid, side, price, quantity) = {
            let o = self.orders.get(idx);
            (o.cid, o.side, o.price, o.quantity)
        };
        let lidx = self.find_or_create_level(cid, side, price);
        let tail = self.levels.get(lidx).tail;
        {
            let order = self.orders.get_mut(idx);
            order.level = lidx;
            order.prev = tail;
            order.next = NIL;
        }
        if tail == NIL {
            self.levels.get_mut(lidx).head = idx;
        } else {
            self.orders.get_mut(tail).next = idx;
        }
        {
            let level = self.levels.get_mut(lidx);
            level.tail = idx;
            level.total_shares += quantity;
            level.num_orders += 1;
        }
        self.order_count += 1;
        if self.order_count > self.max_order_count {
            self.max_order_count = self.order_count;
        }
    }

    /// Remove the order from its level, destroying the level if it empties.
    /// Does not notify and does not destroy the order.
    fn unlink_order(&mut self, idx: u32) {
        let (lidx, quantity, prev, next) = {
            let o = self.orders.get(idx);
            (o.level, o.quantity, o.prev, o.next)
        };
        {
            let level = self.levels.get_mut(lidx);
            level.total_shares -= quantity;
            level.num_orders -= 1;
            if prev == NIL {
                level.head = next;
            }
            if next == NIL {
                level.tail = prev;
            }
        }
        if prev != NIL {
            self.orders.get_mut(prev).next = next;
        }
        if next != NIL {
            self.orders.get_mut(next).prev = prev;
        }
        {
            let order = self.orders.get_mut(idx);
            order.level = NIL;
            order.prev = NIL;
            order.next = NIL;
        }
        if self.levels.get(lidx).num_orders == 0 {
            debug_assert_eq!(self.levels.get(lidx).total_shares, 0);
            self.destroy_level(lidx);
        }
        self.order_count -= 1;
    }

    fn find_or_create_level(&mut self, cid: Cid, side: Side, price: Price) -> u32 {
        let key = LevelKey { cid, side, price };
        if let Some(&idx) = self.levels_by_key.get(&key) {
            return idx;
        }
        let lidx = self.levels.insert(Level::new(cid, side, price));
        self.levels_by_key.insert(key, lidx);
        self.link_level(lidx);
        if self.levels_by_key.len() > self.max_level_count {
            self.max_level_count = self.levels_by_key.len();
        }
        lidx
    }

    /// Splice a fresh level into both half structures at its price-priority
    /// position.
    fn link_level(&mut self, lidx: u32) {
        let (cid, side, price) = {
            let l = self.levels.get(lidx);
            (l.cid, l.side, l.price)
        };
        let key = priority_key(side, price);
        let after = {
            let half = &mut self.books[cid.index()].halves[side.index()];
            half.sorted.insert(key, lidx);
            half.len += 1;
            half.sorted
                .range((Excluded(key), Unbounded))
                .next()
                .map(|(_, &idx)| idx)
        };
        match after {
            None => {
                // least aggressive price so far, append at the tail
                let tail = self.half(cid, side).tail;
                self.books[cid.index()].halves[side.index()].tail = lidx;
                if tail == NIL {
                    self.books[cid.index()].halves[side.index()].head = lidx;
                } else {
                    self.levels.get_mut(tail).next = lidx;
                    self.levels.get_mut(lidx).prev = tail;
                }
            }
            Some(next_idx) => {
                let prev = self.levels.get(next_idx).prev;
                {
                    let level = self.levels.get_mut(lidx);
                    level.prev = prev;
                    level.next = next_idx;
                }
                self.levels.get_mut(next_idx).prev = lidx;
                if prev == NIL {
                    self.books[cid.index()].halves[side.index()].head = lidx;
                } else {
                    self.levels.get_mut(prev).next = lidx;
                }
            }
        }
    }

    fn destroy_level(&mut self, lidx: u32) {
        let (cid, side, price, prev, next) = {
            let l = self.levels.get(lidx);
            (l.cid, l.side, l.price, l.prev, l.next)
        };
        {
            let half = &mut self.books[cid.index()].halves[side.index()];
            half.sorted.remove(&priority_key(side, price));
            half.len -= 1;
            if prev == NIL {
                half.head = next;
            }
            if next == NIL {
                half.tail = prev;
            }
        }
        if prev != NIL {
            self.levels.get_mut(prev).next = next;
        }
        if next != NIL {
            self.levels.get_mut(next).prev = prev;
        }
        self.levels_by_key.remove(&LevelKey { cid, side, price });
        self.levels.remove(lidx);
    }

    fn reduce_by_idx(&mut self, idx: u32, change_quantity: Quantity, tm: Timestamp) {
        let old_quantity = self.orders.get(idx).quantity;
        if old_quantity <= change_quantity {
            self.unlink_order(idx);
            if old_quantity < change_quantity {
                warn!(
                    "order with refnum {} has less remaining quantity ({}) than reduce_by \
                     quantity ({})",
                    self.orders.get(idx).ref_num,
                    old_quantity,
                    change_quantity
                );
            }
            // unlink already settled the level's total_shares
            self.orders.get_mut(idx).quantity = 0;
        } else {
            let lidx = self.orders.get(idx).level;
            self.orders.get_mut(idx).quantity -= change_quantity;
            self.levels.get_mut(lidx).total_shares -= change_quantity;
        }
        self.orders.get_mut(idx).update_time = tm;
        let old_price = self.orders.get(idx).price;
        self.notify_update(idx, old_quantity, old_price);
        if self.orders.get(idx).quantity == 0 {
            self.destroy_order(idx);
        }
    }

    fn delete_idx(&mut self, idx: u32, tm: Timestamp) {
        self.unlink_order(idx);
        self.orders.get_mut(idx).update_time = tm;
        let old_quantity = self.orders.get(idx).quantity;
        self.notify_delete(idx, old_quantity);
        self.destroy_order(idx);
    }

    fn clear_cid(&mut self, cid: Cid, call_listeners: bool) {
        debug_assert!(cid.index() < self.books.len());
        for side in [Side::Bid, Side::Ask] {
            loop {
                let lidx = self.books[cid.index()].halves[side.index()].head;
                if lidx == NIL {
                    break;
                }
                // levels are never empty, so the front order exists; the
                // level destroys itself when its last order unlinks
                let oidx = self.levels.get(lidx).head;
                self.unlink_order(oidx);
                if call_listeners {
                    let quantity = self.orders.get(oidx).quantity;
                    self.notify_delete(oidx, quantity);
                }
                self.destroy_order(oidx);
            }
        }
    }

    fn level_string(&self, lidx: u32) -> String {
        let level = self.levels.get(lidx);
        format!(
            "cid={} side={} price={} total_shares={}",
            level.cid, level.side, level.price, level.total_shares
        )
    }

    fn notify_new(&self, idx: u32) {
        let order = self.orders.get(idx);
        for listener in &self.listeners {
            listener.borrow_mut().on_new_order(self, order);
        }
    }

    fn notify_delete(&self, idx: u32, old_quantity: Quantity) {
        let order = self.orders.get(idx);
        for listener in &self.listeners {
            listener.borrow_mut().on_delete_order(self, order, old_quantity);
        }
    }

    fn notify_update(&self, idx: u32, old_quantity: Quantity, old_price: Price) {
        let order = self.orders.get(idx);
        for listener in &self.listeners {
            listener
                .borrow_mut()
                .on_update_order(self, order, old_quantity, old_price);
        }
    }

    fn notify_exec(&self, idx: u32, old_quantity: Quantity, fill_quantity: Quantity, exec: &ExecInfo) {
        let order = self.orders.get(idx);
        for listener in &self.listeners {
            listener
                .borrow_mut()
                .on_exec_order(self, order, old_quantity, fill_quantity, exec);
        }
    }

    fn notify_replace(&self, old: &Order, new_idx: u32) {
        let new = self.orders.get(new_idx);
        for listener in &self.listeners {
            listener.borrow_mut().on_replace_order(self, old, new);
        }
    }
}

impl Drop for OrderBook {
    fn drop(&mut self) {
        // return all orders and levels to their arenas before the arenas'
        // own leak check runs
        self.clear(false);
    }
}

/// Iterator over a half's levels from the best price outwards.
pub struct LevelIter<'a> {
    book: &'a OrderBook,
    cur: u32,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = &'a Level;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NIL {
            return None;
        }
        let level = self.book.levels.get(self.cur);
        self.cur = level.next;
        Some(level)
    }
}

/// Iterator over a level's orders in time priority.
pub struct OrderIter<'a> {
    book: &'a OrderBook,
    cur: u32,
}

impl<'a> Iterator for OrderIter<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NIL {
            return None;
        }
        let order = self.book.orders.get(self.cur);
        self.cur = order.next;
        Some(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(value: f64) -> Price {
        Price::from_f64(value)
    }

    fn ts(nanos: u64) -> Timestamp {
        Timestamp::from_nanos(nanos)
    }

    /// Records every callback for assertions. Events carry refnums and
    /// values rather than references, since the order storage is recycled.
    #[derive(Default)]
    struct Recorder {
        new_orders: Vec<(BookId, ReferenceNum)>,
        delete_orders: Vec<(BookId, ReferenceNum, Quantity)>,
        replace_orders: Vec<(BookId, ReferenceNum, ReferenceNum)>,
        exec_orders: Vec<(BookId, ReferenceNum, Quantity, Quantity, Option<Price>)>,
        update_orders: Vec<(BookId, ReferenceNum, Quantity, Price)>,
    }

    impl Recorder {
        fn clear(&mut self) {
            self.new_orders.clear();
            self.delete_orders.clear();
            self.replace_orders.clear();
            self.exec_orders.clear();
            self.update_orders.clear();
        }
    }

    impl BookListener for Recorder {
        fn on_new_order(&mut self, book: &OrderBook, order: &Order) {
            self.new_orders.push((book.id(), order.ref_num));
        }

        fn on_delete_order(&mut self, book: &OrderBook, order: &Order, old_quantity: Quantity) {
            self.delete_orders.push((book.id(), order.ref_num, old_quantity));
        }

        fn on_replace_order(&mut self, book: &OrderBook, old: &Order, new: &Order) {
            self.replace_orders.push((book.id(), old.ref_num, new.ref_num));
        }

        fn on_exec_order(
            &mut self,
            book: &OrderBook,
            order: &Order,
            old_quantity: Quantity,
            fill_quantity: Quantity,
            exec: &ExecInfo,
        ) {
            self.exec_orders
                .push((book.id(), order.ref_num, old_quantity, fill_quantity, exec.price));
        }

        fn on_update_order(
            &mut self,
            book: &OrderBook,
            order: &Order,
            old_quantity: Quantity,
            old_price: Price,
        ) {
            self.update_orders
                .push((book.id(), order.ref_num, old_quantity, old_price));
        }
    }

    fn level_refnums(book: &OrderBook, level: &Level) -> Vec<u64> {
        book.order_iter(level).map(|o| o.ref_num.0).collect()
    }

    #[test]
    fn basic() {
        let mut book = OrderBook::new(BookId(0));
        assert_eq!(book.id(), BookId(0));
        assert_eq!(book.num_orders(), 0);

        book.reserve(20, 20, 20);
        book.resize(Cid(10));
        book.new_order(ReferenceNum(1), Cid(0), Side::Bid, 100, px(100.0), ts(0));
        assert_eq!(book.num_orders(), 1);
        let order1 = book.find_order(ReferenceNum(1)).expect("order 1");
        assert_eq!(order1.ref_num, ReferenceNum(1));
        assert_eq!(order1.quantity, 100);
        assert_eq!(order1.price, px(100.0));
        assert_eq!(order1.cid, Cid(0));
        assert_eq!(order1.side, Side::Bid);

        let level1 = book.top_level(Cid(0), Side::Bid).expect("level");
        assert_eq!(level1.price(), px(100.0));
        assert_eq!(level1.total_shares(), 100);
        assert_eq!(level1.num_orders(), 1);
        assert_eq!(level_refnums(&book, level1), vec![1]);
        assert!(book.nth_level(Cid(0), Side::Bid, 0).is_some());
        assert!(book.nth_level(Cid(0), Side::Bid, 1).is_none());
        assert!(book.get_level(Cid(0), Side::Bid, px(100.0)).is_some());
        assert!(book.get_level(Cid(0), Side::Bid, px(100.1)).is_none());
        assert!(book.get_level(Cid(0), Side::Ask, px(100.0)).is_none());

        book.new_order(ReferenceNum(2), Cid(1), Side::Ask, 100, px(102.0), ts(0));
        assert_eq!(book.num_orders(), 2);
        assert!(book.find_order(ReferenceNum(2)).is_some());
        assert!(book.find_order(ReferenceNum(3)).is_none());
        let level2 = book.top_level(Cid(1), Side::Ask).expect("level");
        assert_eq!(level2.price(), px(102.0));
        assert_eq!(level2.total_shares(), 100);

        // better bid moves top of book
        book.new_order(ReferenceNum(3), Cid(0), Side::Bid, 100, px(101.0), ts(0));
        let top = book.top_level(Cid(0), Side::Bid).expect("level");
        assert_eq!(top.price(), px(101.0));
        assert_eq!(book.nth_level(Cid(0), Side::Bid, 0).map(Level::price), Some(px(101.0)));
        assert_eq!(book.nth_level(Cid(0), Side::Bid, 1).map(Level::price), Some(px(100.0)));
        assert!(book.nth_level(Cid(0), Side::Bid, 2).is_none());

        // worse ask leaves top of book alone
        book.new_order(ReferenceNum(4), Cid(1), Side::Ask, 100, px(103.0), ts(0));
        assert_eq!(book.top_level(Cid(1), Side::Ask).map(Level::price), Some(px(102.0)));
        assert_eq!(book.nth_level(Cid(1), Side::Ask, 1).map(Level::price), Some(px(103.0)));
        assert_eq!(book.num_orders(), 4);
        assert_eq!(book.depth(Cid(0), Side::Bid), 2);
        assert_eq!(book.depth(Cid(1), Side::Ask), 2);

        let ei = ExecInfo::default();
        book.execute_order(ReferenceNum(1), 10, &ei, ts(1));
        assert_eq!(book.find_order(ReferenceNum(1)).map(|o| o.quantity), Some(90));
        book.execute_order(ReferenceNum(1), 10, &ei, ts(2));
        assert_eq!(book.find_order(ReferenceNum(1)).map(|o| o.quantity), Some(80));

        let ei = ExecInfo {
            price: Some(px(102.01)),
            ..ExecInfo::default()
        };
        book.execute_order(ReferenceNum(2), 10, &ei, ts(3));
        let order2 = book.find_order(ReferenceNum(2)).expect("order 2");
        assert_eq!(order2.quantity, 90);
        assert_eq!(order2.price, px(102.0));

        book.reduce_order_by(ReferenceNum(1), 5, ts(4));
        assert_eq!(book.find_order(ReferenceNum(1)).map(|o| o.quantity), Some(75));

        book.reduce_order_to(ReferenceNum(2), 5, ts(5));
        assert_eq!(book.find_order(ReferenceNum(2)).map(|o| o.quantity), Some(5));

        book.delete_order(ReferenceNum(2), ts(6));
        assert!(book.find_order(ReferenceNum(2)).is_none());
        assert!(book.get_level(Cid(1), Side::Ask, px(102.0)).is_none());
        assert_eq!(book.top_level(Cid(1), Side::Ask).map(Level::price), Some(px(103.0)));
        assert_eq!(book.num_orders(), 3);

        book.replace_order(ReferenceNum(1), ReferenceNum(5), 80, px(101.10), ts(7));
        assert!(book.find_order(ReferenceNum(1)).is_none());
        let order5 = book.find_order(ReferenceNum(5)).expect("order 5");
        assert_eq!(order5.quantity, 80);
        assert_eq!(order5.price, px(101.10));
        assert_eq!(order5.cid, Cid(0));
        assert_eq!(order5.side, Side::Bid);
        let level5 = book.get_level(Cid(0), Side::Bid, px(101.10)).expect("level");
        assert_eq!(level5.total_shares(), 80);
        assert_eq!(level5.num_orders(), 1);
        assert_eq!(book.top_level(Cid(0), Side::Bid).map(Level::price), Some(px(101.10)));

        assert_eq!(book.num_orders(), 3);
        assert!(book.validate());

        book.clear_book(Cid(0));
        assert_eq!(book.num_orders(), 1);
        assert!(book.top_level(Cid(0), Side::Bid).is_none());
        assert_eq!(book.top_level(Cid(1), Side::Ask).map(Level::price), Some(px(103.0)));

        book.clear(true);
        assert_eq!(book.num_orders(), 0);
        assert_eq!(book.num_levels(), 0);
        assert!(book.max_num_orders() >= 4);
    }

    #[test]
    fn listener_sequences() {
        let mut book = OrderBook::new(BookId(1));
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        book.add_listener(recorder.clone());
        book.resize(Cid(2));

        book.new_order(ReferenceNum(1), Cid(0), Side::Bid, 100, px(100.0), ts(0));
        {
            let rec = recorder.borrow();
            assert_eq!(rec.new_orders, vec![(BookId(1), ReferenceNum(1))]);
        }
        recorder.borrow_mut().clear();

        let ei = ExecInfo {
            price: Some(px(100.0)),
            ..ExecInfo::default()
        };
        book.execute_order(ReferenceNum(1), 10, &ei, ts(1));
        {
            let rec = recorder.borrow();
            assert_eq!(
                rec.exec_orders,
                vec![(BookId(1), ReferenceNum(1), 100, 10, Some(px(100.0)))]
            );
        }
        recorder.borrow_mut().clear();

        let ei = ExecInfo {
            price: Some(px(100.10)),
            ..ExecInfo::default()
        };
        book.execute_order(ReferenceNum(1), 5, &ei, ts(2));
        {
            let rec = recorder.borrow();
            assert_eq!(
                rec.exec_orders,
                vec![(BookId(1), ReferenceNum(1), 90, 5, Some(px(100.10)))]
            );
        }
        assert_eq!(book.find_order(ReferenceNum(1)).map(|o| o.quantity), Some(85));
        recorder.borrow_mut().clear();

        book.reduce_order_by(ReferenceNum(1), 10, ts(3));
        {
            let rec = recorder.borrow();
            assert_eq!(rec.update_orders, vec![(BookId(1), ReferenceNum(1), 85, px(100.0))]);
        }
        recorder.borrow_mut().clear();

        book.reduce_order_to(ReferenceNum(1), 10, ts(4));
        {
            let rec = recorder.borrow();
            assert_eq!(rec.update_orders, vec![(BookId(1), ReferenceNum(1), 75, px(100.0))]);
        }
        recorder.borrow_mut().clear();

        book.replace_order(ReferenceNum(1), ReferenceNum(2), 20, px(100.10), ts(5));
        {
            let rec = recorder.borrow();
            assert_eq!(
                rec.replace_orders,
                vec![(BookId(1), ReferenceNum(1), ReferenceNum(2))]
            );
        }
        let order2 = book.find_order(ReferenceNum(2)).expect("order 2");
        assert_eq!(order2.quantity, 20);
        assert_eq!(order2.price, px(100.10));
        recorder.borrow_mut().clear();

        book.delete_order(ReferenceNum(2), ts(6));
        {
            let rec = recorder.borrow();
            assert_eq!(rec.delete_orders, vec![(BookId(1), ReferenceNum(2), 20)]);
        }
        recorder.borrow_mut().clear();

        book.new_order(ReferenceNum(3), Cid(1), Side::Bid, 100, px(102.0), ts(7));
        recorder.borrow_mut().clear();

        // replacing an unknown refnum warns, fires nothing, returns None
        assert!(book
            .replace_order(ReferenceNum(4), ReferenceNum(5), 50, px(103.0), ts(8))
            .is_none());
        assert!(recorder.borrow().replace_orders.is_empty());

        // clearing an empty cid fires nothing
        book.clear_book(Cid(0));
        assert!(recorder.borrow().delete_orders.is_empty());

        book.clear_book(Cid(1));
        {
            let rec = recorder.borrow();
            assert_eq!(rec.delete_orders, vec![(BookId(1), ReferenceNum(3), 100)]);
        }
        assert_eq!(book.num_orders(), 0);
    }

    #[test]
    fn time_priority_within_level() {
        let mut book = OrderBook::new(BookId(2));
        book.resize(Cid(3));
        for r in [10, 20, 30, 40, 50] {
            book.new_order(ReferenceNum(r), Cid(0), Side::Bid, 100, px(100.0), ts(0));
        }
        assert!(book.validate());

        let level = book.top_level(Cid(0), Side::Bid).expect("level");
        assert_eq!(level.price(), px(100.0));
        assert_eq!(level.total_shares(), 500);
        assert_eq!(level.num_orders(), 5);
        assert_eq!(level_refnums(&book, level), vec![10, 20, 30, 40, 50]);

        // a replaced order loses time priority even at the same price
        book.replace_order(ReferenceNum(20), ReferenceNum(22), 100, px(100.0), ts(1));
        let level = book.top_level(Cid(0), Side::Bid).expect("level");
        assert_eq!(level.num_orders(), 5);
        assert_eq!(level_refnums(&book, level), vec![10, 30, 40, 50, 22]);

        book.delete_order(ReferenceNum(30), ts(2));
        book.delete_order(ReferenceNum(40), ts(2));
        book.delete_order(ReferenceNum(50), ts(2));
        let level = book.top_level(Cid(0), Side::Bid).expect("level");
        assert_eq!(level_refnums(&book, level), vec![10, 22]);
        assert!(book.validate());

        book.clear_book(Cid(0));
        assert!(book.top_level(Cid(0), Side::Bid).is_none());
        assert_eq!(book.num_orders(), 0);
    }

    #[test]
    fn replace_keeping_refnum_moves_to_tail() {
        let mut book = OrderBook::new(BookId(2));
        book.resize(Cid(1));
        for r in [1, 2, 3] {
            book.new_order(ReferenceNum(r), Cid(0), Side::Bid, 100, px(100.0), ts(0));
        }
        let before = book.top_level(Cid(0), Side::Bid).expect("level");
        let shares_before = before.total_shares();
        let levels_before = book.num_levels();

        // same refnum, same quantity, same price: book state is unchanged
        // except the order drops to the back of the queue
        book.replace_order(ReferenceNum(1), ReferenceNum(1), 100, px(100.0), ts(1));
        let level = book.top_level(Cid(0), Side::Bid).expect("level");
        assert_eq!(level.total_shares(), shares_before);
        assert_eq!(book.num_levels(), levels_before);
        assert_eq!(level_refnums(&book, level), vec![2, 3, 1]);
        assert!(book.validate());
        book.clear(false);
    }

    #[test]
    fn price_ordering_across_levels() {
        let mut book = OrderBook::new(BookId(3));
        book.resize(Cid(4));
        for (r, p) in [(100, 100.04), (200, 100.01), (300, 100.03), (400, 100.02), (500, 100.05)] {
            book.new_order(ReferenceNum(r), Cid(0), Side::Bid, 100, px(p), ts(0));
        }
        for (r, p) in [(600, 100.14), (700, 100.11), (800, 100.13), (900, 100.12), (1000, 100.15)]
        {
            book.new_order(ReferenceNum(r), Cid(1), Side::Ask, 100, px(p), ts(0));
        }
        assert!(book.validate());

        assert_eq!(book.top_level(Cid(0), Side::Bid).map(Level::price), Some(px(100.05)));
        assert_eq!(book.top_level(Cid(1), Side::Ask).map(Level::price), Some(px(100.11)));
        assert_eq!(book.depth(Cid(0), Side::Bid), 5);
        assert_eq!(book.depth(Cid(1), Side::Ask), 5);

        let bid_prices: Vec<Price> = book.level_iter(Cid(0), Side::Bid).map(Level::price).collect();
        assert_eq!(
            bid_prices,
            vec![px(100.05), px(100.04), px(100.03), px(100.02), px(100.01)]
        );
        let ask_prices: Vec<Price> = book.level_iter(Cid(1), Side::Ask).map(Level::price).collect();
        assert_eq!(
            ask_prices,
            vec![px(100.11), px(100.12), px(100.13), px(100.14), px(100.15)]
        );
        book.clear(false);
    }

    #[test]
    fn erroneous_input_is_tolerated() {
        let mut book = OrderBook::new(BookId(4));
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        book.add_listener(recorder.clone());
        book.resize(Cid(4));

        book.new_order(ReferenceNum(100), Cid(0), Side::Bid, 100, px(100.04), ts(0));
        recorder.borrow_mut().clear();

        // unknown refnums are warnings, not mutations
        book.reduce_order_by(ReferenceNum(101), 10, ts(1));
        book.reduce_order_to(ReferenceNum(101), 10, ts(1));
        book.delete_order(ReferenceNum(101), ts(1));
        assert!(recorder.borrow().update_orders.is_empty());
        assert!(recorder.borrow().delete_orders.is_empty());
        assert!(book.validate());

        // oversized execute removes the order and reports the full fill
        let ei = ExecInfo {
            price: Some(px(100.03)),
            ..ExecInfo::default()
        };
        book.execute_order(ReferenceNum(100), 101, &ei, ts(2));
        {
            let rec = recorder.borrow();
            assert_eq!(
                rec.exec_orders,
                vec![(BookId(4), ReferenceNum(100), 100, 101, Some(px(100.03)))]
            );
        }
        assert!(book.find_order(ReferenceNum(100)).is_none());
        assert!(book.top_level(Cid(0), Side::Bid).is_none());
        recorder.borrow_mut().clear();
        assert!(book.validate());

        // duplicate refnum implicitly deletes the previous holder
        book.new_order(ReferenceNum(102), Cid(0), Side::Bid, 100, px(100.0), ts(3));
        recorder.borrow_mut().clear();
        book.new_order(ReferenceNum(102), Cid(0), Side::Ask, 150, px(100.04), ts(4));
        {
            let rec = recorder.borrow();
            assert_eq!(rec.delete_orders, vec![(BookId(4), ReferenceNum(102), 100)]);
            assert_eq!(rec.new_orders, vec![(BookId(4), ReferenceNum(102))]);
        }
        let order = book.find_order(ReferenceNum(102)).expect("order 102");
        assert_eq!(order.side, Side::Ask);
        assert_eq!(order.quantity, 150);
        recorder.borrow_mut().clear();
        assert!(book.validate());

        // reduce_to above the current quantity warns but honors the value
        book.reduce_order_to(ReferenceNum(102), 160, ts(5));
        {
            let rec = recorder.borrow();
            assert_eq!(rec.update_orders, vec![(BookId(4), ReferenceNum(102), 150, px(100.04))]);
        }
        assert_eq!(book.find_order(ReferenceNum(102)).map(|o| o.quantity), Some(160));
        recorder.borrow_mut().clear();
        assert!(book.validate());

        // reduce_by above the current quantity removes the order
        book.reduce_order_by(ReferenceNum(102), 200, ts(6));
        {
            let rec = recorder.borrow();
            assert_eq!(rec.update_orders, vec![(BookId(4), ReferenceNum(102), 160, px(100.04))]);
        }
        assert!(book.find_order(ReferenceNum(102)).is_none());
        assert!(book.validate());
    }

    #[test]
    fn add_delete_round_trip_restores_state() {
        let mut book = OrderBook::new(BookId(0));
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        book.add_listener(recorder.clone());
        book.resize(Cid(1));

        book.new_order(ReferenceNum(1), Cid(0), Side::Bid, 100, px(100.0), ts(0));
        book.delete_order(ReferenceNum(1), ts(1));

        assert_eq!(book.num_orders(), 0);
        assert_eq!(book.num_levels(), 0);
        assert!(book.top_level(Cid(0), Side::Bid).is_none());
        let rec = recorder.borrow();
        assert_eq!(rec.new_orders, vec![(BookId(0), ReferenceNum(1))]);
        assert_eq!(rec.delete_orders, vec![(BookId(0), ReferenceNum(1), 100)]);
    }

    #[test]
    fn reduce_to_same_quantity_is_noop_but_notifies() {
        let mut book = OrderBook::new(BookId(0));
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        book.add_listener(recorder.clone());
        book.resize(Cid(1));

        book.new_order(ReferenceNum(1), Cid(0), Side::Bid, 100, px(100.0), ts(0));
        recorder.borrow_mut().clear();

        book.reduce_order_to(ReferenceNum(1), 100, ts(1));
        assert_eq!(book.find_order(ReferenceNum(1)).map(|o| o.quantity), Some(100));
        assert_eq!(
            book.top_level(Cid(0), Side::Bid).map(Level::total_shares),
            Some(100)
        );
        assert_eq!(
            recorder.borrow().update_orders,
            vec![(BookId(0), ReferenceNum(1), 100, px(100.0))]
        );
        book.clear(false);
    }

    #[test]
    fn reduce_to_zero_is_delete() {
        let mut book = OrderBook::new(BookId(0));
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        book.add_listener(recorder.clone());
        book.resize(Cid(1));

        book.new_order(ReferenceNum(1), Cid(0), Side::Bid, 100, px(100.0), ts(0));
        recorder.borrow_mut().clear();
        book.reduce_order_to(ReferenceNum(1), 0, ts(1));

        assert!(book.find_order(ReferenceNum(1)).is_none());
        assert_eq!(book.num_orders(), 0);
        let rec = recorder.borrow();
        assert!(rec.update_orders.is_empty());
        assert_eq!(rec.delete_orders, vec![(BookId(0), ReferenceNum(1), 100)]);
    }

    #[test]
    fn two_level_bid_ordering() {
        let mut book = OrderBook::new(BookId(0));
        book.resize(Cid(1));
        book.new_order(ReferenceNum(1), Cid(0), Side::Bid, 100, px(100.0), ts(0));
        book.new_order(ReferenceNum(2), Cid(0), Side::Bid, 100, px(101.0), ts(1));

        assert_eq!(book.top_level(Cid(0), Side::Bid).map(Level::price), Some(px(101.0)));
        assert_eq!(book.nth_level(Cid(0), Side::Bid, 1).map(Level::price), Some(px(100.0)));
        book.clear(false);
    }

    #[test]
    fn full_fill_destroys_order_and_level() {
        let mut book = OrderBook::new(BookId(0));
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        book.add_listener(recorder.clone());
        book.resize(Cid(1));

        book.new_order(ReferenceNum(100), Cid(0), Side::Bid, 100, px(100.04), ts(0));
        recorder.borrow_mut().clear();
        book.execute_order(ReferenceNum(100), 101, &ExecInfo::default(), ts(1));

        let rec = recorder.borrow();
        assert_eq!(rec.exec_orders, vec![(BookId(0), ReferenceNum(100), 100, 101, None)]);
        assert!(book.find_order(ReferenceNum(100)).is_none());
        assert_eq!(book.num_levels(), 0);
    }

    #[test]
    fn stats_track_high_water_marks() {
        let mut book = OrderBook::new(BookId(0));
        book.resize(Cid(1));
        for r in 0..10_u64 {
            #[allow(clippy::cast_precision_loss)]
            book.new_order(ReferenceNum(r), Cid(0), Side::Bid, 10, px(100.0 + r as f64), ts(0));
        }
        book.clear(false);
        assert_eq!(book.num_orders(), 0);
        assert_eq!(book.max_num_orders(), 10);
        assert_eq!(book.max_num_levels(), 10);
    }

    #[test]
    fn resize_shrink_clears_dropped_cids() {
        let mut book = OrderBook::new(BookId(0));
        book.resize(Cid(3));
        book.new_order(ReferenceNum(1), Cid(0), Side::Bid, 10, px(1.0), ts(0));
        book.new_order(ReferenceNum(2), Cid(2), Side::Ask, 10, px(2.0), ts(0));
        book.resize(Cid(1));
        assert_eq!(book.num_orders(), 1);
        assert!(book.find_order(ReferenceNum(2)).is_none());
        assert!(book.find_order(ReferenceNum(1)).is_some());
        book.clear(false);
    }
}
