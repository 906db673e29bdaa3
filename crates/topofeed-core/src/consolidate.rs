//! Consolidation trait - what a bounded delta queue needs from its entries
//!
//! A queue that refuses to drop data must be able to fold two adjacent
//! entries into one. For an ordered pair `(older, newer)`:
//!
//! ```text
//! apply(apply(S, older), newer)  ≡  apply(S, older.consolidate(newer))
//! ```
//!
//! Unlike a lattice join this is NOT commutative: the arguments are ordered
//! in time and the newer side wins wherever the two disagree.

/// Values that can be held in a consolidating queue.
pub trait Consolidate: Clone {
    /// True when the value carries no change at all and must never be
    /// queued or delivered.
    fn is_degenerate(&self) -> bool;

    /// Fold `self` (the older value) and `newer` into one value that is
    /// observationally equivalent to applying them in order.
    fn consolidate(&self, newer: &Self) -> Self;
}
