//! Eviction Algorithm Module
//!
//! Defines the pluggable bookkeeping contract the memory tier consults when
//! it runs out of room.

// == Eviction Algorithm ==
/// Tracks key usage and picks which key the memory tier should drop next.
///
/// Implementations hold no values, only whatever ordering state they need.
/// The memory tier keeps the tracked key set equal to its own key set by
/// calling these hooks around every mutation.
pub trait EvictionAlgorithm<K>: Send + Sync {
    /// Records that `key` was inserted (or overwritten).
    fn on_entry_add(&mut self, key: &K);

    /// Records a read hit on an existing key.
    fn on_entry_access(&mut self, key: &K);

    /// Records that `key` left the tier, through removal or eviction.
    fn on_entry_remove(&mut self, key: &K);

    /// Returns the key judged least valuable, or `None` when nothing is tracked.
    ///
    /// Selection does not change tracking; the tier follows up with
    /// [`on_entry_remove`](Self::on_entry_remove) once the key is gone.
    fn select_eviction_candidate(&self) -> Option<K>;

    /// Drops all tracking state. Called when the tier is cleared.
    fn on_clear(&mut self);
}
