//! Specialized collection types
//!
//! Arena handles for everything the collision engine owns. Handles are
//! generational, so a key that outlives its slot never resolves to a new
//! occupant.

use std::sync::atomic::{AtomicU64, Ordering};

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Handle to a collision object owned by a detector
    pub struct ObjectKey;

    /// Handle to a collision group owned by a detector
    pub struct GroupKey;

    /// Handle to a cached geometry owned by a geometry cache
    pub struct GeometryKey;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;

/// Monotonic process-wide identifier source
///
/// Used for identities that must be unique across arenas (shapes, detectors).
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a generator whose first id is 1
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next id
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
