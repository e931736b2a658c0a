//! Per-call detection options and pairwise filters

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::object::CollisionObject;
use crate::foundation::collections::ObjectKey;

/// Decides whether a candidate pair goes to the narrow phase
pub trait CollisionFilter: Send + Sync {
    /// Return `false` to skip the pair
    fn needs_collision(&self, object1: &CollisionObject, object2: &CollisionObject) -> bool;
}

impl<F> CollisionFilter for F
where
    F: Fn(&CollisionObject, &CollisionObject) -> bool + Send + Sync,
{
    fn needs_collision(&self, object1: &CollisionObject, object2: &CollisionObject) -> bool {
        self(object1, object2)
    }
}

/// Rejects explicitly listed pairs, in either order
#[derive(Debug, Clone, Default)]
pub struct ExcludedPairsFilter {
    pairs: HashSet<(ObjectKey, ObjectKey)>,
}

impl ExcludedPairsFilter {
    /// Create a filter that excludes nothing
    pub fn new() -> Self {
        Self::default()
    }

    fn ordered(a: ObjectKey, b: ObjectKey) -> (ObjectKey, ObjectKey) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Exclude a pair
    pub fn exclude(&mut self, a: ObjectKey, b: ObjectKey) {
        self.pairs.insert(Self::ordered(a, b));
    }

    /// Stop excluding a pair; false if it was not excluded
    pub fn include(&mut self, a: ObjectKey, b: ObjectKey) -> bool {
        self.pairs.remove(&Self::ordered(a, b))
    }

    /// Whether a pair is excluded
    pub fn is_excluded(&self, a: ObjectKey, b: ObjectKey) -> bool {
        self.pairs.contains(&Self::ordered(a, b))
    }
}

impl CollisionFilter for ExcludedPairsFilter {
    fn needs_collision(&self, object1: &CollisionObject, object2: &CollisionObject) -> bool {
        !self.is_excluded(object1.key(), object2.key())
    }
}

/// Options for one detection call
#[derive(Clone)]
pub struct DetectionOption {
    /// Contact count at which detection stops early (0 behaves as 1)
    pub max_num_contacts: usize,
    /// Compute contact geometry; when off only the fact of collision is reported
    pub enable_contact: bool,
    /// Optional pairwise filter, consulted before the narrow phase
    pub collision_filter: Option<Arc<dyn CollisionFilter>>,
}

impl DetectionOption {
    /// Create an option without a filter
    pub fn new(enable_contact: bool, max_num_contacts: usize) -> Self {
        Self {
            max_num_contacts,
            enable_contact,
            collision_filter: None,
        }
    }

    /// Attach a filter
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn CollisionFilter>) -> Self {
        self.collision_filter = Some(filter);
        self
    }

    /// Attach a closure as the filter
    #[must_use]
    pub fn with_filter_fn<F>(self, filter: F) -> Self
    where
        F: Fn(&CollisionObject, &CollisionObject) -> bool + Send + Sync + 'static,
    {
        self.with_filter(Arc::new(filter))
    }

    /// Stop after this many contacts
    #[must_use]
    pub fn with_max_contacts(mut self, max_num_contacts: usize) -> Self {
        self.max_num_contacts = max_num_contacts;
        self
    }
}

impl Default for DetectionOption {
    fn default() -> Self {
        Self::new(true, 1000)
    }
}

impl fmt::Debug for DetectionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionOption")
            .field("max_num_contacts", &self.max_num_contacts)
            .field("enable_contact", &self.enable_contact)
            .field("has_filter", &self.collision_filter.is_some())
            .finish()
    }
}
