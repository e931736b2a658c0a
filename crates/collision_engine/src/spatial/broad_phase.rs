//! Abstract broad-phase interface
//!
//! The broad phase quickly identifies pairs of objects that might be
//! colliding using some kind of spatial partitioning scheme. This
//! abstraction allows swapping schemes (octree, brute force, ...) without
//! changing the detection pipeline.
//!
//! Backends own their proxies in the order they were given to
//! [`BroadPhase::rebuild`]. Pair enumeration follows that order, so two
//! backends fed the same proxies report the same pairs in the same order.

use crate::foundation::collections::ObjectKey;
use crate::geometry::Aabb;

/// Bounding volume registered for one collision object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proxy {
    /// Owning collision object
    pub key: ObjectKey,
    /// World-space bounds
    pub aabb: Aabb,
}

impl Proxy {
    /// Create a proxy
    pub fn new(key: ObjectKey, aabb: Aabb) -> Self {
        Self { key, aabb }
    }
}

/// Candidate-pair callback; return `true` to stop the enumeration
pub type PairCallback<'a> = dyn FnMut(ObjectKey, ObjectKey) -> bool + 'a;

/// Spatial index over object proxies
pub trait BroadPhase: Send + Sync {
    /// Replace the indexed proxies
    fn rebuild(&mut self, proxies: &[Proxy]);

    /// Indexed proxies, in rebuild order
    fn proxies(&self) -> &[Proxy];

    /// Push the indices (into [`proxies`](Self::proxies)) of every proxy
    /// whose bounds overlap `aabb`, in ascending order
    fn query_indices(&self, aabb: &Aabb, out: &mut Vec<usize>);

    /// Remove every proxy
    fn clear(&mut self);

    /// Number of indexed proxies
    fn len(&self) -> usize {
        self.proxies().len()
    }

    /// True when nothing is indexed
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every proxy in rebuild order
    fn for_each_proxy(&self, visit: &mut dyn FnMut(&Proxy)) {
        self.proxies().iter().for_each(visit);
    }

    /// Objects whose bounds overlap `aabb`
    fn query_aabb(&self, aabb: &Aabb) -> Vec<ObjectKey> {
        let mut indices = Vec::new();
        self.query_indices(aabb, &mut indices);
        let proxies = self.proxies();
        indices.into_iter().map(|i| proxies[i].key).collect()
    }

    /// Enumerate each overlapping pair of indexed proxies once
    ///
    /// The first key of a pair is always the proxy registered earlier.
    fn collide(&self, callback: &mut PairCallback<'_>) {
        let proxies = self.proxies();
        let mut candidates = Vec::new();
        for (i, proxy) in proxies.iter().enumerate() {
            candidates.clear();
            self.query_indices(&proxy.aabb, &mut candidates);
            for &j in candidates.iter().filter(|&&j| j > i) {
                if callback(proxy.key, proxies[j].key) {
                    return;
                }
            }
        }
    }

    /// Enumerate overlapping pairs between this index and another
    ///
    /// The first key of a pair always comes from `self`.
    fn collide_with(&self, other: &dyn BroadPhase, callback: &mut PairCallback<'_>) {
        let theirs = other.proxies();
        let mut candidates = Vec::new();
        for proxy in self.proxies() {
            candidates.clear();
            other.query_indices(&proxy.aabb, &mut candidates);
            for &j in &candidates {
                if callback(proxy.key, theirs[j].key) {
                    return;
                }
            }
        }
    }
}

/// Exhaustive O(n²) broad phase
///
/// Useful as a reference for the octree and for tiny groups where building a
/// tree costs more than it saves.
#[derive(Debug, Clone, Default)]
pub struct BruteForceBroadPhase {
    proxies: Vec<Proxy>,
}

impl BruteForceBroadPhase {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for BruteForceBroadPhase {
    fn rebuild(&mut self, proxies: &[Proxy]) {
        self.proxies.clear();
        self.proxies.extend_from_slice(proxies);
    }

    fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    fn query_indices(&self, aabb: &Aabb, out: &mut Vec<usize>) {
        out.extend(
            self.proxies
                .iter()
                .enumerate()
                .filter(|(_, proxy)| proxy.aabb.intersects(aabb))
                .map(|(i, _)| i),
        );
    }

    fn clear(&mut self) {
        self.proxies.clear();
    }
}
