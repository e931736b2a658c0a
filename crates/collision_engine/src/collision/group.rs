//! Collision groups
//!
//! A group is an ordered, duplicate-free set of collision objects plus the
//! broad-phase index built over them. Groups do not own their members (an
//! object may belong to several groups) apart from the objects a group was
//! created with, which are destroyed along with it.

use std::fmt;

use super::detector::{DetectorId, DetectorType, GroupHandle};
use super::object::CollisionObject;
use crate::foundation::collections::{GroupKey, HandleMap, ObjectKey};
use crate::geometry::GeometryCache;
use crate::spatial::{BroadPhase, Proxy};

/// A set of collision objects with its own broad-phase index
pub struct CollisionGroup {
    handle: GroupHandle,
    members: Vec<ObjectKey>,
    owned: Vec<ObjectKey>,
    broad_phase: Box<dyn BroadPhase>,
    proxies: Vec<Proxy>,
}

impl CollisionGroup {
    pub(crate) fn new(handle: GroupHandle, broad_phase: Box<dyn BroadPhase>) -> Self {
        Self {
            handle,
            members: Vec::new(),
            owned: Vec::new(),
            broad_phase,
            proxies: Vec::new(),
        }
    }

    /// Handle addressing this group
    pub fn handle(&self) -> GroupHandle {
        self.handle
    }

    /// Arena key of this group
    pub fn key(&self) -> GroupKey {
        self.handle.key()
    }

    /// Detector that created this group
    pub fn detector_id(&self) -> DetectorId {
        self.handle.detector_id()
    }

    /// Type tag of the backend that built this group
    pub fn detector_type(&self) -> DetectorType {
        self.handle.detector_type()
    }

    /// Members in insertion order
    pub fn members(&self) -> &[ObjectKey] {
        &self.members
    }

    /// Objects created together with this group
    pub fn owned_objects(&self) -> &[ObjectKey] {
        &self.owned
    }

    /// Whether `object` is a member
    pub fn contains(&self, object: ObjectKey) -> bool {
        self.members.contains(&object)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True without members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Broad-phase index as of the last update
    pub fn broad_phase(&self) -> &dyn BroadPhase {
        self.broad_phase.as_ref()
    }

    pub(crate) fn insert_member(&mut self, object: ObjectKey) -> bool {
        if self.contains(object) {
            return false;
        }
        self.members.push(object);
        true
    }

    pub(crate) fn insert_owned(&mut self, object: ObjectKey) {
        self.insert_member(object);
        self.owned.push(object);
    }

    pub(crate) fn remove_member(&mut self, object: ObjectKey) -> bool {
        let Some(index) = self.members.iter().position(|&m| m == object) else {
            return false;
        };
        self.members.remove(index);
        self.owned.retain(|&o| o != object);
        true
    }

    pub(crate) fn take_members(&mut self) -> Vec<ObjectKey> {
        self.owned.clear();
        std::mem::take(&mut self.members)
    }

    pub(crate) fn take_owned(&mut self) -> Vec<ObjectKey> {
        std::mem::take(&mut self.owned)
    }

    /// Sync every member's engine data and rebuild the broad-phase index
    ///
    /// Members without geometry get no proxy. `pass` identifies the current
    /// detection call so an object shared by two groups updates once.
    pub(crate) fn update(
        &mut self,
        objects: &mut HandleMap<ObjectKey, CollisionObject>,
        cache: &GeometryCache,
        pass: u64,
    ) {
        self.proxies.clear();
        for &key in &self.members {
            let Some(object) = objects.get_mut(key) else {
                log::warn!("group {:?} holds stale object {key:?}", self.handle.key());
                continue;
            };
            object.sync(cache, pass);
            if let Some(aabb) = object.world_aabb() {
                self.proxies.push(Proxy::new(key, *aabb));
            }
        }
        self.broad_phase.rebuild(&self.proxies);
        log::trace!(
            "group {:?} updated: {} members, {} proxies",
            self.handle.key(),
            self.members.len(),
            self.proxies.len()
        );
    }
}

impl fmt::Debug for CollisionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionGroup")
            .field("handle", &self.handle)
            .field("members", &self.members)
            .field("owned", &self.owned)
            .finish_non_exhaustive()
    }
}
