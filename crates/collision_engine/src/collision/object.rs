//! Collision objects
//!
//! A collision object pairs a caller-owned [`ShapeFrame`] with the cached
//! geometry of its shape. Its engine data (the transform and world bounds the
//! broad and narrow phases see) is refreshed lazily, once per detection call.

use std::sync::Arc;

use super::detector::DetectorId;
use crate::dynamics::{Shape, ShapeFrame};
use crate::foundation::collections::{GeometryKey, GroupKey, ObjectKey};
use crate::foundation::math::Isometry3;
use crate::geometry::{Aabb, GeometryCache};

/// A registered shape frame together with its collision geometry
#[derive(Debug)]
pub struct CollisionObject {
    key: ObjectKey,
    detector: DetectorId,
    frame: Arc<ShapeFrame>,
    shape: Arc<Shape>,
    geometry: GeometryKey,
    has_geometry: bool,
    groups: Vec<GroupKey>,
    transform: Isometry3,
    world_aabb: Option<Aabb>,
    synced_pass: u64,
}

impl CollisionObject {
    pub(crate) fn new(
        key: ObjectKey,
        detector: DetectorId,
        frame: Arc<ShapeFrame>,
        cache: &mut GeometryCache,
    ) -> Self {
        let shape = Arc::clone(frame.shape());
        let geometry = cache.acquire(&shape);
        let has_geometry = cache.get(geometry).is_some();
        let mut object = Self {
            key,
            detector,
            frame,
            shape,
            geometry,
            has_geometry,
            groups: Vec::new(),
            transform: Isometry3::identity(),
            world_aabb: None,
            synced_pass: 0,
        };
        object.update_engine_data(cache);
        object
    }

    /// Handle of this object in its detector
    pub fn key(&self) -> ObjectKey {
        self.key
    }

    /// Detector that owns this object
    pub fn detector_id(&self) -> DetectorId {
        self.detector
    }

    /// Registered shape frame
    pub fn shape_frame(&self) -> &Arc<ShapeFrame> {
        &self.frame
    }

    /// Shape the geometry was built from
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Current world transform, read from the frame
    pub fn world_transform(&self) -> Isometry3 {
        self.frame.world_transform()
    }

    /// Cached geometry handle
    pub fn geometry_key(&self) -> GeometryKey {
        self.geometry
    }

    /// False when the shape could not be turned into geometry
    pub fn is_usable(&self) -> bool {
        self.has_geometry
    }

    /// Whether this object is a member of a group
    pub fn has_group(&self, group: GroupKey) -> bool {
        self.groups.contains(&group)
    }

    /// Groups holding this object
    pub fn groups(&self) -> &[GroupKey] {
        &self.groups
    }

    /// Transform as of the last engine-data update
    pub fn engine_transform(&self) -> &Isometry3 {
        &self.transform
    }

    /// World bounds as of the last engine-data update
    pub fn world_aabb(&self) -> Option<&Aabb> {
        self.world_aabb.as_ref()
    }

    /// Push the frame's current pose into the engine data
    pub fn update_engine_data(&mut self, cache: &GeometryCache) {
        self.transform = self.frame.world_transform();
        self.world_aabb = cache.get(self.geometry).map(|g| g.world_aabb(&self.transform));
    }

    /// Update unless already done during detection pass `pass`
    pub(crate) fn sync(&mut self, cache: &GeometryCache, pass: u64) {
        if self.synced_pass != pass {
            self.update_engine_data(cache);
            self.synced_pass = pass;
        }
    }

    pub(crate) fn attach_group(&mut self, group: GroupKey) {
        if !self.has_group(group) {
            self.groups.push(group);
        }
    }

    pub(crate) fn detach_group(&mut self, group: GroupKey) {
        self.groups.retain(|&g| g != group);
    }
}
