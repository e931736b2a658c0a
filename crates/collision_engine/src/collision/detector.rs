//! The collision detector
//!
//! Owns every collision object and group it creates, the geometry cache they
//! share, and the narrow phase. Objects and groups are addressed by arena
//! handles; group handles additionally carry the detector's identity and
//! backend tag so a group can never be used with a detector that did not
//! build it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::contact::DetectionResult;
use super::group::CollisionGroup;
use super::narrow_phase::{NarrowPhase, PrimitiveNarrowPhase};
use super::object::CollisionObject;
use super::option::DetectionOption;
use super::pipeline::{CollisionCallbackData, DetectionStats};
use crate::config::{Config, ConfigError, DetectorConfig};
use crate::dynamics::ShapeFrame;
use crate::foundation::collections::{GroupKey, HandleMap, IdGenerator, ObjectKey};
use crate::geometry::{GeometryBuilder, GeometryCache, TessellatingBuilder};
use crate::spatial::{BroadPhase, BruteForceBroadPhase, OctreeBroadPhase};

static DETECTOR_IDS: IdGenerator = IdGenerator::new();

/// Broad-phase backend of a detector, doubling as its type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorType {
    /// Octree over the configured world bounds
    #[default]
    Octree,
    /// Exhaustive pair enumeration
    BruteForce,
}

impl DetectorType {
    /// Stable type name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Octree => "octree",
            Self::BruteForce => "brute_force",
        }
    }
}

impl fmt::Display for DetectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-unique identity of a detector instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetectorId(u64);

/// Handle to a collision group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle {
    key: GroupKey,
    detector: DetectorId,
    detector_type: DetectorType,
}

impl GroupHandle {
    /// Arena key inside the owning detector
    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Detector that created the group
    pub fn detector_id(&self) -> DetectorId {
        self.detector
    }

    /// Backend tag of the creating detector
    pub fn detector_type(&self) -> DetectorType {
        self.detector_type
    }
}

/// Broad/narrow-phase collision detector
pub struct CollisionDetector {
    id: DetectorId,
    config: DetectorConfig,
    cache: GeometryCache,
    narrow_phase: Box<dyn NarrowPhase>,
    objects: HandleMap<ObjectKey, CollisionObject>,
    groups: HandleMap<GroupKey, CollisionGroup>,
    stats: DetectionStats,
    pass: u64,
}

impl CollisionDetector {
    /// Create a detector from a validated configuration
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let builder = TessellatingBuilder::new(config.tessellation.clone());
        Ok(Self::with_components(config, Box::new(builder), Box::new(PrimitiveNarrowPhase)))
    }

    /// Load a configuration file and create a detector from it
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::new(DetectorConfig::load_from_file(path)?)
    }

    /// Default configuration with the given backend
    pub fn with_type(detector_type: DetectorType) -> Self {
        let config = DetectorConfig {
            detector_type,
            ..DetectorConfig::default()
        };
        Self::with_components(
            config,
            Box::new(TessellatingBuilder::default()),
            Box::new(PrimitiveNarrowPhase),
        )
    }

    /// Create a detector with custom geometry construction and narrow phase
    ///
    /// The configuration is used as given; call [`DetectorConfig::validate`]
    /// first if it comes from outside.
    pub fn with_components(
        config: DetectorConfig,
        builder: Box<dyn GeometryBuilder>,
        narrow_phase: Box<dyn NarrowPhase>,
    ) -> Self {
        let id = DetectorId(DETECTOR_IDS.next_id());
        log::debug!("collision detector {id:?} created with '{}' backend", config.detector_type);
        Self {
            id,
            config,
            cache: GeometryCache::new(builder),
            narrow_phase,
            objects: HandleMap::with_key(),
            groups: HandleMap::with_key(),
            stats: DetectionStats::default(),
            pass: 0,
        }
    }

    /// Identity of this detector
    pub fn id(&self) -> DetectorId {
        self.id
    }

    /// Backend tag
    pub fn detector_type(&self) -> DetectorType {
        self.config.detector_type
    }

    /// Backend type name
    pub fn type_name(&self) -> &'static str {
        self.config.detector_type.as_str()
    }

    /// Configuration in use
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Shared geometry cache
    pub fn geometry_cache(&self) -> &GeometryCache {
        &self.cache
    }

    /// Option populated from the configured detection defaults
    pub fn default_option(&self) -> DetectionOption {
        DetectionOption::new(
            self.config.detection.enable_contact,
            self.config.detection.max_num_contacts,
        )
    }

    /// Counters from the previous detection call
    pub fn last_stats(&self) -> &DetectionStats {
        &self.stats
    }

    // ---------------------------------------------------------------------
    // Objects

    /// Register a shape frame, acquiring geometry for its shape
    pub fn create_object(&mut self, frame: Arc<ShapeFrame>) -> ObjectKey {
        let id = self.id;
        let cache = &mut self.cache;
        let key = self
            .objects
            .insert_with_key(|key| CollisionObject::new(key, id, frame, cache));
        log::trace!("created collision object {key:?}");
        key
    }

    /// Destroy an object, removing it from every group and releasing its geometry
    pub fn destroy_object(&mut self, key: ObjectKey) -> bool {
        let Some(object) = self.objects.remove(key) else {
            log::warn!("destroy_object: unknown object {key:?}");
            return false;
        };
        for &group in object.groups() {
            if let Some(group) = self.groups.get_mut(group) {
                group.remove_member(key);
            }
        }
        self.cache.release(object.shape().id());
        log::trace!("destroyed collision object {key:?} ('{}')", object.shape_frame().name());
        true
    }

    /// Look up an object
    pub fn object(&self, key: ObjectKey) -> Option<&CollisionObject> {
        self.objects.get(key)
    }

    /// All live objects
    pub fn objects(&self) -> impl Iterator<Item = (ObjectKey, &CollisionObject)> {
        self.objects.iter()
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    // ---------------------------------------------------------------------
    // Groups

    fn make_broad_phase(&self) -> Box<dyn BroadPhase> {
        match self.config.detector_type {
            DetectorType::Octree => Box::new(OctreeBroadPhase::new(self.config.octree.clone())),
            DetectorType::BruteForce => Box::new(BruteForceBroadPhase::new()),
        }
    }

    /// Create an empty group
    pub fn create_group(&mut self) -> GroupHandle {
        let broad_phase = self.make_broad_phase();
        let (detector, detector_type) = (self.id, self.config.detector_type);
        let key = self.groups.insert_with_key(|key| {
            CollisionGroup::new(
                GroupHandle {
                    key,
                    detector,
                    detector_type,
                },
                broad_phase,
            )
        });
        GroupHandle {
            key,
            detector,
            detector_type,
        }
    }

    /// Create a group with one new object per frame
    ///
    /// The group owns these objects: they are destroyed when removed from it
    /// or when the group is destroyed.
    pub fn create_group_with_frames<I>(&mut self, frames: I) -> GroupHandle
    where
        I: IntoIterator<Item = Arc<ShapeFrame>>,
    {
        let handle = self.create_group();
        for frame in frames {
            let object = self.create_object(frame);
            if let Some(group) = self.groups.get_mut(handle.key) {
                group.insert_owned(object);
            }
            if let Some(object) = self.objects.get_mut(object) {
                object.attach_group(handle.key);
            }
        }
        handle
    }

    /// Destroy a group and the objects it owns
    pub fn destroy_group(&mut self, handle: GroupHandle) -> bool {
        let Some(key) = self.resolve_group(handle) else {
            return false;
        };
        let Some(mut group) = self.groups.remove(key) else {
            return false;
        };
        let owned = group.take_owned();
        for member in group.take_members() {
            if let Some(object) = self.objects.get_mut(member) {
                object.detach_group(key);
            }
        }
        for object in owned {
            self.destroy_object(object);
        }
        true
    }

    /// Look up a group
    pub fn group(&self, handle: GroupHandle) -> Option<&CollisionGroup> {
        self.resolve_group(handle).and_then(|key| self.groups.get(key))
    }

    /// Number of live groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Add an object to a group; false if it was already a member or either handle is invalid
    pub fn add_object(&mut self, handle: GroupHandle, object: ObjectKey) -> bool {
        let Some(key) = self.resolve_group(handle) else {
            return false;
        };
        let Some(collision_object) = self.objects.get_mut(object) else {
            log::warn!("add_object: unknown object {object:?}");
            return false;
        };
        let inserted = self.groups.get_mut(key).is_some_and(|group| group.insert_member(object));
        if inserted {
            collision_object.attach_group(key);
        }
        inserted
    }

    /// Remove an object from a group; objects the group owns are destroyed
    pub fn remove_object(&mut self, handle: GroupHandle, object: ObjectKey) -> bool {
        let Some(key) = self.resolve_group(handle) else {
            return false;
        };
        let Some(group) = self.groups.get_mut(key) else {
            return false;
        };
        let owned = group.owned_objects().contains(&object);
        if !group.remove_member(object) {
            return false;
        }
        if owned {
            self.destroy_object(object);
        } else if let Some(object) = self.objects.get_mut(object) {
            object.detach_group(key);
        }
        true
    }

    /// Empty a group, returning how many members it had
    pub fn remove_all_objects(&mut self, handle: GroupHandle) -> usize {
        let Some(key) = self.resolve_group(handle) else {
            return 0;
        };
        let Some(group) = self.groups.get_mut(key) else {
            return 0;
        };
        let owned = group.take_owned();
        let members = group.take_members();
        for &member in &members {
            if let Some(object) = self.objects.get_mut(member) {
                object.detach_group(key);
            }
        }
        for object in owned {
            self.destroy_object(object);
        }
        members.len()
    }

    /// Whether an object is a member of a group
    pub fn has_object(&self, handle: GroupHandle, object: ObjectKey) -> bool {
        self.group(handle).is_some_and(|group| group.contains(object))
    }

    fn resolve_group(&self, handle: GroupHandle) -> Option<GroupKey> {
        if handle.detector_type != self.config.detector_type {
            log::debug!(
                "group built by a '{}' detector passed to a '{}' detector",
                handle.detector_type,
                self.config.detector_type
            );
            return None;
        }
        if handle.detector != self.id {
            log::debug!(
                "group {:?} belongs to detector {:?}, not {:?}",
                handle.key,
                handle.detector,
                self.id
            );
            return None;
        }
        if !self.groups.contains_key(handle.key) {
            log::debug!("group {:?} no longer exists", handle.key);
            return None;
        }
        Some(handle.key)
    }

    // ---------------------------------------------------------------------
    // Detection

    fn begin_pass(&mut self, result: &mut DetectionResult) -> u64 {
        result.clear();
        self.stats = DetectionStats::default();
        self.pass += 1;
        self.pass
    }

    /// Self-collision check of one group
    ///
    /// Returns true when any contact was found. False also covers an invalid
    /// group handle; the result is empty in both cases.
    pub fn detect(
        &mut self,
        group: GroupHandle,
        option: &DetectionOption,
        result: &mut DetectionResult,
    ) -> bool {
        let pass = self.begin_pass(result);
        let Some(key) = self.resolve_group(group) else {
            return false;
        };

        if let Some(group) = self.groups.get_mut(key) {
            group.update(&mut self.objects, &self.cache, pass);
        }
        let Some(group) = self.groups.get(key) else {
            return false;
        };

        let narrow_phase = self.narrow_phase.as_ref();
        let mut data =
            CollisionCallbackData::new(option, &self.objects, &self.cache, narrow_phase, result);
        group.broad_phase().collide(&mut |a, b| data.on_candidate(a, b));
        self.stats = data.into_stats();

        log::debug!(
            "detect: {} contacts from {} candidate pairs{}",
            result.len(),
            self.stats.candidate_pairs,
            if self.stats.early_exit { " (stopped at contact cap)" } else { "" }
        );
        !result.is_empty()
    }

    /// Check every object of `group1` against every object of `group2`
    ///
    /// Returns true when any contact was found. False also covers invalid
    /// group handles; the result is empty in both cases.
    pub fn detect_between(
        &mut self,
        group1: GroupHandle,
        group2: GroupHandle,
        option: &DetectionOption,
        result: &mut DetectionResult,
    ) -> bool {
        let pass = self.begin_pass(result);
        let Some(key1) = self.resolve_group(group1) else {
            return false;
        };
        let Some(key2) = self.resolve_group(group2) else {
            return false;
        };

        for key in std::iter::once(key1).chain((key2 != key1).then_some(key2)) {
            if let Some(group) = self.groups.get_mut(key) {
                group.update(&mut self.objects, &self.cache, pass);
            }
        }
        let (Some(first), Some(second)) = (self.groups.get(key1), self.groups.get(key2)) else {
            return false;
        };

        let narrow_phase = self.narrow_phase.as_ref();
        let mut data =
            CollisionCallbackData::new(option, &self.objects, &self.cache, narrow_phase, result);
        let mut on_candidate = |a: ObjectKey, b: ObjectKey| data.on_candidate(a, b);
        // A group against itself is its self-collision; each pair once
        if key1 == key2 {
            first.broad_phase().collide(&mut on_candidate);
        } else {
            first.broad_phase().collide_with(second.broad_phase(), &mut on_candidate);
        }
        self.stats = data.into_stats();

        log::debug!(
            "detect_between: {} contacts from {} candidate pairs{}",
            result.len(),
            self.stats.candidate_pairs,
            if self.stats.early_exit { " (stopped at contact cap)" } else { "" }
        );
        !result.is_empty()
    }
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::with_type(DetectorType::default())
    }
}

impl fmt::Debug for CollisionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionDetector")
            .field("id", &self.id)
            .field("detector_type", &self.config.detector_type)
            .field("objects", &self.objects.len())
            .field("groups", &self.groups.len())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
