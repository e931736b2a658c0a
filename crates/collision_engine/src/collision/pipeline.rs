//! Candidate-pair processing
//!
//! The broad phase drives [`CollisionCallbackData::on_candidate`] once per
//! overlapping pair. Each call filters the pair, runs the narrow phase,
//! prunes the raw contacts and appends the survivors to the caller's result.
//! Once the contact cap is hit the `done` flag is raised and the next call
//! stops the enumeration.

use super::contact::{Contact, DetectionResult};
use super::narrow_phase::{NarrowPhase, NarrowPhaseRequest, NarrowPhaseResult};
use super::object::CollisionObject;
use super::option::DetectionOption;
use super::post_process::mark_redundant;
use crate::foundation::collections::{HandleMap, ObjectKey};
use crate::foundation::math::Vec3;
use crate::geometry::GeometryCache;

/// Counters for one detection call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionStats {
    /// Pairs reported by the broad phase
    pub candidate_pairs: usize,
    /// Pairs rejected by the collision filter
    pub filtered_pairs: usize,
    /// Pairs handed to the narrow phase
    pub narrow_phase_tests: usize,
    /// Pairs the narrow phase found in contact
    pub colliding_pairs: usize,
    /// Contacts dropped by pruning
    pub pruned_contacts: usize,
    /// Whether the contact cap stopped detection early
    pub early_exit: bool,
}

/// State threaded through the broad-phase callback of one detection call
pub(crate) struct CollisionCallbackData<'a> {
    option: &'a DetectionOption,
    objects: &'a HandleMap<ObjectKey, CollisionObject>,
    cache: &'a GeometryCache,
    narrow_phase: &'a dyn NarrowPhase,
    result: &'a mut DetectionResult,
    request: NarrowPhaseRequest,
    raw: NarrowPhaseResult,
    points: Vec<Vec3>,
    done: bool,
    stats: DetectionStats,
}

impl<'a> CollisionCallbackData<'a> {
    pub(crate) fn new(
        option: &'a DetectionOption,
        objects: &'a HandleMap<ObjectKey, CollisionObject>,
        cache: &'a GeometryCache,
        narrow_phase: &'a dyn NarrowPhase,
        result: &'a mut DetectionResult,
    ) -> Self {
        Self {
            option,
            objects,
            cache,
            narrow_phase,
            result,
            request: NarrowPhaseRequest::new(option.max_num_contacts, option.enable_contact),
            raw: NarrowPhaseResult::new(),
            points: Vec::new(),
            done: false,
            stats: DetectionStats::default(),
        }
    }

    pub(crate) fn into_stats(self) -> DetectionStats {
        self.stats
    }

    /// Process one broad-phase candidate; returns true to stop enumeration
    pub(crate) fn on_candidate(&mut self, key1: ObjectKey, key2: ObjectKey) -> bool {
        if self.done {
            return true;
        }
        self.stats.candidate_pairs += 1;

        // A group collided against itself reports every member with itself
        if key1 == key2 {
            return false;
        }
        let (objects, cache) = (self.objects, self.cache);
        let (Some(object1), Some(object2)) = (objects.get(key1), objects.get(key2)) else {
            log::warn!("broad phase reported unknown objects {key1:?}, {key2:?}");
            return false;
        };
        let (Some(geometry1), Some(geometry2)) = (
            cache.get(object1.geometry_key()),
            cache.get(object2.geometry_key()),
        ) else {
            return false;
        };

        if let Some(filter) = &self.option.collision_filter {
            if !filter.needs_collision(object1, object2) {
                self.stats.filtered_pairs += 1;
                return self.done;
            }
        }

        self.raw.clear();
        self.stats.narrow_phase_tests += 1;
        self.narrow_phase.collide(
            geometry1,
            object1.engine_transform(),
            geometry2,
            object2.engine_transform(),
            &self.request,
            &mut self.raw,
        );

        if !self.raw.is_collision() {
            return self.done;
        }
        self.stats.colliding_pairs += 1;
        log::trace!(
            "{} and {} collide with {} raw contacts",
            object1.shape_frame().name(),
            object2.shape_frame().name(),
            self.raw.num_contacts()
        );

        if self.request.enable_contact && self.raw.num_contacts() >= self.request.max_contacts {
            self.done = true;
            self.stats.early_exit = true;
        }

        self.post_process(key1, key2);
        self.done
    }

    fn post_process(&mut self, key1: ObjectKey, key2: ObjectKey) {
        self.points.clear();
        self.points.extend(self.raw.contacts().iter().map(|c| c.point));
        let redundant = mark_redundant(&self.points);

        for (raw, redundant) in self.raw.contacts().iter().zip(redundant) {
            if redundant {
                self.stats.pruned_contacts += 1;
                continue;
            }
            self.result.add_contact(Contact {
                point: raw.point,
                normal: -raw.normal,
                penetration_depth: raw.depth,
                object1: key1,
                object2: key2,
                triangle_id1: raw.primitive1,
                triangle_id2: raw.primitive2,
            });
        }
    }
}
