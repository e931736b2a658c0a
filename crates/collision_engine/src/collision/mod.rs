//! Collision detection
//!
//! The detection pipeline is split into two phases. A group's broad-phase
//! index reports pairs whose bounds overlap; each pair is filtered, handed to
//! the narrow phase, and its raw contacts are pruned before they reach the
//! caller's [`DetectionResult`].
//!
//! ```
//! use std::sync::Arc;
//! use collision_engine::prelude::*;
//!
//! let mut detector = CollisionDetector::default();
//! let ball = ShapeFrame::shared("ball", Arc::new(Shape::sphere(0.5)), translation(0.0, 0.0, 0.4));
//! let ground = ShapeFrame::shared("ground", Arc::new(Shape::plane(Vec3::z(), 0.0)), Isometry3::identity());
//! let group = detector.create_group_with_frames([ball, ground]);
//!
//! let mut result = DetectionResult::new();
//! assert!(detector.detect(group, &DetectionOption::default(), &mut result));
//! assert_eq!(result.len(), 1);
//! ```

pub mod contact;
pub mod detector;
pub mod error;
pub mod group;
pub mod layers;
pub mod narrow_phase;
pub mod object;
pub mod option;
pub mod pipeline;
pub mod post_process;

#[cfg(test)]
mod tests;

pub use contact::{Contact, DetectionResult};
pub use detector::{CollisionDetector, DetectorId, DetectorType, GroupHandle};
pub use error::{CollisionError, CollisionResult};
pub use group::CollisionGroup;
pub use layers::{
    CollisionAspect, CollisionLayers, CollisionProperties, CollisionState, LayerFilter,
};
pub use narrow_phase::{
    NarrowPhase, NarrowPhaseRequest, NarrowPhaseResult, PrimitiveNarrowPhase, RawContact,
};
pub use object::CollisionObject;
pub use option::{CollisionFilter, DetectionOption, ExcludedPairsFilter};
pub use pipeline::DetectionStats;
