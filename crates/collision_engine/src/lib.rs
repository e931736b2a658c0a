//! # Collision Engine
//!
//! Collision detection for physics and robotics simulation: given a set of
//! posed shapes, report which pairs intersect and produce a compact,
//! deduplicated set of contact points per colliding pair.
//!
//! ## Features
//!
//! - **Shared geometry**: collision geometry is built once per shape and
//!   reference counted across every object that uses it
//! - **Two-phase detection**: octree or brute-force broad phase, primitive
//!   narrow phase for spheres, boxes, halfspaces and triangle meshes
//! - **Filtering**: closures, excluded pairs, or layer masks carried on frames
//! - **Contact pruning**: near-duplicate and colinear contacts are removed
//!   before results reach the solver
//! - **Configuration**: TOML or RON detector configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use collision_engine::prelude::*;
//!
//! let mut detector = CollisionDetector::default();
//!
//! let shape = Arc::new(Shape::sphere(0.5));
//! let a = ShapeFrame::shared("a", Arc::clone(&shape), translation(0.0, 0.0, 0.0));
//! let b = ShapeFrame::shared("b", shape, translation(0.8, 0.0, 0.0));
//! let group = detector.create_group_with_frames([a, b]);
//!
//! let option = detector.default_option();
//! let mut result = DetectionResult::new();
//! if detector.detect(group, &option, &mut result) {
//!     for contact in &result {
//!         println!("{:?} depth {}", contact.point, contact.penetration_depth);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod collision;
pub mod config;
pub mod dynamics;
pub mod foundation;
pub mod geometry;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        collision::{
            CollisionAspect, CollisionDetector, CollisionFilter, CollisionLayers, CollisionObject,
            Contact, DetectionOption, DetectionResult, DetectorType, ExcludedPairsFilter,
            GroupHandle, LayerFilter,
        },
        config::{Config, DetectorConfig},
        dynamics::{MeshData, Shape, ShapeFrame},
        foundation::{
            collections::ObjectKey,
            math::{pose, translation, Isometry3, Quat, Vec3},
        },
        geometry::{Aabb, Geometry},
    };
}
