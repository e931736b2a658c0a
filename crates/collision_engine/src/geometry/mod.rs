//! Collision geometry
//!
//! Engine-native geometry, the builder that derives it from application
//! shapes and the reference-counted cache that shares it between objects.

pub mod aabb;
pub mod builder;
pub mod cache;
pub mod collision_geometry;
pub mod primitives;

pub use aabb::Aabb;
pub use builder::{GeometryBuilder, TessellatingBuilder};
pub use cache::GeometryCache;
pub use collision_geometry::{cuboid_corners, cuboid_triangles, Geometry, TriMesh};
pub use primitives::Triangle;
