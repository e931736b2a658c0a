//! Kinematic-model side of the collision boundary
//!
//! Shapes, the frames that pose them in the world, and the aspect table those
//! frames carry. The collision engine consumes these; it never mutates a
//! shape and only reads frame transforms.

pub mod aspect;
pub mod shape;
pub mod shape_frame;

pub use aspect::{Aspect, AspectTable, EmbeddedAspect};
pub use shape::{MeshData, Shape, ShapeData, ShapeId, ShapeKind};
pub use shape_frame::ShapeFrame;
