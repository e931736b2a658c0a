//! Collision engine errors

use crate::dynamics::ShapeKind;

/// Errors raised while turning shapes into collision geometry
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// The builder has no geometry for this kind of shape
    #[error("Attempting to create an unsupported shape type [{0}]")]
    UnsupportedShape(ShapeKind),

    /// Shape parameters cannot produce valid geometry
    #[error("Invalid {kind}: {reason}")]
    InvalidShape {
        /// Kind of the offending shape
        kind: ShapeKind,
        /// What is wrong with it
        reason: String,
    },
}

/// Result alias for geometry construction
pub type CollisionResult<T> = Result<T, CollisionError>;
