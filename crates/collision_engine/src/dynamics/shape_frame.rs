//! Posed shapes owned by the kinematic model

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::aspect::AspectTable;
use super::shape::Shape;
use crate::foundation::math::Isometry3;

/// A shape positioned in world space
///
/// The kinematic model owns frames and moves them between detection calls;
/// the collision engine only reads the transform, always fresh.
#[derive(Debug)]
pub struct ShapeFrame {
    name: String,
    shape: Arc<Shape>,
    world_transform: RwLock<Isometry3>,
    aspects: RwLock<AspectTable>,
}

impl ShapeFrame {
    /// Create a frame at the identity pose
    pub fn new(name: impl Into<String>, shape: Arc<Shape>) -> Self {
        Self::with_transform(name, shape, Isometry3::identity())
    }

    /// Create a frame at a given pose
    pub fn with_transform(
        name: impl Into<String>,
        shape: Arc<Shape>,
        transform: Isometry3,
    ) -> Self {
        Self {
            name: name.into(),
            shape,
            world_transform: RwLock::new(transform),
            aspects: RwLock::new(AspectTable::new()),
        }
    }

    /// Convenience constructor returning a shareable frame
    pub fn shared(name: impl Into<String>, shape: Arc<Shape>, transform: Isometry3) -> Arc<Self> {
        Arc::new(Self::with_transform(name, shape, transform))
    }

    /// Frame name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attached shape
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Current world transform
    pub fn world_transform(&self) -> Isometry3 {
        *self.world_transform.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the frame
    pub fn set_world_transform(&self, transform: Isometry3) {
        *self.world_transform.write().unwrap_or_else(PoisonError::into_inner) = transform;
    }

    /// Read access to the attached aspects
    pub fn aspects(&self) -> RwLockReadGuard<'_, AspectTable> {
        self.aspects.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the attached aspects
    pub fn aspects_mut(&self) -> RwLockWriteGuard<'_, AspectTable> {
        self.aspects.write().unwrap_or_else(PoisonError::into_inner)
    }
}
