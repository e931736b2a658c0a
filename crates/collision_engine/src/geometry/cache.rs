//! Reference-counted geometry cache
//!
//! Shapes are often shared by several collision objects, and building their
//! geometry can be expensive (tessellation). The cache builds each shape's
//! geometry once and hands out a [`GeometryKey`] to every object that
//! acquires it. An entry lives exactly as long as its reference count is
//! non-zero.

use std::collections::HashMap;
use std::fmt;

use super::builder::{GeometryBuilder, TessellatingBuilder};
use super::collision_geometry::Geometry;
use crate::dynamics::{Shape, ShapeId};
use crate::foundation::collections::{GeometryKey, HandleMap};

struct CacheEntry {
    shape_id: ShapeId,
    geometry: Option<Geometry>,
    ref_count: usize,
}

/// Shape-identity keyed arena of collision geometry
pub struct GeometryCache {
    entries: HandleMap<GeometryKey, CacheEntry>,
    by_shape: HashMap<ShapeId, GeometryKey>,
    builder: Box<dyn GeometryBuilder>,
}

impl GeometryCache {
    /// Create an empty cache using the given builder
    pub fn new(builder: Box<dyn GeometryBuilder>) -> Self {
        Self {
            entries: HandleMap::with_key(),
            by_shape: HashMap::new(),
            builder,
        }
    }

    /// Take a reference to the shape's geometry, building it on first use
    ///
    /// A shape the builder rejects still gets an entry (with no geometry) so
    /// that acquire and release stay symmetric.
    pub fn acquire(&mut self, shape: &Shape) -> GeometryKey {
        if let Some(&key) = self.by_shape.get(&shape.id()) {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.ref_count += 1;
                log::trace!(
                    "geometry for shape {:?} now has {} users",
                    shape.id(),
                    entry.ref_count
                );
                return key;
            }
        }

        let geometry = match self.builder.build(shape) {
            Ok(geometry) => {
                log::debug!(
                    "built {} geometry for {} {:?}",
                    geometry.name(),
                    shape.kind(),
                    shape.id()
                );
                Some(geometry)
            }
            Err(err) => {
                log::error!("{err}; objects using shape {:?} will not collide", shape.id());
                None
            }
        };

        let key = self.entries.insert(CacheEntry {
            shape_id: shape.id(),
            geometry,
            ref_count: 1,
        });
        self.by_shape.insert(shape.id(), key);
        key
    }

    /// Drop one reference; the entry and its geometry go away with the last one
    pub fn release(&mut self, shape_id: ShapeId) {
        let Some(&key) = self.by_shape.get(&shape_id) else {
            debug_assert!(false, "released geometry for uncached shape {shape_id:?}");
            log::error!("released geometry for uncached shape {shape_id:?}; ignoring");
            return;
        };
        let Some(entry) = self.entries.get_mut(key) else {
            debug_assert!(false, "geometry index refers to a dead entry for {shape_id:?}");
            log::error!("geometry index refers to a dead entry for {shape_id:?}; dropping it");
            self.by_shape.remove(&shape_id);
            return;
        };

        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            self.entries.remove(key);
            self.by_shape.remove(&shape_id);
            log::trace!("geometry for shape {shape_id:?} released");
        }
    }

    /// Geometry behind a key; `None` if the key is stale or the build failed
    pub fn get(&self, key: GeometryKey) -> Option<&Geometry> {
        self.entries.get(key)?.geometry.as_ref()
    }

    /// Key of a shape's cached entry
    pub fn key_of(&self, shape_id: ShapeId) -> Option<GeometryKey> {
        self.by_shape.get(&shape_id).copied()
    }

    /// Current reference count of a shape; 0 when uncached
    pub fn ref_count(&self, shape_id: ShapeId) -> usize {
        self.key_of(shape_id)
            .and_then(|key| self.entries.get(key))
            .map_or(0, |entry| entry.ref_count)
    }

    /// Shape owning an entry
    pub fn shape_of(&self, key: GeometryKey) -> Option<ShapeId> {
        self.entries.get(key).map(|entry| entry.shape_id)
    }

    /// Number of cached shapes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new(Box::new(TessellatingBuilder::default()))
    }
}

impl fmt::Debug for GeometryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryCache")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
