//! Collision layers for filtering collision detection
//!
//! Frames opt into layer filtering by carrying a [`CollisionAspect`]. An
//! object collides with another only if each one's layer is in the other's
//! mask and both are marked collidable. Frames without the aspect use the
//! defaults: layer [`CollisionLayers::DEFAULT`], mask [`CollisionLayers::ALL`].

use bitflags::bitflags;

use super::object::CollisionObject;
use super::option::CollisionFilter;
use crate::dynamics::{Aspect, ShapeFrame};

bitflags! {
    /// Collision layer bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// Layer of frames that never set one
        const DEFAULT = 1 << 0;
        /// Fixed environment geometry
        const ENVIRONMENT = 1 << 1;
        /// Links of articulated bodies
        const ROBOT = 1 << 2;
        /// Free-moving rigid bodies
        const DYNAMIC = 1 << 3;
        /// Deformable bodies
        const SOFT_BODY = 1 << 4;
        /// Volumes that report overlap only
        const SENSOR = 1 << 5;
        /// Tools and grasped objects
        const TOOL = 1 << 6;
        /// Debris and small loose parts
        const DEBRIS = 1 << 7;
        /// Every layer, including user-defined bits 8-31
        const ALL = u32::MAX;
    }
}

impl CollisionLayers {
    /// True when A's layer is in B's mask AND B's layer is in A's mask
    pub fn should_collide(layer_a: Self, mask_a: Self, layer_b: Self, mask_b: Self) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }

    /// User-defined layer `bit` (8-31)
    pub fn custom(bit: u32) -> Option<Self> {
        (8..32).contains(&bit).then(|| Self::from_bits_retain(1 << bit))
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Layer membership of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionProperties {
    /// Layers this frame belongs to
    pub layer: CollisionLayers,
    /// Layers this frame collides with
    pub mask: CollisionLayers,
}

impl Default for CollisionProperties {
    fn default() -> Self {
        Self {
            layer: CollisionLayers::DEFAULT,
            mask: CollisionLayers::ALL,
        }
    }
}

/// Runtime collision switch of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionState {
    /// Whether the frame takes part in collision at all
    pub collidable: bool,
}

impl Default for CollisionState {
    fn default() -> Self {
        Self { collidable: true }
    }
}

/// Aspect carrying a frame's collision layer data
pub struct CollisionAspect;

impl Aspect for CollisionAspect {
    type State = CollisionState;
    type Properties = CollisionProperties;
    const TAG: &'static str = "collision";
}

impl CollisionAspect {
    /// Set a frame's layer and mask, attaching the aspect if needed
    pub fn set_layers(frame: &ShapeFrame, layer: CollisionLayers, mask: CollisionLayers) {
        frame.aspects_mut().ensure::<Self>().properties = CollisionProperties { layer, mask };
    }

    /// Switch collision on or off for a frame, attaching the aspect if needed
    pub fn set_collidable(frame: &ShapeFrame, collidable: bool) {
        frame.aspects_mut().ensure::<Self>().state.collidable = collidable;
    }

    /// Effective properties and state of a frame
    pub fn resolve(frame: &ShapeFrame) -> (CollisionProperties, CollisionState) {
        frame
            .aspects()
            .get::<Self>()
            .map(|aspect| (aspect.properties, aspect.state))
            .unwrap_or_default()
    }
}

/// Filter applying [`CollisionAspect`] layers and collidable flags
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerFilter;

impl CollisionFilter for LayerFilter {
    fn needs_collision(&self, object1: &CollisionObject, object2: &CollisionObject) -> bool {
        let (props1, state1) = CollisionAspect::resolve(object1.shape_frame());
        let (props2, state2) = CollisionAspect::resolve(object2.shape_frame());
        state1.collidable
            && state2.collidable
            && CollisionLayers::should_collide(props1.layer, props1.mask, props2.layer, props2.mask)
    }
}
