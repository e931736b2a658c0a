//! Application-level shape descriptions
//!
//! Shapes are immutable parameter sets. Each instance receives a unique
//! [`ShapeId`] on construction, and it is that identity (not the parameters)
//! the geometry cache keys on: two boxes of the same size built separately are
//! two cache entries.

use std::fmt;
use std::sync::Arc;

use crate::foundation::collections::IdGenerator;
use crate::foundation::math::Vec3;

static SHAPE_IDS: IdGenerator = IdGenerator::new();

/// Process-unique identity of a [`Shape`] instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(u64);

impl ShapeId {
    /// Raw id value
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Discriminant of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Axis-aligned box in the frame
    Box,
    /// Ellipsoid (sphere when all diameters match)
    Ellipsoid,
    /// Z-aligned cylinder centred on the frame origin
    Cylinder,
    /// Infinite plane, solid below
    Plane,
    /// Triangle mesh with a per-axis scale
    Mesh,
    /// Deformable triangle mesh in its current configuration
    SoftMesh,
    /// Polyline; used for visualization only
    LineSegment,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Box => "BoxShape",
            Self::Ellipsoid => "EllipsoidShape",
            Self::Cylinder => "CylinderShape",
            Self::Plane => "PlaneShape",
            Self::Mesh => "MeshShape",
            Self::SoftMesh => "SoftMeshShape",
            Self::LineSegment => "LineSegmentShape",
        };
        f.write_str(name)
    }
}

/// Indexed triangle soup in model space
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Triangle indices, three per face
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data from vertices and flat triangle indices
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of complete triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Kind-specific shape parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeData {
    /// Box with full edge lengths
    Box {
        /// Edge lengths along x, y, z
        size: Vec3,
    },
    /// Ellipsoid with full diameters
    Ellipsoid {
        /// Diameters along x, y, z
        size: Vec3,
    },
    /// Cylinder along the local z axis
    Cylinder {
        /// Radius
        radius: f64,
        /// Full height
        height: f64,
    },
    /// Plane `normal · x = offset`; the solid side is `normal · x <= offset`
    Plane {
        /// Plane normal (normalized on construction)
        normal: Vec3,
        /// Signed offset along the normal
        offset: f64,
    },
    /// Shared mesh with a scale
    Mesh {
        /// Mesh data, possibly shared by several shapes
        mesh: Arc<MeshData>,
        /// Per-axis scale applied to the vertices
        scale: Vec3,
    },
    /// Soft body surface
    SoftMesh {
        /// Current surface configuration
        mesh: MeshData,
    },
    /// Polyline
    LineSegment {
        /// Polyline vertices
        vertices: Vec<Vec3>,
        /// Rendering thickness
        thickness: f64,
    },
}

/// Immutable geometric description of a collidable (or visual) shape
#[derive(Debug)]
pub struct Shape {
    id: ShapeId,
    data: ShapeData,
}

impl Shape {
    /// Wrap shape data, allocating a fresh identity
    pub fn new(data: ShapeData) -> Self {
        Self {
            id: ShapeId(SHAPE_IDS.next_id()),
            data,
        }
    }

    /// Box with full edge lengths
    pub fn cuboid(size: Vec3) -> Self {
        Self::new(ShapeData::Box { size })
    }

    /// Ellipsoid with full diameters
    pub fn ellipsoid(size: Vec3) -> Self {
        Self::new(ShapeData::Ellipsoid { size })
    }

    /// Sphere of the given radius (an ellipsoid with equal diameters)
    pub fn sphere(radius: f64) -> Self {
        Self::ellipsoid(Vec3::repeat(radius * 2.0))
    }

    /// Cylinder along local z
    pub fn cylinder(radius: f64, height: f64) -> Self {
        Self::new(ShapeData::Cylinder { radius, height })
    }

    /// Plane through `offset * normal`
    pub fn plane(normal: Vec3, offset: f64) -> Self {
        let normal = normal.try_normalize(f64::EPSILON).unwrap_or_else(Vec3::z);
        Self::new(ShapeData::Plane { normal, offset })
    }

    /// Scaled triangle mesh
    pub fn mesh(mesh: Arc<MeshData>, scale: Vec3) -> Self {
        Self::new(ShapeData::Mesh { mesh, scale })
    }

    /// Soft mesh in its current configuration
    pub fn soft_mesh(mesh: MeshData) -> Self {
        Self::new(ShapeData::SoftMesh { mesh })
    }

    /// Polyline
    pub fn line_segment(vertices: Vec<Vec3>, thickness: f64) -> Self {
        Self::new(ShapeData::LineSegment { vertices, thickness })
    }

    /// Identity of this instance
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Kind-specific parameters
    pub fn data(&self) -> &ShapeData {
        &self.data
    }

    /// Discriminant
    pub fn kind(&self) -> ShapeKind {
        match &self.data {
            ShapeData::Box { .. } => ShapeKind::Box,
            ShapeData::Ellipsoid { .. } => ShapeKind::Ellipsoid,
            ShapeData::Cylinder { .. } => ShapeKind::Cylinder,
            ShapeData::Plane { .. } => ShapeKind::Plane,
            ShapeData::Mesh { .. } => ShapeKind::Mesh,
            ShapeData::SoftMesh { .. } => ShapeKind::SoftMesh,
            ShapeData::LineSegment { .. } => ShapeKind::LineSegment,
        }
    }

    /// True for an ellipsoid whose three diameters match
    pub fn is_sphere(&self) -> bool {
        match &self.data {
            ShapeData::Ellipsoid { size } => {
                approx::relative_eq!(size.x, size.y) && approx::relative_eq!(size.y, size.z)
            }
            _ => false,
        }
    }
}
