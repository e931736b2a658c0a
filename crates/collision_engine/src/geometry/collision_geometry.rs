//! Engine-native collision geometry

use super::aabb::Aabb;
use super::primitives::Triangle;
use crate::collision::error::{CollisionError, CollisionResult};
use crate::dynamics::ShapeKind;
use crate::foundation::math::{Isometry3, Vec3};

/// Indexed triangle mesh in local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh {
    vertices: Vec<Vec3>,
    indices: Vec<[u32; 3]>,
    local_aabb: Aabb,
}

impl TriMesh {
    /// Build a mesh, rejecting out-of-range indices
    pub fn new(
        vertices: Vec<Vec3>,
        indices: Vec<[u32; 3]>,
        kind: ShapeKind,
    ) -> CollisionResult<Self> {
        let vertex_count = vertices.len();
        if let Some(bad) = indices.iter().flatten().find(|&&i| i as usize >= vertex_count) {
            return Err(CollisionError::InvalidShape {
                kind,
                reason: format!("index {bad} out of range for {vertex_count} vertices"),
            });
        }
        if vertices.iter().any(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(CollisionError::InvalidShape {
                kind,
                reason: "non-finite vertex".into(),
            });
        }
        let local_aabb = Aabb::from_points(&vertices)
            .unwrap_or_else(|| Aabb::new(Vec3::zeros(), Vec3::zeros()));
        Ok(Self {
            vertices,
            indices,
            local_aabb,
        })
    }

    /// Build a mesh from a flat index list, three indices per face
    pub fn from_flat_indices(
        vertices: Vec<Vec3>,
        indices: &[u32],
        kind: ShapeKind,
    ) -> CollisionResult<Self> {
        if indices.len() % 3 != 0 {
            log::warn!(
                "{kind} has {} indices, ignoring the trailing {}",
                indices.len(),
                indices.len() % 3
            );
        }
        let faces = indices
            .chunks_exact(3)
            .map(|face| [face[0], face[1], face[2]])
            .collect();
        Self::new(vertices, faces, kind)
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle faces
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// Number of faces
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Face `index` in local coordinates
    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let [a, b, c] = *self.indices.get(index)?;
        Some(Triangle::new(
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ))
    }

    /// All faces in local coordinates, in index order
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.iter().map(|&[a, b, c]| {
            Triangle::new(
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            )
        })
    }

    /// Bounds of the vertices
    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }
}

/// Collision geometry consumed by the narrow phase
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Sphere centred on the frame origin
    Sphere {
        /// Radius
        radius: f64,
    },
    /// Box centred on the frame origin
    Cuboid {
        /// Half edge lengths
        half_extents: Vec3,
    },
    /// Solid side of the plane `normal · x = offset`
    Halfspace {
        /// Unit outward normal
        normal: Vec3,
        /// Offset along the normal
        offset: f64,
    },
    /// Triangle soup
    TriMesh(TriMesh),
}

impl Geometry {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Cuboid { .. } => "cuboid",
            Self::Halfspace { .. } => "halfspace",
            Self::TriMesh(_) => "trimesh",
        }
    }

    /// Bounds in the geometry's own frame; infinite for halfspaces
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Self::Sphere { radius } => {
                Aabb::from_center_extents(Vec3::zeros(), Vec3::repeat(*radius))
            }
            Self::Cuboid { half_extents } => {
                Aabb::from_center_extents(Vec3::zeros(), *half_extents)
            }
            Self::Halfspace { .. } => Aabb::infinite(),
            Self::TriMesh(mesh) => mesh.local_aabb(),
        }
    }

    /// World bounds under a frame transform
    pub fn world_aabb(&self, transform: &Isometry3) -> Aabb {
        match self {
            // Rotation-invariant, keep it tight
            Self::Sphere { radius } => {
                Aabb::from_center_extents(transform.translation.vector, Vec3::repeat(*radius))
            }
            Self::TriMesh(mesh) if !mesh.vertices().is_empty() => {
                let world: Vec<Vec3> = mesh
                    .vertices()
                    .iter()
                    .map(|v| transform.rotation * v + transform.translation.vector)
                    .collect();
                Aabb::from_points(&world)
                    .unwrap_or_else(|| self.local_aabb().transformed(transform))
            }
            _ => self.local_aabb().transformed(transform),
        }
    }

    /// Corner or mesh vertices in local coordinates; empty for spheres and halfspaces
    pub fn local_vertices(&self) -> Vec<Vec3> {
        match self {
            Self::Cuboid { half_extents } => cuboid_corners(half_extents).to_vec(),
            Self::TriMesh(mesh) => mesh.vertices().to_vec(),
            Self::Sphere { .. } | Self::Halfspace { .. } => Vec::new(),
        }
    }

    /// Faces in local coordinates with their primitive ids
    ///
    /// A cuboid is split into twelve triangles; their ids are not meaningful
    /// to callers and are reported as 0.
    pub fn local_triangles(&self) -> Vec<(usize, Triangle)> {
        match self {
            Self::Cuboid { half_extents } => {
                cuboid_triangles(half_extents).map(|t| (0, t)).to_vec()
            }
            Self::TriMesh(mesh) => mesh.triangles().enumerate().collect(),
            Self::Sphere { .. } | Self::Halfspace { .. } => Vec::new(),
        }
    }
}

/// The eight corners of a box, bit i of the index selecting +/- on axis i
pub fn cuboid_corners(half_extents: &Vec3) -> [Vec3; 8] {
    std::array::from_fn(|i| {
        Vec3::new(
            if i & 1 == 0 { -half_extents.x } else { half_extents.x },
            if i & 2 == 0 { -half_extents.y } else { half_extents.y },
            if i & 4 == 0 { -half_extents.z } else { half_extents.z },
        )
    })
}

/// Twelve outward-wound triangles covering a box surface
pub fn cuboid_triangles(half_extents: &Vec3) -> [Triangle; 12] {
    const FACES: [[usize; 4]; 6] = [
        [0, 2, 6, 4], // -x
        [1, 5, 7, 3], // +x
        [0, 4, 5, 1], // -y
        [2, 3, 7, 6], // +y
        [0, 1, 3, 2], // -z
        [4, 6, 7, 5], // +z
    ];
    let c = cuboid_corners(half_extents);
    std::array::from_fn(|i| {
        let [a, b, d, e] = FACES[i / 2];
        if i % 2 == 0 {
            Triangle::new(c[a], c[d], c[b])
        } else {
            Triangle::new(c[a], c[e], c[d])
        }
    })
}
