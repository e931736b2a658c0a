//! Shape-to-geometry construction
//!
//! Boxes, spheres and planes map onto native primitives. Cylinders and
//! non-spherical ellipsoids have no primitive here and are tessellated at the
//! resolution given by [`TessellationSettings`].

use super::collision_geometry::{Geometry, TriMesh};
use crate::collision::error::{CollisionError, CollisionResult};
use crate::config::TessellationSettings;
use crate::dynamics::{Shape, ShapeData, ShapeKind};
use crate::foundation::math::{constants::{PI, TAU}, Vec3};

/// Builds engine-native geometry for a shape
///
/// Must be deterministic: the cache builds once per shape instance and
/// shares the result.
pub trait GeometryBuilder: Send + Sync {
    /// Build geometry for `shape`
    fn build(&self, shape: &Shape) -> CollisionResult<Geometry>;
}

/// Default builder: native primitives where possible, triangle meshes otherwise
#[derive(Debug, Clone, Default)]
pub struct TessellatingBuilder {
    settings: TessellationSettings,
}

impl TessellatingBuilder {
    /// Create a builder with the given tessellation resolution
    pub fn new(settings: TessellationSettings) -> Self {
        Self { settings }
    }

    /// Tessellation resolution in use
    pub fn settings(&self) -> &TessellationSettings {
        &self.settings
    }
}

impl GeometryBuilder for TessellatingBuilder {
    fn build(&self, shape: &Shape) -> CollisionResult<Geometry> {
        let kind = shape.kind();
        match shape.data() {
            ShapeData::Box { size } => {
                check_extents(kind, size)?;
                Ok(Geometry::Cuboid {
                    half_extents: size * 0.5,
                })
            }
            ShapeData::Ellipsoid { size } => {
                check_extents(kind, size)?;
                if shape.is_sphere() {
                    Ok(Geometry::Sphere { radius: size.x * 0.5 })
                } else {
                    let (vertices, faces) = tessellate_ellipsoid(
                        size * 0.5,
                        self.settings.ellipsoid_rings.max(2),
                        self.settings.ellipsoid_segments.max(3),
                    );
                    Ok(Geometry::TriMesh(TriMesh::new(vertices, faces, kind)?))
                }
            }
            ShapeData::Cylinder { radius, height } => {
                check_extents(kind, &Vec3::new(*radius, *radius, *height))?;
                let (vertices, faces) = tessellate_cylinder(
                    *radius,
                    *height,
                    self.settings.cylinder_slices.max(3),
                    self.settings.cylinder_stacks.max(1),
                );
                Ok(Geometry::TriMesh(TriMesh::new(vertices, faces, kind)?))
            }
            ShapeData::Plane { normal, offset } => Ok(Geometry::Halfspace {
                normal: *normal,
                offset: *offset,
            }),
            ShapeData::Mesh { mesh, scale } => {
                let vertices = mesh.vertices.iter().map(|v| v.component_mul(scale)).collect();
                Ok(Geometry::TriMesh(TriMesh::from_flat_indices(vertices, &mesh.indices, kind)?))
            }
            ShapeData::SoftMesh { mesh } => Ok(Geometry::TriMesh(TriMesh::from_flat_indices(
                mesh.vertices.clone(),
                &mesh.indices,
                kind,
            )?)),
            ShapeData::LineSegment { .. } => Err(CollisionError::UnsupportedShape(kind)),
        }
    }
}

fn check_extents(kind: ShapeKind, extents: &Vec3) -> CollisionResult<()> {
    if extents.iter().all(|v| v.is_finite() && *v >= 0.0) {
        Ok(())
    } else {
        Err(CollisionError::InvalidShape {
            kind,
            reason: format!("dimensions must be finite and non-negative, got {extents:?}"),
        })
    }
}

/// Latitude/longitude mesh with one vertex at each pole
fn tessellate_ellipsoid(radii: Vec3, rings: u32, segments: u32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let mut vertices = Vec::with_capacity(((rings - 1) * segments + 2) as usize);
    vertices.push(Vec3::new(0.0, 0.0, radii.z));
    for ring in 1..rings {
        let theta = PI * f64::from(ring) / f64::from(rings);
        for segment in 0..segments {
            let phi = TAU * f64::from(segment) / f64::from(segments);
            vertices.push(Vec3::new(
                radii.x * theta.sin() * phi.cos(),
                radii.y * theta.sin() * phi.sin(),
                radii.z * theta.cos(),
            ));
        }
    }
    let bottom = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
    vertices.push(Vec3::new(0.0, 0.0, -radii.z));

    let ring_start = |ring: u32| 1 + ring * segments;
    let mut faces = Vec::with_capacity((2 * rings * segments) as usize);
    for j in 0..segments {
        let next = (j + 1) % segments;
        faces.push([0, ring_start(0) + j, ring_start(0) + next]);
    }
    for ring in 0..rings - 2 {
        for j in 0..segments {
            let next = (j + 1) % segments;
            let (a, b) = (ring_start(ring) + j, ring_start(ring) + next);
            let (c, d) = (ring_start(ring + 1) + j, ring_start(ring + 1) + next);
            faces.push([a, c, b]);
            faces.push([b, c, d]);
        }
    }
    let last = ring_start(rings - 2);
    for j in 0..segments {
        let next = (j + 1) % segments;
        faces.push([last + j, bottom, last + next]);
    }
    (vertices, faces)
}

/// Closed cylinder along z: `stacks + 1` rings of `slices` vertices plus two cap centres
fn tessellate_cylinder(
    radius: f64,
    height: f64,
    slices: u32,
    stacks: u32,
) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let half = height * 0.5;
    let mut vertices = Vec::with_capacity(((stacks + 1) * slices + 2) as usize);
    for stack in 0..=stacks {
        let z = -half + height * f64::from(stack) / f64::from(stacks);
        for slice in 0..slices {
            let phi = TAU * f64::from(slice) / f64::from(slices);
            vertices.push(Vec3::new(radius * phi.cos(), radius * phi.sin(), z));
        }
    }
    let bottom_center = (stacks + 1) * slices;
    let top_center = bottom_center + 1;
    vertices.push(Vec3::new(0.0, 0.0, -half));
    vertices.push(Vec3::new(0.0, 0.0, half));

    let mut faces = Vec::with_capacity((2 * slices * (stacks + 1)) as usize);
    for stack in 0..stacks {
        for j in 0..slices {
            let next = (j + 1) % slices;
            let (a, b) = (stack * slices + j, stack * slices + next);
            let (c, d) = (a + slices, b + slices);
            faces.push([a, b, d]);
            faces.push([a, d, c]);
        }
    }
    let top_ring = stacks * slices;
    for j in 0..slices {
        let next = (j + 1) % slices;
        faces.push([bottom_center, next, j]);
        faces.push([top_center, top_ring + j, top_ring + next]);
    }
    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::MeshData;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn build(shape: &Shape) -> CollisionResult<Geometry> {
        TessellatingBuilder::default().build(shape)
    }

    #[test]
    fn test_box_becomes_cuboid() {
        let geometry = build(&Shape::cuboid(Vec3::new(2.0, 4.0, 6.0))).unwrap();
        assert_eq!(
            geometry,
            Geometry::Cuboid {
                half_extents: Vec3::new(1.0, 2.0, 3.0)
            }
        );
    }

    #[test]
    fn test_sphere_fast_path() {
        let geometry = build(&Shape::sphere(0.25)).unwrap();
        assert_eq!(geometry, Geometry::Sphere { radius: 0.25 });
    }

    #[test]
    fn test_ellipsoid_is_tessellated_within_radii() {
        let geometry = build(&Shape::ellipsoid(Vec3::new(2.0, 4.0, 6.0))).unwrap();
        let Geometry::TriMesh(mesh) = geometry else {
            panic!("expected a mesh, got {geometry:?}");
        };
        let settings = TessellationSettings::default();
        let rings = settings.ellipsoid_rings as usize;
        let segments = settings.ellipsoid_segments as usize;
        assert_eq!(mesh.vertices().len(), (rings - 1) * segments + 2);
        assert_eq!(mesh.triangle_count(), 2 * (rings - 1) * segments);
        let aabb = mesh.local_aabb();
        assert_relative_eq!(aabb.max.z, 3.0);
        assert_relative_eq!(aabb.min.z, -3.0);
        assert!(aabb.max.x <= 1.0 + 1e-12);
    }

    #[test]
    fn test_cylinder_uses_sixteen_by_sixteen_default() {
        let geometry = build(&Shape::cylinder(0.5, 2.0)).unwrap();
        let Geometry::TriMesh(mesh) = geometry else {
            panic!("expected a mesh, got {geometry:?}");
        };
        assert_eq!(mesh.vertices().len(), 17 * 16 + 2);
        assert_eq!(mesh.triangle_count(), 2 * 16 * 16 + 2 * 16);
        assert_relative_eq!(mesh.local_aabb().max.z, 1.0);
        assert_relative_eq!(mesh.local_aabb().max.x, 0.5);
    }

    #[test]
    fn test_tessellated_faces_point_outward() {
        for shape in [Shape::cylinder(0.5, 2.0), Shape::ellipsoid(Vec3::new(1.0, 2.0, 3.0))] {
            let Geometry::TriMesh(mesh) = build(&shape).unwrap() else {
                panic!("expected a mesh");
            };
            for tri in mesh.triangles() {
                let outward = tri.normal().dot(&tri.centroid()) > 0.0;
                assert!(outward, "{} face points inward", shape.kind());
            }
        }
    }

    #[test]
    fn test_plane_becomes_halfspace() {
        let geometry = build(&Shape::plane(Vec3::z(), -1.0)).unwrap();
        assert_eq!(
            geometry,
            Geometry::Halfspace {
                normal: Vec3::z(),
                offset: -1.0
            }
        );
    }

    #[test]
    fn test_mesh_is_scaled_and_soft_mesh_is_not() {
        let data = MeshData::new(vec![Vec3::zeros(), Vec3::x(), Vec3::y()], vec![0, 1, 2]);
        let scaled = build(&Shape::mesh(Arc::new(data.clone()), Vec3::new(2.0, 3.0, 1.0))).unwrap();
        let soft = build(&Shape::soft_mesh(data)).unwrap();
        match (scaled, soft) {
            (Geometry::TriMesh(scaled), Geometry::TriMesh(soft)) => {
                assert_eq!(scaled.vertices()[1], Vec3::new(2.0, 0.0, 0.0));
                assert_eq!(scaled.vertices()[2], Vec3::new(0.0, 3.0, 0.0));
                assert_eq!(soft.vertices()[1], Vec3::x());
            }
            other => panic!("expected meshes, got {other:?}"),
        }
    }

    #[test]
    fn test_line_segment_is_unsupported() {
        let result = build(&Shape::line_segment(vec![Vec3::zeros(), Vec3::x()], 1.0));
        assert_eq!(result, Err(CollisionError::UnsupportedShape(ShapeKind::LineSegment)));
    }

    #[test]
    fn test_negative_box_is_invalid() {
        let result = build(&Shape::cuboid(Vec3::new(1.0, -1.0, 1.0)));
        assert!(matches!(result, Err(CollisionError::InvalidShape { kind: ShapeKind::Box, .. })));
    }
}
