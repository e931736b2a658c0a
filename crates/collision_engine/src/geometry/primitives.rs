//! Triangle primitive and the intersection tests built on it

use super::aabb::Aabb;
use crate::foundation::math::{Isometry3, Vec3};

/// A triangle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// The same triangle carried by a rigid transform
    pub fn transformed(&self, iso: &Isometry3) -> Self {
        Self {
            v0: iso.rotation * self.v0 + iso.translation.vector,
            v1: iso.rotation * self.v1 + iso.translation.vector,
            v2: iso.rotation * self.v2 + iso.translation.vector,
        }
    }

    /// Vertices in winding order
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Unit normal (right-hand rule); zero for a degenerate triangle
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).try_normalize(f64::EPSILON).unwrap_or_else(Vec3::zeros)
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Bounding box of the three vertices
    pub fn aabb(&self) -> Aabb {
        Aabb::new(
            self.v0.inf(&self.v1).inf(&self.v2),
            self.v0.sup(&self.v1).sup(&self.v2),
        )
    }

    /// Get the closest point on the triangle to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let v0_to_point = point - self.v0;

        let d1 = edge1.dot(&v0_to_point);
        let d2 = edge2.dot(&v0_to_point);

        // Vertex region outside v0
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        // Vertex region outside v1
        let v1_to_point = point - self.v1;
        let d3 = edge1.dot(&v1_to_point);
        let d4 = edge2.dot(&v1_to_point);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        // Vertex region outside v2
        let v2_to_point = point - self.v2;
        let d5 = edge1.dot(&v2_to_point);
        let d6 = edge2.dot(&v2_to_point);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        // Edge regions
        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return self.v0 + edge1 * v;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.v0 + edge2 * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        // Inside the face
        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        self.v0 + edge1 * v + edge2 * w
    }

    /// Signed distance from a point to the triangle plane
    pub fn distance_to_point(&self, point: Vec3) -> f64 {
        self.normal().dot(&(point - self.v0))
    }

    /// Separating-axis test against another triangle
    ///
    /// Tests the two face normals and the nine edge-edge cross products.
    /// Touching triangles count as intersecting.
    pub fn intersects_triangle(&self, other: &Triangle) -> bool {
        const EPSILON: f64 = 1e-12;

        fn project(tri: &Triangle, axis: &Vec3) -> (f64, f64) {
            let p0 = axis.dot(&tri.v0);
            let p1 = axis.dot(&tri.v1);
            let p2 = axis.dot(&tri.v2);
            (p0.min(p1).min(p2), p0.max(p1).max(p2))
        }

        // false when `axis` separates the two triangles
        fn overlaps_on(a: &Triangle, b: &Triangle, axis: Vec3) -> bool {
            if axis.magnitude_squared() < EPSILON {
                return true;
            }
            let axis = axis.normalize();
            let (min_a, max_a) = project(a, &axis);
            let (min_b, max_b) = project(b, &axis);
            max_a >= min_b && max_b >= min_a
        }

        let edges_a = [self.v1 - self.v0, self.v2 - self.v1, self.v0 - self.v2];
        let edges_b = [other.v1 - other.v0, other.v2 - other.v1, other.v0 - other.v2];

        if !overlaps_on(self, other, edges_a[0].cross(&edges_a[1])) {
            return false;
        }
        if !overlaps_on(self, other, edges_b[0].cross(&edges_b[1])) {
            return false;
        }

        edges_a
            .iter()
            .all(|ea| edges_b.iter().all(|eb| overlaps_on(self, other, ea.cross(eb))))
    }
}
