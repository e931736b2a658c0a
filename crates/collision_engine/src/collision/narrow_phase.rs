//! Narrow-phase contact generation
//!
//! Raw contacts carry a normal pointing from the first geometry toward the
//! second. The pipeline flips it when it converts raw contacts into
//! [`Contact`](super::Contact)s.

use crate::foundation::math::{inverse_transform_point, Isometry3, Vec3};
use crate::geometry::{cuboid_corners, Geometry, Triangle};

/// Parameters of one narrow-phase query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrowPhaseRequest {
    /// Stop generating contacts at this count (at least 1)
    pub max_contacts: usize,
    /// Compute contact geometry; when off contacts carry zeroed geometry
    pub enable_contact: bool,
}

impl NarrowPhaseRequest {
    /// Create a request, clamping `max_contacts` to at least 1
    pub fn new(max_contacts: usize, enable_contact: bool) -> Self {
        Self {
            max_contacts: max_contacts.max(1),
            enable_contact,
        }
    }
}

/// One contact as produced by the narrow phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawContact {
    /// World-space point
    pub point: Vec3,
    /// Unit normal from the first geometry toward the second
    pub normal: Vec3,
    /// Penetration depth (0 where it cannot be measured)
    pub depth: f64,
    /// Sub-feature of the first geometry
    pub primitive1: usize,
    /// Sub-feature of the second geometry
    pub primitive2: usize,
}

/// Contacts of one geometry pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrowPhaseResult {
    contacts: Vec<RawContact>,
}

impl NarrowPhaseResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the pair collides
    pub fn is_collision(&self) -> bool {
        !self.contacts.is_empty()
    }

    /// Number of contacts found
    pub fn num_contacts(&self) -> usize {
        self.contacts.len()
    }

    /// Contacts in generation order
    pub fn contacts(&self) -> &[RawContact] {
        &self.contacts
    }

    /// Append a contact
    pub fn add_contact(&mut self, contact: RawContact) {
        self.contacts.push(contact);
    }

    /// Drop all contacts
    pub fn clear(&mut self) {
        self.contacts.clear();
    }
}

/// Exact intersection test between two posed geometries
pub trait NarrowPhase: Send + Sync {
    /// Append the pair's contacts to `result`, at most `request.max_contacts`
    fn collide(
        &self,
        geometry1: &Geometry,
        transform1: &Isometry3,
        geometry2: &Geometry,
        transform2: &Isometry3,
        request: &NarrowPhaseRequest,
        result: &mut NarrowPhaseResult,
    );
}

/// Narrow phase over spheres, boxes, halfspaces and triangle meshes
///
/// Mesh-mesh contacts come from triangle pairs that pass a separating-axis
/// test; their depth is not measured and reported as 0. Two halfspaces never
/// report contact.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveNarrowPhase;

impl NarrowPhase for PrimitiveNarrowPhase {
    fn collide(
        &self,
        geometry1: &Geometry,
        transform1: &Isometry3,
        geometry2: &Geometry,
        transform2: &Isometry3,
        request: &NarrowPhaseRequest,
        result: &mut NarrowPhaseResult,
    ) {
        let start = result.num_contacts();
        let mut sink = ContactSink {
            result: &mut *result,
            start,
            limit: start + request.max_contacts.max(1),
            swapped: false,
        };
        dispatch(geometry1, transform1, geometry2, transform2, &mut sink);

        if !request.enable_contact {
            for contact in &mut result.contacts[start..] {
                contact.point = Vec3::zeros();
                contact.normal = Vec3::zeros();
                contact.depth = 0.0;
            }
        }
    }
}

struct ContactSink<'a> {
    result: &'a mut NarrowPhaseResult,
    start: usize,
    limit: usize,
    swapped: bool,
}

impl ContactSink<'_> {
    fn found_any(&self) -> bool {
        self.result.num_contacts() > self.start
    }

    fn is_full(&self) -> bool {
        self.result.num_contacts() >= self.limit
    }

    /// Returns true once the sink is full
    fn push(
        &mut self,
        point: Vec3,
        normal: Vec3,
        depth: f64,
        primitive1: usize,
        primitive2: usize,
    ) -> bool {
        if self.is_full() {
            return true;
        }
        let contact = if self.swapped {
            RawContact {
                point,
                normal: -normal,
                depth,
                primitive1: primitive2,
                primitive2: primitive1,
            }
        } else {
            RawContact {
                point,
                normal,
                depth,
                primitive1,
                primitive2,
            }
        };
        self.result.add_contact(contact);
        self.is_full()
    }
}

fn dispatch(
    g1: &Geometry,
    tf1: &Isometry3,
    g2: &Geometry,
    tf2: &Isometry3,
    sink: &mut ContactSink<'_>,
) {
    use Geometry::{Cuboid, Halfspace, Sphere, TriMesh};

    match (g1, g2) {
        (Sphere { radius: r1 }, Sphere { radius: r2 }) => sphere_sphere(*r1, tf1, *r2, tf2, sink),
        (Sphere { radius }, Cuboid { half_extents }) => {
            sphere_cuboid(*radius, tf1, half_extents, tf2, sink);
        }
        (Sphere { radius }, Halfspace { normal, offset }) => {
            sphere_halfspace(*radius, tf1, &world_plane(normal, *offset, tf2), sink);
        }
        (Sphere { radius }, TriMesh(_)) => sphere_triangles(*radius, tf1, g2, tf2, sink),
        (Cuboid { .. } | TriMesh(_), Halfspace { normal, offset }) => {
            vertices_halfspace(g1, tf1, &world_plane(normal, *offset, tf2), sink);
        }
        (Cuboid { half_extents: h1 }, Cuboid { half_extents: h2 }) => {
            cuboid_cuboid(h1, tf1, h2, tf2, sink);
            if !sink.found_any() {
                triangle_pairs(g1, tf1, g2, tf2, sink);
            }
        }
        (Cuboid { .. } | TriMesh(_), Cuboid { .. } | TriMesh(_)) => {
            triangle_pairs(g1, tf1, g2, tf2, sink);
        }
        (Halfspace { .. }, Halfspace { .. }) => {}
        // Remaining combinations are mirror images of the ones above
        (Cuboid { .. } | TriMesh(_) | Halfspace { .. }, _) => {
            sink.swapped = !sink.swapped;
            dispatch(g2, tf2, g1, tf1, sink);
            sink.swapped = !sink.swapped;
        }
    }
}

/// Plane `normal · x = offset` in world coordinates
struct Plane {
    normal: Vec3,
    offset: f64,
}

impl Plane {
    fn signed_distance(&self, point: &Vec3) -> f64 {
        self.normal.dot(point) - self.offset
    }
}

fn world_plane(normal: &Vec3, offset: f64, transform: &Isometry3) -> Plane {
    let normal = transform.rotation * normal;
    Plane {
        normal,
        offset: offset + normal.dot(&transform.translation.vector),
    }
}

fn sphere_sphere(r1: f64, tf1: &Isometry3, r2: f64, tf2: &Isometry3, sink: &mut ContactSink<'_>) {
    let c1 = tf1.translation.vector;
    let c2 = tf2.translation.vector;
    let delta = c2 - c1;
    let distance = delta.norm();
    let radius_sum = r1 + r2;
    if distance > radius_sum {
        return;
    }
    let normal = delta.try_normalize(f64::EPSILON).unwrap_or_else(Vec3::z);
    let depth = radius_sum - distance;
    // Middle of the overlap along the centre line
    let point = c1 + normal * (r1 - depth * 0.5);
    sink.push(point, normal, depth, 0, 0);
}

fn sphere_cuboid(
    radius: f64,
    tf1: &Isometry3,
    half: &Vec3,
    tf2: &Isometry3,
    sink: &mut ContactSink<'_>,
) {
    let center = tf1.translation.vector;
    let local = inverse_transform_point(tf2, &center);
    let clamped = local.zip_map(half, |c, h| c.clamp(-h, h));

    if clamped != local {
        let offset = clamped - local;
        let distance = offset.norm();
        if distance > radius {
            return;
        }
        let normal = tf2.rotation * (offset / distance);
        let point = tf2.rotation * clamped + tf2.translation.vector;
        sink.push(point, normal, radius - distance, 0, 0);
        return;
    }

    // Centre inside the box: leave through the nearest face
    let gaps = half - local.abs();
    let axis = gaps.imin();
    let mut face_normal = Vec3::zeros();
    face_normal[axis] = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
    let normal = -(tf2.rotation * face_normal);
    sink.push(center, normal, radius + gaps[axis], 0, 0);
}

fn sphere_halfspace(radius: f64, tf1: &Isometry3, plane: &Plane, sink: &mut ContactSink<'_>) {
    let center = tf1.translation.vector;
    let distance = plane.signed_distance(&center);
    if distance > radius {
        return;
    }
    let point = center - plane.normal * distance;
    sink.push(point, -plane.normal, radius - distance, 0, 0);
}

fn sphere_triangles(
    radius: f64,
    tf1: &Isometry3,
    mesh: &Geometry,
    tf2: &Isometry3,
    sink: &mut ContactSink<'_>,
) {
    let center = tf1.translation.vector;
    for (id, triangle) in mesh.local_triangles() {
        let triangle = triangle.transformed(tf2);
        let closest = triangle.closest_point(center);
        let offset = closest - center;
        let distance = offset.norm();
        if distance > radius {
            continue;
        }
        let normal = offset
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(|| -triangle.normal());
        if sink.push(closest, normal, radius - distance, 0, id) {
            return;
        }
    }
}

fn vertices_halfspace(shape: &Geometry, tf: &Isometry3, plane: &Plane, sink: &mut ContactSink<'_>) {
    let mut check = |vertex: &Vec3, primitive: usize| {
        let world = tf.rotation * vertex + tf.translation.vector;
        let distance = plane.signed_distance(&world);
        distance <= 0.0 && sink.push(world, -plane.normal, -distance, primitive, 0)
    };

    match shape {
        Geometry::TriMesh(mesh) => {
            // Triangle soup: shared vertices are reported once per face
            for (id, [a, b, c]) in mesh.indices().iter().enumerate() {
                for &index in &[*a, *b, *c] {
                    if check(&mesh.vertices()[index as usize], id) {
                        return;
                    }
                }
            }
        }
        _ => {
            for vertex in shape.local_vertices() {
                if check(&vertex, 0) {
                    return;
                }
            }
        }
    }
}

/// Corners of each box that lie inside the other
fn cuboid_cuboid(
    h1: &Vec3,
    tf1: &Isometry3,
    h2: &Vec3,
    tf2: &Isometry3,
    sink: &mut ContactSink<'_>,
) {
    if corners_inside(h1, tf1, h2, tf2, sink) {
        return;
    }
    sink.swapped = !sink.swapped;
    corners_inside(h2, tf2, h1, tf1, sink);
    sink.swapped = !sink.swapped;
}

fn corners_inside(
    corners_half: &Vec3,
    corners_tf: &Isometry3,
    box_half: &Vec3,
    box_tf: &Isometry3,
    sink: &mut ContactSink<'_>,
) -> bool {
    for corner in cuboid_corners(corners_half) {
        let world = corners_tf.rotation * corner + corners_tf.translation.vector;
        let local = inverse_transform_point(box_tf, &world);
        let gaps = box_half - local.abs();
        if gaps.min() < 0.0 {
            continue;
        }
        let axis = gaps.imin();
        let mut face_normal = Vec3::zeros();
        face_normal[axis] = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
        // Corner box sits outside the face it entered through
        let normal = -(box_tf.rotation * face_normal);
        if sink.push(world, normal, gaps[axis], 0, 0) {
            return true;
        }
    }
    false
}

fn triangle_pairs(
    g1: &Geometry,
    tf1: &Isometry3,
    g2: &Geometry,
    tf2: &Isometry3,
    sink: &mut ContactSink<'_>,
) {
    let world = |geometry: &Geometry, tf: &Isometry3| -> Vec<(usize, Triangle)> {
        geometry
            .local_triangles()
            .into_iter()
            .map(|(id, t)| (id, t.transformed(tf)))
            .collect()
    };
    let first = world(g1, tf1);
    let second: Vec<_> = world(g2, tf2)
        .into_iter()
        .map(|(id, t)| (id, t, t.aabb()))
        .collect();

    for (id1, tri1) in &first {
        let bounds1 = tri1.aabb();
        for (id2, tri2, bounds2) in &second {
            if !bounds1.intersects(bounds2) || !tri1.intersects_triangle(tri2) {
                continue;
            }
            let point = tri2.closest_point(tri1.centroid());
            let normal = -tri2.normal();
            if sink.push(point, normal, 0.0, *id1, *id2) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::translation;
    use crate::geometry::TriMesh;
    use crate::dynamics::ShapeKind;
    use approx::assert_relative_eq;

    fn collide(
        g1: &Geometry,
        tf1: &Isometry3,
        g2: &Geometry,
        tf2: &Isometry3,
        max: usize,
    ) -> NarrowPhaseResult {
        let mut result = NarrowPhaseResult::new();
        let request = NarrowPhaseRequest::new(max, true);
        PrimitiveNarrowPhase.collide(g1, tf1, g2, tf2, &request, &mut result);
        result
    }

    fn origin() -> Isometry3 {
        Isometry3::identity()
    }

    fn ground() -> Geometry {
        Geometry::Halfspace {
            normal: Vec3::z(),
            offset: 0.0,
        }
    }

    #[test]
    fn test_sphere_sphere_depth_and_normal() {
        let sphere = Geometry::Sphere { radius: 0.5 };
        let result = collide(&sphere, &origin(), &sphere, &translation(0.8, 0.0, 0.0), 10);
        assert_eq!(result.num_contacts(), 1);
        let contact = result.contacts()[0];
        assert_relative_eq!(contact.depth, 0.2, epsilon = 1e-12);
        assert_relative_eq!(contact.normal, Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(contact.point, Vec3::new(0.4, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_separated_spheres_do_not_collide() {
        let sphere = Geometry::Sphere { radius: 0.5 };
        let result = collide(&sphere, &origin(), &sphere, &translation(1.01, 0.0, 0.0), 10);
        assert!(!result.is_collision());
    }

    #[test]
    fn test_swapped_pair_flips_normal() {
        let sphere = Geometry::Sphere { radius: 0.5 };
        let cube = Geometry::Cuboid {
            half_extents: Vec3::repeat(0.5),
        };
        let tf_sphere = translation(0.0, 0.0, 0.9);
        let direct = collide(&sphere, &tf_sphere, &cube, &origin(), 10);
        let mirrored = collide(&cube, &origin(), &sphere, &tf_sphere, 10);

        assert_eq!(direct.num_contacts(), 1);
        assert_relative_eq!(direct.contacts()[0].normal, -Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(direct.contacts()[0].depth, 0.1, epsilon = 1e-12);
        assert_relative_eq!(mirrored.contacts()[0].normal, Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_inside_box_leaves_through_nearest_face() {
        let sphere = Geometry::Sphere { radius: 0.1 };
        let cube = Geometry::Cuboid {
            half_extents: Vec3::repeat(1.0),
        };
        let result = collide(&sphere, &translation(0.0, 0.0, 0.8), &cube, &origin(), 10);
        let contact = result.contacts()[0];
        assert_relative_eq!(contact.normal, -Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(contact.depth, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_box_resting_on_ground_reports_bottom_corners() {
        let cube = Geometry::Cuboid {
            half_extents: Vec3::repeat(0.5),
        };
        let result = collide(&cube, &translation(0.0, 0.0, 0.49), &ground(), &origin(), 10);
        assert_eq!(result.num_contacts(), 4);
        for contact in result.contacts() {
            assert_relative_eq!(contact.normal, -Vec3::z());
            assert_relative_eq!(contact.depth, 0.01, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_contacts_are_capped() {
        let cube = Geometry::Cuboid {
            half_extents: Vec3::repeat(0.5),
        };
        let result = collide(&cube, &translation(0.0, 0.0, 0.4), &ground(), &origin(), 2);
        assert_eq!(result.num_contacts(), 2);
    }

    #[test]
    fn test_overlapping_boxes_collide() {
        let cube = Geometry::Cuboid {
            half_extents: Vec3::repeat(0.5),
        };
        let result = collide(&cube, &origin(), &cube, &translation(0.9, 0.2, 0.3), 100);
        assert!(result.is_collision());
        for contact in result.contacts() {
            // Box 2 sits at +x, so box 1 pushes it along +x
            assert!(contact.normal.x > 0.5, "unexpected normal {:?}", contact.normal);
        }
    }

    #[test]
    fn test_crossed_boxes_fall_back_to_triangles() {
        // A long thin bar through the middle of a cube: no corner is inside the other box
        let cube = Geometry::Cuboid {
            half_extents: Vec3::repeat(0.5),
        };
        let bar = Geometry::Cuboid {
            half_extents: Vec3::new(2.0, 0.1, 0.1),
        };
        let result = collide(&cube, &origin(), &bar, &origin(), 100);
        assert!(result.is_collision());
    }

    #[test]
    fn test_halfspaces_never_collide() {
        let result = collide(&ground(), &origin(), &ground(), &origin(), 10);
        assert!(!result.is_collision());
    }

    #[test]
    fn test_sphere_against_mesh_reports_triangle_ids() {
        let mesh = TriMesh::from_flat_indices(
            vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::new(1.0, 1.0, 0.0)],
            &[0, 1, 2, 1, 3, 2],
            ShapeKind::Mesh,
        )
        .unwrap();
        let mesh = Geometry::TriMesh(mesh);
        let sphere = Geometry::Sphere { radius: 0.2 };
        let result = collide(&sphere, &translation(0.8, 0.8, 0.1), &mesh, &origin(), 10);
        assert_eq!(result.num_contacts(), 1);
        assert_eq!(result.contacts()[0].primitive2, 1);
        assert_relative_eq!(result.contacts()[0].depth, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_disabled_contacts_are_zeroed() {
        let cube = Geometry::Cuboid {
            half_extents: Vec3::repeat(0.5),
        };
        let mut result = NarrowPhaseResult::new();
        PrimitiveNarrowPhase.collide(
            &cube,
            &translation(0.0, 0.0, 0.4),
            &ground(),
            &origin(),
            &NarrowPhaseRequest::new(10, false),
            &mut result,
        );
        assert!(result.is_collision());
        assert!(result.contacts().iter().all(|c| c.point == Vec3::zeros() && c.depth == 0.0));
    }
}
