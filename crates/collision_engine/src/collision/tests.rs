//! End-to-end detection scenarios

use std::sync::Arc;

use approx::assert_relative_eq;

use super::*;
use crate::config::DetectorConfig;
use crate::dynamics::{MeshData, Shape, ShapeFrame};
use crate::foundation::collections::ObjectKey;
use crate::foundation::logging::init_for_tests;
use crate::foundation::math::{translation, Isometry3, Vec3};
use crate::geometry::{Geometry, TessellatingBuilder};

fn frame(name: &str, shape: Shape, x: f64, y: f64, z: f64) -> Arc<ShapeFrame> {
    ShapeFrame::shared(name, Arc::new(shape), translation(x, y, z))
}

fn ground() -> Arc<ShapeFrame> {
    ShapeFrame::shared("ground", Arc::new(Shape::plane(Vec3::z(), 0.0)), Isometry3::identity())
}

/// Narrow phase that reports a fixed list of points for every pair
struct ScriptedNarrowPhase {
    points: Vec<Vec3>,
}

impl NarrowPhase for ScriptedNarrowPhase {
    fn collide(
        &self,
        _: &Geometry,
        _: &Isometry3,
        _: &Geometry,
        _: &Isometry3,
        request: &NarrowPhaseRequest,
        result: &mut NarrowPhaseResult,
    ) {
        for point in self.points.iter().take(request.max_contacts) {
            result.add_contact(RawContact {
                point: *point,
                normal: Vec3::x(),
                depth: 0.0,
                primitive1: 0,
                primitive2: 0,
            });
        }
    }
}

fn scripted_detector(points: Vec<Vec3>) -> CollisionDetector {
    CollisionDetector::with_components(
        DetectorConfig::default(),
        Box::new(TessellatingBuilder::default()),
        Box::new(ScriptedNarrowPhase { points }),
    )
}

fn detect_scripted(points: Vec<Vec3>) -> DetectionResult {
    let mut detector = scripted_detector(points);
    let group = detector.create_group_with_frames([
        frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0),
        frame("b", Shape::sphere(1.0), 0.5, 0.0, 0.0),
    ]);
    let mut result = DetectionResult::new();
    detector.detect(group, &DetectionOption::default(), &mut result);
    result
}

#[test]
fn test_disjoint_shapes_report_nothing() {
    init_for_tests();
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("left", Shape::sphere(0.5), -2.0, 0.0, 0.0),
        frame("right", Shape::cuboid(Vec3::repeat(1.0)), 2.0, 0.0, 0.0),
    ]);

    let mut result = DetectionResult::new();
    assert!(!detector.detect(group, &DetectionOption::default(), &mut result));
    assert!(result.is_empty());
    assert_eq!(detector.last_stats().candidate_pairs, 0);
}

#[test]
fn test_overlapping_spheres_report_depth_and_normal() {
    init_for_tests();
    let (radius, separation) = (0.5, 0.7);
    let mut detector = CollisionDetector::default();
    let group = detector.create_group();
    let first = detector.create_object(frame("first", Shape::sphere(radius), 0.0, 0.0, 0.0));
    let second_frame = frame("second", Shape::sphere(radius), separation, 0.0, 0.0);
    let second = detector.create_object(second_frame);
    assert!(detector.add_object(group, first));
    assert!(detector.add_object(group, second));

    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &DetectionOption::default(), &mut result));
    assert_eq!(result.len(), 1);

    let contact = result.contacts()[0];
    assert_eq!((contact.object1, contact.object2), (first, second));
    assert_relative_eq!(contact.penetration_depth, 2.0 * radius - separation, epsilon = 1e-12);
    // From object 2 toward object 1
    assert_relative_eq!(contact.normal, -Vec3::x(), epsilon = 1e-12);
    assert!(result.in_collision(second, first));
}

#[test]
fn test_box_on_ground_normals_point_up() {
    init_for_tests();
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("crate", Shape::cuboid(Vec3::repeat(1.0)), 0.0, 0.0, 0.45),
        ground(),
    ]);

    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &DetectionOption::default(), &mut result));
    assert_eq!(result.len(), 4);
    for contact in &result {
        assert_relative_eq!(contact.normal, Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(contact.penetration_depth, 0.05, epsilon = 1e-12);
    }
}

#[test]
fn test_shared_mesh_vertices_are_reported_once() {
    init_for_tests();
    let quad = MeshData::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ],
        vec![0, 1, 2, 1, 3, 2],
    );
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("tile", Shape::mesh(Arc::new(quad), Vec3::repeat(1.0)), 0.0, 0.0, -0.1),
        ground(),
    ]);

    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &DetectionOption::default(), &mut result));
    // Six raw vertex contacts, two of them repeats
    assert_eq!(result.len(), 4);
    assert_eq!(detector.last_stats().pruned_contacts, 2);
}

#[test]
fn test_tessellated_cylinder_contacts_are_pruned() {
    init_for_tests();
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("can", Shape::cylinder(0.3, 1.0), 0.0, 0.0, 0.49),
        ground(),
    ]);

    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &DetectionOption::default(), &mut result));
    assert!(detector.last_stats().pruned_contacts > 0);
    for contact in &result {
        assert_relative_eq!(contact.point.z, -0.01, epsilon = 1e-9);
        assert_relative_eq!(contact.normal, Vec3::z(), epsilon = 1e-12);
    }
}

#[test]
fn test_points_within_tolerance_keep_one() {
    let result = detect_scripted(vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 1.0 + 1e-13)]);
    assert_eq!(result.len(), 1);
    assert_relative_eq!(result.contacts()[0].point.z, 1.0 + 1e-13);
}

#[test]
fn test_three_colinear_points_keep_at_most_two() {
    let result =
        detect_scripted(vec![Vec3::zeros(), Vec3::new(0.5, 0.5, 0.0), Vec3::new(1.0, 1.0, 0.0)]);
    assert_eq!(result.len(), 2);
    assert_eq!(result.contacts()[0].point, Vec3::new(0.5, 0.5, 0.0));
}

#[test]
fn test_three_coincident_points_keep_the_last() {
    let result = detect_scripted(vec![Vec3::repeat(2.0); 3]);
    assert_eq!(result.len(), 1);
}

#[test]
fn test_filter_runs_before_narrow_phase() {
    init_for_tests();
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0),
        frame("b", Shape::sphere(1.0), 0.5, 0.0, 0.0),
    ]);
    let option = DetectionOption::default().with_filter_fn(|_, _| false);

    let mut result = DetectionResult::new();
    assert!(!detector.detect(group, &option, &mut result));
    assert!(result.is_empty());
    let stats = detector.last_stats();
    assert_eq!(stats.candidate_pairs, 1);
    assert_eq!(stats.filtered_pairs, 1);
    assert_eq!(stats.narrow_phase_tests, 0);
}

#[test]
fn test_excluded_pairs_filter() {
    let mut detector = CollisionDetector::default();
    let group = detector.create_group();
    let keys: Vec<ObjectKey> = (0..3)
        .map(|i| {
            detector.create_object(frame("s", Shape::sphere(1.0), f64::from(i) * 0.5, 0.0, 0.0))
        })
        .collect();
    for &key in &keys {
        detector.add_object(group, key);
    }

    let mut excluded = ExcludedPairsFilter::new();
    excluded.exclude(keys[1], keys[0]);
    let option = DetectionOption::default().with_filter(Arc::new(excluded));

    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &option, &mut result));
    assert!(!result.in_collision(keys[0], keys[1]));
    assert!(result.in_collision(keys[0], keys[2]));
    assert!(result.in_collision(keys[1], keys[2]));
}

#[test]
fn test_layer_filter_uses_frame_aspects() {
    let mut detector = CollisionDetector::default();
    let robot = frame("robot", Shape::sphere(1.0), 0.0, 0.0, 0.0);
    let sensor = frame("sensor", Shape::sphere(1.0), 0.5, 0.0, 0.0);
    let wall = frame("wall", Shape::cuboid(Vec3::repeat(1.0)), -0.5, 0.0, 0.0);
    CollisionAspect::set_layers(&robot, CollisionLayers::ROBOT, CollisionLayers::ENVIRONMENT);
    CollisionAspect::set_layers(&wall, CollisionLayers::ENVIRONMENT, CollisionLayers::ALL);
    CollisionAspect::set_collidable(&sensor, false);
    let group = detector.create_group_with_frames([robot, sensor, wall]);

    let option = DetectionOption::default().with_filter(Arc::new(LayerFilter));
    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &option, &mut result));
    let names: Vec<(&str, &str)> = result
        .iter()
        .map(|c| {
            (
                detector.object(c.object1).map_or("?", |o| o.shape_frame().name()),
                detector.object(c.object2).map_or("?", |o| o.shape_frame().name()),
            )
        })
        .collect();
    assert!(names.iter().all(|&pair| pair == ("robot", "wall")), "{names:?}");
}

#[test]
fn test_sequential_detects_do_not_accumulate() {
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("crate", Shape::cuboid(Vec3::repeat(1.0)), 0.0, 0.0, 0.45),
        ground(),
    ]);
    let option = DetectionOption::default();

    let mut result = DetectionResult::new();
    detector.detect(group, &option, &mut result);
    let first = result.clone();
    detector.detect(group, &option, &mut result);
    assert_eq!(result, first);
}

#[test]
fn test_frames_are_resynced_every_call() {
    let mut detector = CollisionDetector::default();
    let ball = frame("ball", Shape::sphere(0.5), 0.0, 0.0, 3.0);
    let group = detector.create_group_with_frames([Arc::clone(&ball), ground()]);
    let option = DetectionOption::default();
    let mut result = DetectionResult::new();

    assert!(!detector.detect(group, &option, &mut result));
    ball.set_world_transform(translation(0.0, 0.0, 0.25));
    assert!(detector.detect(group, &option, &mut result));
    assert_relative_eq!(result.contacts()[0].penetration_depth, 0.25, epsilon = 1e-12);
}

#[test]
fn test_early_exit_only_with_contacts_enabled() {
    let frames = || {
        [
            frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0),
            frame("b", Shape::sphere(1.0), 0.1, 0.0, 0.0),
            frame("c", Shape::sphere(1.0), 0.2, 0.0, 0.0),
        ]
    };

    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames(frames());
    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &DetectionOption::new(true, 1), &mut result));
    assert!(detector.last_stats().early_exit);
    assert_eq!(detector.last_stats().colliding_pairs, 1);
    assert_eq!(result.len(), 1);

    assert!(detector.detect(group, &DetectionOption::new(false, 1), &mut result));
    assert!(!detector.last_stats().early_exit);
    assert_eq!(detector.last_stats().colliding_pairs, 3);
    assert_eq!(result.len(), 3);
    assert!(result.iter().all(|c| c.point == Vec3::zeros()));
}

#[test]
fn test_pair_exceeding_cap_is_still_fully_processed() {
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("crate", Shape::cuboid(Vec3::repeat(1.0)), 0.0, 0.0, 0.45),
        ground(),
        frame("ball", Shape::sphere(0.5), 5.0, 0.0, 0.25),
    ]);

    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &DetectionOption::new(true, 3), &mut result));
    // The crate pair hits the cap of 3 and stops detection before the ball
    assert_eq!(result.len(), 3);
    assert!(detector.last_stats().early_exit);
    assert_eq!(detector.last_stats().colliding_pairs, 1);
}

#[test]
fn test_zero_max_contacts_behaves_as_one() {
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("crate", Shape::cuboid(Vec3::repeat(1.0)), 0.0, 0.0, 0.45),
        ground(),
    ]);
    let mut result = DetectionResult::new();
    assert!(detector.detect(group, &DetectionOption::new(true, 0), &mut result));
    assert_eq!(result.len(), 1);
}

#[test]
fn test_cross_backend_group_is_rejected() {
    init_for_tests();
    let mut octree = CollisionDetector::with_type(DetectorType::Octree);
    let mut brute = CollisionDetector::with_type(DetectorType::BruteForce);
    let frames = [
        frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0),
        frame("b", Shape::sphere(1.0), 0.5, 0.0, 0.0),
    ];
    let octree_group = octree.create_group_with_frames(frames.clone());
    let brute_group = brute.create_group_with_frames(frames);

    let mut result = DetectionResult::new();
    assert!(octree.detect(octree_group, &DetectionOption::default(), &mut result));
    assert!(!result.is_empty());

    assert!(!octree.detect(brute_group, &DetectionOption::default(), &mut result));
    assert!(result.is_empty());
    let option = DetectionOption::default();
    assert!(!octree.detect_between(octree_group, brute_group, &option, &mut result));
    assert!(octree.group(brute_group).is_none());
    let object = octree.objects().next().map(|(key, _)| key).unwrap();
    assert!(!octree.add_object(brute_group, object));
}

#[test]
fn test_group_from_another_detector_instance_is_rejected() {
    let mut first = CollisionDetector::default();
    let mut second = CollisionDetector::default();
    let group = first.create_group_with_frames([frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0)]);
    second.create_group();

    let mut result = DetectionResult::new();
    assert!(!second.detect(group, &DetectionOption::default(), &mut result));
    assert!(!second.destroy_group(group));
    assert_eq!(first.group_count(), 1);
}

#[test]
fn test_octree_and_brute_force_agree() {
    let frames: Vec<Arc<ShapeFrame>> = (0..40)
        .map(|i| {
            let t = f64::from(i);
            let shape = match i % 3 {
                0 => Shape::sphere(0.4),
                1 => Shape::cuboid(Vec3::new(0.6, 0.5, 0.4)),
                _ => Shape::cylinder(0.3, 0.8),
            };
            frame("body", shape, (t * 1.3).sin() * 3.0, (t * 0.7).cos() * 3.0, (t * 0.4).sin())
        })
        .chain(std::iter::once(ground()))
        .collect();

    let run = |detector_type| {
        let mut detector = CollisionDetector::with_type(detector_type);
        let group = detector.create_group_with_frames(frames.iter().cloned());
        let mut result = DetectionResult::new();
        detector.detect(group, &DetectionOption::default(), &mut result);
        (result, *detector.last_stats())
    };

    let (octree_result, octree_stats) = run(DetectorType::Octree);
    let (brute_result, brute_stats) = run(DetectorType::BruteForce);
    assert!(octree_result.is_collision());
    assert_eq!(octree_stats, brute_stats);
    assert_eq!(octree_result, brute_result);
}

#[test]
fn test_detect_between_reports_only_cross_pairs() {
    let mut detector = CollisionDetector::default();
    let left = detector.create_group_with_frames([
        frame("l1", Shape::sphere(1.0), 0.0, 0.0, 0.0),
        frame("l2", Shape::sphere(1.0), 0.5, 0.0, 0.0),
    ]);
    let right = detector.create_group_with_frames([frame("r1", Shape::sphere(1.0), 1.0, 0.0, 0.0)]);

    let mut result = DetectionResult::new();
    assert!(detector.detect_between(left, right, &DetectionOption::default(), &mut result));
    assert_eq!(result.len(), 2);
    let right_member = detector.group(right).map(|g| g.members()[0]);
    for contact in &result {
        assert_eq!(Some(contact.object2), right_member);
    }
}

#[test]
fn test_group_against_itself_matches_self_collision() {
    init_for_tests();
    for detector_type in [DetectorType::Octree, DetectorType::BruteForce] {
        let mut detector = CollisionDetector::with_type(detector_type);
        let group = detector.create_group_with_frames([
            frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0),
            frame("b", Shape::sphere(1.0), 0.5, 0.0, 0.0),
            frame("c", Shape::cuboid(Vec3::repeat(1.0)), 0.0, 0.0, 1.2),
        ]);
        let option = DetectionOption::default();

        let mut own = DetectionResult::new();
        assert!(detector.detect(group, &option, &mut own));
        let own_stats = *detector.last_stats();

        let mut against_itself = DetectionResult::new();
        assert!(detector.detect_between(group, group, &option, &mut against_itself));
        assert_eq!(against_itself, own);
        assert_eq!(*detector.last_stats(), own_stats);
    }
}

#[test]
fn test_object_shared_between_groups_is_not_paired_with_itself() {
    let mut detector = CollisionDetector::default();
    let shared = detector.create_object(frame("shared", Shape::sphere(1.0), 0.0, 0.0, 0.0));
    let (a, b) = (detector.create_group(), detector.create_group());
    detector.add_object(a, shared);
    detector.add_object(b, shared);

    let mut result = DetectionResult::new();
    assert!(!detector.detect_between(a, b, &DetectionOption::default(), &mut result));
    assert_eq!(detector.last_stats().candidate_pairs, 1);
    assert_eq!(detector.last_stats().narrow_phase_tests, 0);
}

#[test]
fn test_unsupported_shape_is_skipped() {
    init_for_tests();
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("polyline", Shape::line_segment(vec![Vec3::zeros(), Vec3::x()], 0.1), 0.0, 0.0, 0.0),
        frame("ball", Shape::sphere(1.0), 0.0, 0.0, 0.0),
    ]);
    let polyline = detector.group(group).map(|g| g.members()[0]).unwrap();
    assert!(!detector.object(polyline).unwrap().is_usable());

    let mut result = DetectionResult::new();
    assert!(!detector.detect(group, &DetectionOption::default(), &mut result));
    assert_eq!(detector.geometry_cache().len(), 2);
}

#[test]
fn test_membership_is_idempotent_and_tracked() {
    let mut detector = CollisionDetector::default();
    let group = detector.create_group();
    let object = detector.create_object(frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0));

    assert!(detector.add_object(group, object));
    assert!(!detector.add_object(group, object));
    assert!(detector.has_object(group, object));
    assert!(detector.object(object).unwrap().has_group(group.key()));
    assert_eq!(detector.group(group).unwrap().len(), 1);

    assert!(detector.remove_object(group, object));
    assert!(!detector.remove_object(group, object));
    assert!(!detector.has_object(group, object));
    assert!(detector.object(object).unwrap().groups().is_empty());
}

#[test]
fn test_shared_shape_geometry_is_refcounted() {
    let mut detector = CollisionDetector::default();
    let shape = Arc::new(Shape::cylinder(0.5, 1.0));
    let keys: Vec<ObjectKey> = (0..3)
        .map(|i| {
            let transform = translation(f64::from(i), 0.0, 0.0);
            detector.create_object(ShapeFrame::shared("c", Arc::clone(&shape), transform))
        })
        .collect();
    assert_eq!(detector.geometry_cache().len(), 1);
    assert_eq!(detector.geometry_cache().ref_count(shape.id()), 3);

    for key in keys {
        assert!(detector.destroy_object(key));
    }
    assert!(detector.geometry_cache().is_empty());
}

#[test]
fn test_destroying_objects_leaves_no_dangling_state() {
    let mut detector = CollisionDetector::default();
    let (a, b) = (detector.create_group(), detector.create_group());
    let object = detector.create_object(frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0));
    detector.add_object(a, object);
    detector.add_object(b, object);

    assert!(detector.remove_object(a, object));
    assert!(detector.destroy_object(object));
    assert!(!detector.has_object(b, object));
    assert!(detector.group(b).unwrap().is_empty());
    assert!(detector.geometry_cache().is_empty());
    assert!(!detector.destroy_object(object));
}

#[test]
fn test_destroy_group_destroys_owned_objects_only() {
    let mut detector = CollisionDetector::default();
    let owner =
        detector.create_group_with_frames([frame("owned", Shape::sphere(1.0), 0.0, 0.0, 0.0)]);
    let other = detector.create_group();
    let owned = detector.group(owner).unwrap().members()[0];
    let borrowed = detector.create_object(frame("borrowed", Shape::sphere(1.0), 0.0, 0.0, 0.0));
    detector.add_object(owner, borrowed);
    detector.add_object(other, owned);

    assert!(detector.destroy_group(owner));
    assert!(detector.object(owned).is_none());
    assert!(!detector.has_object(other, owned));
    assert!(detector.object(borrowed).unwrap().groups().is_empty());
    assert_eq!(detector.geometry_cache().len(), 1);

    let mut result = DetectionResult::new();
    assert!(!detector.detect(owner, &DetectionOption::default(), &mut result));
    assert!(!detector.destroy_group(owner));
}

#[test]
fn test_remove_all_objects() {
    let mut detector = CollisionDetector::default();
    let group = detector.create_group_with_frames([
        frame("a", Shape::sphere(1.0), 0.0, 0.0, 0.0),
        frame("b", Shape::sphere(1.0), 0.0, 0.0, 0.0),
    ]);
    let extra = detector.create_object(frame("c", Shape::sphere(1.0), 0.0, 0.0, 0.0));
    detector.add_object(group, extra);

    assert_eq!(detector.remove_all_objects(group), 3);
    assert!(detector.group(group).unwrap().is_empty());
    assert_eq!(detector.object_count(), 1);
    assert!(detector.object(extra).unwrap().groups().is_empty());
}

#[test]
fn test_default_option_follows_config() {
    let mut config = DetectorConfig::default();
    config.detection.max_num_contacts = 7;
    config.detection.enable_contact = false;
    let detector = CollisionDetector::new(config).unwrap();

    let option = detector.default_option();
    assert_eq!(option.max_num_contacts, 7);
    assert!(!option.enable_contact);
    assert!(option.collision_filter.is_none());
    assert_eq!(detector.type_name(), "octree");
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = DetectorConfig::default();
    config.tessellation.cylinder_slices = 2;
    assert!(CollisionDetector::new(config).is_err());
}
