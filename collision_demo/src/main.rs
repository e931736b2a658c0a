//! Collision Demo
//!
//! Builds a small tabletop scene, drops a ball onto a stack of crates and
//! reports the contacts found at every step:
//! - Self-collision of the scene group with the octree broad phase
//! - A gripper group checked against the scene through layer masks
//! - The same scene re-run on the brute-force backend for comparison
//!
//! Usage: `collision_demo [detector.toml]`

use std::sync::Arc;

use collision_engine::foundation::logging;
use collision_engine::foundation::math::constants::PI;
use collision_engine::prelude::*;

// Ball drop settings
const DROP_HEIGHT: f64 = 3.0;
const DROP_STEP: f64 = 0.35;
const NUM_STEPS: usize = 8;

const BALL_RADIUS: f64 = 0.5;
const CRATE_SIZE: f64 = 1.0;

struct Scene {
    ball: Arc<ShapeFrame>,
    frames: Vec<Arc<ShapeFrame>>,
}

fn build_scene() -> Scene {
    let crate_shape = Arc::new(Shape::cuboid(Vec3::repeat(CRATE_SIZE)));
    let plane = Arc::new(Shape::plane(Vec3::z(), 0.0));
    let ground = ShapeFrame::shared("ground", plane, Isometry3::identity());
    let lower =
        ShapeFrame::shared("crate_lower", Arc::clone(&crate_shape), translation(0.0, 0.0, 0.48));
    let upper = ShapeFrame::shared("crate_upper", crate_shape, translation(0.1, 0.0, 1.45));

    // Cylinder lying on its side
    let roll = Quat::from_axis_angle(&Vec3::x_axis(), PI / 2.0);
    let can = ShapeFrame::shared(
        "can",
        Arc::new(Shape::cylinder(0.3, 1.2)),
        pose(Vec3::new(2.0, 0.0, 0.29), roll),
    );
    let pebble = ShapeFrame::shared(
        "pebble",
        Arc::new(Shape::ellipsoid(Vec3::new(0.6, 0.4, 0.3))),
        translation(-1.5, 0.5, 0.12),
    );
    let ball = ShapeFrame::shared(
        "ball",
        Arc::new(Shape::sphere(BALL_RADIUS)),
        translation(0.1, 0.0, DROP_HEIGHT),
    );

    for frame in [&lower, &upper, &can, &pebble] {
        CollisionAspect::set_layers(frame, CollisionLayers::ENVIRONMENT, CollisionLayers::ALL);
    }
    CollisionAspect::set_layers(&ball, CollisionLayers::DYNAMIC, CollisionLayers::ALL);

    Scene {
        ball: Arc::clone(&ball),
        frames: vec![ground, lower, upper, can, pebble, ball],
    }
}

fn gripper_frames() -> Vec<Arc<ShapeFrame>> {
    let finger = Arc::new(Shape::cuboid(Vec3::new(0.1, 0.3, 0.6)));
    let frames = vec![
        ShapeFrame::shared("finger_left", Arc::clone(&finger), translation(-0.58, 0.0, 1.5)),
        ShapeFrame::shared("finger_right", finger, translation(0.9, 0.0, 1.5)),
    ];
    for frame in &frames {
        // Fingers only touch the environment, never the ball
        CollisionAspect::set_layers(frame, CollisionLayers::TOOL, CollisionLayers::ENVIRONMENT);
    }
    frames
}

fn report(detector: &CollisionDetector, label: &str, result: &DetectionResult) {
    let stats = detector.last_stats();
    log::info!(
        "{label}: {} contacts ({} candidate pairs, {} pruned)",
        result.len(),
        stats.candidate_pairs,
        stats.pruned_contacts
    );
    let name = |key: ObjectKey| {
        detector.object(key).map_or("<destroyed>", |o| o.shape_frame().name())
    };
    for contact in result {
        log::debug!(
            "  {} / {} at ({:.3}, {:.3}, {:.3}) normal ({:.2}, {:.2}, {:.2}) depth {:.4}",
            name(contact.object1),
            name(contact.object2),
            contact.point.x,
            contact.point.y,
            contact.point.z,
            contact.normal.x,
            contact.normal.y,
            contact.normal.z,
            contact.penetration_depth
        );
    }
}

fn run_drop(detector: &mut CollisionDetector) -> usize {
    let scene = build_scene();
    let group = detector.create_group_with_frames(scene.frames.iter().cloned());
    let gripper = detector.create_group_with_frames(gripper_frames());
    let option = detector.default_option();
    let layered = detector.default_option().with_filter(Arc::new(LayerFilter));

    let mut result = DetectionResult::new();
    let mut total = 0;
    for step in 0..NUM_STEPS {
        #[allow(clippy::cast_precision_loss)]
        let height = (step as f64).mul_add(-DROP_STEP, DROP_HEIGHT);
        scene.ball.set_world_transform(translation(0.1, 0.0, height));

        detector.detect(group, &option, &mut result);
        report(detector, &format!("step {step} (ball at z {height:.2})"), &result);
        total += result.len();
    }

    if detector.detect_between(group, gripper, &layered, &mut result) {
        report(detector, "gripper vs scene", &result);
    } else {
        log::info!("gripper is clear of the scene");
    }

    detector.destroy_group(gripper);
    detector.destroy_group(group);
    log::info!(
        "'{}' backend finished: {} contacts over {NUM_STEPS} steps, {} cached geometries left",
        detector.type_name(),
        total,
        detector.geometry_cache().len()
    );
    total
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    println!("=== Collision Demo ===");
    let mut detector = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("loading detector configuration from {path}");
            CollisionDetector::from_config_file(path)?
        }
        None => CollisionDetector::default(),
    };

    let octree_total = run_drop(&mut detector);

    let mut config = detector.config().clone();
    config.detector_type = DetectorType::BruteForce;
    let mut reference = CollisionDetector::new(config)?;
    let brute_total = run_drop(&mut reference);

    if octree_total == brute_total {
        println!("Both backends reported {octree_total} contacts");
    } else {
        log::warn!("backends disagree: octree {octree_total}, brute force {brute_total}");
    }
    Ok(())
}
