//! Math utilities and types
//!
//! Provides the double-precision math types used by the collision engine.
//! Poses are rigid (rotation + translation); scale lives on the shapes.

pub use nalgebra::{Matrix3, Translation3, Unit, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f64>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f64>;

/// Rigid world transform of a shape frame
pub type Isometry3 = nalgebra::Isometry3<f64>;

/// Build an isometry from a translation only
pub fn translation(x: f64, y: f64, z: f64) -> Isometry3 {
    Isometry3::translation(x, y, z)
}

/// Build an isometry from a translation and a rotation
pub fn pose(position: Vec3, rotation: Quat) -> Isometry3 {
    Isometry3::from_parts(Translation3::from(position), rotation)
}

/// Transform a vector-valued point by an isometry
pub fn transform_point(iso: &Isometry3, point: &Vec3) -> Vec3 {
    iso.rotation * point + iso.translation.vector
}

/// Map a world-space point into the local frame of an isometry
pub fn inverse_transform_point(iso: &Isometry3, point: &Vec3) -> Vec3 {
    iso.rotation.inverse() * (point - iso.translation.vector)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f64 = std::f64::consts::PI;

    /// 2 * Pi
    pub const TAU: f64 = 2.0 * PI;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_round_trip() {
        let iso = pose(
            Vec3::new(1.0, -2.0, 0.5),
            Quat::from_axis_angle(&Vec3::z_axis(), constants::PI * 0.5),
        );
        let p = Vec3::new(0.3, 0.7, -1.0);
        let world = transform_point(&iso, &p);
        let back = inverse_transform_point(&iso, &world);
        assert_relative_eq!(back, p, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_applies_before_translation() {
        let iso = pose(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), constants::PI * 0.5),
        );
        let world = transform_point(&iso, &Vec3::x());
        assert_relative_eq!(world, Vec3::new(10.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
