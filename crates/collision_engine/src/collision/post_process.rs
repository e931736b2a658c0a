//! Contact pruning
//!
//! Narrow-phase output for one pair is noisy: meshes report shared vertices
//! once per face and flat contact patches produce runs of colinear points.
//! Two passes thin that out before contacts reach the result:
//!
//! 1. a point closer than `3·ε²` to any *later* point is dropped;
//! 2. a surviving point that is colinear (cross-product norm below `ε²`) with
//!    any two later surviving points is dropped.
//!
//! Both passes only ever drop the lower-indexed point of a group, so of three
//! coincident points only the last survives. Survivors keep their order.

use crate::foundation::math::Vec3;

/// Base tolerance; the thresholds are derived from its square
pub const EPSILON: f64 = 1e-6;

/// Squared tolerance
pub const EPSILON_SQUARED: f64 = EPSILON * EPSILON;

/// Mark points to drop; `true` at index i means point i is redundant
pub fn mark_redundant(points: &[Vec3]) -> Vec<bool> {
    let n = points.len();
    let mut redundant = vec![false; n];

    for i in 0..n.saturating_sub(1) {
        if points[i + 1..]
            .iter()
            .any(|p| (points[i] - p).norm() < 3.0 * EPSILON_SQUARED)
        {
            redundant[i] = true;
        }
    }

    for i in 0..n {
        if redundant[i] {
            continue;
        }
        'scan: for j in i + 1..n {
            if redundant[j] {
                continue;
            }
            for k in j + 1..n {
                if redundant[k] {
                    continue;
                }
                let va = points[i] - points[j];
                let vb = points[i] - points[k];
                if va.cross(&vb).norm() < EPSILON_SQUARED {
                    redundant[i] = true;
                    break 'scan;
                }
            }
        }
    }

    redundant
}

/// Indices of the points that survive pruning, in order
pub fn surviving_indices(points: &[Vec3]) -> Vec<usize> {
    mark_redundant(points)
        .into_iter()
        .enumerate()
        .filter_map(|(i, redundant)| (!redundant).then_some(i))
        .collect()
}
