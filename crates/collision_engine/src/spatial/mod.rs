//! Broad-phase spatial indexing
//!
//! Provides the [`BroadPhase`] interface and the indices behind it: an
//! octree for scenes of any size and a brute-force reference.

mod broad_phase;
mod octree;

pub use broad_phase::{BroadPhase, BruteForceBroadPhase, PairCallback, Proxy};
pub use octree::{OctreeBroadPhase, OctreeNode};
