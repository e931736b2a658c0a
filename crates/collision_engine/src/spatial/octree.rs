//! Octree broad phase
//!
//! Divides the configured world volume into hierarchical regions. Each node
//! subdivides into 8 octants when its proxy count exceeds a threshold.
//! Proxies are stored by the centre of their bounds in exactly one node;
//! queries expand node bounds by the largest proxy half extent so proxies
//! that poke out of their storage node are still found. Proxies with
//! unbounded or out-of-world bounds live in a flat overflow list.

use super::broad_phase::{BroadPhase, Proxy};
use crate::config::OctreeSettings;
use crate::foundation::math::Vec3;
use crate::geometry::Aabb;

#[derive(Debug, Clone, Copy)]
struct OctreeEntry {
    index: usize,
    center: Vec3,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    bounds: Aabb,
    entries: Vec<OctreeEntry>,
    children: Option<Box<[OctreeNode; 8]>>,
    depth: u32,
}

impl OctreeNode {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    /// World-space bounds of this node
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Child nodes, if subdivided
    pub fn children(&self) -> Option<&[OctreeNode; 8]> {
        self.children.as_deref()
    }

    // Octant layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
    fn octant_index(&self, position: &Vec3) -> usize {
        let center = self.bounds.center();
        let x_bit = usize::from(position.x >= center.x);
        let y_bit = usize::from(position.y >= center.y);
        let z_bit = usize::from(position.z >= center.z);
        (z_bit << 2) | (y_bit << 1) | x_bit
    }

    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;
        let depth = self.depth + 1;

        self.children = Some(Box::new(std::array::from_fn(|octant| {
            let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
            let child_center = Vec3::new(
                center.x + quarter_extents.x * sign(1),
                center.y + quarter_extents.y * sign(2),
                center.z + quarter_extents.z * sign(4),
            );
            OctreeNode::new(Aabb::from_center_extents(child_center, quarter_extents), depth)
        })));

        // Redistribute existing entries to children
        for entry in std::mem::take(&mut self.entries) {
            let octant = self.octant_index(&entry.center);
            if let Some(children) = self.children.as_mut() {
                children[octant].entries.push(entry);
            }
        }
    }

    fn insert(&mut self, entry: OctreeEntry, settings: &OctreeSettings) -> bool {
        if !self.bounds.contains_point(entry.center) {
            return false;
        }

        if self.is_leaf() {
            let should_subdivide = self.entries.len() >= settings.max_entities_per_node
                && self.depth < settings.max_depth
                && self.bounds.extents().x > settings.min_node_size;

            if !should_subdivide {
                self.entries.push(entry);
                return true;
            }
            self.subdivide();
        }

        let octant = self.octant_index(&entry.center);
        match self.children.as_mut() {
            Some(children) => children[octant].insert(entry, settings),
            None => false,
        }
    }

    fn query(&self, aabb: &Aabb, margin: &Vec3, proxies: &[Proxy], out: &mut Vec<usize>) {
        let expanded = Aabb::new(self.bounds.min - margin, self.bounds.max + margin);
        if !expanded.intersects(aabb) {
            return;
        }

        out.extend(
            self.entries
                .iter()
                .filter(|entry| proxies[entry.index].aabb.intersects(aabb))
                .map(|entry| entry.index),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(aabb, margin, proxies, out);
            }
        }
    }

    fn count_entries(&self) -> usize {
        self.entries.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(OctreeNode::count_entries).sum())
    }

    fn max_depth_reached(&self) -> u32 {
        self.children.as_ref().map_or(self.depth, |children| {
            children.iter().map(OctreeNode::max_depth_reached).max().unwrap_or(self.depth)
        })
    }
}

/// Octree spatial partitioning over object proxies
#[derive(Debug, Clone)]
pub struct OctreeBroadPhase {
    root: OctreeNode,
    settings: OctreeSettings,
    proxies: Vec<Proxy>,
    overflow: Vec<usize>,
    // Largest half extent of any tree-stored proxy, per axis
    margin: Vec3,
}

impl OctreeBroadPhase {
    /// Create an empty octree covering the configured world bounds
    pub fn new(settings: OctreeSettings) -> Self {
        let bounds = Aabb::new(settings.world_min, settings.world_max);
        Self {
            root: OctreeNode::new(bounds, 0),
            settings,
            proxies: Vec::new(),
            overflow: Vec::new(),
            margin: Vec3::zeros(),
        }
    }

    /// Root node, for inspection
    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Settings in use
    pub fn settings(&self) -> &OctreeSettings {
        &self.settings
    }

    /// Number of proxies stored outside the tree
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Number of proxies stored in tree nodes
    pub fn tree_len(&self) -> usize {
        self.root.count_entries()
    }

    /// Deepest node depth
    pub fn depth(&self) -> u32 {
        self.root.max_depth_reached()
    }
}

impl Default for OctreeBroadPhase {
    fn default() -> Self {
        Self::new(OctreeSettings::default())
    }
}

impl BroadPhase for OctreeBroadPhase {
    fn rebuild(&mut self, proxies: &[Proxy]) {
        self.clear();
        self.proxies.extend_from_slice(proxies);

        for (index, proxy) in self.proxies.iter().enumerate() {
            if !proxy.aabb.is_finite() {
                self.overflow.push(index);
                continue;
            }
            let entry = OctreeEntry {
                index,
                center: proxy.aabb.center(),
            };
            if self.root.insert(entry, &self.settings) {
                self.margin = self.margin.sup(&proxy.aabb.extents());
            } else {
                log::trace!("proxy {:?} is outside the octree world bounds", proxy.key);
                self.overflow.push(index);
            }
        }

        if !self.overflow.is_empty() {
            log::debug!(
                "octree rebuilt: {} proxies in tree, {} in overflow, depth {}",
                self.proxies.len() - self.overflow.len(),
                self.overflow.len(),
                self.depth()
            );
        }
    }

    fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    fn query_indices(&self, aabb: &Aabb, out: &mut Vec<usize>) {
        let start = out.len();
        self.root.query(aabb, &self.margin, &self.proxies, out);
        out.extend(
            self.overflow
                .iter()
                .copied()
                .filter(|&i| self.proxies[i].aabb.intersects(aabb)),
        );
        out[start..].sort_unstable();
    }

    fn clear(&mut self) {
        self.root = OctreeNode::new(self.root.bounds, 0);
        self.proxies.clear();
        self.overflow.clear();
        self.margin = Vec3::zeros();
    }
}
