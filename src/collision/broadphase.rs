use std::collections::HashSet;

use glam::Vec3;

use crate::{
    config::OctreeConfig,
    core::collider::OrientedBox,
    utils::allocator::EntityId,
};

/// Index of a node inside the octree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(u32);

impl NodeHandle {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// World-axis bounds of one body as seen by the broad phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProxy {
    pub id: EntityId,
    pub min: Vec3,
    pub max: Vec3,
    pub awake: bool,
}

impl BodyProxy {
    /// Worst-case axis-aligned bounds of an oriented box.
    pub fn from_box(obb: &OrientedBox, awake: bool) -> Self {
        let half = obb.world_half_extents();
        Self {
            id: obb.body,
            min: obb.center - half,
            max: obb.center + half,
            awake,
        }
    }

    /// Cubic bounds of a sphere, used for field-of-influence emitters.
    pub fn from_sphere(id: EntityId, center: Vec3, radius: f32, awake: bool) -> Self {
        Self {
            id,
            min: center - Vec3::splat(radius),
            max: center + Vec3::splat(radius),
            awake,
        }
    }

    fn overlaps(&self, min: Vec3, max: Vec3) -> bool {
        self.min.cmple(max).all() && self.max.cmpge(min).all()
    }
}

#[derive(Debug, Clone)]
struct OctreeNode {
    center: Vec3,
    half_size: Vec3,
    depth: u8,
    children: Option<[NodeHandle; 8]>,
    bodies: Vec<BodyProxy>,
    /// Bodies that entered this subtree.
    population: usize,
}

impl OctreeNode {
    fn new(center: Vec3, half_size: Vec3, depth: u8) -> Self {
        Self {
            center,
            half_size,
            depth,
            children: None,
            bodies: Vec::new(),
            population: 0,
        }
    }

    fn min(&self) -> Vec3 {
        self.center - self.half_size
    }

    fn max(&self) -> Vec3 {
        self.center + self.half_size
    }
}

/// Loose octree over a fixed volume, rebuilt every step.
///
/// Nodes live in an arena and reference each other by [`NodeHandle`], so
/// splitting and merging never invalidate handles held during traversal.
/// Bodies straddling octant boundaries are stored in every leaf they touch.
#[derive(Debug, Clone)]
pub struct Octree {
    config: OctreeConfig,
    nodes: Vec<OctreeNode>,
    free_nodes: Vec<NodeHandle>,
    root: NodeHandle,
}

impl Default for Octree {
    fn default() -> Self {
        Self::new(OctreeConfig::default())
    }
}

impl Octree {
    pub fn new(config: OctreeConfig) -> Self {
        let mut tree = Self {
            config,
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            root: NodeHandle(0),
        };
        tree.setup();
        tree
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Drops every node and body, leaving a single empty root.
    pub fn setup(&mut self) {
        self.nodes.clear();
        self.free_nodes.clear();
        self.nodes.push(OctreeNode::new(
            self.config.center,
            self.config.half_size,
            0,
        ));
        self.root = NodeHandle(0);
    }

    /// Inserts a body into every leaf its bounds touch. Bounds outside the
    /// volume are clamped onto its boundary cells.
    pub fn insert(&mut self, proxy: BodyProxy) {
        let root = &self.nodes[self.root.index()];
        let (lo, hi) = (root.min(), root.max());
        let clamped = BodyProxy {
            min: proxy.min.clamp(lo, hi),
            max: proxy.max.clamp(lo, hi),
            ..proxy
        };
        self.insert_into(self.root, clamped);
    }

    /// Removes a body from the tree, collapsing subtrees that fall below the
    /// merge threshold. Returns whether the body was present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.remove_from(self.root, id)
    }

    /// Unordered candidate pairs, each reported once with the lower handle
    /// first. Pairs of two sleeping bodies are skipped.
    pub fn candidate_pairs(&self) -> Vec<(EntityId, EntityId)> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        let mut stack = vec![self.root];

        while let Some(handle) = stack.pop() {
            let node = &self.nodes[handle.index()];
            if let Some(children) = node.children {
                stack.extend(children.iter().rev().copied());
                continue;
            }

            for (k, first) in node.bodies.iter().enumerate() {
                for second in &node.bodies[..k] {
                    if first.id == second.id || (!first.awake && !second.awake) {
                        continue;
                    }
                    let key = if first.id < second.id {
                        (first.id, second.id)
                    } else {
                        (second.id, first.id)
                    };
                    if seen.insert(key) {
                        pairs.push(key);
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.walk().filter(|node| node.children.is_none()).count()
    }

    /// Deepest level currently in use (the root is level 0).
    pub fn depth(&self) -> u8 {
        self.walk().map(|node| node.depth).max().unwrap_or(0)
    }

    fn walk(&self) -> impl Iterator<Item = &OctreeNode> + '_ {
        let mut stack = vec![self.root];
        std::iter::from_fn(move || {
            let handle = stack.pop()?;
            let node = &self.nodes[handle.index()];
            if let Some(children) = node.children {
                stack.extend(children.iter().copied());
            }
            Some(node)
        })
    }

    fn insert_into(&mut self, handle: NodeHandle, proxy: BodyProxy) {
        let node = &mut self.nodes[handle.index()];
        node.population += 1;

        match node.children {
            Some(children) => {
                for child in children {
                    let child_node = &self.nodes[child.index()];
                    if proxy.overlaps(child_node.min(), child_node.max()) {
                        self.insert_into(child, proxy);
                    }
                }
            }
            None => {
                node.bodies.push(proxy);
                if node.bodies.len() > self.config.split_threshold
                    && node.depth < self.config.max_depth
                {
                    self.split(handle);
                }
            }
        }
    }

    fn split(&mut self, handle: NodeHandle) {
        let (center, half_size, depth, bodies) = {
            let node = &mut self.nodes[handle.index()];
            (
                node.center,
                node.half_size,
                node.depth,
                std::mem::take(&mut node.bodies),
            )
        };
        log::trace!("octree split at depth {depth} ({} bodies)", bodies.len());

        let quarter = half_size * 0.5;
        let mut children = [NodeHandle(0); 8];
        for (octant, slot) in children.iter_mut().enumerate() {
            let offset = Vec3::new(
                if octant & 1 == 0 { -quarter.x } else { quarter.x },
                if octant & 2 == 0 { -quarter.y } else { quarter.y },
                if octant & 4 == 0 { -quarter.z } else { quarter.z },
            );
            *slot = self.allocate(OctreeNode::new(center + offset, quarter, depth + 1));
        }
        self.nodes[handle.index()].children = Some(children);

        for proxy in bodies {
            for child in children {
                let child_node = &self.nodes[child.index()];
                if proxy.overlaps(child_node.min(), child_node.max()) {
                    self.insert_into(child, proxy);
                }
            }
        }
    }

    fn remove_from(&mut self, handle: NodeHandle, id: EntityId) -> bool {
        let children = self.nodes[handle.index()].children;
        let found = match children {
            None => {
                let node = &mut self.nodes[handle.index()];
                match node.bodies.iter().position(|proxy| proxy.id == id) {
                    Some(index) => {
                        node.bodies.remove(index);
                        true
                    }
                    None => false,
                }
            }
            Some(children) => {
                let mut found = false;
                for child in children {
                    found |= self.remove_from(child, id);
                }
                found
            }
        };

        if found {
            let node = &mut self.nodes[handle.index()];
            node.population = node.population.saturating_sub(1);
            if node.children.is_some() && node.population < self.config.merge_threshold {
                self.merge(handle);
            }
        }
        found
    }

    fn merge(&mut self, handle: NodeHandle) {
        let mut gathered: Vec<BodyProxy> = Vec::new();
        if let Some(children) = self.nodes[handle.index()].children.take() {
            for child in children {
                self.release(child, &mut gathered);
            }
        }
        log::trace!(
            "octree merge at depth {} ({} bodies)",
            self.nodes[handle.index()].depth,
            gathered.len()
        );
        let node = &mut self.nodes[handle.index()];
        node.population = gathered.len();
        node.bodies = gathered;
    }

    /// Frees a subtree, collecting its bodies without duplicates.
    fn release(&mut self, handle: NodeHandle, gathered: &mut Vec<BodyProxy>) {
        let node = &mut self.nodes[handle.index()];
        let children = node.children.take();
        for proxy in std::mem::take(&mut node.bodies) {
            if !gathered.iter().any(|known| known.id == proxy.id) {
                gathered.push(proxy);
            }
        }
        if let Some(children) = children {
            for child in children {
                self.release(child, gathered);
            }
        }
        self.free_nodes.push(handle);
    }

    fn allocate(&mut self, node: OctreeNode) -> NodeHandle {
        match self.free_nodes.pop() {
            Some(handle) => {
                self.nodes[handle.index()] = node;
                handle
            }
            None => {
                self.nodes.push(node);
                NodeHandle(self.nodes.len() as u32 - 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(index: u32, center: Vec3, awake: bool) -> BodyProxy {
        BodyProxy {
            id: EntityId::from_index(index),
            min: center - Vec3::splat(0.5),
            max: center + Vec3::splat(0.5),
            awake,
        }
    }

    fn small_tree() -> Octree {
        Octree::new(OctreeConfig {
            half_size: Vec3::splat(16.0),
            ..OctreeConfig::default()
        })
    }

    #[test]
    fn overlapping_bodies_are_paired_once() {
        let mut tree = small_tree();
        tree.insert(cube(0, Vec3::ZERO, true));
        tree.insert(cube(1, Vec3::new(0.5, 0.0, 0.0), true));
        tree.insert(cube(2, Vec3::new(10.0, 10.0, 10.0), true));

        let pairs = tree.candidate_pairs();
        assert_eq!(pairs, vec![(EntityId::from_index(0), EntityId::from_index(1))]);
    }

    #[test]
    fn splits_above_threshold_and_keeps_straddlers_in_every_leaf() {
        let mut tree = small_tree();
        for i in 0..7 {
            tree.insert(cube(i, Vec3::new(-8.0 + i as f32 * 0.1, -8.0, -8.0), true));
        }
        // Straddles the root center, so it lands in all eight octants.
        tree.insert(cube(7, Vec3::ZERO, true));
        assert!(tree.leaf_count() >= 8);
        assert!(tree.depth() >= 1);

        let pairs = tree.candidate_pairs();
        let with_straddler = pairs
            .iter()
            .filter(|(a, b)| a.index() == 7 || b.index() == 7)
            .count();
        assert_eq!(with_straddler, 0);
        // The seven clustered cubes are all mutually paired exactly once.
        assert_eq!(pairs.len(), 7 * 6 / 2);
    }

    #[test]
    fn merges_when_population_drops() {
        let mut tree = small_tree();
        for i in 0..8 {
            tree.insert(cube(i, Vec3::new(-8.0 + i as f32 * 2.0, -8.0, -8.0), true));
        }
        let split_nodes = tree.node_count();
        assert!(split_nodes > 1);

        for i in 0..6 {
            assert!(tree.remove(EntityId::from_index(i)));
        }
        assert_eq!(tree.node_count(), 1);
        assert!(!tree.remove(EntityId::from_index(0)));
    }

    #[test]
    fn depth_is_bounded() {
        let mut tree = Octree::new(OctreeConfig {
            half_size: Vec3::splat(16.0),
            max_depth: 2,
            ..OctreeConfig::default()
        });
        for i in 0..40 {
            tree.insert(cube(i, Vec3::new(0.01 * i as f32 - 10.0, -10.0, -10.0), true));
        }
        assert!(tree.depth() <= 2);
        assert_eq!(tree.candidate_pairs().len(), 40 * 39 / 2);
    }

    #[test]
    fn sleeping_pairs_are_skipped_but_mixed_pairs_kept() {
        let mut tree = small_tree();
        tree.insert(cube(0, Vec3::ZERO, false));
        tree.insert(cube(1, Vec3::new(0.2, 0.0, 0.0), false));
        tree.insert(cube(2, Vec3::new(0.4, 0.0, 0.0), true));

        let pairs = tree.candidate_pairs();
        assert_eq!(
            pairs,
            vec![
                (EntityId::from_index(0), EntityId::from_index(2)),
                (EntityId::from_index(1), EntityId::from_index(2)),
            ]
        );
    }

    #[test]
    fn bodies_outside_the_volume_are_clamped_in() {
        let mut tree = small_tree();
        tree.insert(cube(0, Vec3::new(100.0, 0.0, 0.0), true));
        tree.insert(cube(1, Vec3::new(120.0, 0.0, 0.0), true));
        assert_eq!(tree.candidate_pairs().len(), 1);
    }

    #[test]
    fn setup_clears_everything() {
        let mut tree = small_tree();
        for i in 0..10 {
            tree.insert(cube(i, Vec3::splat(i as f32), true));
        }
        tree.setup();
        assert_eq!(tree.node_count(), 1);
        assert!(tree.candidate_pairs().is_empty());
    }
}
