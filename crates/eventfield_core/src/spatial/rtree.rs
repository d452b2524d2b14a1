//! Bulk-loaded R-tree over points.
//!
//! Built with Sort-Tile-Recursive packing: entries are sorted into slabs
//! along x, each slab into slabs along y, then z, and cut into full nodes.
//! The same pass packs each upper level using node centers until a single
//! root remains.

use std::ops::Range;

use crate::math::{Aabb, Vec3};

/// Maximum children per node.
pub const MAX_NODE_ENTRIES: usize = 32;

/// A position tagged with the store index it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexedPoint {
    /// Event position.
    pub position: Vec3,
    /// Event index in the store.
    pub index: usize,
}

#[derive(Debug)]
enum NodeKind {
    Leaf(Vec<IndexedPoint>),
    Branch(Vec<usize>),
}

#[derive(Debug)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

/// Immutable, bulk-loaded R-tree.
#[derive(Debug, Default)]
pub struct RTree {
    /// Node arena; children refer to other nodes by position.
    nodes: Vec<Node>,
    root: Option<usize>,
    len: usize,
}

impl RTree {
    /// Packs `points` into a tree.
    #[must_use]
    pub fn bulk_load(mut points: Vec<IndexedPoint>) -> Self {
        let len = points.len();
        if points.is_empty() {
            return Self::default();
        }

        let mut nodes = Vec::new();
        let mut groups = Vec::new();
        tile(&mut points, &|p: &IndexedPoint| p.position, 0, 0, &mut groups);

        let mut level: Vec<usize> = groups
            .into_iter()
            .map(|range| {
                let entries = points[range].to_vec();
                let mut bounds = Aabb::EMPTY;
                for entry in &entries {
                    bounds.merge_point(entry.position);
                }
                nodes.push(Node { bounds, kind: NodeKind::Leaf(entries) });
                nodes.len() - 1
            })
            .collect();

        while level.len() > 1 {
            let mut groups = Vec::new();
            let centers = |id: &usize| nodes[*id].bounds.center();
            tile(&mut level, &centers, 0, 0, &mut groups);

            let mut parents = Vec::with_capacity(groups.len());
            for range in groups {
                let children = level[range].to_vec();
                let mut bounds = Aabb::EMPTY;
                for &child in &children {
                    bounds.merge(&nodes[child].bounds);
                }
                nodes.push(Node { bounds, kind: NodeKind::Branch(children) });
                parents.push(nodes.len() - 1);
            }
            level = parents;
        }

        Self { root: level.first().copied(), nodes, len }
    }

    /// Number of indexed points.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree holds no points.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bounds of everything in the tree.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.root.map_or(Aabb::EMPTY, |root| self.nodes[root].bounds)
    }

    /// Calls `visit` with the store index of every point inside `area`
    /// (faces inclusive).
    pub fn query(&self, area: &Aabb, mut visit: impl FnMut(usize)) {
        let Some(root) = self.root else {
            return;
        };

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.bounds.intersects(area) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    for entry in entries {
                        if area.contains(entry.position) {
                            visit(entry.index);
                        }
                    }
                }
                NodeKind::Branch(children) => stack.extend_from_slice(children),
            }
        }
    }
}

/// Sort-Tile-Recursive partition of `items` into runs of at most
/// `MAX_NODE_ENTRIES`, appended to `groups` as ranges offset by `base`.
fn tile<T>(
    items: &mut [T],
    center: &impl Fn(&T) -> Vec3,
    axis: usize,
    base: usize,
    groups: &mut Vec<Range<usize>>,
) {
    let n = items.len();
    if n <= MAX_NODE_ENTRIES || axis > 2 {
        for start in (0..n).step_by(MAX_NODE_ENTRIES) {
            groups.push(base + start..base + (start + MAX_NODE_ENTRIES).min(n));
        }
        return;
    }

    let pages = n.div_ceil(MAX_NODE_ENTRIES);
    let remaining_axes = (3 - axis) as f64;
    let slabs = (pages as f64).powf(remaining_axes.recip()).ceil().max(1.0) as usize;
    let slab_len = MAX_NODE_ENTRIES * pages.div_ceil(slabs);

    items.sort_unstable_by(|a, b| center(a).axis(axis).total_cmp(&center(b).axis(axis)));
    for (i, slab) in items.chunks_mut(slab_len).enumerate() {
        tile(slab, center, axis + 1, base + i * slab_len, groups);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<IndexedPoint> {
        let mut points = Vec::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    points.push(IndexedPoint {
                        position: Vec3::new(x as f32, y as f32, z as f32),
                        index: points.len(),
                    });
                }
            }
        }
        points
    }

    fn brute_force(points: &[IndexedPoint], area: &Aabb) -> Vec<usize> {
        let mut hits: Vec<usize> = points
            .iter()
            .filter(|p| area.contains(p.position))
            .map(|p| p.index)
            .collect();
        hits.sort_unstable();
        hits
    }

    #[test]
    fn test_empty_tree() {
        let tree = RTree::bulk_load(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.bounds().is_empty());

        let mut hits = 0;
        tree.query(&Aabb::around(Vec3::ZERO, 100.0), |_| hits += 1);
        assert_eq!(hits, 0);
    }

    #[test]
    fn test_single_leaf() {
        let points = grid(2);
        let tree = RTree::bulk_load(points.clone());
        assert_eq!(tree.len(), 8);

        let area = Aabb::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 1.0));
        let mut hits = Vec::new();
        tree.query(&area, |i| hits.push(i));
        hits.sort_unstable();
        assert_eq!(hits, brute_force(&points, &area));
    }

    #[test]
    fn test_multi_level_matches_brute_force() {
        // enough points for leaves, one branch level and a root
        let points = grid(20);
        let tree = RTree::bulk_load(points.clone());
        assert_eq!(tree.len(), 8000);
        assert_eq!(tree.bounds(), Aabb::new(Vec3::ZERO, Vec3::splat(19.0)));

        for area in [
            Aabb::around(Vec3::splat(10.0), 2.5),
            Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(19.0, 0.0, 19.0)),
            Aabb::around(Vec3::new(-5.0, 3.0, 3.0), 1.0),
            Aabb::around(Vec3::splat(19.0), 0.0),
        ] {
            let mut hits = Vec::new();
            tree.query(&area, |i| hits.push(i));
            hits.sort_unstable();
            assert_eq!(hits, brute_force(&points, &area));
        }
    }

    #[test]
    fn test_tile_respects_node_capacity() {
        let mut points = grid(11);
        let mut groups = Vec::new();
        tile(&mut points, &|p: &IndexedPoint| p.position, 0, 0, &mut groups);

        let total: usize = groups.iter().map(ExactSizeIterator::len).sum();
        assert_eq!(total, 11 * 11 * 11);
        assert!(groups.iter().all(|g| !g.is_empty() && g.len() <= MAX_NODE_ENTRIES));
    }
}
