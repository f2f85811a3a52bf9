//! Region quadtree over the logical canvas.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use stroke::Rect;

use crate::config::QuadTreeConfig;

#[derive(Debug, Clone)]
struct Entry<K> {
    key: K,
    rect: Rect,
}

#[derive(Debug, Clone)]
struct Node<K> {
    bounds: Rect,
    depth: u8,
    entries: Vec<Entry<K>>,
    children: Option<Box<[Node<K>; 4]>>,
}

impl<K: Clone + Eq> Node<K> {
    const fn new(bounds: Rect, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    const fn can_split(&self, config: &QuadTreeConfig) -> bool {
        self.depth < config.max_depth && self.bounds.width() > 1 && self.bounds.height() > 1
    }

    fn insert(&mut self, entry: Entry<K>, config: &QuadTreeConfig) {
        if let Some(children) = self.children.as_mut() {
            if !push_down(children, &entry, config) {
                self.entries.push(entry);
            }
            return;
        }

        if self.entries.len() < config.capacity || !self.can_split(config) {
            self.entries.push(entry);
            return;
        }

        self.split(config);
        self.insert(entry, config);
    }

    /// Turns a full leaf into four quadrants and pushes its entries down.
    ///
    /// Entries no child overlaps stay here.
    fn split(&mut self, config: &QuadTreeConfig) {
        let Rect {
            min_x,
            min_y,
            max_x,
            max_y,
        } = self.bounds;
        let mid_x = min_x + (max_x - min_x) / 2;
        let mid_y = min_y + (max_y - min_y) / 2;
        let depth = self.depth + 1;
        let mut children = Box::new([
            Self::new(Rect::new(min_x, min_y, mid_x, mid_y), depth),
            Self::new(Rect::new(mid_x + 1, min_y, max_x, mid_y), depth),
            Self::new(Rect::new(min_x, mid_y + 1, mid_x, max_y), depth),
            Self::new(Rect::new(mid_x + 1, mid_y + 1, max_x, max_y), depth),
        ]);

        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            if !push_down(&mut children, &entry, config) {
                self.entries.push(entry);
            }
        }
        self.children = Some(children);
    }

    fn query<Q>(&self, region: &Rect, out: &mut HashSet<K, Q>)
    where
        K: Hash,
        Q: std::hash::BuildHasher,
    {
        for entry in &self.entries {
            if entry.rect.intersects(region) {
                out.insert(entry.key.clone());
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects(region) {
                    child.query(region, out);
                }
            }
        }
    }

    fn remove(&mut self, key: &K, rect: &Rect) {
        self.entries.retain(|entry| entry.key != *key);
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.bounds.intersects(rect) {
                    child.remove(key, rect);
                }
            }
        }
    }

    fn count_nodes(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(Self::count_nodes).sum())
    }

    fn count_entries(&self) -> usize {
        self.entries.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(Self::count_entries).sum())
    }
}

/// Inserts `entry` into every child it overlaps. Returns `false` if none.
fn push_down<K: Clone + Eq>(
    children: &mut [Node<K>; 4],
    entry: &Entry<K>,
    config: &QuadTreeConfig,
) -> bool {
    let mut stored = false;
    for child in children.iter_mut() {
        if child.bounds.intersects(&entry.rect) {
            child.insert(entry.clone(), config);
            stored = true;
        }
    }
    stored
}

/// Quadtree of keyed boxes over `[0, 65535]²`.
///
/// An entry is stored in every leaf its box overlaps, so a region query only
/// visits overlapping nodes and deduplicates by key. Boxes are stored as
/// given; inflating them by a brush radius is left to the caller's query.
#[derive(Debug, Clone)]
pub struct QuadTree<K> {
    config: QuadTreeConfig,
    root: Node<K>,
    bounds: HashMap<K, Rect>,
}

impl<K: Clone + Eq + Hash> QuadTree<K> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new(config: QuadTreeConfig) -> Self {
        Self {
            config,
            root: Node::new(Rect::CANVAS, 0),
            bounds: HashMap::new(),
        }
    }

    /// Returns the tree configuration.
    #[must_use]
    pub const fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Inserts `key` with box `rect`, replacing any box it already had.
    pub fn insert(&mut self, key: K, rect: Rect) {
        self.remove(&key);
        self.bounds.insert(key.clone(), rect);
        self.root.insert(Entry { key, rect }, &self.config);
    }

    /// Removes `key`, returning its box. No-op if the key is unknown.
    pub fn remove(&mut self, key: &K) -> Option<Rect> {
        let rect = self.bounds.remove(key)?;
        self.root.remove(key, &rect);
        Some(rect)
    }

    /// Returns the box stored for `key`.
    #[must_use]
    pub fn bounds_of(&self, key: &K) -> Option<Rect> {
        self.bounds.get(key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.bounds.contains_key(key)
    }

    /// Every key whose box overlaps `region`, each once.
    #[must_use]
    pub fn query(&self, region: Rect) -> HashSet<K> {
        let mut out = HashSet::new();
        self.query_into(region, &mut out);
        out
    }

    /// Like [`QuadTree::query`], adding to an existing set.
    pub fn query_into<Q: std::hash::BuildHasher>(&self, region: Rect, out: &mut HashSet<K, Q>) {
        if self.root.bounds.intersects(&region) {
            self.root.query(&region, out);
        } else {
            // Boxes entirely off the canvas live at the root.
            for entry in &self.root.entries {
                if entry.rect.intersects(&region) {
                    out.insert(entry.key.clone());
                }
            }
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Removes every entry and collapses the tree to its root.
    pub fn clear(&mut self) {
        self.root = Node::new(Rect::CANVAS, 0);
        self.bounds.clear();
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }

    /// Stored entries across all nodes; at least [`QuadTree::len`] because
    /// boxes spanning quadrants are stored more than once.
    #[must_use]
    pub fn stored_entries(&self) -> usize {
        self.root.count_entries()
    }

    /// Iterates keys with their boxes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Rect)> {
        self.bounds.iter()
    }
}

impl<K: Clone + Eq + Hash> Default for QuadTree<K> {
    fn default() -> Self {
        Self::new(QuadTreeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(i: i32) -> Rect {
        // Disjoint 100x100 boxes on a 50-column grid.
        let x = (i % 50) * 1000;
        let y = (i / 50) * 1000;
        Rect::new(x, y, x + 99, y + 99)
    }

    #[test]
    fn empty_tree() {
        let tree: QuadTree<u32> = QuadTree::default();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.query(Rect::CANVAS).is_empty());
    }

    #[test]
    fn splits_when_capacity_exceeded() {
        let mut tree = QuadTree::new(QuadTreeConfig::for_testing());
        for i in 0..3 {
            tree.insert(i, cell(i * 20));
        }
        assert!(tree.node_count() > 1);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn never_splits_at_max_depth() {
        let mut tree = QuadTree::new(QuadTreeConfig {
            capacity: 1,
            max_depth: 0,
        });
        for i in 0..10 {
            tree.insert(i, cell(i));
        }
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.query(Rect::CANVAS).len(), 10);
    }

    #[test]
    fn spanning_entry_is_stored_in_several_leaves_and_returned_once() {
        let mut tree = QuadTree::new(QuadTreeConfig {
            capacity: 1,
            max_depth: 3,
        });
        tree.insert(1u32, Rect::new(10, 10, 20, 20));
        tree.insert(2, Rect::new(60_000, 60_000, 60_010, 60_010));
        // Crosses the root's midlines in both axes.
        tree.insert(3, Rect::new(30_000, 30_000, 40_000, 40_000));

        assert!(tree.stored_entries() > tree.len());
        let hits = tree.query(Rect::new(32_000, 32_000, 34_000, 34_000));
        assert_eq!(hits, HashSet::from([3]));
        assert_eq!(tree.query(Rect::CANVAS).len(), 3);
    }

    #[test]
    fn query_touching_edges_counts() {
        let mut tree = QuadTree::default();
        tree.insert("a", Rect::new(100, 100, 200, 200));
        assert!(tree.query(Rect::new(200, 200, 300, 300)).contains("a"));
        assert!(tree.query(Rect::new(201, 201, 300, 300)).is_empty());
    }

    #[test]
    fn remove_by_key() {
        let mut tree = QuadTree::new(QuadTreeConfig::for_testing());
        for i in 0..20 {
            tree.insert(i, cell(i));
        }
        assert_eq!(tree.remove(&5), Some(cell(5)));
        assert_eq!(tree.remove(&5), None);
        assert_eq!(tree.len(), 19);
        assert!(!tree.query(cell(5)).contains(&5));
        assert!(tree.query(cell(6)).contains(&6));
    }

    #[test]
    fn reinsert_replaces_box() {
        let mut tree = QuadTree::new(QuadTreeConfig::for_testing());
        tree.insert(1, cell(0));
        tree.insert(1, cell(30));
        assert_eq!(tree.len(), 1);
        assert!(tree.query(cell(0)).is_empty());
        assert_eq!(tree.bounds_of(&1), Some(cell(30)));
    }

    #[test]
    fn off_canvas_regions_still_find_overlaps() {
        let mut tree = QuadTree::default();
        tree.insert(1, Rect::new(0, 0, 5, 5));
        // Query inflated past the canvas edge.
        assert!(tree.query(Rect::new(-50, -50, 0, 0)).contains(&1));
        assert!(tree.query(Rect::new(-50, -50, -1, -1)).is_empty());
    }

    #[test]
    fn clear_resets_tree() {
        let mut tree = QuadTree::new(QuadTreeConfig::for_testing());
        for i in 0..20 {
            tree.insert(i, cell(i));
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.query(Rect::CANVAS).is_empty());
    }

    #[test]
    fn single_pixel_nodes_do_not_split() {
        let mut tree = QuadTree::new(QuadTreeConfig {
            capacity: 1,
            max_depth: u8::MAX,
        });
        for i in 0..4 {
            tree.insert(i, Rect::new(7, 7, 7, 7));
        }
        assert_eq!(tree.query(Rect::new(7, 7, 7, 7)).len(), 4);
    }
}
