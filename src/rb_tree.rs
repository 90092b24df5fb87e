//! RedBlackTree: ordered storage with arena-allocated nodes.
//!
//! Nodes are addressed by generational slot keys; `parent` is a plain key
//! used for walking upward and never owns anything. Insert and delete
//! rebalancing run as loops over the ancestor chain, one named case per
//! iteration, with the left/right mirror images folded together by
//! [`Side`].

use crate::dictionary::{Dictionary, Entry};
use crate::error::DictError;
use crate::hashing::hash_of;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, trace};
use slotmap::{new_key_type, SlotMap};
use std::io;
use thiserror::Error;

new_key_type! {
    struct NodeKey;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::Red => "Red",
            Color::Black => "Black",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug)]
struct TreeNode<K, V> {
    entry: Entry<K, V>,
    left: Option<NodeKey>,
    right: Option<NodeKey>,
    parent: Option<NodeKey>,
    red: bool,
}

impl<K, V> TreeNode<K, V> {
    fn color(&self) -> Color {
        if self.red {
            Color::Red
        } else {
            Color::Black
        }
    }
}

/// Stable reference to one node of a [`RedBlackTree`]. Resolves to `None`
/// once the node has been removed, even if its slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeHandle(NodeKey);

impl NodeHandle {
    pub fn key<'a, K, V, S>(&self, tree: &'a RedBlackTree<K, V, S>) -> Option<&'a K> {
        tree.nodes.get(self.0).map(|n| n.entry.key())
    }

    pub fn value<'a, K, V, S>(&self, tree: &'a RedBlackTree<K, V, S>) -> Option<&'a V> {
        tree.nodes.get(self.0).map(|n| n.entry.value())
    }

    pub fn value_mut<'a, K, V, S>(&self, tree: &'a mut RedBlackTree<K, V, S>) -> Option<&'a mut V> {
        tree.nodes.get_mut(self.0).map(|n| n.entry.value_mut())
    }

    pub fn color<K, V, S>(&self, tree: &RedBlackTree<K, V, S>) -> Option<Color> {
        tree.nodes.get(self.0).map(TreeNode::color)
    }

    pub fn hash<K, V, S>(&self, tree: &RedBlackTree<K, V, S>) -> Option<u32> {
        tree.nodes.get(self.0).map(|n| n.entry.hash())
    }
}

/// A broken structural property reported by [`RedBlackTree::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeViolation {
    #[error("root node is red")]
    RedRoot,
    #[error("red node has a red child")]
    RedChildOfRed,
    #[error("black height differs between subtrees ({left} vs {right})")]
    BlackHeight { left: usize, right: usize },
    #[error("child does not link back to its parent")]
    ParentLink,
    #[error("link points at a node that is not stored")]
    DanglingLink,
    #[error("keys are not in ascending in-order sequence")]
    Order,
    #[error("{reachable} nodes reachable from the root but {stored} stored")]
    Unreachable { reachable: usize, stored: usize },
}

#[inline]
fn compare<Q>(a: &Q, b: &Q) -> Result<Ordering, DictError>
where
    Q: ?Sized + PartialOrd,
{
    a.partial_cmp(b).ok_or(DictError::IncomparableKey)
}

/// Keys must order against themselves before they are compared with
/// anything stored; rejects NaN-like keys up front.
#[inline]
fn ensure_ordered<Q>(q: &Q) -> Result<(), DictError>
where
    Q: ?Sized + PartialOrd,
{
    if q.partial_cmp(q).is_none() {
        debug!("rejecting key without a total order");
        return Err(DictError::IncomparableKey);
    }
    Ok(())
}

/// Red-black tree keyed by `PartialOrd` comparison.
pub struct RedBlackTree<K, V, S = DefaultHashBuilder> {
    hasher: S,
    root: Option<NodeKey>,
    nodes: SlotMap<NodeKey, TreeNode<K, V>>,
}

impl<K, V> RedBlackTree<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V> Default for RedBlackTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> RedBlackTree<K, V, S> {
    /// The hasher only fills the cached hash of each entry; placement is
    /// decided by key order.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            root: None,
            nodes: SlotMap::with_key(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeHandle> {
        self.root.map(NodeHandle)
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeKey, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((k, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let n = &self.nodes[k];
            stack.extend(n.left.map(|c| (c, depth + 1)));
            stack.extend(n.right.map(|c| (c, depth + 1)));
        }
        deepest
    }

    /// Pre-order walk from the root.
    pub fn preorder(&self) -> Preorder<'_, K, V> {
        Preorder {
            nodes: &self.nodes,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Pre-order walk of the subtree rooted at `from`; empty for a stale handle.
    pub fn preorder_from(&self, from: NodeHandle) -> Preorder<'_, K, V> {
        Preorder {
            nodes: &self.nodes,
            stack: Some(from.0)
                .filter(|k| self.nodes.contains_key(*k))
                .into_iter()
                .collect(),
        }
    }

    /// Print the pre-order walk, one `TreeNode<Color, key:value>` per line.
    pub fn write_preorder<W: io::Write>(&self, out: &mut W) -> io::Result<()>
    where
        K: fmt::Display,
        V: fmt::Display,
    {
        for node in self.preorder() {
            writeln!(out, "{}", node)?;
        }
        Ok(())
    }

    /// Detach the node `handle` refers to and return its key and value.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Option<(K, V)> {
        if !self.nodes.contains_key(handle.0) {
            return None;
        }
        self.delete_node(handle.0).map(Entry::into_parts)
    }

    #[inline]
    fn child(&self, k: NodeKey, side: Side) -> Option<NodeKey> {
        let n = &self.nodes[k];
        match side {
            Side::Left => n.left,
            Side::Right => n.right,
        }
    }

    #[inline]
    fn set_child(&mut self, k: NodeKey, side: Side, c: Option<NodeKey>) {
        let n = &mut self.nodes[k];
        match side {
            Side::Left => n.left = c,
            Side::Right => n.right = c,
        }
    }

    #[inline]
    fn parent_of(&self, k: NodeKey) -> Option<NodeKey> {
        self.nodes[k].parent
    }

    #[inline]
    fn set_parent(&mut self, k: NodeKey, p: Option<NodeKey>) {
        self.nodes[k].parent = p;
    }

    /// Absent children count as black.
    #[inline]
    fn is_red(&self, k: Option<NodeKey>) -> bool {
        k.is_some_and(|k| self.nodes[k].red)
    }

    #[inline]
    fn set_red(&mut self, k: NodeKey, red: bool) {
        self.nodes[k].red = red;
    }

    #[inline]
    fn side_of(&self, child: NodeKey, parent: NodeKey) -> Side {
        if self.nodes[parent].left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Point whatever referenced `old` from `parent` (or the root slot) at `new`.
    fn replace_child(&mut self, parent: Option<NodeKey>, old: NodeKey, new: Option<NodeKey>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let side = self.side_of(old, p);
                self.set_child(p, side, new);
            }
        }
    }

    /// Move `x` one level down towards `down`, promoting its child on the
    /// opposite side into its place.
    fn rotate(&mut self, x: NodeKey, down: Side) {
        let up = down.opposite();
        let promoted = self.child(x, up);
        debug_assert!(promoted.is_some(), "rotation needs a child to promote");
        let Some(r) = promoted else {
            return;
        };
        let inner = self.child(r, down);
        self.set_child(x, up, inner);
        if let Some(i) = inner {
            self.set_parent(i, Some(x));
        }
        let xp = self.parent_of(x);
        self.set_parent(r, xp);
        self.replace_child(xp, x, Some(r));
        self.set_child(r, down, Some(x));
        self.set_parent(x, Some(r));
    }

    fn fix_after_insert(&mut self, mut x: NodeKey) {
        loop {
            let Some(mut xp) = self.parent_of(x) else {
                self.set_red(x, false);
                return;
            };
            if !self.nodes[xp].red {
                return;
            }
            let Some(xpp) = self.parent_of(xp) else {
                return;
            };
            let side = self.side_of(xp, xpp);
            let uncle = self.child(xpp, side.opposite());
            if let Some(u) = uncle.filter(|&u| self.nodes[u].red) {
                self.set_red(u, false);
                self.set_red(xp, false);
                self.set_red(xpp, true);
                x = xpp;
                continue;
            }
            // Inner grandchild: rotate it to the outside first.
            if self.child(xp, side.opposite()) == Some(x) {
                self.rotate(xp, side);
                core::mem::swap(&mut x, &mut xp);
            }
            self.set_red(xp, false);
            self.set_red(xpp, true);
            self.rotate(xpp, side.opposite());
        }
    }

    fn subtree_min(&self, mut k: NodeKey) -> NodeKey {
        while let Some(l) = self.nodes[k].left {
            k = l;
        }
        k
    }

    /// Hang `v` where `u` hung; `u`'s own links are left untouched.
    fn transplant(&mut self, u: NodeKey, v: Option<NodeKey>) {
        let up = self.parent_of(u);
        self.replace_child(up, u, v);
        if let Some(v) = v {
            self.set_parent(v, up);
        }
    }

    fn delete_node(&mut self, z: NodeKey) -> Option<Entry<K, V>> {
        let (zl, zr, z_red) = {
            let n = &self.nodes[z];
            (n.left, n.right, n.red)
        };
        let mut removed_red = z_red;
        // `x` takes the removed position and may be absent, so its parent
        // is tracked separately.
        let (x, x_parent);
        match (zl, zr) {
            (None, _) => {
                x = zr;
                x_parent = self.parent_of(z);
                self.transplant(z, zr);
            }
            (Some(_), None) => {
                x = zl;
                x_parent = self.parent_of(z);
                self.transplant(z, zl);
            }
            (Some(l), Some(r)) => {
                let y = self.subtree_min(r);
                removed_red = self.nodes[y].red;
                x = self.nodes[y].right;
                if self.parent_of(y) == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.parent_of(y);
                    self.transplant(y, x);
                    self.set_child(y, Side::Right, Some(r));
                    self.set_parent(r, Some(y));
                }
                self.transplant(z, Some(y));
                self.set_child(y, Side::Left, Some(l));
                self.set_parent(l, Some(y));
                self.set_red(y, z_red);
            }
        }
        if !removed_red {
            trace!("black node removed; rebalancing");
            self.fix_after_delete(x, x_parent);
        }
        self.nodes.remove(z).map(|n| n.entry)
    }

    fn fix_after_delete(&mut self, mut x: Option<NodeKey>, mut parent: Option<NodeKey>) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else {
                break;
            };
            let side = if self.child(p, Side::Left) == x {
                Side::Left
            } else {
                Side::Right
            };
            let far_side = side.opposite();
            // A doubly black position always has a sibling while black
            // heights agree.
            let Some(mut s) = self.child(p, far_side) else {
                break;
            };

            // Red sibling: rotate it above the parent so the new sibling is black.
            if self.nodes[s].red {
                self.set_red(s, false);
                self.set_red(p, true);
                self.rotate(p, side);
                match self.child(p, far_side) {
                    Some(n) => s = n,
                    None => break,
                }
            }

            let near = self.child(s, side);
            let far = self.child(s, far_side);

            // Both nephews black: push the extra black up a level.
            if !self.is_red(near) && !self.is_red(far) {
                self.set_red(s, true);
                x = Some(p);
                parent = self.parent_of(p);
                continue;
            }

            // Only the near nephew red: turn it into the far-nephew case.
            if !self.is_red(far) {
                if let Some(n) = near {
                    self.set_red(n, false);
                }
                self.set_red(s, true);
                self.rotate(s, far_side);
                match self.child(p, far_side) {
                    Some(n) => s = n,
                    None => break,
                }
            }

            // Far nephew red: one rotation at the parent finishes the job.
            let p_red = self.nodes[p].red;
            self.set_red(s, p_red);
            self.set_red(p, false);
            if let Some(f) = self.child(s, far_side) {
                self.set_red(f, false);
            }
            self.rotate(p, side);
            x = self.root;
            break;
        }
        if let Some(x) = x {
            self.set_red(x, false);
        }
    }
}

impl<K, V, S> RedBlackTree<K, V, S>
where
    K: PartialOrd,
{
    fn find_key<Q>(&self, q: &Q) -> Result<Option<NodeKey>, DictError>
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        ensure_ordered(q)?;
        let mut cursor = self.root;
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            cursor = match compare(q, node.entry.key().borrow())? {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Ok(Some(k)),
            };
        }
        Ok(None)
    }

    pub fn find<Q>(&self, q: &Q) -> Result<Option<NodeHandle>, DictError>
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        Ok(self.find_key(q)?.map(NodeHandle))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> Result<bool, DictError>
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        Ok(self.find_key(q)?.is_some())
    }

    pub fn get<Q>(&self, q: &Q) -> Result<Option<&V>, DictError>
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        Ok(self.find_key(q)?.map(|k| self.nodes[k].entry.value()))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<Option<&mut V>, DictError>
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        Ok(match self.find_key(q)? {
            Some(k) => Some(self.nodes[k].entry.value_mut()),
            None => None,
        })
    }

    /// Insert with a caller-supplied cached hash. An equal key has its value
    /// replaced in place, leaving the shape of the tree untouched.
    pub fn insert_hashed(&mut self, hash: u32, key: K, value: V) -> Result<Option<V>, DictError> {
        ensure_ordered(&key)?;
        let mut parent = None;
        let mut side = Side::Left;
        let mut cursor = self.root;
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            parent = Some(k);
            match compare(&key, node.entry.key())? {
                Ordering::Less => {
                    side = Side::Left;
                    cursor = node.left;
                }
                Ordering::Greater => {
                    side = Side::Right;
                    cursor = node.right;
                }
                Ordering::Equal => return Ok(Some(self.nodes[k].entry.set_value(value))),
            }
        }

        let k = self.nodes.insert(TreeNode {
            entry: Entry::new(hash, key, value),
            left: None,
            right: None,
            parent,
            red: true,
        });
        match parent {
            None => self.root = Some(k),
            Some(p) => self.set_child(p, side, Some(k)),
        }
        self.fix_after_insert(k);
        Ok(None)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Result<Option<V>, DictError>
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        let Some(k) = self.find_key(q)? else {
            return Ok(None);
        };
        Ok(self.delete_node(k).map(|e| e.into_parts().1))
    }

    /// Check every red-black property plus ordering and link symmetry,
    /// returning the black height (absent leaves count as one).
    pub fn validate(&self) -> Result<usize, TreeViolation> {
        if let Some(r) = self.root {
            let root = self.nodes.get(r).ok_or(TreeViolation::DanglingLink)?;
            if root.red {
                return Err(TreeViolation::RedRoot);
            }
            if root.parent.is_some() {
                return Err(TreeViolation::ParentLink);
            }
        }
        let mut reachable = 0;
        let height = self.check_subtree(self.root, None, None, &mut reachable)?;
        if reachable != self.nodes.len() {
            return Err(TreeViolation::Unreachable {
                reachable,
                stored: self.nodes.len(),
            });
        }
        Ok(height)
    }

    fn check_subtree<'a>(
        &'a self,
        node: Option<NodeKey>,
        lo: Option<&'a K>,
        hi: Option<&'a K>,
        reachable: &mut usize,
    ) -> Result<usize, TreeViolation> {
        let Some(k) = node else {
            return Ok(1);
        };
        let n = self.nodes.get(k).ok_or(TreeViolation::DanglingLink)?;
        *reachable += 1;

        let key = n.entry.key();
        if lo.is_some_and(|lo| !(lo < key)) || hi.is_some_and(|hi| !(key < hi)) {
            return Err(TreeViolation::Order);
        }
        for c in [n.left, n.right].into_iter().flatten() {
            let child = self.nodes.get(c).ok_or(TreeViolation::DanglingLink)?;
            if child.parent != Some(k) {
                return Err(TreeViolation::ParentLink);
            }
            if n.red && child.red {
                return Err(TreeViolation::RedChildOfRed);
            }
        }

        let left = self.check_subtree(n.left, lo, Some(key), reachable)?;
        let right = self.check_subtree(n.right, Some(key), hi, reachable)?;
        if left != right {
            return Err(TreeViolation::BlackHeight { left, right });
        }
        Ok(left + usize::from(!n.red))
    }
}

impl<K, V, S> RedBlackTree<K, V, S>
where
    K: PartialOrd + Hash,
    S: BuildHasher,
{
    /// Insert or update, caching the key's hash from the tree's hasher.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, DictError> {
        let hash = hash_of(&self.hasher, &key);
        self.insert_hashed(hash, key, value)
    }
}

impl<K, V, S> Dictionary<K, V> for RedBlackTree<K, V, S>
where
    K: PartialOrd + Hash,
    S: BuildHasher,
{
    fn len(&self) -> usize {
        RedBlackTree::len(self)
    }

    fn contains_key(&self, key: &K) -> Result<bool, DictError> {
        RedBlackTree::contains_key(self, key)
    }

    fn get(&self, key: &K) -> Result<Option<&V>, DictError> {
        RedBlackTree::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, DictError> {
        RedBlackTree::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<Option<V>, DictError> {
        RedBlackTree::remove(self, key)
    }
}

impl<K, V, S> fmt::Debug for RedBlackTree<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedBlackTree")
            .field("len", &self.nodes.len())
            .field("height", &self.height())
            .finish()
    }
}

/// A node visited by [`Preorder`].
pub struct TreeNodeRef<'a, K, V> {
    key: NodeKey,
    node: &'a TreeNode<K, V>,
}

impl<'a, K, V> TreeNodeRef<'a, K, V> {
    pub fn handle(&self) -> NodeHandle {
        NodeHandle(self.key)
    }

    pub fn entry(&self) -> &'a Entry<K, V> {
        &self.node.entry
    }

    pub fn key(&self) -> &'a K {
        self.node.entry.key()
    }

    pub fn value(&self) -> &'a V {
        self.node.entry.value()
    }

    pub fn color(&self) -> Color {
        self.node.color()
    }
}

impl<'a, K: fmt::Display, V: fmt::Display> fmt::Display for TreeNodeRef<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TreeNode<{}, {}:{}>",
            self.node.color(),
            self.node.entry.key(),
            self.node.entry.value()
        )
    }
}

/// Lazy pre-order traversal driven by an explicit stack.
pub struct Preorder<'a, K, V> {
    nodes: &'a SlotMap<NodeKey, TreeNode<K, V>>,
    stack: Vec<NodeKey>,
}

impl<'a, K, V> Iterator for Preorder<'a, K, V> {
    type Item = TreeNodeRef<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.stack.pop()?;
        let nodes = self.nodes;
        let node = &nodes[k];
        self.stack.extend(node.right);
        self.stack.extend(node.left);
        Some(TreeNodeRef { key: k, node })
    }
}
