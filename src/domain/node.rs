use std::fmt;

use generational_arena::Index;

use crate::domain::mark::Mark;
use crate::domain::policy::Matcher;
use crate::domain::tree::MarkedTree;

/// Arena slot for one tree element.
///
/// `prev` is the previous sibling, or the parent when this node is its
/// parent's first child. Only the root (and a node mid-move) has no `prev`.
#[derive(Debug)]
pub struct TreeNode<T> {
    pub(crate) mark: Mark,
    pub(crate) item: T,
    pub(crate) prev: Option<Index>,
    pub(crate) next: Option<Index>,
    pub(crate) child: Option<Index>,
}

impl<T> TreeNode<T> {
    pub(crate) fn new(mark: Mark, item: T) -> Self {
        Self {
            mark,
            item,
            prev: None,
            next: None,
            child: None,
        }
    }
}

/// Borrowed view of a node inside a [`MarkedTree`].
pub struct NodeRef<'a, T> {
    tree: &'a MarkedTree<T>,
    idx: Index,
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<'a, T> NodeRef<'a, T> {
    pub(crate) fn new(tree: &'a MarkedTree<T>, idx: Index) -> Self {
        Self { tree, idx }
    }

    pub(crate) fn index(&self) -> Index {
        self.idx
    }

    fn slot(&self) -> &'a TreeNode<T> {
        self.tree.slot(self.idx)
    }

    fn relative(&self, idx: Option<Index>) -> Option<NodeRef<'a, T>> {
        idx.map(|idx| NodeRef::new(self.tree, idx))
    }

    pub fn mark(&self) -> Mark {
        self.slot().mark
    }

    pub fn item(&self) -> &'a T {
        &self.slot().item
    }

    /// Previous sibling, or the parent if this is a first child.
    pub fn prev(&self) -> Option<NodeRef<'a, T>> {
        self.relative(self.slot().prev)
    }

    pub fn next(&self) -> Option<NodeRef<'a, T>> {
        self.relative(self.slot().next)
    }

    /// First child.
    pub fn child(&self) -> Option<NodeRef<'a, T>> {
        self.relative(self.slot().child)
    }

    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.relative(self.tree.parent_index(self.idx))
    }

    pub fn is_root(&self) -> bool {
        self.idx == self.tree.root_index()
    }

    pub fn is_first_child(&self) -> bool {
        self.tree.is_first_child(self.idx)
    }

    /// Immediate children, first to last.
    pub fn children(&self) -> Vec<NodeRef<'a, T>> {
        let mut children = Vec::new();
        let mut cursor = self.child();
        while let Some(child) = cursor {
            cursor = child.next();
            children.push(child);
        }
        children
    }

    pub fn child_items(&self) -> Vec<&'a T> {
        self.children().into_iter().map(|child| child.item()).collect()
    }

    pub fn child_items_matching<M: Matcher<T>>(&self, matcher: M) -> Vec<&'a T> {
        self.children()
            .into_iter()
            .map(|child| child.item())
            .filter(|item| matcher.matches(item))
            .collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("mark", &self.mark())
            .field("item", self.item())
            .finish()
    }
}

/// Two views are equal when they address the same node of the same tree.
impl<T> PartialEq for NodeRef<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.idx == other.idx
    }
}

impl<T> Eq for NodeRef<'_, T> {}

/// Subtree handed back by [`MarkedTree::remove`].
///
/// Owns the removed items as a flat pre-order list, so dropping, cloning or
/// comparing a subtree of any depth never recurses. The first entry is the
/// detached root; children keep their original order and marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedNode<T> {
    entries: Vec<DetachedEntry<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DetachedEntry<T> {
    mark: Mark,
    item: T,
    /// Levels below the detached root
    depth: usize,
}

impl<T> DetachedNode<T> {
    /// Starts a subtree at its root; further nodes follow in pre-order.
    pub(crate) fn new(mark: Mark, item: T) -> Self {
        Self {
            entries: vec![DetachedEntry {
                mark,
                item,
                depth: 0,
            }],
        }
    }

    pub(crate) fn push(&mut self, depth: usize, mark: Mark, item: T) {
        self.entries.push(DetachedEntry { mark, item, depth });
    }

    fn head(&self) -> &DetachedEntry<T> {
        &self.entries[0]
    }

    pub fn mark(&self) -> Mark {
        self.head().mark
    }

    pub fn item(&self) -> &T {
        &self.head().item
    }

    /// Items of the detached root's immediate children, in order.
    pub fn child_items(&self) -> Vec<&T> {
        self.entries
            .iter()
            .filter(|entry| entry.depth == 1)
            .map(|entry| &entry.item)
            .collect()
    }

    /// Nodes in this subtree, the detached root included.
    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    /// Marks in pre-order.
    pub fn marks(&self) -> Vec<Mark> {
        self.entries.iter().map(|entry| entry.mark).collect()
    }

    /// `(depth, mark, item)` in pre-order; the detached root has depth 0.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Mark, &T)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.depth, entry.mark, &entry.item))
    }

    /// Hands the items back in pre-order, paired with their marks.
    pub fn into_items(self) -> Vec<(Mark, T)> {
        self.entries
            .into_iter()
            .map(|entry| (entry.mark, entry.item))
            .collect()
    }
}
