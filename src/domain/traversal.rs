//! Pre-order traversal, search, child queries and bulk updates.
//!
//! None of these depend on the chain mode.

use generational_arena::Index;
use itertools::Itertools;
use tracing::instrument;

use crate::domain::mark::Mark;
use crate::domain::node::NodeRef;
use crate::domain::policy::{Matcher, Updater};
use crate::domain::tree::MarkedTree;

/// Depth-first pre-order walk over one subtree.
///
/// The start node is yielded first; its own siblings are never visited.
pub struct PreOrderIterator<'a, T> {
    tree: &'a MarkedTree<T>,
    start: Index,
    stack: Vec<Index>,
}

impl<'a, T> PreOrderIterator<'a, T> {
    fn new(tree: &'a MarkedTree<T>, start: Option<Index>) -> Self {
        Self {
            tree,
            start: start.unwrap_or_else(|| tree.root_index()),
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a, T> Iterator for PreOrderIterator<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let node = self.tree.slot(current);
        // Sibling goes under the child so the child is visited first
        if current != self.start {
            if let Some(next) = node.next {
                self.stack.push(next);
            }
        }
        if let Some(child) = node.child {
            self.stack.push(child);
        }
        Some(NodeRef::new(self.tree, current))
    }
}

impl<'a, T> IntoIterator for &'a MarkedTree<T> {
    type Item = NodeRef<'a, T>;
    type IntoIter = PreOrderIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> MarkedTree<T> {
    /// Whole tree in pre-order, root first.
    pub fn iter(&self) -> PreOrderIterator<'_, T> {
        PreOrderIterator::new(self, Some(self.root_index()))
    }

    /// Subtree at `mark` in pre-order; empty for an unknown mark.
    pub fn iter_from(&self, mark: Mark) -> PreOrderIterator<'_, T> {
        PreOrderIterator::new(self, self.index_of(mark))
    }

    /// Registered marks, ascending. The root is not included.
    pub fn marks(&self) -> Vec<Mark> {
        self.registered().map(|(mark, _)| mark).sorted().collect()
    }

    /// Number of levels, counting the root level.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root_index(), 1)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            let mut cursor = self.slot(idx).child;
            while let Some(child) = cursor {
                stack.push((child, depth + 1));
                cursor = self.slot(child).next;
            }
        }
        max_depth
    }

    /// Nodes without children, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaves(&self) -> Vec<NodeRef<'_, T>> {
        self.iter().filter(|node| node.child().is_none()).collect()
    }

    /// First node in pre-order from the root whose item matches.
    #[instrument(level = "debug", skip_all)]
    pub fn find_first_node<M: Matcher<T>>(&self, matcher: M) -> Option<NodeRef<'_, T>> {
        self.iter().find(|node| matcher.matches(node.item()))
    }

    /// First match in pre-order from `start_mark`, the start node included.
    #[instrument(level = "debug", skip(self, matcher))]
    pub fn find_first_node_from<M: Matcher<T>>(
        &self,
        start_mark: Mark,
        matcher: M,
    ) -> Option<NodeRef<'_, T>> {
        self.iter_from(start_mark)
            .find(|node| matcher.matches(node.item()))
    }

    /// Every match in pre-order from the root.
    #[instrument(level = "debug", skip_all)]
    pub fn find_nodes<M: Matcher<T>>(&self, matcher: M) -> Vec<NodeRef<'_, T>> {
        self.iter()
            .filter(|node| matcher.matches(node.item()))
            .collect()
    }

    /// Every match in pre-order from `start_mark`; empty for an unknown mark.
    #[instrument(level = "debug", skip(self, matcher))]
    pub fn find_nodes_from<M: Matcher<T>>(
        &self,
        start_mark: Mark,
        matcher: M,
    ) -> Vec<NodeRef<'_, T>> {
        self.iter_from(start_mark)
            .filter(|node| matcher.matches(node.item()))
            .collect()
    }

    /// Immediate children of `parent_mark`.
    pub fn get_child_nodes(&self, parent_mark: Mark) -> Vec<NodeRef<'_, T>> {
        self.get_node(parent_mark)
            .map(|parent| parent.children())
            .unwrap_or_default()
    }

    pub fn get_child_nodes_matching<M: Matcher<T>>(
        &self,
        parent_mark: Mark,
        matcher: M,
    ) -> Vec<NodeRef<'_, T>> {
        self.get_child_nodes(parent_mark)
            .into_iter()
            .filter(|node| matcher.matches(node.item()))
            .collect()
    }

    pub fn get_child_items(&self, parent_mark: Mark) -> Vec<&T> {
        self.get_node(parent_mark)
            .map(|parent| parent.child_items())
            .unwrap_or_default()
    }

    pub fn get_child_items_matching<M: Matcher<T>>(&self, parent_mark: Mark, matcher: M) -> Vec<&T> {
        self.get_node(parent_mark)
            .map(|parent| parent.child_items_matching(matcher))
            .unwrap_or_default()
    }

    /// First immediate child of `parent_mark` whose item matches.
    pub fn get_first_child_node<M: Matcher<T>>(
        &self,
        parent_mark: Mark,
        matcher: M,
    ) -> Option<NodeRef<'_, T>> {
        self.get_child_nodes(parent_mark)
            .into_iter()
            .find(|node| matcher.matches(node.item()))
    }

    /// Applies `updater` to the root and every registered node.
    ///
    /// The root goes first; the rest follow mark-table order, not tree order.
    #[instrument(level = "debug", skip_all)]
    pub fn update_nodes<U: Updater<T>>(&mut self, mut updater: U) {
        for idx in self.table_order() {
            updater.update(&mut self.slot_mut(idx).item);
        }
    }

    /// Like [`update_nodes`](Self::update_nodes), restricted to matching items.
    #[instrument(level = "debug", skip_all)]
    pub fn update_nodes_matching<M, U>(&mut self, matcher: M, mut updater: U)
    where
        M: Matcher<T>,
        U: Updater<T>,
    {
        for idx in self.table_order() {
            let item = &mut self.slot_mut(idx).item;
            if matcher.matches(item) {
                updater.update(item);
            }
        }
    }

    /// Applies `updater` to the subtree at `start_mark`, in pre-order.
    #[instrument(level = "debug", skip(self, updater))]
    pub fn update_nodes_from<U: Updater<T>>(&mut self, start_mark: Mark, mut updater: U) {
        for idx in self.subtree_order(start_mark) {
            updater.update(&mut self.slot_mut(idx).item);
        }
    }

    #[instrument(level = "debug", skip(self, matcher, updater))]
    pub fn update_nodes_from_matching<M, U>(&mut self, start_mark: Mark, matcher: M, mut updater: U)
    where
        M: Matcher<T>,
        U: Updater<T>,
    {
        for idx in self.subtree_order(start_mark) {
            let item = &mut self.slot_mut(idx).item;
            if matcher.matches(item) {
                updater.update(item);
            }
        }
    }

    /// Applies `updater` to each ancestor of `start_mark`, nearest first,
    /// up to and including the root. The start node itself is skipped.
    #[instrument(level = "debug", skip(self, updater))]
    pub fn update_parent_nodes<U: Updater<T>>(&mut self, start_mark: Mark, mut updater: U) {
        for idx in self.ancestor_order(start_mark) {
            updater.update(&mut self.slot_mut(idx).item);
        }
    }

    #[instrument(level = "debug", skip(self, matcher, updater))]
    pub fn update_parent_nodes_matching<M, U>(
        &mut self,
        start_mark: Mark,
        matcher: M,
        mut updater: U,
    ) where
        M: Matcher<T>,
        U: Updater<T>,
    {
        for idx in self.ancestor_order(start_mark) {
            let item = &mut self.slot_mut(idx).item;
            if matcher.matches(item) {
                updater.update(item);
            }
        }
    }

    fn table_order(&self) -> Vec<Index> {
        std::iter::once(self.root_index())
            .chain(self.registered().map(|(_, idx)| idx))
            .collect()
    }

    fn subtree_order(&self, start_mark: Mark) -> Vec<Index> {
        self.iter_from(start_mark).map(|node| node.index()).collect()
    }

    fn ancestor_order(&self, start_mark: Mark) -> Vec<Index> {
        let mut ancestors = Vec::new();
        let mut cursor = self.index_of(start_mark);
        while let Some(idx) = cursor.and_then(|idx| self.parent_index(idx)) {
            ancestors.push(idx);
            cursor = Some(idx);
        }
        ancestors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> MarkedTree<String> {
        let mut tree = MarkedTree::new("food".to_string());
        tree.add("fruit".to_string()).unwrap();
        tree.descend().unwrap();
        tree.add("apple".to_string()).unwrap();
        tree.add("banana".to_string()).unwrap();
        tree.ascend().unwrap();
        tree.add("vegetable".to_string()).unwrap();
        tree.descend().unwrap();
        tree.add("tomato".to_string()).unwrap();
        tree
    }

    #[test]
    fn given_tree_when_iterating_then_yields_pre_order() {
        let tree = tree();
        let items: Vec<_> = tree.iter().map(|node| node.item().as_str()).collect();
        assert_eq!(items, vec!["food", "fruit", "apple", "banana", "vegetable", "tomato"]);
    }

    #[test]
    fn given_mark_when_iterating_from_then_stays_inside_subtree() {
        let tree = tree();
        let fruit = tree.find_first_node(|item: &String| item == "fruit").unwrap();
        let items: Vec<_> = tree
            .iter_from(fruit.mark())
            .map(|node| node.item().as_str())
            .collect();
        assert_eq!(items, vec!["fruit", "apple", "banana"]);
        assert_eq!(tree.iter_from(99).count(), 0);
    }

    #[test]
    fn given_tree_when_measuring_then_reports_depth_and_leaves() {
        let tree = tree();
        assert_eq!(tree.depth(), 3);
        let leaves: Vec<_> = tree.leaves().iter().map(|node| node.item().clone()).collect();
        assert_eq!(leaves, vec!["apple", "banana", "tomato"]);
        assert_eq!(MarkedTree::new(()).depth(), 1);
    }

    #[test]
    fn given_tree_when_listing_marks_then_sorted_without_root() {
        let tree = tree();
        assert_eq!(tree.marks(), vec![1, 2, 3, 4, 5]);
    }
}
