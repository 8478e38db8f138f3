//! Marked tree: a general tree whose nodes are addressed by stable marks.
//!
//! Two modes of operation:
//! - chained: a cursor (`parent`, `last`) follows an append-only build path;
//!   `add`, `descend` and `ascend` move it.
//! - unchained: every mutation names its target by mark.
//!
//! Nodes are kept in a generational arena. Each node links to its next
//! sibling and first child; `prev` points at the previous sibling or, for a
//! first child, at the parent.

use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, trace};

use crate::config::TreeSettings;
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::mark::{Mark, MarkAllocator, ROOT_MARK};
use crate::domain::node::{DetachedNode, NodeRef, TreeNode};
use crate::domain::policy::{AddDecision, TreePolicy};

/// Chain cursor: new items go below `last`, or become the first child of
/// `parent` when `last` is `None`.
#[derive(Debug, Clone, Copy)]
struct ChainCursor {
    parent: Index,
    last: Option<Index>,
}

/// Attachment point for a node that is not currently linked.
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// Sole child of a childless parent.
    FirstChild(Index),
    Above(Index),
    Below(Index),
}

pub struct MarkedTree<T> {
    arena: Arena<TreeNode<T>>,
    /// Every node except the root, by mark
    marks: HashMap<Mark, Index>,
    root: Index,
    chain: Option<ChainCursor>,
    allocator: MarkAllocator,
    policy: Option<Box<dyn TreePolicy<T> + Send>>,
}

impl<T> MarkedTree<T> {
    /// Creates a tree holding only `root_item`, in chained mode.
    pub fn new(root_item: T) -> Self {
        Self::with_settings(root_item, &TreeSettings::default())
    }

    pub fn with_settings(root_item: T, settings: &TreeSettings) -> Self {
        let mut arena = Arena::with_capacity(settings.initial_capacity.max(1));
        let root = arena.insert(TreeNode::new(ROOT_MARK, root_item));
        let mut tree = Self {
            arena,
            marks: HashMap::with_capacity(settings.initial_capacity),
            root,
            chain: None,
            allocator: MarkAllocator::new(settings.mark_ceiling),
            policy: None,
        };
        tree.clear();
        tree
    }

    /// Enters (`true`) or leaves (`false`) chained mode.
    ///
    /// Entering points the cursor at the root and its last child, whatever
    /// the cursor was before.
    #[instrument(level = "debug", skip(self))]
    pub fn set_chain(&mut self, chain: bool) {
        if chain {
            let parent = self.root;
            self.chain = Some(ChainCursor {
                parent,
                last: self.last_child(parent),
            });
        } else {
            self.chain = None;
        }
        debug!(chain, size = self.size(), "chain mode set");
    }

    pub fn is_chain(&self) -> bool {
        self.chain.is_some()
    }

    pub fn root(&self) -> NodeRef<'_, T> {
        NodeRef::new(self, self.root)
    }

    /// Node at `mark`. The root is not addressable by mark.
    pub fn get_node(&self, mark: Mark) -> Option<NodeRef<'_, T>> {
        self.index_of(mark).map(|idx| NodeRef::new(self, idx))
    }

    pub fn get_item(&self, mark: Mark) -> Option<&T> {
        self.index_of(mark).map(|idx| &self.slot(idx).item)
    }

    pub fn get_item_mut(&mut self, mark: Mark) -> Option<&mut T> {
        let idx = self.index_of(mark)?;
        self.arena.get_mut(idx).map(|node| &mut node.item)
    }

    pub fn root_item_mut(&mut self) -> &mut T {
        let root = self.root;
        &mut self.arena[root].item
    }

    pub fn contains(&self, mark: Mark) -> bool {
        self.marks.contains_key(&mark)
    }

    /// Parent of the node at `mark`; top-level nodes report the root.
    pub fn get_parent_node(&self, mark: Mark) -> Option<NodeRef<'_, T>> {
        let idx = self.index_of(mark)?;
        self.parent_index(idx).map(|parent| NodeRef::new(self, parent))
    }

    /// Cursor parent, `None` when unchained.
    pub fn chain_parent(&self) -> Option<NodeRef<'_, T>> {
        self.chain.map(|cursor| NodeRef::new(self, cursor.parent))
    }

    /// Cursor last child, `None` when unchained or the parent has no children.
    pub fn chain_last(&self) -> Option<NodeRef<'_, T>> {
        self.chain
            .and_then(|cursor| cursor.last)
            .map(|idx| NodeRef::new(self, idx))
    }

    /// Moves the cursor up one level, to the last node of that level.
    ///
    /// Returns `false` when the cursor is already at root level.
    #[instrument(level = "debug", skip(self))]
    pub fn ascend(&mut self) -> TreeResult<bool> {
        let cursor = self.cursor()?;
        match self.parent_index(cursor.parent) {
            Some(parent) => {
                self.chain = Some(ChainCursor {
                    parent,
                    last: self.last_child(parent),
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Moves the cursor down into the current last node.
    ///
    /// Returns `false` when the current level has no nodes yet.
    #[instrument(level = "debug", skip(self))]
    pub fn descend(&mut self) -> TreeResult<bool> {
        let cursor = self.cursor()?;
        match cursor.last {
            Some(last) => {
                self.chain = Some(ChainCursor {
                    parent: last,
                    last: self.last_child(last),
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Chained mode: appends `item` at the cursor and returns its mark.
    #[instrument(level = "debug", skip(self, item))]
    pub fn add(&mut self, item: T) -> TreeResult<Mark> {
        let cursor = self.cursor()?;
        let slot = match cursor.last {
            Some(last) => Slot::Below(last),
            None => Slot::FirstChild(cursor.parent),
        };
        let idx = self.create_node(item)?;
        self.link(idx, slot);
        self.chain = Some(ChainCursor {
            parent: cursor.parent,
            last: Some(idx),
        });
        self.notify_add(idx);
        Ok(self.slot(idx).mark)
    }

    /// Unchained mode: inserts `item` as the sibling just before `mark`.
    #[instrument(level = "debug", skip(self, item))]
    pub fn add_above(&mut self, mark: Mark, item: T) -> TreeResult<Option<Mark>> {
        self.ensure_unchained()?;
        self.allocator.check()?;
        match self.index_of(mark) {
            Some(target) => self.insert_at(item, Slot::Above(target)).map(Some),
            None => Ok(None),
        }
    }

    /// Unchained mode: inserts `item` as the sibling just after `mark`.
    #[instrument(level = "debug", skip(self, item))]
    pub fn add_below(&mut self, mark: Mark, item: T) -> TreeResult<Option<Mark>> {
        self.ensure_unchained()?;
        self.allocator.check()?;
        match self.index_of(mark) {
            Some(target) => self.insert_at(item, Slot::Below(target)).map(Some),
            None => Ok(None),
        }
    }

    /// Unchained mode: adds `item` as a child of `dest_mark`, placed by the
    /// tree policy, or last if there is none.
    #[instrument(level = "debug", skip(self, item))]
    pub fn add_child(&mut self, dest_mark: Mark, item: T) -> TreeResult<Option<Mark>> {
        self.append_child(dest_mark, item, None)
    }

    /// Like [`add_child`](Self::add_child), but placement is decided by
    /// `placement` instead of the tree policy.
    #[instrument(level = "debug", skip(self, item, placement))]
    pub fn add_child_with(
        &mut self,
        dest_mark: Mark,
        item: T,
        placement: &dyn TreePolicy<T>,
    ) -> TreeResult<Option<Mark>> {
        self.append_child(dest_mark, item, Some(placement))
    }

    /// Unchained mode: moves the subtree at `src_mark` to just before `dest_mark`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_above(&mut self, dest_mark: Mark, src_mark: Mark) -> TreeResult<bool> {
        self.ensure_unchained()?;
        let Some((dest, src)) = self.movable(dest_mark, src_mark) else {
            return Ok(false);
        };
        self.detach(src);
        self.link(src, Slot::Above(dest));
        self.notify_add(src);
        Ok(true)
    }

    /// Unchained mode: moves the subtree at `src_mark` to just after `dest_mark`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_below(&mut self, dest_mark: Mark, src_mark: Mark) -> TreeResult<bool> {
        self.ensure_unchained()?;
        let Some((dest, src)) = self.movable(dest_mark, src_mark) else {
            return Ok(false);
        };
        self.detach(src);
        self.link(src, Slot::Below(dest));
        self.notify_add(src);
        Ok(true)
    }

    /// Unchained mode: moves the subtree at `src_mark` under `dest_mark`,
    /// placed by the tree policy, or last if there is none.
    #[instrument(level = "debug", skip(self))]
    pub fn move_as_child(&mut self, dest_mark: Mark, src_mark: Mark) -> TreeResult<bool> {
        self.reparent(dest_mark, src_mark, None)
    }

    #[instrument(level = "debug", skip(self, placement))]
    pub fn move_as_child_with(
        &mut self,
        dest_mark: Mark,
        src_mark: Mark,
        placement: &dyn TreePolicy<T>,
    ) -> TreeResult<bool> {
        self.reparent(dest_mark, src_mark, Some(placement))
    }

    /// Unchained mode: detaches the subtree at `mark` and forgets all of its
    /// marks. The subtree is handed back intact.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, mark: Mark) -> TreeResult<Option<DetachedNode<T>>> {
        self.ensure_unchained()?;
        let Some(idx) = self.index_of(mark) else {
            return Ok(None);
        };
        self.detach(idx);
        let removed = self.take_subtree(idx);
        debug!(mark, size = self.size(), "removed subtree");
        Ok(removed)
    }

    /// Drops every node but the root and re-enters chained mode.
    ///
    /// The mark counter keeps running.
    #[instrument(level = "debug", skip(self))]
    pub fn clear(&mut self) {
        let root = self.root;
        self.arena.retain(|idx, _| idx == root);
        self.marks.clear();
        self.arena[root].child = None;
        self.set_chain(true);
    }

    /// Node count, root included.
    pub fn size(&self) -> usize {
        self.marks.len() + 1
    }

    pub fn mark_ceiling(&self) -> Mark {
        self.allocator.ceiling()
    }

    /// Installs the policy consulted for child placement and notified of
    /// attach/detach.
    ///
    /// Policies must be `Send` so a tree of `Send` items can be handed to
    /// another thread; share notification state through `Arc`.
    pub fn set_tree_policy<P>(&mut self, policy: P)
    where
        P: TreePolicy<T> + Send + 'static,
    {
        self.policy = Some(Box::new(policy));
    }

    pub fn clear_tree_policy(&mut self) -> Option<Box<dyn TreePolicy<T> + Send>> {
        self.policy.take()
    }

    pub fn tree_policy(&self) -> Option<&dyn TreePolicy<T>> {
        self.policy
            .as_deref()
            .map(|policy| policy as &dyn TreePolicy<T>)
    }

    pub fn is_tree_policy(&self) -> bool {
        self.policy.is_some()
    }

    // ---------------------------------------------------------------
    // crate-internal node access
    // ---------------------------------------------------------------

    pub(crate) fn slot(&self, idx: Index) -> &TreeNode<T> {
        &self.arena[idx]
    }

    pub(crate) fn slot_mut(&mut self, idx: Index) -> &mut TreeNode<T> {
        &mut self.arena[idx]
    }

    pub(crate) fn root_index(&self) -> Index {
        self.root
    }

    pub(crate) fn index_of(&self, mark: Mark) -> Option<Index> {
        self.marks.get(&mark).copied()
    }

    pub(crate) fn registered(&self) -> impl Iterator<Item = (Mark, Index)> + '_ {
        self.marks.iter().map(|(mark, idx)| (*mark, *idx))
    }

    pub(crate) fn is_first_child(&self, idx: Index) -> bool {
        self.slot(idx)
            .prev
            .is_some_and(|prev| self.slot(prev).child == Some(idx))
    }

    /// Walks back over earlier siblings to the first child, whose `prev` is
    /// the parent.
    pub(crate) fn parent_index(&self, idx: Index) -> Option<Index> {
        let mut cursor = idx;
        loop {
            let prev = self.slot(cursor).prev?;
            if self.slot(prev).child == Some(cursor) {
                return Some(prev);
            }
            cursor = prev;
        }
    }

    pub(crate) fn last_child(&self, idx: Index) -> Option<Index> {
        let mut last = self.slot(idx).child?;
        while let Some(next) = self.slot(last).next {
            last = next;
        }
        Some(last)
    }

    // ---------------------------------------------------------------
    // mode and capacity checks
    // ---------------------------------------------------------------

    fn cursor(&self) -> TreeResult<ChainCursor> {
        self.chain.ok_or(TreeError::NotChained)
    }

    fn ensure_unchained(&self) -> TreeResult<()> {
        match self.chain {
            Some(_) => Err(TreeError::Chained),
            None => Ok(()),
        }
    }

    // ---------------------------------------------------------------
    // structural helpers
    // ---------------------------------------------------------------

    fn create_node(&mut self, item: T) -> TreeResult<Index> {
        let mark = self.allocator.allocate()?;
        let idx = self.arena.insert(TreeNode::new(mark, item));
        self.marks.insert(mark, idx);
        trace!(mark, "created node");
        Ok(idx)
    }

    fn insert_at(&mut self, item: T, slot: Slot) -> TreeResult<Mark> {
        let idx = self.create_node(item)?;
        self.link(idx, slot);
        self.notify_add(idx);
        Ok(self.slot(idx).mark)
    }

    fn append_child(
        &mut self,
        dest_mark: Mark,
        item: T,
        placement: Option<&dyn TreePolicy<T>>,
    ) -> TreeResult<Option<Mark>> {
        self.ensure_unchained()?;
        self.allocator.check()?;
        let Some(dest) = self.index_of(dest_mark) else {
            return Ok(None);
        };
        let slot = self.child_slot(dest, &item, placement.or_else(|| self.tree_policy()));
        self.insert_at(item, slot).map(Some)
    }

    fn reparent(
        &mut self,
        dest_mark: Mark,
        src_mark: Mark,
        placement: Option<&dyn TreePolicy<T>>,
    ) -> TreeResult<bool> {
        self.ensure_unchained()?;
        let Some((dest, src)) = self.movable(dest_mark, src_mark) else {
            return Ok(false);
        };
        self.detach(src);
        let item = &self.slot(src).item;
        let slot = self.child_slot(dest, item, placement.or_else(|| self.tree_policy()));
        self.link(src, slot);
        self.notify_add(src);
        Ok(true)
    }

    /// Resolves where a new child of `dest` goes.
    ///
    /// Without a policy, or when every existing child passes, the child goes
    /// last.
    fn child_slot(&self, dest: Index, item: &T, policy: Option<&dyn TreePolicy<T>>) -> Slot {
        let Some(first) = self.slot(dest).child else {
            return Slot::FirstChild(dest);
        };
        let mut last = first;
        if let Some(policy) = policy {
            let mut cursor = Some(first);
            while let Some(existing) = cursor {
                match policy.add_decision(&self.slot(existing).item, item) {
                    AddDecision::Above => return Slot::Above(existing),
                    AddDecision::Below => return Slot::Below(existing),
                    AddDecision::Pass => {}
                }
                last = existing;
                cursor = self.slot(existing).next;
            }
        } else {
            while let Some(next) = self.slot(last).next {
                last = next;
            }
        }
        Slot::Below(last)
    }

    /// Resolves both marks and rejects moves onto itself or into its own
    /// subtree.
    fn movable(&self, dest_mark: Mark, src_mark: Mark) -> Option<(Index, Index)> {
        let dest = self.index_of(dest_mark)?;
        let src = self.index_of(src_mark)?;
        if dest == src || self.is_ancestor(src, dest) {
            debug!(dest_mark, src_mark, "move rejected");
            return None;
        }
        Some((dest, src))
    }

    fn is_ancestor(&self, ancestor: Index, idx: Index) -> bool {
        let mut cursor = idx;
        while let Some(parent) = self.parent_index(cursor) {
            if parent == ancestor {
                return true;
            }
            cursor = parent;
        }
        false
    }

    /// Splices an unlinked node (and its subtree) into `slot`.
    fn link(&mut self, idx: Index, slot: Slot) {
        trace!(?slot, "link");
        match slot {
            Slot::FirstChild(parent) => {
                let node = self.slot_mut(idx);
                node.prev = Some(parent);
                node.next = None;
                self.slot_mut(parent).child = Some(idx);
            }
            Slot::Above(target) => {
                let prev = self.slot(target).prev;
                if let Some(prev) = prev {
                    if self.slot(prev).child == Some(target) {
                        self.slot_mut(prev).child = Some(idx);
                    } else {
                        self.slot_mut(prev).next = Some(idx);
                    }
                }
                let node = self.slot_mut(idx);
                node.prev = prev;
                node.next = Some(target);
                self.slot_mut(target).prev = Some(idx);
            }
            Slot::Below(target) => {
                let next = self.slot(target).next;
                if let Some(next) = next {
                    self.slot_mut(next).prev = Some(idx);
                }
                let node = self.slot_mut(idx);
                node.prev = Some(target);
                node.next = next;
                self.slot_mut(target).next = Some(idx);
            }
        }
    }

    /// Unlinks a node from its parent and siblings. Its subtree and marks
    /// stay registered.
    fn detach(&mut self, idx: Index) {
        let parent = self.parent_index(idx);
        let (prev, next) = {
            let node = self.slot(idx);
            (node.prev, node.next)
        };
        if let Some(prev) = prev {
            if self.slot(prev).child == Some(idx) {
                self.slot_mut(prev).child = next;
            } else {
                self.slot_mut(prev).next = next;
            }
        }
        if let Some(next) = next {
            self.slot_mut(next).prev = prev;
        }
        let node = self.slot_mut(idx);
        node.prev = None;
        node.next = None;
        trace!(mark = node.mark, "detached");

        if let (Some(policy), Some(parent)) = (self.policy.as_deref(), parent) {
            let parent = self.slot(parent);
            let child = self.slot(idx);
            policy.on_remove(parent.mark, child.mark, &parent.item, &child.item);
        }
    }

    fn notify_add(&self, idx: Index) {
        let Some(policy) = self.policy.as_deref() else {
            return;
        };
        if let Some(parent) = self.parent_index(idx) {
            let parent = self.slot(parent);
            let child = self.slot(idx);
            policy.on_add(parent.mark, child.mark, &parent.item, &child.item);
        }
    }

    /// Releases a detached subtree from the arena and the mark table, in
    /// pre-order.
    fn take_subtree(&mut self, idx: Index) -> Option<DetachedNode<T>> {
        let root = self.release(idx)?;
        let mut stack = Vec::new();
        self.push_children(&mut stack, root.child, 1);
        let mut detached = DetachedNode::new(root.mark, root.item);

        while let Some((current, depth)) = stack.pop() {
            let Some(node) = self.release(current) else {
                continue;
            };
            self.push_children(&mut stack, node.child, depth + 1);
            detached.push(depth, node.mark, node.item);
        }
        Some(detached)
    }

    fn release(&mut self, idx: Index) -> Option<TreeNode<T>> {
        let node = self.arena.remove(idx)?;
        self.marks.remove(&node.mark);
        Some(node)
    }

    /// Pushes a sibling chain so the first sibling is popped first.
    fn push_children(&self, stack: &mut Vec<(Index, usize)>, first: Option<Index>, depth: usize) {
        let start = stack.len();
        let mut cursor = first;
        while let Some(child) = cursor {
            stack.push((child, depth));
            cursor = self.slot(child).next;
        }
        stack[start..].reverse();
    }
}

impl<T> fmt::Debug for MarkedTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkedTree")
            .field("size", &self.size())
            .field("chain", &self.is_chain())
            .field("next_mark", &self.allocator.peek())
            .field("mark_ceiling", &self.allocator.ceiling())
            .field("policy", &self.is_tree_policy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Checks the link invariants of every reachable node.
    fn assert_links<T>(tree: &MarkedTree<T>) {
        let mut reachable = 0;
        let mut stack = vec![tree.root];
        while let Some(idx) = stack.pop() {
            reachable += 1;
            let node = tree.slot(idx);
            if let Some(next) = node.next {
                assert_eq!(tree.slot(next).prev, Some(idx), "next.prev must point back");
                stack.push(next);
            }
            if let Some(child) = node.child {
                assert_eq!(tree.parent_index(child), Some(idx), "child resolves parent");
                assert!(tree.is_first_child(child));
                stack.push(child);
            }
        }
        assert_eq!(reachable, tree.size());
        assert_eq!(tree.arena.len(), tree.size());
    }

    fn music_tree() -> (MarkedTree<&'static str>, Mark, Mark, Mark) {
        let mut tree = MarkedTree::new("ROOT");
        let music = tree.add("music").unwrap();
        tree.descend().unwrap();
        tree.add("jazz").unwrap();
        let blues = tree.add("blues").unwrap();
        tree.descend().unwrap();
        tree.add("The Thrill is Gone").unwrap();
        tree.add("Mannish Boy").unwrap();
        tree.ascend().unwrap();
        tree.add("rap").unwrap();
        tree.ascend().unwrap();
        let video = tree.add("video").unwrap();
        (tree, music, blues, video)
    }

    #[test]
    fn given_chained_build_when_inspecting_links_then_invariants_hold() {
        let (tree, ..) = music_tree();
        assert_links(&tree);
        assert_eq!(tree.size(), 8);
    }

    #[test]
    fn given_moves_when_relinking_then_invariants_hold() {
        let (mut tree, music, blues, video) = music_tree();
        tree.set_chain(false);

        assert!(tree.move_above(music, blues).unwrap());
        assert_links(&tree);
        assert!(tree.move_below(video, music).unwrap());
        assert_links(&tree);
        assert!(tree.move_as_child(video, blues).unwrap());
        assert_links(&tree);
        assert!(tree.move_above(video, blues).unwrap());
        assert_links(&tree);

        let top: Vec<_> = tree.root().child_items();
        assert_eq!(top, vec![&"blues", &"video", &"music"]);
    }

    #[test]
    fn given_first_child_moved_below_next_sibling_when_relinking_then_parent_child_updated() {
        let (mut tree, music, ..) = music_tree();
        tree.set_chain(false);
        let jazz = tree.get_node(music).unwrap().child().unwrap().mark();
        let blues = tree.get_node(jazz).unwrap().next().unwrap().mark();

        assert!(tree.move_below(blues, jazz).unwrap());

        assert_links(&tree);
        let music_node = tree.get_node(music).unwrap();
        assert_eq!(music_node.child().unwrap().mark(), blues);
        assert_eq!(music_node.child_items(), vec![&"blues", &"jazz", &"rap"]);
    }

    #[test]
    fn given_remove_when_subtree_released_then_arena_shrinks() {
        let (mut tree, _, blues, _) = music_tree();
        tree.set_chain(false);
        let removed = tree.remove(blues).unwrap().unwrap();
        assert_eq!(removed.node_count(), 3);
        assert_links(&tree);
        assert_eq!(tree.size(), 5);
    }

    #[test]
    fn given_clear_when_marks_dropped_then_counter_keeps_running() {
        let (mut tree, _, _, video) = music_tree();
        tree.clear();
        assert_links(&tree);
        let next = tree.add("again").unwrap();
        assert!(next > video);
    }
}
