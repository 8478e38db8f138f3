use std::fmt;

use termtree::Tree;
use tracing::instrument;

use crate::domain::node::{DetachedNode, NodeRef};
use crate::domain::tree::MarkedTree;

/// Rendering of a tree shape as a `termtree::Tree`.
///
/// The result is built without recursion, but `termtree::Tree` nests one
/// value per level and drops recursively; for very deep trees print through
/// `Display` instead, which never builds the nested value.
pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// One rendered line: depth below the rendered root, whether the node is the
/// last of its siblings, and its label.
type Line = (usize, bool, String);

impl<T: fmt::Display> NodeRef<'_, T> {
    /// Pre-order lines of this subtree; siblings of the start node are skipped.
    fn outline(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut stack = vec![(*self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let is_last = depth == 0 || node.next().is_none();
            lines.push((depth, is_last, node.item().to_string()));
            let children = node.children();
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
        lines
    }
}

impl<T: fmt::Display> DetachedNode<T> {
    fn outline(&self) -> Vec<Line> {
        let mut lines: Vec<Line> = self
            .iter()
            .map(|(depth, _, item)| (depth, true, item.to_string()))
            .collect();
        // Walking backwards, a sibling seen at the same depth means "not last"
        let mut sibling_ahead: Vec<bool> = Vec::new();
        for line in lines.iter_mut().rev() {
            let depth = line.0;
            if sibling_ahead.len() <= depth {
                sibling_ahead.resize(depth + 1, false);
            }
            line.1 = !sibling_ahead[depth];
            sibling_ahead[depth] = true;
            sibling_ahead.truncate(depth + 1);
        }
        lines
    }
}

/// Assembles nested leaves bottom-up from pre-order lines.
fn build_tree(lines: Vec<Line>) -> Tree<String> {
    let mut pending: Vec<Vec<Tree<String>>> = Vec::new();
    for (depth, _, label) in lines.into_iter().rev() {
        if pending.len() < depth + 2 {
            pending.resize_with(depth + 2, Vec::new);
        }
        let mut leaves = std::mem::take(&mut pending[depth + 1]);
        leaves.reverse();
        pending[depth].push(Tree::new(label).with_leaves(leaves));
    }
    pending
        .into_iter()
        .next()
        .and_then(|mut top| top.pop())
        .unwrap_or_else(|| Tree::new(String::new()))
}

/// Writes pre-order lines with termtree's glyphs, one indent per level.
fn write_lines(f: &mut fmt::Formatter<'_>, lines: Vec<Line>) -> fmt::Result {
    let mut prefix = String::new();
    let mut level_ends: Vec<usize> = Vec::new();
    for (depth, is_last, label) in lines {
        if depth == 0 {
            writeln!(f, "{label}")?;
            continue;
        }
        level_ends.truncate(depth - 1);
        prefix.truncate(level_ends.last().copied().unwrap_or(0));
        let glyph = if is_last { "└── " } else { "├── " };
        writeln!(f, "{prefix}{glyph}{label}")?;
        prefix.push_str(if is_last { "    " } else { "│   " });
        level_ends.push(prefix.len());
    }
    Ok(())
}

impl<T: fmt::Display> TreeNodeConvert for NodeRef<'_, T> {
    fn to_tree_string(&self) -> Tree<String> {
        build_tree(self.outline())
    }
}

impl<T: fmt::Display> TreeNodeConvert for MarkedTree<T> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        self.root().to_tree_string()
    }
}

impl<T: fmt::Display> TreeNodeConvert for DetachedNode<T> {
    fn to_tree_string(&self) -> Tree<String> {
        build_tree(self.outline())
    }
}

impl<T: fmt::Display> fmt::Display for MarkedTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_lines(f, self.root().outline())
    }
}

impl<T: fmt::Display> fmt::Display for DetachedNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_lines(f, self.outline())
    }
}
