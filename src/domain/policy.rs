//! Collaborator traits: matching, updating, and child placement/notification.

use std::cmp::Ordering;

use crate::domain::mark::Mark;

/// Predicate over tree items used by searches and filtered updates.
pub trait Matcher<T> {
    fn matches(&self, item: &T) -> bool;
}

impl<T, F> Matcher<T> for F
where
    F: Fn(&T) -> bool,
{
    fn matches(&self, item: &T) -> bool {
        self(item)
    }
}

/// In-place mutation applied by bulk updates.
pub trait Updater<T> {
    fn update(&mut self, item: &mut T);
}

impl<T, F> Updater<T> for F
where
    F: FnMut(&mut T),
{
    fn update(&mut self, item: &mut T) {
        self(item)
    }
}

/// Where a new child goes relative to an existing sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddDecision {
    /// Insert immediately above the existing child.
    Above,
    /// Insert immediately below the existing child.
    Below,
    /// Not here; keep scanning.
    Pass,
}

impl AddDecision {
    /// Negative means above, positive means below, zero passes.
    pub fn from_sign(decision: i32) -> Self {
        Self::from(decision.cmp(&0))
    }
}

impl From<Ordering> for AddDecision {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => AddDecision::Above,
            Ordering::Equal => AddDecision::Pass,
            Ordering::Greater => AddDecision::Below,
        }
    }
}

/// Optional strategy injected into a tree.
///
/// `add_decision` is consulted left to right across the existing children
/// when a child is appended; the first non-`Pass` answer wins, and if every
/// child passes the new child goes last. `on_add` and `on_remove` observe
/// attach/detach of any node that has a parent. Notifications must not be
/// used to reshape the tree.
pub trait TreePolicy<T> {
    fn add_decision(&self, _existing: &T, _new: &T) -> AddDecision {
        AddDecision::Pass
    }

    fn on_add(&self, _parent_mark: Mark, _child_mark: Mark, _parent: &T, _child: &T) {}

    fn on_remove(&self, _parent_mark: Mark, _child_mark: Mark, _parent: &T, _child: &T) {}
}
