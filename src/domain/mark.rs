//! Mark allocation

use crate::domain::error::{TreeError, TreeResult};

/// Stable node identifier, unique for the lifetime of a tree.
pub type Mark = u64;

/// Mark held by the root node. Never registered, never handed out.
pub const ROOT_MARK: Mark = 0;

/// Highest mark a tree hands out unless configured otherwise.
pub const DEFAULT_MARK_CEILING: Mark = i64::MAX as Mark;

/// Highest ceiling an allocator accepts; larger requests are clamped so the
/// counter itself can never overflow.
pub const MAX_MARK_CEILING: Mark = Mark::MAX - 1;

/// Monotonic mark counter with an explicit upper bound.
///
/// Marks `1..=ceiling` are allocated in order. The counter is never rewound,
/// so a mark is not reused even after the tree is cleared.
#[derive(Debug, Clone)]
pub struct MarkAllocator {
    next: Mark,
    ceiling: Mark,
}

impl Default for MarkAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_MARK_CEILING)
    }
}

impl MarkAllocator {
    pub fn new(ceiling: Mark) -> Self {
        Self {
            next: ROOT_MARK + 1,
            ceiling: ceiling.min(MAX_MARK_CEILING),
        }
    }

    pub fn ceiling(&self) -> Mark {
        self.ceiling
    }

    /// The mark the next allocation will return.
    pub fn peek(&self) -> Mark {
        self.next
    }

    /// Fails if another allocation would exceed the ceiling.
    pub fn check(&self) -> TreeResult<()> {
        if self.next > self.ceiling {
            return Err(TreeError::MarkCeilingReached {
                ceiling: self.ceiling,
            });
        }
        Ok(())
    }

    pub fn allocate(&mut self) -> TreeResult<Mark> {
        self.check()?;
        let mark = self.next;
        self.next += 1;
        Ok(mark)
    }
}
