//! Domain layer: the marked tree engine
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod display;
pub mod error;
pub mod mark;
pub mod node;
pub mod policy;
pub mod traversal;
pub mod tree;

pub use display::TreeNodeConvert;
pub use error::{TreeError, TreeResult};
pub use mark::{Mark, MarkAllocator, DEFAULT_MARK_CEILING, MAX_MARK_CEILING, ROOT_MARK};
pub use node::{DetachedNode, NodeRef};
pub use policy::{AddDecision, Matcher, TreePolicy, Updater};
pub use traversal::PreOrderIterator;
pub use tree::MarkedTree;
