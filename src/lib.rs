//! General tree with stable integer marks.
//!
//! Every node except the root gets a mark when it is created; marks are
//! handed out in increasing order and never reused by the same tree. A tree
//! is built either through a chain cursor (`add`/`descend`/`ascend`) or, once
//! unchained, by naming target marks (`add_above`, `move_as_child`,
//! `remove`, ...).
//!
//! ```
//! use markedtree::MarkedTree;
//!
//! let mut tree = MarkedTree::new("ROOT");
//! let music = tree.add("music")?;
//! tree.descend()?;
//! tree.add("jazz")?;
//!
//! tree.set_chain(false);
//! tree.add_child(music, "blues")?;
//! assert_eq!(tree.get_child_items(music), vec![&"jazz", &"blues"]);
//! # Ok::<(), markedtree::TreeError>(())
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod util;

pub use config::TreeSettings;
pub use domain::{
    AddDecision, DetachedNode, Mark, MarkedTree, Matcher, NodeRef, PreOrderIterator, TreeError,
    TreeNodeConvert, TreePolicy, TreeResult, Updater, ROOT_MARK,
};
pub use errors::{SettingsError, SettingsResult};
