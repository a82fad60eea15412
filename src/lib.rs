//! # ctw-tree
//!
//! A binary weighted context tree, the core of Context Tree Weighting.
//!
//! The tree keeps KT statistics for every context suffix of up to `depth`
//! bits it has seen and mixes them recursively, so the root's weighted
//! probability is a prediction over all context orders at once.
//!
//! ```rust
//! use ctw_tree::ContextTree;
//!
//! let mut tree = ContextTree::new(2)?;
//! let p1 = tree.predict(&[0, 1])?;
//! tree.update(&[0, 1], 1)?;
//! assert!(tree.predict(&[0, 1])? > p1);
//! # Ok::<(), ctw_tree::CtwError>(())
//! ```

pub mod config;
pub mod error;
pub mod estimator;
pub mod helpers;
pub mod history;
pub mod models;
pub mod snapshot;
pub mod sweep;
pub mod tree;

#[cfg(test)]
mod proptests;

pub use config::TreeConfig;
pub use error::{CtwError, Result};
pub use estimator::{Estimator, KtTable};
pub use history::{ContextWindow, History};
pub use models::{CtwModel, Model};
pub use snapshot::{SnapshotNode, TreeSnapshot};
pub use tree::{ContextTree, Field, Node, NodeId, NodeLine};
