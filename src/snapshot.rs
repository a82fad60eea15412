//! Snapshot persistence of a built tree.
//!
//! Only counts and children are stored, `pe`/`pw` are recomputed on restore
//! so a snapshot can't carry probabilities that disagree with its counts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TreeConfig;
use crate::error::{CtwError, Result};
use crate::estimator::{Estimator, KtTable};
use crate::tree::{ContextTree, Node, NodeId, MAX_OBSERVATIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub count0: u32,
    pub count1: u32,
    pub child0: Option<NodeId>,
    pub child1: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub config: TreeConfig,
    /// Arena in id order, the root first.
    pub nodes: Vec<SnapshotNode>,
}

impl TreeSnapshot {
    /// Checks the arena shape: every non-root node has exactly one parent
    /// numbered before it, and every leaf sits at full depth. Counts are
    /// checked last, once every child id is known to be in range.
    fn validate(&self) -> Result<()> {
        let config = &self.config;
        config.validate()?;
        if self.nodes.is_empty() {
            return Err(CtwError::Snapshot("missing root node".to_string()));
        }
        if self.nodes.len() > config.capacity {
            return Err(CtwError::Snapshot(format!(
                "{} nodes exceed capacity {}",
                self.nodes.len(),
                config.capacity
            )));
        }

        let mut depths: Vec<Option<usize>> = vec![None; self.nodes.len()];
        depths[0] = Some(0);
        for (index, node) in self.nodes.iter().enumerate() {
            let depth = depths[index]
                .ok_or_else(|| CtwError::Snapshot(format!("node #{index} has no parent")))?;

            let children = [node.child0, node.child1];
            if children == [None, None] {
                let lone_root = index == 0 && self.nodes.len() == 1;
                if depth != config.depth && !lone_root {
                    return Err(CtwError::Snapshot(format!(
                        "leaf #{index} at depth {depth}, expected {}",
                        config.depth
                    )));
                }
                continue;
            }

            for child in children.into_iter().flatten() {
                let slot = child.index();
                if slot <= index || slot >= self.nodes.len() {
                    return Err(CtwError::Snapshot(format!("node #{index} has invalid child {child}")));
                }
                if depths[slot].is_some() {
                    return Err(CtwError::Snapshot(format!("node {child} has two parents")));
                }
                if depth + 1 > config.depth {
                    return Err(CtwError::Snapshot(format!("node {child} is deeper than {}", config.depth)));
                }
                depths[slot] = Some(depth + 1);
            }
        }
        self.validate_counts()
    }

    /// Every count is conserved from the children up, so no node holds more
    /// observations than the root, and the root stays within the limit
    /// `update` enforces.
    fn validate_counts(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            let total = node.count0.checked_add(node.count1).ok_or_else(|| {
                CtwError::Snapshot(format!("node #{index} total overflows a u32"))
            })?;
            if index == 0 && total > MAX_OBSERVATIONS {
                return Err(CtwError::Snapshot(format!(
                    "root holds {total} observations, limit is {MAX_OBSERVATIONS}"
                )));
            }

            let children = [node.child0, node.child1];
            if children == [None, None] {
                if total == 0 && index != 0 {
                    return Err(CtwError::Snapshot(format!("leaf #{index} has no observations")));
                }
                continue;
            }
            let (zeros, ones) = children.into_iter().flatten().fold((0u64, 0u64), |(a, b), child| {
                let saved = &self.nodes[child.index()];
                (a + u64::from(saved.count0), b + u64::from(saved.count1))
            });
            if u64::from(node.count0) != zeros || u64::from(node.count1) != ones {
                return Err(CtwError::Snapshot(format!(
                    "node #{index} counts a={} b={} but children sum to a={zeros} b={ones}",
                    node.count0, node.count1
                )));
            }
        }
        Ok(())
    }
}

impl<E: Estimator> ContextTree<E> {
    pub fn snapshot(&self) -> TreeSnapshot {
        let nodes = self
            .nodes()
            .iter()
            .map(|node| SnapshotNode {
                count0: node.count0(),
                count1: node.count1(),
                child0: node.child0(),
                child1: node.child1(),
            })
            .collect();
        TreeSnapshot { config: *self.config(), nodes }
    }

    /// Writes the snapshot as JSON, atomically (temp file + rename).
    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(&self.snapshot())?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(temp_path, path)?;
        Ok(())
    }
}

impl ContextTree<KtTable> {
    pub fn from_snapshot(snapshot: TreeSnapshot) -> Result<Self> {
        Self::restore_with(snapshot, KtTable::new())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let snapshot: TreeSnapshot = serde_json::from_slice(&data)?;
        Self::from_snapshot(snapshot)
    }
}

impl<E: Estimator> ContextTree<E> {
    /// Rebuilds a tree from `snapshot`, recomputing probabilities with
    /// `estimator`.
    pub fn restore_with(snapshot: TreeSnapshot, estimator: E) -> Result<Self> {
        snapshot.validate()?;

        let nodes = snapshot
            .nodes
            .iter()
            .map(|saved| {
                let mut node = Node::leaf();
                node.count0 = saved.count0;
                node.count1 = saved.count1;
                node.children = [saved.child0, saved.child1];
                node
            })
            .collect();
        let tree = Self::from_parts(snapshot.config, estimator, nodes);
        tree.check_all().map_err(|err| CtwError::Snapshot(err.to_string()))?;

        debug!(depth = tree.depth(), nodes = tree.len(), "context tree restored");
        Ok(tree)
    }
}
