//! Configuration for context trees

use serde::{Deserialize, Serialize};

use crate::error::{CtwError, Result};

/// Default node capacity of the arena.
pub const DEFAULT_CAPACITY: usize = 2_000_000;

/// Tree configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Number of context bits every update is conditioned on
    pub depth: usize,

    /// Max nodes the arena holds, the root included
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Run the per-node invariant checks on every update
    #[serde(default = "default_invariant_checks")]
    pub check_invariants: bool,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_invariant_checks() -> bool {
    cfg!(debug_assertions)
}

impl TreeConfig {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            capacity: default_capacity(),
            check_invariants: default_invariant_checks(),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// A full path (root to leaf) must fit, and every id must fit a `u32`.
    pub fn validate(&self) -> Result<()> {
        if self.capacity <= self.depth {
            return Err(CtwError::Config(format!(
                "capacity {} can't hold a single path of depth {}",
                self.capacity, self.depth
            )));
        }
        if u32::try_from(self.capacity).is_err() {
            return Err(CtwError::Config(format!(
                "capacity {} exceeds the {} node id limit",
                self.capacity,
                u32::MAX
            )));
        }
        Ok(())
    }
}
