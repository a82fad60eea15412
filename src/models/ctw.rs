use super::{quantize, Model};
use crate::config::TreeConfig;
use crate::error::Result;
use crate::history::{ContextWindow, History};
use crate::tree::ContextTree;

/// A context tree fed from its own sliding window of past bits.
#[derive(Debug, Clone)]
pub struct CtwModel {
    tree: ContextTree,
    window: ContextWindow,
}

impl CtwModel {
    pub fn new(config: TreeConfig) -> Result<Self> {
        let tree = ContextTree::with_config(config)?;
        let window = ContextWindow::new(config.depth);
        Ok(Self { tree, window })
    }

    /// Unquantized probability that the next bit is a `1`.
    pub fn probability(&self) -> f64 {
        // the window always holds `depth` valid bits
        self.tree.predict_unchecked(self.window.context())
    }

    pub fn tree(&self) -> &ContextTree {
        &self.tree
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    pub fn into_tree(self) -> ContextTree {
        self.tree
    }
}

impl Model for CtwModel {
    fn predict(&self) -> u16 {
        quantize(self.probability())
    }

    fn update(&mut self, bit: u8) -> Result<()> {
        self.tree.update(self.window.context(), bit)?;
        self.window.update(bit);
        Ok(())
    }
}
