use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a node in the tree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-context statistics. Children are `None` until first observed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub(crate) count0: u32,
    pub(crate) count1: u32,
    pub(crate) pe: f64,
    pub(crate) pw: f64,
    pub(crate) ln_pe: f64,
    pub(crate) ln_pw: f64,
    pub(crate) children: [Option<NodeId>; 2],
}

impl Node {
    pub(crate) fn leaf() -> Self {
        Self {
            count0: 0,
            count1: 0,
            pe: 1.0,
            pw: 1.0,
            ln_pe: 0.0,
            ln_pw: 0.0,
            children: [None; 2],
        }
    }

    pub fn count0(&self) -> u32 {
        self.count0
    }

    pub fn count1(&self) -> u32 {
        self.count1
    }

    pub fn total(&self) -> u32 {
        self.count0 + self.count1
    }

    /// KT probability of this node's own counts.
    pub fn pe(&self) -> f64 {
        self.pe
    }

    /// Weighted probability of the subtree rooted here.
    pub fn pw(&self) -> f64 {
        self.pw
    }

    pub fn ln_pe(&self) -> f64 {
        self.ln_pe
    }

    pub fn ln_pw(&self) -> f64 {
        self.ln_pw
    }

    pub fn child0(&self) -> Option<NodeId> {
        self.children[0]
    }

    pub fn child1(&self) -> Option<NodeId> {
        self.children[1]
    }

    pub fn child(&self, bit: u8) -> Option<NodeId> {
        self.children[usize::from(bit)]
    }

    pub fn is_leaf(&self) -> bool {
        self.children == [None, None]
    }

    pub(crate) fn count_mut(&mut self, bit: u8) -> &mut u32 {
        match bit {
            0 => &mut self.count0,
            _ => &mut self.count1,
        }
    }
}

/// Node field readable through [`ContextTree::get`](super::ContextTree::get).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Count0,
    Count1,
    Pe,
    Pw,
}

impl Field {
    pub(crate) fn read(self, node: &Node) -> f64 {
        match self {
            Field::Count0 => f64::from(node.count0),
            Field::Count1 => f64::from(node.count1),
            Field::Pe => node.pe,
            Field::Pw => node.pw,
        }
    }
}
