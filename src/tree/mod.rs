//! The binary weighted context tree.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. A node stands
//! for a context suffix: the root is the empty context, its `child1` the
//! contexts ending in `1`, that child's `child0` the contexts ending in `01`,
//! and so on down to `depth` bits. Nodes are created the first time their
//! suffix is observed and are never removed, so ids stay valid for the life of
//! the tree and a child's id is always greater than its parent's.

mod invariants;
mod node;
mod render;

pub use self::{node::*, render::*};

use std::f64::consts::LN_2;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::config::TreeConfig;
use crate::error::{CtwError, Result};
use crate::estimator::{Estimator, KtTable};

const LN_HALF: f64 = -LN_2;

/// Most observations a root may hold, one short of `u32::MAX` so `predict`
/// can still count a hypothetical bit.
pub(crate) const MAX_OBSERVATIONS: u32 = u32::MAX - 1;

#[derive(Debug, Clone)]
pub struct ContextTree<E: Estimator = KtTable> {
    nodes: Vec<Node>,
    config: TreeConfig,
    estimator: E,
    // scratch buffer for the root-to-leaf walk of `update`
    path: Vec<NodeId>,
}

impl ContextTree<KtTable> {
    pub fn new(depth: usize) -> Result<Self> {
        Self::with_config(TreeConfig::new(depth))
    }

    pub fn with_config(config: TreeConfig) -> Result<Self> {
        Self::with_estimator(config, KtTable::new())
    }
}

impl<E: Estimator> ContextTree<E> {
    pub fn with_estimator(config: TreeConfig, mut estimator: E) -> Result<Self> {
        config.validate()?;
        estimator.reserve(1);

        let mut nodes = Vec::with_capacity(config.capacity);
        nodes.push(Node::leaf());
        debug!(depth = config.depth, capacity = config.capacity, "context tree created");

        Ok(Self { nodes, config, estimator, path: Vec::with_capacity(config.depth + 1) })
    }

    /// Builds a tree around an arena that already satisfies every invariant
    /// apart from `pe`/`pw`, which are recomputed here.
    pub(crate) fn from_parts(config: TreeConfig, mut estimator: E, nodes: Vec<Node>) -> Self {
        let total = nodes.first().map_or(0, Node::total);
        estimator.reserve(total.saturating_add(2));

        let mut arena = Vec::with_capacity(config.capacity.max(nodes.len()));
        arena.extend(nodes);
        let mut tree = Self { nodes: arena, config, estimator, path: Vec::with_capacity(config.depth + 1) };
        // children always come after their parent
        for index in (0..tree.nodes.len()).rev() {
            tree.refresh(NodeId(index as u32));
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn depth(&self) -> usize {
        self.config.depth
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Number of nodes created so far, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`, the root exists from construction on.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Bits observed so far.
    pub fn observations(&self) -> u32 {
        self.nodes[NodeId::ROOT.index()].total()
    }

    /// Reads `field` of `node`, or `default` when the node is absent.
    ///
    /// Defaults act as the identity of the surrounding computation: `0` when
    /// summing counts, `1` when multiplying weighted probabilities.
    pub fn get(&self, field: Field, node: Option<NodeId>, default: f64) -> f64 {
        node.and_then(|id| self.node(id)).map_or(default, |node| field.read(node))
    }

    /// Ideal code length in bits of everything observed, `-log2 pw(root)`.
    pub fn code_length(&self) -> f64 {
        -self.nodes[NodeId::ROOT.index()].ln_pw / LN_2
    }

    /// Records `bit` as following `context` (oldest bit first).
    ///
    /// Fails without touching the tree if the context has the wrong length,
    /// a value isn't a bit, or the missing path nodes don't fit the arena.
    pub fn update(&mut self, context: &[u8], bit: u8) -> Result<()> {
        self.check_context(context)?;
        if bit > 1 {
            return Err(CtwError::InvalidBit(bit));
        }

        let total = self.observations();
        if total >= MAX_OBSERVATIONS {
            warn!(total, "context tree rejected update, observation limit reached");
            return Err(CtwError::ObservationLimit);
        }
        let required = self.nodes.len() + self.missing_on_path(context);
        if required > self.config.capacity {
            warn!(required, capacity = self.config.capacity, "context tree rejected update, arena is full");
            return Err(CtwError::CapacityExceeded { capacity: self.config.capacity, required });
        }
        self.estimator.reserve(total.saturating_add(2));

        let mut path = std::mem::take(&mut self.path);
        path.clear();
        let mut id = NodeId::ROOT;
        path.push(id);
        for &ctx_bit in context.iter().rev() {
            id = self.child_or_insert(id, ctx_bit);
            path.push(id);
        }

        // leaf to root, a parent's weight needs its children's fresh values
        let result = path.iter().rev().try_for_each(|&id| self.observe(id, bit));
        self.path = path;
        result
    }

    /// Probability that the bit following `context` is a `1`.
    ///
    /// This is `pw(root)` after a hypothetical `1` divided by `pw(root)` now,
    /// evaluated in the log domain without touching the tree. Read it before
    /// calling `update` with the actual bit.
    pub fn predict(&self, context: &[u8]) -> Result<f64> {
        self.check_context(context)?;
        Ok(self.predict_unchecked(context))
    }

    /// `predict` for a context the caller already knows is valid.
    pub(crate) fn predict_unchecked(&self, context: &[u8]) -> f64 {
        let root = &self.nodes[NodeId::ROOT.index()];
        let ln_after = self.ln_pw_with_one(Some(NodeId::ROOT), context);
        (ln_after - root.ln_pw).exp().min(1.0)
    }

    pub fn lines(&self) -> Lines<'_> {
        Lines::new(&self.nodes, self.config.depth)
    }

    fn check_context(&self, context: &[u8]) -> Result<()> {
        if context.len() != self.config.depth {
            return Err(CtwError::DepthMismatch { expected: self.config.depth, actual: context.len() });
        }
        match context.iter().find(|&&b| b > 1) {
            Some(&bad) => Err(CtwError::InvalidBit(bad)),
            None => Ok(()),
        }
    }

    fn missing_on_path(&self, context: &[u8]) -> usize {
        let mut id = NodeId::ROOT;
        for (walked, &bit) in context.iter().rev().enumerate() {
            match self.nodes[id.index()].child(bit) {
                Some(child) => id = child,
                None => return context.len() - walked,
            }
        }
        0
    }

    fn child_or_insert(&mut self, parent: NodeId, bit: u8) -> NodeId {
        if let Some(child) = self.nodes[parent.index()].child(bit) {
            return child;
        }

        // capacity was validated to fit a u32 and checked before the walk
        debug_assert!(self.nodes.len() < self.config.capacity);
        let child = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::leaf());
        self.nodes[parent.index()].children[usize::from(bit)] = Some(child);
        trace!(%parent, %child, bit, "context node created");
        child
    }

    fn observe(&mut self, id: NodeId, bit: u8) -> Result<()> {
        *self.nodes[id.index()].count_mut(bit) += 1;
        if self.config.check_invariants {
            self.check_counts(id)?;
        }
        self.refresh(id);
        Ok(())
    }

    fn refresh(&mut self, id: NodeId) {
        let node = self.nodes[id.index()];
        let pe = self.estimator.probability(node.count0, node.count1);
        let ln_pe = self.estimator.ln_probability(node.count0, node.count1);

        let (pw, ln_pw) = if node.is_leaf() {
            (pe, ln_pe)
        } else {
            let [child0, child1] = node.children;
            let pw_children = self.get(Field::Pw, child0, 1.0) * self.get(Field::Pw, child1, 1.0);
            let ln_children = self.ln_pw_or_zero(child0) + self.ln_pw_or_zero(child1);
            (0.5 * pe + 0.5 * pw_children, LN_HALF + ln_add_exp(ln_pe, ln_children))
        };

        let node = &mut self.nodes[id.index()];
        node.pe = pe;
        node.ln_pe = ln_pe;
        node.pw = pw;
        node.ln_pw = ln_pw;
    }

    fn ln_pw_or_zero(&self, node: Option<NodeId>) -> f64 {
        node.map_or(0.0, |id| self.nodes[id.index()].ln_pw)
    }

    /// `ln pw` of `node` as if a `1` followed `context`. An absent node is a
    /// fresh leaf, and so is everything below it.
    fn ln_pw_with_one(&self, node: Option<NodeId>, context: &[u8]) -> f64 {
        let node = node.map(|id| &self.nodes[id.index()]);
        let (count0, count1) = node.map_or((0, 0), |n| (n.count0, n.count1));
        let ln_pe = self.estimator.ln_probability(count0, count1 + 1);

        let Some((&bit, rest)) = context.split_last() else {
            return ln_pe;
        };
        let on_path = self.ln_pw_with_one(node.and_then(|n| n.child(bit)), rest);
        let off_path = self.ln_pw_or_zero(node.and_then(|n| n.child(bit ^ 1)));
        LN_HALF + ln_add_exp(ln_pe, on_path + off_path)
    }
}

impl<E: Estimator> fmt::Display for ContextTree<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// `ln(e^a + e^b)` without leaving the log domain.
#[inline]
fn ln_add_exp(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if lo == f64::NEG_INFINITY {
        return hi;
    }
    hi + (lo - hi).exp().ln_1p()
}
