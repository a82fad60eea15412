use tracing::error;

use super::{ln_add_exp, ContextTree, Field, NodeId, LN_HALF};
use crate::error::{CtwError, Result};
use crate::estimator::Estimator;

const TOLERANCE: f64 = 1e-9;

impl<E: Estimator> ContextTree<E> {
    /// Leaf and internal count invariants of a single node.
    ///
    /// A leaf must have been visited, an internal node's counts must be the
    /// sum of its children's.
    pub(super) fn check_counts(&self, id: NodeId) -> Result<()> {
        let node = &self.nodes[id.index()];
        if node.is_leaf() {
            if node.total() == 0 {
                return Err(self.violation(id, "leaf has no observations".to_string()));
            }
            return Ok(());
        }

        let [child0, child1] = node.children;
        let zeros = self.get(Field::Count0, child0, 0.0) + self.get(Field::Count0, child1, 0.0);
        let ones = self.get(Field::Count1, child0, 0.0) + self.get(Field::Count1, child1, 0.0);
        if f64::from(node.count0) != zeros || f64::from(node.count1) != ones {
            let detail = format!(
                "counts a={} b={} but children sum to a={zeros} b={ones}",
                node.count0, node.count1
            );
            return Err(self.violation(id, detail));
        }
        Ok(())
    }

    /// Probability bookkeeping of a single node: `pe` from the estimator,
    /// `pw` from the weighting rule, and both within bounds.
    fn check_weights(&self, id: NodeId) -> Result<()> {
        let node = &self.nodes[id.index()];
        let ln_pe = self.estimator.ln_probability(node.count0, node.count1);
        if node.ln_pe != ln_pe || node.pe != self.estimator.probability(node.count0, node.count1) {
            return Err(self.violation(id, "pe differs from the estimator".to_string()));
        }
        if !(node.ln_pw <= 0.0 && node.ln_pw.is_finite()) || !(0.0..=1.0).contains(&node.pw) {
            return Err(self.violation(id, "pw out of bounds".to_string()));
        }

        let (pw, ln_pw) = if node.is_leaf() {
            (node.pe, node.ln_pe)
        } else {
            let [child0, child1] = node.children;
            let pw_children = self.get(Field::Pw, child0, 1.0) * self.get(Field::Pw, child1, 1.0);
            let ln_children = self.ln_pw_or_zero(child0) + self.ln_pw_or_zero(child1);
            (0.5 * node.pe + 0.5 * pw_children, LN_HALF + ln_add_exp(node.ln_pe, ln_children))
        };
        if (node.pw - pw).abs() > TOLERANCE * pw || (node.ln_pw - ln_pw).abs() > TOLERANCE * ln_pw.abs().max(1.0) {
            let detail = format!("pw={} ln_pw={} but weighting gives {pw} {ln_pw}", node.pw, node.ln_pw);
            return Err(self.violation(id, detail));
        }
        Ok(())
    }

    /// Validates every node in the arena.
    ///
    /// The root of a tree that has seen nothing is the only leaf allowed to
    /// have zero observations.
    pub fn check_all(&self) -> Result<()> {
        for index in 0..self.nodes.len() {
            let id = NodeId(index as u32);
            let node = &self.nodes[index];
            let untouched_root = id == NodeId::ROOT && node.is_leaf() && node.total() == 0;
            if !untouched_root {
                self.check_counts(id)?;
            }
            self.check_weights(id)?;
        }
        Ok(())
    }

    fn violation(&self, id: NodeId, detail: String) -> CtwError {
        let node = &self.nodes[id.index()];
        error!(node = %id, state = ?node, %detail, "context tree invariant violated");
        CtwError::InvariantViolation { node: id, detail }
    }
}
