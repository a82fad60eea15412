use std::fmt;

use super::{Node, NodeId};

/// One node of the diagnostic dump.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeLine {
    pub id: NodeId,
    /// Context suffix the node stands for, oldest bit first.
    pub label: String,
    /// Tree depth, labels are right aligned to it.
    pub depth: usize,
    pub count0: u32,
    pub count1: u32,
    pub pe: f64,
    pub pw: f64,
}

impl fmt::Display for NodeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>width$}: a={} b={} pe={} pw={}",
            self.label,
            self.count0,
            self.count1,
            self.pe,
            self.pw,
            width = self.depth
        )
    }
}

struct Frame {
    id: NodeId,
    label: String,
    expanded: bool,
}

/// Lazy post-order walk: the `1` subtree, the `0` subtree, then the node.
pub struct Lines<'a> {
    nodes: &'a [Node],
    depth: usize,
    stack: Vec<Frame>,
}

impl<'a> Lines<'a> {
    pub(super) fn new(nodes: &'a [Node], depth: usize) -> Self {
        let mut stack = Vec::with_capacity(depth * 2 + 1);
        if !nodes.is_empty() {
            stack.push(Frame { id: NodeId::ROOT, label: String::new(), expanded: false });
        }
        Self { nodes, depth, stack }
    }
}

impl Iterator for Lines<'_> {
    type Item = NodeLine;

    fn next(&mut self) -> Option<NodeLine> {
        let nodes = self.nodes;
        while let Some(Frame { id, label, expanded }) = self.stack.pop() {
            let node = &nodes[id.index()];
            if expanded {
                return Some(NodeLine {
                    id,
                    label,
                    depth: self.depth,
                    count0: node.count0,
                    count1: node.count1,
                    pe: node.pe,
                    pw: node.pw,
                });
            }

            // popped in reverse: child1, child0, then the node itself
            let child_labels = [(node.child0(), format!("0{label}")), (node.child1(), format!("1{label}"))];
            self.stack.push(Frame { id, label, expanded: true });
            for (child, child_label) in child_labels {
                if let Some(child) = child {
                    self.stack.push(Frame { id: child, label: child_label, expanded: false });
                }
            }
        }
        None
    }
}
