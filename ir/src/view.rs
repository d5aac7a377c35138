//! Read-only views over a subset of a graph's nodes.
//!
//! A [`GraphView`] restricts an existing [`Graph`] to a member set and
//! recomputes the boundary (input/output) ops relative to membership instead
//! of the whole graph. The view borrows its parent; mutations made to the
//! parent through other handles remain visible, which is intentional.

use std::collections::BTreeSet;

use snafu::ensure;

use crate::error::{NotInViewSnafu, Result};
use crate::graph::Graph;
use crate::op::OpNode;
use crate::tensor::TensorInfo;

/// Non-owning restriction of a graph to a named subset of its ops.
#[derive(Debug)]
pub struct GraphView<'g> {
    graph: &'g Graph,
    members: BTreeSet<String>,
    output_nodes: Vec<String>,
}

impl<'g> GraphView<'g> {
    /// Build a view over `members` with the given view-level output nodes.
    ///
    /// Every member must exist in the parent graph and every output must be
    /// a member; violations are lookup errors.
    pub fn new(
        graph: &'g Graph,
        members: impl IntoIterator<Item = impl Into<String>>,
        output_nodes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let members: BTreeSet<String> = members.into_iter().map(Into::into).collect();
        for name in &members {
            graph.node(name)?;
        }
        let output_nodes: Vec<String> = output_nodes.into_iter().map(Into::into).collect();
        for name in &output_nodes {
            ensure!(members.contains(name), NotInViewSnafu { name });
        }
        Ok(Self { graph, members, output_nodes })
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    /// Member node lookup; names outside the view are lookup errors even if
    /// the parent graph knows them.
    pub fn node(&self, name: &str) -> Result<&'g OpNode> {
        ensure!(self.members.contains(name), NotInViewSnafu { name });
        self.graph.node(name)
    }

    /// Members none of whose input tensors are produced inside the view
    /// (null inputs count as produced outside).
    pub fn input_ops(&self) -> Result<Vec<&'g OpNode>> {
        let mut ops = Vec::new();
        for name in &self.members {
            let op = self.graph.node(name)?;
            let boundary = op.input_tensors().iter().all(|t| !self.members.contains(t.op_name()));
            if boundary {
                ops.push(op);
            }
        }
        Ok(ops)
    }

    /// Every input tensor of every view-input op.
    pub fn input_tensors(&self) -> Result<Vec<&'g TensorInfo>> {
        let mut out = Vec::new();
        for op in self.input_ops()? {
            out.extend(op.input_tensors());
        }
        Ok(out)
    }

    /// The declared view-level output ops.
    pub fn output_ops(&self) -> Result<Vec<&'g OpNode>> {
        self.output_nodes.iter().map(|name| self.node(name)).collect()
    }

    /// Output tensors of the declared view-level output ops.
    pub fn output_tensors(&self) -> Result<Vec<&'g TensorInfo>> {
        let mut out = Vec::new();
        for op in self.output_ops()? {
            out.extend(op.output_tensors());
        }
        Ok(out)
    }
}
