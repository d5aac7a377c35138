//! The graph arena: owner of operation nodes and their tensors.
//!
//! A [`Graph`] owns its [`OpNode`]s by value in a name-keyed map and is
//! identified by a process-unique [`GraphId`]. Nodes and tensors refer back
//! to their graph through that id only, so ownership stays a tree and all
//! cross-references are lookups through the arena.
//!
//! Invariants:
//! - `output_nodes` is non-empty (checked at construction).
//! - The nodes reachable from `output_nodes` form a DAG; a cycle is a hard
//!   ordering error.
//! - `topo_order` lists reachable nodes producers-before-consumers; it is
//!   empty until first computed and recomputed idempotently by [`Graph::sort`].

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use snafu::ensure;

use crate::error::{DuplicateOpSnafu, EmptyOutputNodesSnafu, GraphCycleSnafu, OpNotFoundSnafu, Result};
use crate::op::OpNode;
use crate::tensor::TensorInfo;
use crate::types::{random_ident, Backend, GraphId};

/// Explicit copy context threaded through deep-copy operations.
///
/// Every tensor and node copied under one context is retagged to the same
/// target graph, so cross-references among the copies resolve against the
/// new arena rather than the original.
#[derive(Debug, Clone, Copy)]
pub struct CopyContext {
    target: GraphId,
}

impl CopyContext {
    pub fn new(target: GraphId) -> Self {
        Self { target }
    }

    pub fn target(&self) -> GraphId {
        self.target
    }
}

/// An owned computation graph.
pub struct Graph {
    id: GraphId,
    backend: Backend,
    output_nodes: Vec<String>,
    /// Name-keyed node storage. BTreeMap iteration order doubles as the
    /// deterministic tiebreak for topological sorting.
    nodes: std::collections::BTreeMap<String, OpNode>,
    /// Cached topological order; empty until first computed.
    topo_order: RefCell<Vec<String>>,
    /// Lazily built op_type -> node names index.
    type_index: RefCell<Option<HashMap<String, Vec<String>>>>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("backend", &self.backend)
            .field("output_nodes", &self.output_nodes)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Graph {
    /// Create an empty graph. At least one output node name is required.
    pub fn new(output_nodes: impl IntoIterator<Item = impl Into<String>>, backend: Backend) -> Result<Self> {
        let output_nodes: Vec<String> = output_nodes.into_iter().map(Into::into).collect();
        ensure!(!output_nodes.is_empty(), EmptyOutputNodesSnafu);
        Ok(Self {
            id: GraphId::next(),
            backend,
            output_nodes,
            nodes: std::collections::BTreeMap::new(),
            topo_order: RefCell::new(Vec::new()),
            type_index: RefCell::new(None),
        })
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn output_nodes(&self) -> &[String] {
        &self.output_nodes
    }

    /// Replace the declared output nodes (e.g. after a merge) and drop the
    /// stale topological order.
    pub fn set_output_nodes(&mut self, output_nodes: impl IntoIterator<Item = impl Into<String>>) -> Result<()> {
        let output_nodes: Vec<String> = output_nodes.into_iter().map(Into::into).collect();
        ensure!(!output_nodes.is_empty(), EmptyOutputNodesSnafu);
        self.output_nodes = output_nodes;
        self.topo_order.borrow_mut().clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Node lookup by name.
    pub fn node(&self, name: &str) -> Result<&OpNode> {
        self.nodes.get(name).ok_or_else(|| OpNotFoundSnafu { name }.build())
    }

    /// Mutable node lookup by name.
    pub fn node_mut(&mut self, name: &str) -> Result<&mut OpNode> {
        self.nodes.get_mut(name).ok_or_else(|| OpNotFoundSnafu { name }.build())
    }

    /// Iterate nodes in name order (not topological order).
    pub fn iter(&self) -> impl Iterator<Item = &OpNode> {
        self.nodes.values()
    }

    /// Register a node, retagging it to this graph. Last write wins; this is
    /// the construction-time registration path used by the node builder.
    pub(crate) fn register(&mut self, mut op: OpNode) {
        op.rebind(self.id);
        *self.type_index.borrow_mut() = None;
        tracing::trace!(graph = %self.id, op = %op.name(), op_type = %op.op_type(), "op registered");
        self.nodes.insert(op.name().to_string(), op);
    }

    /// Insert an already-built node, rejecting duplicates.
    ///
    /// The node is adopted: it and its tensors are retagged to this graph.
    /// With `resort` the topological order is recomputed immediately (a full
    /// re-sort per insertion); pass `false` during bulk construction and
    /// call [`Graph::sort`] once at the end.
    pub fn add_op(&mut self, op: OpNode, resort: bool) -> Result<()> {
        ensure!(!self.nodes.contains_key(op.name()), DuplicateOpSnafu { name: op.name() });
        tracing::debug!(graph = %self.id, op = %op.name(), resort, "op added");
        self.register(op);
        if resort {
            self.sort()?;
        }
        Ok(())
    }

    /// Nodes of the given op type, via a lazily built index.
    ///
    /// The index is built on first call and invalidated whenever a node is
    /// registered, so additions are always visible.
    pub fn get_ops_by_type(&self, op_type: &str) -> Vec<&OpNode> {
        if self.type_index.borrow().is_none() {
            let mut index: HashMap<String, Vec<String>> = HashMap::new();
            for op in self.nodes.values() {
                index.entry(op.op_type().to_string()).or_default().push(op.name().to_string());
            }
            tracing::debug!(graph = %self.id, types = index.len(), "type index built");
            *self.type_index.borrow_mut() = Some(index);
        }
        let borrow = self.type_index.borrow();
        let names = borrow.as_ref().and_then(|index| index.get(op_type));
        names
            .map(|names| names.iter().filter_map(|name| self.nodes.get(name)).collect())
            .unwrap_or_default()
    }

    /// Recompute the topological order over nodes reachable from the output
    /// nodes, producers before consumers, lexicographic tiebreak. Idempotent.
    ///
    /// Fails with a lookup error on dangling references and with a
    /// consistency error on a cycle.
    pub fn sort(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Open,
            Done,
        }

        let mut order: Vec<String> = Vec::with_capacity(self.nodes.len());
        let mut marks: HashMap<String, Mark> = HashMap::new();
        // (name, expanded): the second visit of an entry emits it post-order.
        let mut stack: Vec<(String, bool)> = Vec::new();
        for output in self.output_nodes.iter().rev() {
            stack.push((output.clone(), false));
        }

        while let Some((name, expanded)) = stack.pop() {
            if expanded {
                marks.insert(name.clone(), Mark::Done);
                order.push(name);
                continue;
            }
            match marks.get(&name) {
                Some(Mark::Done) => continue,
                // Reached again while still being expanded: back edge.
                Some(Mark::Open) => return GraphCycleSnafu { node: name }.fail(),
                None => {}
            }
            let op = self.node(&name)?;
            marks.insert(name.clone(), Mark::Open);
            stack.push((name, true));

            let mut producers: Vec<&str> = Vec::new();
            for tensor in op.input_tensors() {
                if tensor.is_null() {
                    continue;
                }
                if !producers.contains(&tensor.op_name()) {
                    producers.push(tensor.op_name());
                }
            }
            for producer in producers.into_iter().rev() {
                if marks.get(producer) != Some(&Mark::Done) {
                    stack.push((producer.to_string(), false));
                }
            }
        }

        tracing::trace!(graph = %self.id, ordered = order.len(), total = self.nodes.len(), "topological sort");
        *self.topo_order.borrow_mut() = order;
        Ok(())
    }

    /// Current cached topological order (may be empty if never computed).
    pub fn topo_order(&self) -> Vec<String> {
        self.topo_order.borrow().clone()
    }

    /// Nodes in topological order, sorting first if the cache is empty.
    pub fn ops(&self) -> Result<Vec<&OpNode>> {
        if self.topo_order.borrow().is_empty() {
            self.sort()?;
        }
        let order = self.topo_order.borrow();
        order.iter().map(|name| self.node(name)).collect()
    }

    /// The declared terminal nodes, resolved.
    pub fn output_ops(&self) -> Result<Vec<&OpNode>> {
        self.output_nodes.iter().map(|name| self.node(name)).collect()
    }

    /// Output tensors of the output nodes, de-duplicated by name.
    pub fn output_tensors(&self) -> Result<Vec<&TensorInfo>> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut out = Vec::new();
        for op in self.output_ops()? {
            for tensor in op.output_tensors() {
                if seen.insert(tensor.name()) {
                    out.push(tensor);
                }
            }
        }
        Ok(out)
    }

    /// Nodes that take no input tensor or at least one null input tensor.
    pub fn input_ops(&self) -> Vec<&OpNode> {
        self.nodes
            .values()
            .filter(|op| op.input_tensors().is_empty() || op.input_tensors().iter().any(TensorInfo::is_null))
            .collect()
    }

    /// Input tensors of the input ops whose producer is not itself an input
    /// op (null tensors included), de-duplicated by name.
    pub fn input_tensors(&self) -> Vec<&TensorInfo> {
        let input_ops = self.input_ops();
        let input_names: BTreeSet<&str> = input_ops.iter().map(|op| op.name()).collect();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut out = Vec::new();
        for op in &input_ops {
            for tensor in op.input_tensors() {
                if !input_names.contains(tensor.op_name()) && seen.insert(tensor.name()) {
                    out.push(tensor);
                }
            }
        }
        out
    }

    /// Move one node into `dest`: removed here, retagged (tensors included),
    /// registered there. Both graphs' caches are dropped; re-sort after the
    /// batch of moves is done.
    pub fn move_op_into(&mut self, name: &str, dest: &mut Graph) -> Result<()> {
        let op = self.nodes.remove(name).ok_or_else(|| OpNotFoundSnafu { name }.build())?;
        self.topo_order.borrow_mut().clear();
        *self.type_index.borrow_mut() = None;
        dest.register(op);
        dest.topo_order.borrow_mut().clear();
        Ok(())
    }

    /// Drain every node of this graph into `dest`.
    ///
    /// Unsafe in the contract sense: afterwards `dest.output_nodes` and its
    /// topological order are the caller's responsibility. Fix the output
    /// nodes first, then run [`Graph::sort`] and [`Graph::prune`]. This
    /// graph is left empty and must not be used further. When `dest`'s type
    /// index has already been built it is extended in place.
    pub fn unsafe_merge_into(&mut self, dest: &mut Graph) {
        tracing::warn!(src = %self.id, dest = %dest.id, moved = self.nodes.len(), "unsafe merge; dest outputs and order are stale");
        let nodes = std::mem::take(&mut self.nodes);
        let mut index = dest.type_index.borrow_mut();
        for (name, mut op) in nodes {
            op.rebind(dest.id);
            if let Some(index) = index.as_mut() {
                index.entry(op.op_type().to_string()).or_default().push(name.clone());
            }
            dest.nodes.insert(name, op);
        }
        drop(index);
        self.topo_order.borrow_mut().clear();
        *self.type_index.borrow_mut() = None;
        dest.topo_order.borrow_mut().clear();
    }

    /// Drop every node not reachable from the output nodes.
    pub fn prune(&mut self) -> Result<()> {
        let mut reachable: BTreeSet<String> = BTreeSet::new();
        let mut pending: Vec<String> = Vec::new();
        for output in &self.output_nodes {
            self.node(output)?;
            if reachable.insert(output.clone()) {
                pending.push(output.clone());
            }
        }
        while let Some(name) = pending.pop() {
            let op = self.node(&name)?;
            for tensor in op.input_tensors() {
                if tensor.is_null() {
                    continue;
                }
                let producer = tensor.op_name();
                if self.nodes.contains_key(producer) && reachable.insert(producer.to_string()) {
                    pending.push(producer.to_string());
                }
            }
        }
        let before = self.nodes.len();
        self.nodes.retain(|name, _| reachable.contains(name));
        if self.nodes.len() != before {
            tracing::debug!(graph = %self.id, removed = before - self.nodes.len(), "pruned unreachable ops");
            self.topo_order.borrow_mut().clear();
            *self.type_index.borrow_mut() = None;
        }
        Ok(())
    }

    /// Structure-preserving deep copy into a fresh graph instance.
    pub fn deep_copy(&self) -> Result<Graph> {
        let mut copy = Graph::new(self.output_nodes.clone(), self.backend)?;
        let cx = CopyContext::new(copy.id);
        for (name, op) in &self.nodes {
            copy.nodes.insert(name.clone(), op.copy_into(&cx));
        }
        copy.sort()?;
        Ok(copy)
    }

    /// Deep copy with every identifier suffixed by `_{suffix}`.
    ///
    /// Node names, tensor names (suffix inserted into the producer component
    /// of `"<op>:<index>"`, index preserved), and the declared output-node
    /// list are rewritten consistently, so the copy shares no name with the
    /// original. With `None` a random 8-character suffix is drawn. Returns
    /// the copy together with the suffix used.
    pub fn copy_with_suffix(&self, suffix: Option<&str>) -> Result<(Graph, String)> {
        let suffix = suffix.map(str::to_string).unwrap_or_else(|| random_ident(8));
        let outputs: Vec<String> = self.output_nodes.iter().map(|name| format!("{name}_{suffix}")).collect();
        let mut copy = Graph::new(outputs, self.backend)?;
        let cx = CopyContext::new(copy.id);
        for op in self.nodes.values() {
            let mut renamed = op.copy_into(&cx);
            renamed.apply_suffix(&suffix);
            copy.nodes.insert(renamed.name().to_string(), renamed);
        }
        copy.sort()?;
        tracing::debug!(src = %self.id, copy = %copy.id, %suffix, "graph copied with suffix");
        Ok((copy, suffix))
    }
}
