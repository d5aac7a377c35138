//! Tensor handles: the data edges of the graph.
//!
//! A [`TensorInfo`] is a value-like descriptor of one edge. It carries the
//! id of its owning graph rather than a reference; the producing op is
//! resolved by name through that graph's node map. A *null tensor* is a
//! sentinel whose producer name carries [`NULL_OP_PREFIX`]: it stands for a
//! value supplied from outside the graph and has no producing op.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use snafu::ensure;

use crate::dtype::DType;
use crate::error::{EmptyNameSnafu, GraphMismatchSnafu, ProducerNotFoundSnafu, Result};
use crate::graph::{CopyContext, Graph};
use crate::op::OpNode;
use crate::types::{random_ident, GraphId, TensorShape, NULL_OP_PREFIX};

/// Descriptor of a single tensor edge.
///
/// Tensor names follow the `"<op_name>:<index>"` convention of the import
/// format. Equality is name plus owning-graph identity; hashing and ordering
/// use the name alone.
#[derive(Debug, Clone)]
pub struct TensorInfo {
    name: String,
    op_name: String,
    dtype: DType,
    shape: TensorShape,
    graph: GraphId,
}

impl TensorInfo {
    /// Construct a tensor handle. Name and producer name must be non-empty.
    pub fn new(
        name: impl Into<String>,
        op_name: impl Into<String>,
        dtype: DType,
        shape: TensorShape,
        graph: GraphId,
    ) -> Result<Self> {
        let name = name.into();
        let op_name = op_name.into();
        ensure!(!name.is_empty(), EmptyNameSnafu { what: "tensor name" });
        ensure!(!op_name.is_empty(), EmptyNameSnafu { what: "tensor op_name" });
        Ok(Self { name, op_name, dtype, shape, graph })
    }

    /// Make a null tensor owned by `graph`.
    ///
    /// The handle gets a fresh randomized producer name under the null
    /// prefix, so it never collides with a real op and [`Self::is_null`]
    /// holds by construction.
    pub fn make_null(graph: GraphId, dtype: DType, shape: TensorShape) -> Self {
        let op_name = format!("{}_{}", NULL_OP_PREFIX, random_ident(8));
        let name = format!("{op_name}:0");
        Self { name, op_name, dtype, shape, graph }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn graph(&self) -> GraphId {
        self.graph
    }

    /// Whether this handle is a null tensor. A pure name-prefix test, not a
    /// stored flag, so it stays correct across copy and suffix renames.
    pub fn is_null(&self) -> bool {
        self.op_name.starts_with(NULL_OP_PREFIX)
    }

    /// Reassign the owning graph id.
    ///
    /// Low-level move primitive: no node map is touched, and any op still
    /// listing this tensor must be fixed up by the caller. Prefer
    /// [`Graph::move_op_into`] which composes the full move.
    pub fn move_into(&mut self, graph: GraphId) {
        self.graph = graph;
    }

    /// Resolve the producing op through the owning graph.
    ///
    /// Returns `Ok(None)` only for null tensors. A missing producer on an
    /// ordinary tensor is an IR inconsistency and reported as a lookup
    /// error, as is resolving against a graph this handle does not belong to.
    pub fn producer<'g>(&self, graph: &'g Graph) -> Result<Option<&'g OpNode>> {
        ensure!(graph.id() == self.graph, GraphMismatchSnafu { expected: self.graph, actual: graph.id() });
        if self.is_null() {
            return Ok(None);
        }
        match graph.node(&self.op_name) {
            Ok(op) => Ok(Some(op)),
            Err(_) => ProducerNotFoundSnafu { tensor: &self.name, op_name: &self.op_name }.fail(),
        }
    }

    /// Copy this handle into the graph named by the copy context.
    pub fn copy_into(&self, cx: &CopyContext) -> TensorInfo {
        let mut copy = self.clone();
        copy.graph = cx.target();
        copy
    }

    /// Rewrite names for a suffixed graph copy: the producer component of
    /// `"<op>:<index>"` gets `_{suffix}` appended, the index is preserved.
    pub(crate) fn apply_suffix(&mut self, suffix: &str) {
        self.name = match self.name.split_once(':') {
            Some((op, index)) => format!("{op}_{suffix}:{index}"),
            None => format!("{}_{}", self.name, suffix),
        };
        self.op_name = format!("{}_{}", self.op_name, suffix);
    }
}

impl PartialEq for TensorInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.graph == other.graph
    }
}

impl Eq for TensorInfo {}

impl Hash for TensorInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for TensorInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TensorInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name).then_with(|| self.graph.cmp(&other.graph))
    }
}
