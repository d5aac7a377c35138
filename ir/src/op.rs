//! Operation nodes.
//!
//! An [`OpNode`] is one computation step: a type tag, ordered input and
//! output tensor lists, and a typed attribute map. Nodes are owned by value
//! inside their graph's node map and carry the owning graph's id; the
//! derived input/output node sets are resolved through that graph.
//!
//! Nodes are constructed through [`OpNodeBuilder`], which validates its
//! arguments and then either registers the node into a graph
//! ([`OpNodeBuilder::finish`]) or returns it detached
//! ([`OpNodeBuilder::build`]).

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use snafu::ensure;

use crate::attr::AttrValue;
use crate::dtype::DType;
use crate::error::{
    ArityMismatchSnafu, EmptyNameSnafu, IndexOutOfBoundsSnafu, InvalidPermutationSnafu, NotAPlaceholderSnafu,
    OpaqueAttrValueSnafu, Result,
};
use crate::graph::{CopyContext, Graph};
use crate::tensor::TensorInfo;
use crate::types::{Backend, GraphId, TensorShape, PLACEHOLDER_OP_TYPE};

/// A computation node in a graph.
///
/// Equality is name plus owning-graph identity; hashing uses the name alone.
#[derive(Debug, Clone)]
pub struct OpNode {
    name: String,
    op_type: String,
    backend: Backend,
    graph: GraphId,
    input_tensors: Vec<TensorInfo>,
    output_tensors: Vec<TensorInfo>,
    n_inputs: usize,
    n_outputs: usize,
    attributes: BTreeMap<String, AttrValue>,
}

impl OpNode {
    /// Start building a node with the given name and op type.
    pub fn builder(name: impl Into<String>, op_type: impl Into<String>) -> OpNodeBuilder {
        OpNodeBuilder {
            name: name.into(),
            op_type: op_type.into(),
            backend: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            n_inputs: None,
            n_outputs: None,
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn graph(&self) -> GraphId {
        self.graph
    }

    pub fn input_tensors(&self) -> &[TensorInfo] {
        &self.input_tensors
    }

    pub fn output_tensors(&self) -> &[TensorInfo] {
        &self.output_tensors
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Output tensor at `index`, bounds-checked.
    pub fn output(&self, index: usize) -> Result<&TensorInfo> {
        ensure!(index < self.output_tensors.len(), IndexOutOfBoundsSnafu { index, len: self.output_tensors.len() });
        Ok(&self.output_tensors[index])
    }

    /// Producers of this node's non-null input tensors, de-duplicated,
    /// first-seen order. A non-null input whose producer is absent from the
    /// graph is a lookup error.
    pub fn input_nodes<'g>(&self, graph: &'g Graph) -> Result<Vec<&'g OpNode>> {
        let mut names: Vec<&str> = Vec::new();
        for tensor in &self.input_tensors {
            if tensor.is_null() {
                continue;
            }
            if !names.contains(&tensor.op_name()) {
                names.push(tensor.op_name());
            }
        }
        names.into_iter().map(|name| graph.node(name)).collect()
    }

    /// Consumers of this node's output tensors, first-seen topological order.
    ///
    /// Scans every node in the owning graph on each call; no cache. The
    /// graphs this IR targets are small enough that the O(|graph|) scan is
    /// acceptable.
    pub fn output_nodes<'g>(&self, graph: &'g Graph) -> Result<Vec<&'g OpNode>> {
        let mut out: Vec<&'g OpNode> = Vec::new();
        for op in graph.ops()? {
            let consumes = op.input_tensors.iter().any(|t| t.op_name() == self.name);
            if consumes && !out.iter().any(|o| o.name == op.name) {
                out.push(op);
            }
        }
        Ok(out)
    }

    /// Insert a fresh null tensor into the input list.
    ///
    /// Only placeholder ops accept unbound input slots. `index` defaults to
    /// appending; an index past the end is a consistency error. Returns the
    /// created handle.
    pub fn add_null_input_tensor(&mut self, index: Option<usize>) -> Result<TensorInfo> {
        ensure!(
            self.op_type == PLACEHOLDER_OP_TYPE,
            NotAPlaceholderSnafu { op: &self.name, op_type: &self.op_type }
        );
        let index = index.unwrap_or(self.input_tensors.len());
        ensure!(index <= self.input_tensors.len(), IndexOutOfBoundsSnafu { index, len: self.input_tensors.len() });
        let tensor = TensorInfo::make_null(self.graph, DType::default(), None);
        self.input_tensors.insert(index, tensor.clone());
        self.n_inputs += 1;
        Ok(tensor)
    }

    /// Overwrite the input slot at `index` with a fresh null tensor.
    pub fn replace_with_null_input_tensor(&mut self, index: usize) -> Result<TensorInfo> {
        ensure!(index < self.input_tensors.len(), IndexOutOfBoundsSnafu { index, len: self.input_tensors.len() });
        let tensor = TensorInfo::make_null(self.graph, DType::default(), None);
        self.input_tensors[index] = tensor.clone();
        Ok(tensor)
    }

    /// Detached clone with input tensors reordered by `permutation`.
    ///
    /// Used by the equivalence registry to materialize commutative-argument
    /// candidates. The permutation must cover every input slot exactly once.
    pub fn with_permuted_inputs(&self, permutation: &[usize]) -> Result<OpNode> {
        let arity = self.input_tensors.len();
        let mut sorted: Vec<usize> = permutation.to_vec();
        sorted.sort_unstable();
        ensure!(
            sorted.len() == arity && sorted.iter().enumerate().all(|(i, &p)| i == p),
            InvalidPermutationSnafu { permutation: permutation.to_vec(), arity }
        );
        let mut copy = self.clone();
        copy.input_tensors = permutation.iter().map(|&i| self.input_tensors[i].clone()).collect();
        Ok(copy)
    }

    /// Copy this node into the graph named by the copy context. Every tensor
    /// handle in the copy points at the context's target graph, so all
    /// cross-references inside one deep copy land on the same new graph.
    pub fn copy_into(&self, cx: &CopyContext) -> OpNode {
        let mut copy = self.clone();
        copy.graph = cx.target();
        copy.input_tensors = self.input_tensors.iter().map(|t| t.copy_into(cx)).collect();
        copy.output_tensors = self.output_tensors.iter().map(|t| t.copy_into(cx)).collect();
        copy
    }

    /// Retag this node and all of its tensors to `graph`.
    pub(crate) fn rebind(&mut self, graph: GraphId) {
        self.graph = graph;
        for tensor in self.input_tensors.iter_mut().chain(self.output_tensors.iter_mut()) {
            tensor.move_into(graph);
        }
    }

    /// Rename for a suffixed graph copy: the node name and every tensor
    /// cross-reference get `_{suffix}` appended.
    pub(crate) fn apply_suffix(&mut self, suffix: &str) {
        self.name = format!("{}_{}", self.name, suffix);
        for tensor in self.input_tensors.iter_mut().chain(self.output_tensors.iter_mut()) {
            tensor.apply_suffix(suffix);
        }
    }
}

impl PartialEq for OpNode {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.graph == other.graph
    }
}

impl Eq for OpNode {}

impl Hash for OpNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

enum OutputSlot {
    Spec { dtype: DType, shape: TensorShape },
    Tensor(TensorInfo),
}

/// Builder for [`OpNode`].
///
/// `finish` registers the node into a graph (the node map write is the
/// side effect the IR build flow relies on, last write wins); `build`
/// returns a detached node for [`Graph::add_op`] or synthetic candidates.
pub struct OpNodeBuilder {
    name: String,
    op_type: String,
    backend: Option<Backend>,
    inputs: Vec<TensorInfo>,
    outputs: Vec<OutputSlot>,
    n_inputs: Option<usize>,
    n_outputs: Option<usize>,
    attributes: Vec<(String, AttrValue)>,
}

impl OpNodeBuilder {
    /// Override the backend tag; defaults to the graph's backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Append an input tensor.
    pub fn input(mut self, tensor: TensorInfo) -> Self {
        self.inputs.push(tensor);
        self
    }

    /// Append several input tensors.
    pub fn inputs(mut self, tensors: impl IntoIterator<Item = TensorInfo>) -> Self {
        self.inputs.extend(tensors);
        self
    }

    /// Append an output tensor named `"<op_name>:<index>"`.
    pub fn output(mut self, dtype: DType, shape: TensorShape) -> Self {
        self.outputs.push(OutputSlot::Spec { dtype, shape });
        self
    }

    /// Append an explicitly constructed output tensor.
    pub fn output_tensor(mut self, tensor: TensorInfo) -> Self {
        self.outputs.push(OutputSlot::Tensor(tensor));
        self
    }

    /// Declare the expected input arity; must equal the input list length.
    pub fn n_inputs(mut self, n: usize) -> Self {
        self.n_inputs = Some(n);
        self
    }

    /// Declare the expected output arity; must equal the output list length.
    pub fn n_outputs(mut self, n: usize) -> Self {
        self.n_outputs = Some(n);
        self
    }

    /// Attach an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Validate and return a detached node bound to `graph`'s id, without
    /// touching the node map.
    pub fn build(self, graph: &Graph) -> Result<OpNode> {
        ensure!(!self.name.is_empty(), EmptyNameSnafu { what: "op name" });
        ensure!(!self.op_type.is_empty(), EmptyNameSnafu { what: "op type" });

        if let Some(expected) = self.n_inputs {
            ensure!(
                expected == self.inputs.len(),
                ArityMismatchSnafu { op: &self.name, what: "n_inputs", expected, actual: self.inputs.len() }
            );
        }
        if let Some(expected) = self.n_outputs {
            ensure!(
                expected == self.outputs.len(),
                ArityMismatchSnafu { op: &self.name, what: "n_outputs", expected, actual: self.outputs.len() }
            );
        }

        let mut attributes = BTreeMap::new();
        for (key, value) in self.attributes {
            ensure!(value.permitted_under(&key), OpaqueAttrValueSnafu { op: &self.name, key: &key });
            attributes.insert(key, value);
        }

        let id = graph.id();
        let mut inputs = self.inputs;
        for tensor in &mut inputs {
            tensor.move_into(id);
        }

        let mut outputs = Vec::with_capacity(self.outputs.len());
        for (index, slot) in self.outputs.into_iter().enumerate() {
            match slot {
                OutputSlot::Spec { dtype, shape } => {
                    outputs.push(TensorInfo::new(format!("{}:{index}", self.name), &self.name, dtype, shape, id)?);
                }
                OutputSlot::Tensor(mut tensor) => {
                    tensor.move_into(id);
                    outputs.push(tensor);
                }
            }
        }

        Ok(OpNode {
            n_inputs: inputs.len(),
            n_outputs: outputs.len(),
            name: self.name,
            op_type: self.op_type,
            backend: self.backend.unwrap_or(graph.backend()),
            graph: id,
            input_tensors: inputs,
            output_tensors: outputs,
            attributes,
        })
    }

    /// Validate and register the node into `graph`, returning clones of its
    /// output tensors for wiring downstream ops.
    pub fn finish(self, graph: &mut Graph) -> Result<Vec<TensorInfo>> {
        let op = self.build(graph)?;
        let outputs = op.output_tensors().to_vec();
        graph.register(op);
        Ok(outputs)
    }
}
