use snafu::Snafu;

use crate::types::{Backend, GraphId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// IR error kinds.
///
/// Variants group into validation errors (malformed construction arguments),
/// consistency errors (documented preconditions violated), and lookup errors
/// (a name absent from its expected scope). "No match" from the pattern
/// matcher is never an error.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    // ===== validation =====
    /// A required identifier is empty.
    #[snafu(display("{what} must be a non-empty string"))]
    EmptyName { what: &'static str },

    /// Graph declared without output nodes.
    #[snafu(display("a graph requires at least one output node"))]
    EmptyOutputNodes,

    /// Explicit arity disagrees with the tensor list length.
    #[snafu(display("op `{op}`: {what} is {expected} but {actual} tensors were given"))]
    ArityMismatch { op: String, what: &'static str, expected: usize, actual: usize },

    /// Opaque attribute payload under a non-reserved key.
    #[snafu(display("op `{op}`: opaque value for attribute `{key}` requires a reserved-prefix key"))]
    OpaqueAttrValue { op: String, key: String },

    /// Input permutation is not a permutation of the op's input slots.
    #[snafu(display("invalid input permutation {permutation:?} for arity {arity}"))]
    InvalidPermutation { permutation: Vec<usize>, arity: usize },

    // ===== consistency =====
    /// Insertion would shadow an existing node.
    #[snafu(display("duplicate op `{name}` in graph"))]
    DuplicateOp { name: String },

    /// Operation requires a specific backend.
    #[snafu(display("operation requires a tensorflow graph, got backend `{backend}`"))]
    UnsupportedBackend { backend: Backend },

    /// Null-input insertion on a non-placeholder op.
    #[snafu(display("op `{op}` has type `{op_type}`, null input slots require `Placeholder`"))]
    NotAPlaceholder { op: String, op_type: String },

    /// Tensor slot index out of range.
    #[snafu(display("index {index} out of bounds for {len} tensor slots"))]
    IndexOutOfBounds { index: usize, len: usize },

    /// A handle was resolved against a graph it does not belong to.
    #[snafu(display("handle belongs to graph {expected}, resolved against {actual}"))]
    GraphMismatch { expected: GraphId, actual: GraphId },

    /// Cycle detected during topological ordering.
    #[snafu(display("graph contains a cycle through op `{node}`"))]
    GraphCycle { node: String },

    // ===== lookup =====
    /// Node name absent from the graph's node map.
    #[snafu(display("op `{name}` not found in graph"))]
    OpNotFound { name: String },

    /// Non-null tensor whose producer is missing: an IR inconsistency.
    #[snafu(display("tensor `{tensor}` names producer `{op_name}`, which is not in the graph"))]
    ProducerNotFound { tensor: String, op_name: String },

    /// Node name absent from a graph view's member set.
    #[snafu(display("op `{name}` not found in graph view"))]
    NotInView { name: String },
}
