//! Shared type definitions for the graph IR.
//!
//! This module contains the small value types used throughout the IR:
//! graph identifiers, backend tags, tensor shapes, and scalar attribute
//! values, along with the reserved naming conventions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use smallvec::SmallVec;

/// Prefix marking a tensor as a null tensor (a value supplied from outside
/// the graph, with no producing op). The check is a pure name-prefix test so
/// it survives copy and rename as long as renames append suffixes.
pub const NULL_OP_PREFIX: &str = "_graft_null";

/// Attribute keys starting with this prefix are internal bookkeeping: their
/// values are stored as given, without normalization, and are never exported.
pub const RESERVED_ATTR_PREFIX: &str = "_graft_";

/// The designated free-input op type. Pattern nodes of this type with no
/// input tensors match any subject node during equivalence queries.
pub const PLACEHOLDER_OP_TYPE: &str = "Placeholder";

/// Backend-scoped attribute key carrying the device placement string used by
/// the graph-definition export.
pub const DEVICE_ATTR_KEY: &str = "tensorflow__device";

/// Stable process-unique identifier of a [`Graph`](crate::Graph) instance.
///
/// Tensors and ops carry a `GraphId` instead of an owning back-reference;
/// all cross-references are resolved by lookup through the owning graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u64);

static GRAPH_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

impl GraphId {
    /// Allocate a fresh identifier. Never reused within a process.
    pub(crate) fn next() -> Self {
        GraphId(GRAPH_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// The training framework a graph was imported from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Backend {
    #[default]
    Unspecified,
    TensorFlow,
    PyTorch,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Unspecified => "unspecified",
            Backend::TensorFlow => "tensorflow",
            Backend::PyTorch => "pytorch",
        };
        f.write_str(name)
    }
}

/// Tensor shape: `None` means unknown rank, a `None` entry means an unknown
/// dimension. Dimensions are `usize`, so non-negativity holds by construction.
pub type TensorShape = Option<SmallVec<[Option<usize>; 4]>>;

/// Build a fully-known shape from a list of dimensions.
pub fn shape_of(dims: &[usize]) -> TensorShape {
    Some(dims.iter().map(|&d| Some(d)).collect())
}

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float(v)
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Str(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Str(v)
    }
}

const IDENT_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Random alphanumeric identifier fragment, used for null-tensor names and
/// default rename suffixes.
pub(crate) fn random_ident(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| IDENT_CHARSET[rng.gen_range(0..IDENT_CHARSET.len())] as char).collect()
}
