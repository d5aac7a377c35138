//! Graph intermediate representation for imported computation graphs.
//!
//! This crate defines the IR data structures shared by the graph
//! transformation pipeline.
//!
//! # Module Organization
//!
//! - [`types`] - Identifiers, backend tags, shapes, reserved name prefixes
//! - [`dtype`] - Tensor element types
//! - [`attr`] - Typed attribute values
//! - [`tensor`] - Tensor handles (data edges), null-tensor sentinel
//! - [`op`] - Operation nodes and their builder
//! - [`graph`] - The owning graph arena: ordering, copying, merging
//! - [`view`] - Read-only node-subset views
//! - [`export`] - Serializable graph-definition derivation
//! - [`error`] - Error types and result handling

pub mod attr;
pub mod dtype;
pub mod error;
pub mod export;
pub mod graph;
pub mod op;
pub mod prelude;
pub mod tensor;
pub mod types;
pub mod view;

#[cfg(test)]
mod test;

// Re-exports: all core types remain accessible at the crate root.
pub use attr::AttrValue;
pub use dtype::DType;
pub use error::{Error, Result};
pub use export::{GraphDef, NodeDef};
pub use graph::{CopyContext, Graph};
pub use op::{OpNode, OpNodeBuilder};
pub use tensor::TensorInfo;
pub use types::{
    shape_of, Backend, GraphId, ScalarValue, TensorShape, DEVICE_ATTR_KEY, NULL_OP_PREFIX, PLACEHOLDER_OP_TYPE,
    RESERVED_ATTR_PREFIX,
};
pub use view::GraphView;
