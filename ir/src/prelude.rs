//! Common imports for working with IR graphs.
//!
//! ```rust,ignore
//! use graft_ir::prelude::*;
//! ```

pub use crate::attr::AttrValue;
pub use crate::dtype::DType;
pub use crate::error::{Error, Result};
pub use crate::graph::{CopyContext, Graph};
pub use crate::op::{OpNode, OpNodeBuilder};
pub use crate::tensor::TensorInfo;
pub use crate::types::{shape_of, Backend, GraphId, ScalarValue, TensorShape, NULL_OP_PREFIX, PLACEHOLDER_OP_TYPE};
pub use crate::view::GraphView;
