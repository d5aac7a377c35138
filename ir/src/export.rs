//! Graph-definition export.
//!
//! Derives a serializable graph definition from a tensorflow-backed graph:
//! one record per node in cached topological order, inputs as
//! `"producer:index"` tensor names, device placement read from the
//! backend-scoped device attribute. The wire encoding itself lives outside
//! this crate; the records here only need to serialize.

use std::collections::BTreeMap;

use snafu::ensure;

use crate::attr::AttrValue;
use crate::error::{Result, UnsupportedBackendSnafu};
use crate::graph::Graph;
use crate::types::{Backend, DEVICE_ATTR_KEY, RESERVED_ATTR_PREFIX};

/// One exported node record.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct NodeDef {
    pub name: String,
    pub op: String,
    pub input: Vec<String>,
    pub device: String,
    pub attr: BTreeMap<String, AttrValue>,
}

/// Exported graph definition: node records in topological order.
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct GraphDef {
    pub node: Vec<NodeDef>,
}

/// Whether an attribute key is backend-scoped (`<scope>__<name>`). Such keys
/// parameterize the export itself and are not emitted as node attributes.
fn is_backend_scoped_key(key: &str) -> bool {
    match key.split_once("__") {
        Some((scope, rest)) => is_ident(scope) && is_ident(rest),
        None => false,
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl Graph {
    /// Derive the graph definition. Requires the tensorflow backend.
    ///
    /// Backend-scoped and reserved-prefix attribute keys are omitted from
    /// the per-node attribute maps; the device string defaults to empty when
    /// the device attribute is absent.
    pub fn to_graph_def(&self) -> Result<GraphDef> {
        ensure!(self.backend() == Backend::TensorFlow, UnsupportedBackendSnafu { backend: self.backend() });
        let mut def = GraphDef::default();
        for op in self.ops()? {
            let device = op.attr(DEVICE_ATTR_KEY).and_then(AttrValue::as_str).unwrap_or_default().to_string();
            let attr: BTreeMap<String, AttrValue> = op
                .attributes()
                .iter()
                .filter(|(key, _)| !is_backend_scoped_key(key) && !key.starts_with(RESERVED_ATTR_PREFIX))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            def.node.push(NodeDef {
                name: op.name().to_string(),
                op: op.op_type().to_string(),
                input: op.input_tensors().iter().map(|t| t.name().to_string()).collect(),
                device,
                attr,
            });
        }
        Ok(def)
    }
}
