//! Structural morphisms and the decorated op they produce.
//!
//! A morphism describes how an op of one type can stand in for an op of
//! another type during matching: it knows how to derive the adjusted
//! attribute set of the substitute. The transform itself is applied by the
//! rewriting layer; the matcher only records which morphism made a pairing
//! legal.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use graft_ir::{AttrValue, Graph, GraphId, OpNode, TensorInfo};

/// Structural-compatibility transform between two op types.
pub trait Morphism: fmt::Debug + Send + Sync {
    /// Short identifying name, for logs and match reports.
    fn name(&self) -> &str;

    /// Attribute map of the substitute op derived from the matched op.
    fn adjusted_attributes(&self, op: &OpNode) -> BTreeMap<String, AttrValue>;
}

/// Morphism that keeps the matched op's attributes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMorphism;

impl Morphism for IdentityMorphism {
    fn name(&self) -> &str {
        "identity"
    }

    fn adjusted_attributes(&self, op: &OpNode) -> BTreeMap<String, AttrValue> {
        op.attributes().clone()
    }
}

/// An op paired with the morphism that made it substitutable.
///
/// Explicit decorator over [`OpNode`]: every accessor delegates to the
/// wrapped node, and the morphism rides alongside for the rewriting layer.
#[derive(Debug, Clone)]
pub struct MetaOpInfo {
    op: OpNode,
    morphism: Arc<dyn Morphism>,
}

impl MetaOpInfo {
    pub fn new(op: OpNode, morphism: Arc<dyn Morphism>) -> Self {
        Self { op, morphism }
    }

    pub fn op(&self) -> &OpNode {
        &self.op
    }

    pub fn morphism(&self) -> &Arc<dyn Morphism> {
        &self.morphism
    }

    pub fn name(&self) -> &str {
        self.op.name()
    }

    pub fn op_type(&self) -> &str {
        self.op.op_type()
    }

    pub fn graph(&self) -> GraphId {
        self.op.graph()
    }

    pub fn input_tensors(&self) -> &[TensorInfo] {
        self.op.input_tensors()
    }

    pub fn output_tensors(&self) -> &[TensorInfo] {
        self.op.output_tensors()
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        self.op.attributes()
    }

    /// Attribute map of the substitute op this pairing stands for.
    pub fn adjusted_attributes(&self) -> BTreeMap<String, AttrValue> {
        self.morphism.adjusted_attributes(&self.op)
    }

    pub fn input_nodes<'g>(&self, graph: &'g Graph) -> graft_ir::Result<Vec<&'g OpNode>> {
        self.op.input_nodes(graph)
    }
}
