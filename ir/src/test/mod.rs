//! Test support: tiny graph-construction helpers shared by the suites.

mod unit;

use crate::prelude::*;

/// Empty tensorflow-backed graph with the given output node names.
pub(crate) fn graph(outputs: &[&str]) -> Graph {
    Graph::new(outputs.iter().copied(), Backend::TensorFlow).expect("graph construction")
}

/// Source node (no inputs) with a single float output.
pub(crate) fn source(g: &mut Graph, name: &str, op_type: &str) -> TensorInfo {
    OpNode::builder(name, op_type).output(DType::Float32, None).finish(g).expect("source op").remove(0)
}

/// Unary node with a single float output.
pub(crate) fn unary(g: &mut Graph, name: &str, op_type: &str, input: TensorInfo) -> TensorInfo {
    OpNode::builder(name, op_type).input(input).output(DType::Float32, None).finish(g).expect("unary op").remove(0)
}

/// Binary node with a single float output.
pub(crate) fn binary(g: &mut Graph, name: &str, op_type: &str, lhs: TensorInfo, rhs: TensorInfo) -> TensorInfo {
    OpNode::builder(name, op_type)
        .input(lhs)
        .input(rhs)
        .output(DType::Float32, None)
        .finish(g)
        .expect("binary op")
        .remove(0)
}

/// Every producer must appear before each of its consumers in the cached
/// topological order.
pub(crate) fn assert_topo_valid(g: &Graph) {
    let order = g.topo_order();
    let position = |name: &str| order.iter().position(|n| n == name);
    for op in g.iter() {
        let Some(op_pos) = position(op.name()) else { continue };
        for tensor in op.input_tensors() {
            if tensor.is_null() {
                continue;
            }
            let producer_pos = position(tensor.op_name()).expect("producer must be ordered");
            assert!(producer_pos < op_pos, "{} must precede {}", tensor.op_name(), op.name());
        }
    }
}

/// The diamond fixture used across the unit suites:
///
/// ```text
/// x (Placeholder)   w (Const)
///        \          /
///         a = MatMul
///        /          \
///   b = Relu         |
///        \          /
///        out = Add      outputs = [out]
/// ```
pub(crate) fn diamond() -> Graph {
    let mut g = graph(&["out"]);
    let x = source(&mut g, "x", "Placeholder");
    let w = source(&mut g, "w", "Const");
    let a = binary(&mut g, "a", "MatMul", x, w);
    let b = unary(&mut g, "b", "Relu", a.clone());
    binary(&mut g, "out", "Add", a, b);
    g.sort().expect("diamond is acyclic");
    g
}
