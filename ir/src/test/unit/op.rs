use test_case::test_case;

use crate::prelude::*;
use crate::test::{binary, diamond, graph, source};

#[test]
fn explicit_arity_must_match_the_lists() {
    let mut g = graph(&["add"]);
    let a = TensorInfo::make_null(g.id(), DType::Float32, None);
    let b = TensorInfo::make_null(g.id(), DType::Float32, None);
    let err = OpNode::builder("add", "Add")
        .input(a)
        .input(b)
        .n_inputs(3)
        .output(DType::Float32, None)
        .finish(&mut g)
        .unwrap_err();
    assert!(matches!(err, Error::ArityMismatch { expected: 3, actual: 2, .. }));
    assert!(g.is_empty(), "failed construction must not register the op");
}

#[test]
fn explicit_output_arity_checked_too() {
    let mut g = graph(&["add"]);
    let err = OpNode::builder("add", "Add").n_outputs(2).output(DType::Float32, None).finish(&mut g).unwrap_err();
    assert!(matches!(err, Error::ArityMismatch { expected: 2, actual: 1, .. }));
}

#[test]
fn arity_defaults_come_from_the_lists() {
    let mut g = graph(&["add"]);
    let a = TensorInfo::make_null(g.id(), DType::Float32, None);
    let b = TensorInfo::make_null(g.id(), DType::Float32, None);
    OpNode::builder("add", "Add").input(a).input(b).output(DType::Float32, None).finish(&mut g).unwrap();
    let op = g.node("add").unwrap();
    assert_eq!(op.n_inputs(), 2);
    assert_eq!(op.n_outputs(), 1);
}

#[test]
fn input_nodes_dedup_and_skip_nulls() {
    let mut g = graph(&["sum"]);
    let x = source(&mut g, "x", "Const");
    let null = TensorInfo::make_null(g.id(), DType::Float32, None);
    OpNode::builder("sum", "AddN")
        .input(x.clone())
        .input(null)
        .input(x)
        .output(DType::Float32, None)
        .finish(&mut g)
        .unwrap();
    let inputs = g.node("sum").unwrap().input_nodes(&g).unwrap();
    assert_eq!(inputs.iter().map(|op| op.name()).collect::<Vec<_>>(), vec!["x"]);
}

#[test]
fn output_nodes_scans_consumers() {
    let g = diamond();
    let a = g.node("a").unwrap();
    let consumers = a.output_nodes(&g).unwrap();
    let names: Vec<&str> = consumers.iter().map(|op| op.name()).collect();
    assert_eq!(names, vec!["b", "out"]);
}

#[test]
fn add_null_input_requires_placeholder() {
    let mut g = graph(&["out"]);
    source(&mut g, "c", "Const");
    let err = g.node_mut("c").unwrap().add_null_input_tensor(None).unwrap_err();
    assert!(matches!(err, Error::NotAPlaceholder { .. }));
}

#[test]
fn add_null_input_appends_and_counts() {
    let mut g = graph(&["out"]);
    source(&mut g, "p", "Placeholder");
    let op = g.node_mut("p").unwrap();
    let t = op.add_null_input_tensor(None).unwrap();
    assert!(t.is_null());
    assert_eq!(op.n_inputs(), 1);
    assert_eq!(op.input_tensors().len(), 1);

    let err = op.add_null_input_tensor(Some(5)).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfBounds { index: 5, .. }));
}

#[test]
fn replace_with_null_input_checks_bounds() {
    let mut g = graph(&["y"]);
    let x = source(&mut g, "x", "Const");
    binary(&mut g, "y", "Add", x.clone(), x);
    let op = g.node_mut("y").unwrap();

    assert!(matches!(op.replace_with_null_input_tensor(2), Err(Error::IndexOutOfBounds { index: 2, len: 2 })));

    let t = op.replace_with_null_input_tensor(0).unwrap();
    assert!(t.is_null());
    assert!(op.input_tensors()[0].is_null());
    assert!(!op.input_tensors()[1].is_null());
    assert_eq!(op.n_inputs(), 2);
}

#[test]
fn output_access_is_bounds_checked() {
    let g = diamond();
    let a = g.node("a").unwrap();
    assert_eq!(a.output(0).unwrap().name(), "a:0");
    assert!(matches!(a.output(1), Err(Error::IndexOutOfBounds { index: 1, len: 1 })));
}

#[test_case(&[1, 0]; "swap")]
#[test_case(&[0, 1]; "identity")]
fn permuted_inputs_reorder(perm: &[usize]) {
    let mut g = graph(&["y"]);
    let x = source(&mut g, "x", "Const");
    let w = source(&mut g, "w", "Const");
    binary(&mut g, "y", "Add", x, w);
    let op = g.node("y").unwrap();
    let permuted = op.with_permuted_inputs(perm).unwrap();
    for (slot, &src) in perm.iter().enumerate() {
        assert_eq!(permuted.input_tensors()[slot], op.input_tensors()[src]);
    }
    assert_eq!(permuted.name(), op.name());
}

#[test_case(&[0, 0]; "repeated slot")]
#[test_case(&[0]; "too short")]
#[test_case(&[0, 1, 2]; "too long")]
fn bad_permutations_are_rejected(perm: &[usize]) {
    let mut g = graph(&["y"]);
    let x = source(&mut g, "x", "Const");
    let w = source(&mut g, "w", "Const");
    binary(&mut g, "y", "Add", x, w);
    let err = g.node("y").unwrap().with_permuted_inputs(perm).unwrap_err();
    assert!(matches!(err, Error::InvalidPermutation { .. }));
}

#[test]
fn opaque_attrs_need_reserved_keys() {
    let mut g = graph(&["c"]);
    let err = OpNode::builder("c", "Const")
        .attr("quant", AttrValue::Opaque(vec![1]))
        .output(DType::Float32, None)
        .finish(&mut g)
        .unwrap_err();
    assert!(matches!(err, Error::OpaqueAttrValue { .. }));

    OpNode::builder("c", "Const")
        .attr("_graft_quant", AttrValue::Opaque(vec![1]))
        .attr("value", 3i64)
        .output(DType::Float32, None)
        .finish(&mut g)
        .unwrap();
    let op = g.node("c").unwrap();
    assert_eq!(op.attr("value").and_then(AttrValue::as_int), Some(3));
    assert!(matches!(op.attr("_graft_quant"), Some(AttrValue::Opaque(_))));
}

#[test]
fn builder_inherits_graph_backend() {
    let mut g = graph(&["c"]);
    source(&mut g, "c", "Const");
    assert_eq!(g.node("c").unwrap().backend(), Backend::TensorFlow);

    let mut g = Graph::new(["c"], Backend::PyTorch).unwrap();
    OpNode::builder("c", "Const").backend(Backend::TensorFlow).output(DType::Float32, None).finish(&mut g).unwrap();
    assert_eq!(g.node("c").unwrap().backend(), Backend::TensorFlow);
}
