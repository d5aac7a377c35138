use crate::prelude::*;
use crate::test::{assert_topo_valid, binary, diamond, graph, source, unary};

#[test]
fn graphs_require_output_nodes() {
    let outputs: Vec<String> = Vec::new();
    assert!(matches!(Graph::new(outputs, Backend::TensorFlow), Err(Error::EmptyOutputNodes)));
}

#[test]
fn topological_order_is_valid_and_idempotent() {
    let g = diamond();
    assert_topo_valid(&g);
    let first = g.topo_order();
    g.sort().unwrap();
    assert_eq!(first, g.topo_order());
}

#[test]
fn ops_triggers_the_sort() {
    let g = diamond();
    assert_eq!(g.topo_order().len(), 5);
    let names: Vec<&str> = g.ops().unwrap().iter().map(|op| op.name()).collect();
    assert_eq!(names.last(), Some(&"out"));
    assert_eq!(names.len(), 5);
}

#[test]
fn cycles_are_hard_errors() {
    let mut g = graph(&["a"]);
    let b_out = TensorInfo::new("b:0", "b", DType::Float32, None, g.id()).unwrap();
    let a_out = OpNode::builder("a", "Relu").input(b_out).output(DType::Float32, None).finish(&mut g).unwrap();
    OpNode::builder("b", "Relu").inputs(a_out).output(DType::Float32, None).finish(&mut g).unwrap();
    assert!(matches!(g.sort(), Err(Error::GraphCycle { .. })));
}

#[test]
fn duplicate_add_op_leaves_the_map_unchanged() {
    let mut g = diamond();
    let mut other = graph(&["x"]);
    let intruder = OpNode::builder("a", "Neg").output(DType::Float32, None).build(&other).unwrap();
    let before = g.len();

    let err = g.add_op(intruder, true).unwrap_err();
    assert!(matches!(err, Error::DuplicateOp { .. }));
    assert_eq!(g.len(), before);
    assert_eq!(g.node("a").unwrap().op_type(), "MatMul");
}

#[test]
fn add_op_adopts_and_resorts() {
    let mut g = diamond();
    let a_tensor = g.node("a").unwrap().output(0).unwrap().clone();
    let stage = graph(&["tmp"]);
    let op = OpNode::builder("extra", "Relu").input(a_tensor).output(DType::Float32, None).build(&stage).unwrap();

    g.add_op(op, true).unwrap();
    let adopted = g.node("extra").unwrap();
    assert_eq!(adopted.graph(), g.id());
    assert!(adopted.input_tensors().iter().all(|t| t.graph() == g.id()));
    // extra is not reachable from "out", so it stays out of the order.
    assert!(!g.topo_order().contains(&"extra".to_string()));
}

#[test]
fn deferred_resort_for_bulk_construction() {
    let mut g = graph(&["y"]);
    let stage = graph(&["tmp"]);
    let x = OpNode::builder("x", "Const").output(DType::Float32, None).build(&stage).unwrap();
    g.add_op(x, false).unwrap();
    assert!(g.topo_order().is_empty());

    let x_out = g.node("x").unwrap().output(0).unwrap().clone();
    let y = OpNode::builder("y", "Relu").input(x_out).output(DType::Float32, None).build(&stage).unwrap();
    g.add_op(y, false).unwrap();

    g.sort().unwrap();
    assert_eq!(g.topo_order(), vec!["x".to_string(), "y".to_string()]);
}

#[test]
fn type_index_lookup_and_invalidation() {
    let mut g = diamond();
    let relus: Vec<&str> = g.get_ops_by_type("Relu").iter().map(|op| op.name()).collect();
    assert_eq!(relus, vec!["b"]);
    assert!(g.get_ops_by_type("Conv2D").is_empty());

    let b_tensor = g.node("b").unwrap().output(0).unwrap().clone();
    let stage = graph(&["tmp"]);
    let op = OpNode::builder("b2", "Relu").input(b_tensor).output(DType::Float32, None).build(&stage).unwrap();
    g.add_op(op, false).unwrap();

    let relus: Vec<&str> = g.get_ops_by_type("Relu").iter().map(|op| op.name()).collect();
    assert_eq!(relus, vec!["b", "b2"], "index must see ops added after it was built");
}

#[test]
fn deep_copy_round_trip() {
    let g = diamond();
    let copy = g.deep_copy().unwrap();

    assert_ne!(copy.id(), g.id());
    assert_eq!(copy.output_nodes(), g.output_nodes());
    assert_eq!(copy.len(), g.len());
    assert_eq!(copy.topo_order().len(), g.topo_order().len());

    for op in g.iter() {
        let twin = copy.node(op.name()).unwrap();
        assert_eq!(twin.op_type(), op.op_type());
        assert_eq!(twin.input_tensors().len(), op.input_tensors().len());
        assert_eq!(twin.output_tensors().len(), op.output_tensors().len());
        assert_eq!(
            twin.attributes().keys().collect::<Vec<_>>(),
            op.attributes().keys().collect::<Vec<_>>()
        );
        assert_eq!(twin.graph(), copy.id());
        assert!(twin.output_tensors().iter().all(|t| t.graph() == copy.id()));
    }
}

#[test]
fn boundary_derivations() {
    let g = diamond();

    let outputs: Vec<&str> = g.output_ops().unwrap().iter().map(|op| op.name()).collect();
    assert_eq!(outputs, vec!["out"]);

    let output_tensors: Vec<&str> = g.output_tensors().unwrap().iter().map(|t| t.name()).collect();
    assert_eq!(output_tensors, vec!["out:0"]);

    // x and w have no inputs at all.
    let mut inputs: Vec<&str> = g.input_ops().iter().map(|op| op.name()).collect();
    inputs.sort_unstable();
    assert_eq!(inputs, vec!["w", "x"]);
    assert!(g.input_tensors().is_empty());
}

#[test]
fn null_inputs_mark_input_ops() {
    let mut g = graph(&["y"]);
    let x = source(&mut g, "x", "Const");
    let null = TensorInfo::make_null(g.id(), DType::Float32, None);
    OpNode::builder("y", "Add").input(x).input(null).output(DType::Float32, None).finish(&mut g).unwrap();

    let inputs: Vec<&str> = g.input_ops().iter().map(|op| op.name()).collect();
    assert_eq!(inputs, vec!["y"]);
    // y's non-null input comes from x, which is itself an input op.
    let tensors: Vec<&str> = g.input_tensors().iter().map(|t| t.name()).collect();
    assert_eq!(tensors.len(), 1);
    assert!(tensors[0].starts_with(NULL_OP_PREFIX));
}

#[test]
fn move_op_between_graphs() {
    let mut g1 = graph(&["x"]);
    source(&mut g1, "x", "Const");
    let mut g2 = graph(&["x"]);

    g1.move_op_into("x", &mut g2).unwrap();
    assert!(!g1.contains("x"));
    let moved = g2.node("x").unwrap();
    assert_eq!(moved.graph(), g2.id());
    assert!(moved.output_tensors().iter().all(|t| t.graph() == g2.id()));

    assert!(matches!(g1.move_op_into("x", &mut g2), Err(Error::OpNotFound { .. })));
}

#[test]
fn merge_then_fix_outputs_sort_and_prune() {
    let mut dest = diamond();
    let mut side = graph(&["z"]);
    let y = source(&mut side, "y", "Const");
    unary(&mut side, "z", "Relu", y);
    // orphan never reachable from any output
    source(&mut side, "orphan", "Const");

    side.unsafe_merge_into(&mut dest);
    assert!(side.is_empty());
    assert_eq!(dest.len(), 8);
    assert!(dest.node("z").unwrap().graph() == dest.id());

    dest.set_output_nodes(["out", "z"]).unwrap();
    dest.sort().unwrap();
    dest.prune().unwrap();
    assert_eq!(dest.len(), 7, "orphan must be pruned");
    assert!(!dest.contains("orphan"));

    let order = dest.topo_order();
    assert!(order.contains(&"out".to_string()) && order.contains(&"z".to_string()));
}

#[test]
fn merge_extends_an_already_built_type_index() {
    let mut dest = diamond();
    // Force the index to exist before the merge.
    assert_eq!(dest.get_ops_by_type("Const").len(), 1);

    let mut side = graph(&["k"]);
    source(&mut side, "k", "Const");
    side.unsafe_merge_into(&mut dest);

    let consts: Vec<&str> = dest.get_ops_by_type("Const").iter().map(|op| op.name()).collect();
    assert!(consts.contains(&"w") && consts.contains(&"k"));
}

#[test]
fn prune_requires_resolvable_outputs() {
    let mut g = graph(&["missing"]);
    source(&mut g, "x", "Const");
    assert!(matches!(g.prune(), Err(Error::OpNotFound { .. })));
}
