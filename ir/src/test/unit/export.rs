use crate::prelude::*;
use crate::test::{graph, source, unary};

fn exportable() -> Graph {
    let mut g = graph(&["y"]);
    let x = OpNode::builder("x", "Const")
        .attr("value", 7i64)
        .attr(crate::DEVICE_ATTR_KEY, "/cpu:0")
        .attr("_graft_origin", AttrValue::Opaque(vec![0xde, 0xad]))
        .output(DType::Float32, None)
        .finish(&mut g)
        .unwrap()
        .remove(0);
    unary(&mut g, "y", "Relu", x);
    g
}

#[test]
fn export_requires_the_tensorflow_backend() {
    let mut g = Graph::new(["x"], Backend::PyTorch).unwrap();
    source(&mut g, "x", "Const");
    assert!(matches!(g.to_graph_def(), Err(Error::UnsupportedBackend { .. })));
}

#[test]
fn records_follow_topological_order() {
    let g = exportable();
    let def = g.to_graph_def().unwrap();
    let names: Vec<&str> = def.node.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn record_fields_are_derived_from_the_node() {
    let g = exportable();
    let def = g.to_graph_def().unwrap();

    let x = &def.node[0];
    assert_eq!(x.op, "Const");
    assert_eq!(x.device, "/cpu:0");
    assert!(x.input.is_empty());
    // value survives; the device key and the reserved key are filtered.
    assert_eq!(x.attr.keys().collect::<Vec<_>>(), vec!["value"]);

    let y = &def.node[1];
    assert_eq!(y.input, vec!["x:0"]);
    assert_eq!(y.device, "");
}
