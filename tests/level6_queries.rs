//! Level 6: Queries, Persistence & Controller Tests
//!
//! These tests verify the connection queries with option filters, the link
//! template used by drag-to-connect, snapshot/restore of a whole graph, and
//! the Slint-facing controller.

mod common;

use common::harness::GraphHarness;
use common::TrackingBehavior;
use slint::{Model, VecModel};
use slint_node_graph::{
    AllowAll, DefaultBehavior, Edge, GraphController, GraphSnapshot, Item, LineType, LinkOptions,
    LinkState, LinkTemplate, Node, NodeId, OptionFilter, Port, PortId, PortPressOutcome, Rect,
};
use std::rc::Rc;

struct Fixture {
    mid: NodeId,
    int_src: NodeId,
    float_src: NodeId,
    sink: NodeId,
    int_in: PortId,
    exec_out: PortId,
    sink_in: PortId,
}

fn socket(label: &str, edge: Edge, y: f32, options: &[(&str, &str)]) -> Item {
    let port = options
        .iter()
        .fold(Port::new(edge), |port, (k, v)| port.with_option(*k, *v));
    Item::new("socket", label)
        .with_rect(Rect::new(0.0, y, 100.0, 20.0))
        .with_port(port)
}

/// Two data sources feed a middle node whose exec output drives a sink.
/// The middle node's last item is a plain label.
fn fixture(h: &mut GraphHarness) -> Fixture {
    let mid = Node::new(200.0, 0.0, 100.0, 120.0)
        .with_item(socket("a", Edge::Left, 10.0, &[("kind", "data"), ("type", "int")]))
        .with_item(socket("b", Edge::Left, 40.0, &[("kind", "data"), ("type", "float")]))
        .with_item(socket("then", Edge::Right, 70.0, &[("kind", "exec")]))
        .with_item(Item::new("label", "note"));
    let (mid, mp) = h.add(mid, AllowAll);

    let int_node = Node::new(0.0, 0.0, 100.0, 60.0)
        .with_item(socket("out", Edge::Right, 10.0, &[("kind", "data"), ("type", "int")]));
    let (int_src, ip) = h.add(int_node, AllowAll);
    let float_node = Node::new(0.0, 100.0, 100.0, 60.0)
        .with_item(socket("out", Edge::Right, 10.0, &[("kind", "data"), ("type", "float")]));
    let (float_src, fp) = h.add(float_node, AllowAll);
    let sink_node = Node::new(400.0, 0.0, 100.0, 60.0)
        .with_item(socket("in", Edge::Left, 10.0, &[("kind", "exec")]));
    let (sink, sp) = h.add(sink_node, AllowAll);

    h.connect(ip[0], mp[0]);
    h.connect(fp[0], mp[1]);
    h.connect(mp[2], sp[0]);

    Fixture {
        mid,
        int_src,
        float_src,
        sink,
        int_in: mp[0],
        exec_out: mp[2],
        sink_in: sp[0],
    }
}

// ============================================================================
// Connection Queries
// ============================================================================

#[test]
fn test_connected_nodes_grouped_by_item() {
    let mut h = GraphHarness::new();
    let f = fixture(&mut h);

    let found = h.graph.connected_nodes(f.mid, None, None, false).unwrap();
    assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(found[&0][0].node, f.int_src);
    assert_eq!(found[&1][0].node, f.float_src);
    assert_eq!(found[&2][0].node, f.sink);
    assert_eq!(found[&2][0].port, f.exec_out);
    assert_eq!(found[&2][0].other_port, f.sink_in);
}

#[test]
fn test_connected_nodes_with_filters() {
    let mut h = GraphHarness::new();
    let f = fixture(&mut h);

    let data = OptionFilter::new().is("kind", "data");
    let found = h.graph.connected_nodes(f.mid, Some(&data), None, false).unwrap();
    assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![0, 1]);

    let int = OptionFilter::new().is("type", "int");
    let found = h.graph.connected_nodes(f.mid, Some(&data), Some(&int), false).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[&0][0].node, f.int_src);

    let numeric = OptionFilter::new().any_of("type", ["int", "float"]);
    let found = h.graph.connected_nodes(f.mid, None, Some(&numeric), false).unwrap();
    assert_eq!(found.values().map(Vec::len).sum::<usize>(), 2);
}

#[test]
fn test_first_only_stops_at_first_match() {
    let mut h = GraphHarness::new();
    let f = fixture(&mut h);
    let found = h.graph.connected_nodes(f.mid, None, None, true).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[&0].len(), 1);

    let exec = OptionFilter::new().is("kind", "exec");
    let first = h.graph.connected_node(f.mid, Some(&exec), None).unwrap().unwrap();
    assert_eq!(first.node, f.sink);
    assert_eq!(h.graph.connected_node(f.sink, None, Some(&exec)).unwrap().unwrap().node, f.mid);
}

#[test]
fn test_queries_skip_pending_links() {
    let mut h = GraphHarness::new();
    let f = fixture(&mut h);
    assert!(matches!(h.press(f.int_in), PortPressOutcome::Started(_)));
    let found = h.graph.connected_nodes(f.mid, None, None, false).unwrap();
    assert_eq!(found[&0].len(), 1);
}

#[test]
fn test_unconnected_item_indices() {
    let mut h = GraphHarness::new();
    let f = fixture(&mut h);
    assert_eq!(h.graph.unconnected_item_indices(f.mid, None).unwrap(), vec![3]);

    // items whose matching ports are all unlinked, including items without matching ports
    let exec = OptionFilter::new().is("kind", "exec");
    assert_eq!(
        h.graph.unconnected_item_indices(f.mid, Some(&exec)).unwrap(),
        vec![0, 1, 3]
    );

    let link = h.graph.links_for_port(f.int_in)[0];
    h.graph.delete_link(link).unwrap();
    assert_eq!(h.graph.unconnected_item_indices(f.mid, None).unwrap(), vec![0, 3]);
}

#[test]
fn test_queries_on_unknown_node_fail() {
    let h = GraphHarness::new();
    assert!(h.graph.connected_nodes(NodeId(7), None, None, false).is_err());
    assert!(h.graph.unconnected_item_indices(NodeId(7), None).is_err());
}

// ============================================================================
// Link Templates
// ============================================================================

#[test]
fn test_link_template_styles_started_links() {
    let mut h = GraphHarness::new();
    let f = fixture(&mut h);
    h.graph.set_link_template(|port, item| {
        if port.options.get("kind").and_then(|v| v.as_str()) == Some("exec") {
            LinkTemplate {
                options: Some(LinkOptions::default().with_line_type(LineType::Angular).with_width(4.0)),
                end1: None,
                end2: Some("arrow".into()),
            }
        } else {
            assert_eq!(item.kind, "socket");
            LinkTemplate::default()
        }
    });

    let PortPressOutcome::Started(link) = h.press(f.exec_out) else {
        panic!("drag did not start");
    };
    let l = h.graph.link(link).unwrap();
    assert_eq!(l.options().line_type, LineType::Angular);
    assert_eq!(l.options().width, 4.0);
    assert_eq!(l.end_kinds(), (None, Some("arrow")));

    h.graph.cancel_pending();
    let PortPressOutcome::Started(link) = h.press(f.int_in) else {
        panic!("drag did not start");
    };
    assert_eq!(h.graph.link(link).unwrap().options().line_type, LineType::Line);
}

// ============================================================================
// Snapshot & Restore
// ============================================================================

#[test]
fn test_snapshot_restore_preserves_topology() {
    let mut h = GraphHarness::new();
    let f = fixture(&mut h);
    h.graph.set_collapsed(f.sink, true).unwrap();
    h.press(f.int_in);

    let snapshot = h.graph.snapshot();
    assert_eq!(snapshot.nodes.len(), 4);
    // the pending link is not persisted
    assert_eq!(snapshot.links.len(), 3);

    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed: GraphSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snapshot);

    let mut restored = GraphHarness::new();
    let tracker = restored.tracker.clone();
    let report = restored
        .graph
        .restore(&parsed, |_| Box::new(TrackingBehavior::new(&tracker)))
        .unwrap();
    assert_eq!(report.nodes.len(), 4);
    assert_eq!(report.links.len(), 3);
    assert_eq!(report.dropped, 0);
    assert_eq!(tracker.connected_count(), 6);
    assert!(restored.graph.node(report.nodes[3]).unwrap().is_collapsed());
    assert!(restored.graph.pending_link().is_none());
    restored.assert_registry_symmetric();

    // same shape of connections, under the new ids
    let mid = report.nodes[0];
    let found = restored.graph.connected_nodes(mid, None, None, false).unwrap();
    assert_eq!(found[&0][0].node, report.nodes[1]);
    assert_eq!(found[&2][0].node, report.nodes[3]);
    assert_eq!(restored.graph.flush_deferred(), 3);
}

#[test]
fn test_restore_skips_dangling_links() {
    let mut h = GraphHarness::new();
    fixture(&mut h);
    let mut snapshot = h.graph.snapshot();
    snapshot.nodes.truncate(3);

    let mut restored = GraphHarness::new();
    let tracker = restored.tracker.clone();
    let report = restored
        .graph
        .restore(&snapshot, |_| Box::new(TrackingBehavior::new(&tracker)))
        .unwrap();
    assert_eq!(report.links.len(), 2);
    assert_eq!(report.dropped, 1);
    restored.assert_registry_symmetric();
}

// ============================================================================
// Controller
// ============================================================================

fn controller_fixture() -> (GraphController, PortId, PortId) {
    let ctrl = GraphController::new();
    let graph = ctrl.graph();
    let mut g = graph.borrow_mut();
    let a = g.add_node(
        Node::new(0.0, 0.0, 100.0, 60.0).with_item(
            Item::new("out", "out")
                .with_rect(Rect::new(0.0, 15.0, 100.0, 20.0))
                .with_port(Port::new(Edge::Right)),
        ),
        DefaultBehavior,
    );
    let b = g.add_node(
        Node::new(300.0, 0.0, 100.0, 60.0).with_item(
            Item::new("in", "in")
                .with_rect(Rect::new(0.0, 15.0, 100.0, 20.0))
                .with_port(Port::new(Edge::Left)),
        ),
        DefaultBehavior,
    );
    let pa = g.node(a).unwrap().ports().next().unwrap().id();
    let pb = g.node(b).unwrap().ports().next().unwrap().id();
    drop(g);
    (ctrl, pa, pb)
}

#[test]
fn test_controller_drives_bound_model() {
    let (ctrl, pa, _) = controller_fixture();
    let model = Rc::new(VecModel::<i32>::default());
    ctrl.bind_model(model.clone(), |p| p.id.0 as i32);

    let press = ctrl.port_pressed_callback();
    press(pa.0 as i32);
    assert_eq!(model.row_count(), 1);

    let released = ctrl.pointer_released_callback();
    released(300.0, 25.0);
    let graph = ctrl.graph();
    let link = graph.borrow().links().next().unwrap().id();
    assert_eq!(graph.borrow().link_state(link), LinkState::Bound);
    assert_eq!(model.row_data(0), Some(link.0 as i32));

    ctrl.graph().borrow_mut().delete_link(link).unwrap();
    ctrl.flush();
    assert_eq!(model.row_count(), 0);
}

#[test]
fn test_controller_layout_reports_reroute_on_flush() {
    let (ctrl, pa, pb) = controller_fixture();
    ctrl.handle_port_pressed(pa.0 as i32);
    ctrl.handle_port_pressed(pb.0 as i32);
    ctrl.flush();

    // the target node was dragged down by 100px
    let node_rect = ctrl.node_rect_changed_callback();
    node_rect(2, 300.0, 100.0, 100.0, 60.0);
    let graph = ctrl.graph();
    assert!(graph.borrow().has_deferred());
    assert_eq!(ctrl.flush(), 1);
    let link = graph.borrow().links_for_port(pb)[0];
    let end = graph.borrow().link(link).unwrap().route().unwrap().end;
    assert_eq!(end.y, 125.0);
}

#[test]
fn test_controller_viewport_converts_reports() {
    let (ctrl, pa, pb) = controller_fixture();
    ctrl.handle_port_pressed(pa.0 as i32);
    ctrl.handle_port_pressed(pb.0 as i32);
    ctrl.flush();

    let viewport = ctrl.viewport_changed_callback();
    viewport(2.0, 50.0, 0.0);
    assert_eq!(ctrl.zoom(), 2.0);
    let graph = ctrl.graph();
    // pan and zoom alone never re-route
    assert!(!graph.borrow().has_deferred());

    // marker box reported in screen space lands at local (300, 25)
    let anchor = ctrl.port_anchor_changed_callback();
    anchor(pb.0 as i32, 640.0, 40.0, 20.0, 20.0);
    assert_eq!(ctrl.flush(), 1);
    let link = graph.borrow().links_for_port(pb)[0];
    let end = graph.borrow().link(link).unwrap().route().unwrap().end;
    assert_eq!((end.x, end.y), (300.0, 25.0));
}

#[test]
fn test_controller_ignores_invalid_ids() {
    let (ctrl, _, _) = controller_fixture();
    assert_eq!(ctrl.handle_port_pressed(0), PortPressOutcome::Ignored);
    assert_eq!(ctrl.handle_port_pressed(99), PortPressOutcome::Ignored);
    ctrl.handle_item_rect(42, 0, 0.0, 0.0, 10.0, 10.0);
    ctrl.handle_node_rect(-3, 0.0, 0.0, 10.0, 10.0);
    assert_eq!(ctrl.graph().borrow().links().count(), 0);
    assert!(ctrl.compute_link_path(5).is_empty());
}
