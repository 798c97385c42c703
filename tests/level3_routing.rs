//! Level 3: Link Routing Tests
//!
//! These tests verify the four line types, the Z/L polyline decision, end
//! decorations, and that degenerate geometry never replaces a good render.

mod common;

use common::harness::GraphHarness;
use slint_node_graph::{
    Edge, LineStyle, LineType, LinkOptions, LinkState, NodeId, Point, PortId, PortPressOutcome,
    Rect,
};

/// Node X at the origin with a RIGHT port at offset 20 and a TOP port at offset 40,
/// node Y directly to its right with a LEFT port at offset 40.
fn scenario(h: &mut GraphHarness) -> (NodeId, PortId, PortId, NodeId, PortId) {
    let (x, xp) = h.node_with_ports(
        Rect::new(0.0, 0.0, 100.0, 80.0),
        &[(Edge::Right, 20.0), (Edge::Top, 40.0)],
    );
    let (y, yp) = h.node_with_ports(Rect::new(200.0, 0.0, 100.0, 80.0), &[(Edge::Left, 40.0)]);
    (x, xp[0], xp[1], y, yp[0])
}

fn angular() -> LinkOptions {
    LinkOptions::default().with_line_type(LineType::Angular)
}

// ============================================================================
// Scenario A: straight line
// ============================================================================

#[test]
fn test_line_runs_between_anchors() {
    let mut h = GraphHarness::new();
    let (_, right, _, _, left) = scenario(&mut h);
    let link = h.connect(right, left);

    let routed = h.routed(link);
    assert_eq!(routed.points, vec![Point::new(100.0, 25.0), Point::new(200.0, 45.0)]);
    assert_eq!(routed.points[0], h.anchor(right));
    assert_eq!(routed.points[1], h.anchor(left));
    // padding 10 on each side, commands relative to the element origin
    assert_eq!(routed.bounds, Rect::new(90.0, 15.0, 120.0, 40.0));
    assert_eq!(routed.commands, "M 10 10 L 110 30");
}

// ============================================================================
// Scenario B: opposite facings give a Z
// ============================================================================

#[test]
fn test_hover_opposite_port_routes_z() {
    let mut h = GraphHarness::new();
    h.graph.set_default_link_options(angular());
    let (_, right, _, _, left) = scenario(&mut h);

    let PortPressOutcome::Started(link) = h.press(right) else {
        panic!("drag did not start");
    };
    assert!(h.graph.on_port_hover(Some(left)));

    let routed = h.routed(link);
    assert_eq!(
        routed.points,
        vec![
            Point::new(100.0, 25.0),
            Point::new(150.0, 25.0),
            Point::new(150.0, 45.0),
            Point::new(200.0, 45.0),
        ]
    );
    // preview only: nothing bound at the hovered port
    assert_eq!(h.graph.link_state(link), LinkState::Pending);
    assert!(h.graph.links_for_port(left).is_empty());
}

#[test]
fn test_backwards_z_bends_midway() {
    let mut h = GraphHarness::new();
    let (_, a) = h.node_with_ports(Rect::new(200.0, 0.0, 100.0, 80.0), &[(Edge::Right, 20.0)]);
    let (_, b) = h.node_with_ports(Rect::new(0.0, 100.0, 100.0, 80.0), &[(Edge::Left, 20.0)]);
    let link = h.connect_styled(a[0], b[0], angular());

    // start (300, 25) behind end (0, 125): both facings flip, bends meet in the middle
    let points = h.routed(link).points;
    assert_eq!(points.len(), 4);
    assert_eq!(points[1], Point::new(150.0, 25.0));
    assert_eq!(points[2], Point::new(150.0, 125.0));
    assert_eq!(h.graph.reservations().vertical_owner(150), Some(link));
}

// ============================================================================
// Scenario C: perpendicular facings give an L
// ============================================================================

#[test]
fn test_hover_perpendicular_port_routes_l() {
    let mut h = GraphHarness::new();
    h.graph.set_default_link_options(angular());
    let (_, right, top, _, _) = scenario(&mut h);

    let PortPressOutcome::Started(link) = h.press(right) else {
        panic!("drag did not start");
    };
    h.graph.on_port_hover(Some(top));

    let routed = h.routed(link);
    assert_eq!(
        routed.points,
        vec![Point::new(100.0, 25.0), Point::new(45.0, 25.0), Point::new(45.0, 0.0)]
    );
    assert!(h.graph.reservations().is_empty());
}

#[test]
fn test_hover_leave_falls_back_to_pointer() {
    let mut h = GraphHarness::new();
    h.graph.set_default_link_options(angular());
    let (_, right, _, _, left) = scenario(&mut h);

    let PortPressOutcome::Started(link) = h.press(right) else {
        panic!("drag did not start");
    };
    h.graph.on_port_hover(Some(left));
    assert!(h.graph.on_pointer_moved(Point::new(160.0, 65.0)));
    assert!(h.graph.on_port_hover(None));

    // free end faces back towards the bound end, so the preview is a Z
    let routed = h.routed(link);
    assert_eq!(routed.end, Point::new(160.0, 65.0));
    assert_eq!(routed.points.len(), 4);
}

// ============================================================================
// Curves, Rounded Corners & Style
// ============================================================================

#[test]
fn test_curve_control_points() {
    let mut h = GraphHarness::new();
    let (_, right, _, _, left) = scenario(&mut h);
    let link = h.connect_styled(right, left, LinkOptions::default().with_line_type(LineType::Curve));

    let points = h.routed(link).points;
    assert_eq!(
        points,
        vec![
            Point::new(100.0, 25.0),
            Point::new(150.0, 25.0),
            Point::new(150.0, 45.0),
            Point::new(200.0, 45.0),
        ]
    );
    assert!(h.routed(link).commands.contains(" C "));
}

#[test]
fn test_rounded_link_smooths_corners() {
    let mut h = GraphHarness::new();
    let (_, right, _, _, left) = scenario(&mut h);
    let link = h.connect_styled(right, left, LinkOptions::default().with_line_type(LineType::Rounded));
    let routed = h.routed(link);
    assert_eq!(routed.points.len(), 4);
    assert_eq!(routed.commands.matches(" C ").count(), 2);
}

#[test]
fn test_path_carries_style() {
    let mut h = GraphHarness::new();
    let (_, right, _, _, left) = scenario(&mut h);
    let options = LinkOptions::default()
        .with_line_style(LineStyle::Dotted)
        .with_width(3.0)
        .with_color(slint::Color::from_rgb_u8(255, 0, 0));
    let link = h.connect_styled(right, left, options);

    let path = h.graph.link_path(link).unwrap();
    assert_eq!(path.dash_array, Some("1,4"));
    assert_eq!(path.width, 3.0);
    assert_eq!(path.color, slint::Color::from_rgb_u8(255, 0, 0));
    assert!(!path.pending);
}

#[test]
fn test_line_type_parsing() {
    assert_eq!("rounded".parse::<LineType>().unwrap(), LineType::Rounded);
    assert_eq!(LineType::try_from(2).unwrap(), LineType::Angular);
    assert!("zigzag".parse::<LineType>().is_err());
    assert!(LineStyle::try_from(7).is_err());
}

// ============================================================================
// End Decorations
// ============================================================================

#[test]
fn test_arrow_end_pulls_line_back() {
    let mut h = GraphHarness::new();
    let (_, right, _, _, left) = scenario(&mut h);
    let id = h
        .graph
        .create_link(Some(right), Some(left), None, Some("arrow"), None)
        .unwrap()
        .link()
        .unwrap();
    h.graph.flush_deferred();

    let routed = h.routed(id);
    // LEFT facing end at (200, 45) moves out by the arrow's 10px width
    assert_eq!(routed.points[1], Point::new(190.0, 45.0));
    assert_eq!(routed.end, Point::new(200.0, 45.0));
    assert_eq!(routed.glyphs.len(), 1);
    assert_eq!(routed.glyphs[0].kind, "arrow");
    assert_eq!(routed.glyphs[0].angle, 0.0);
}

#[test]
fn test_unknown_end_kind_rejected_before_registration() {
    let mut h = GraphHarness::new();
    let (_, right, _, _, left) = scenario(&mut h);
    assert!(h
        .graph
        .create_link(Some(right), Some(left), Some("feather"), None, None)
        .is_err());
    assert_eq!(h.graph.links().count(), 0);
    assert!(!h.graph.port(right).unwrap().is_active());
}

// ============================================================================
// Deferred & Degenerate Routing
// ============================================================================

#[test]
fn test_bound_link_routes_on_next_tick() {
    let mut h = GraphHarness::new();
    let (_, right, _, _, left) = scenario(&mut h);
    let id = h
        .graph
        .create_link(Some(right), Some(left), None, None, None)
        .unwrap()
        .link()
        .unwrap();
    assert!(h.graph.link(id).unwrap().route().is_none());
    assert!(h.graph.paths().is_empty());
    assert_eq!(h.graph.flush_deferred(), 1);
    assert_eq!(h.graph.paths().len(), 1);
}

#[test]
fn test_degenerate_geometry_keeps_previous_render() {
    let mut h = GraphHarness::new();
    let (x, right, _, _, left) = scenario(&mut h);
    let link = h.connect(right, left);
    let before = h.routed(link);

    h.graph.move_node(x, f32::NAN, 0.0).unwrap();
    assert_eq!(h.graph.flush_deferred(), 0);
    assert_eq!(h.routed(link), before);
}

#[test]
fn test_reported_anchor_overrides_model() {
    let mut h = GraphHarness::new();
    let (_, right, _, _, left) = scenario(&mut h);
    let link = h.connect(right, left);

    h.graph
        .handle_port_anchor(right, Rect::new(105.0, 30.0, 10.0, 10.0))
        .unwrap();
    assert!(h.graph.has_deferred());
    h.graph.flush_deferred();
    assert_eq!(h.routed(link).start, Point::new(110.0, 35.0));
}
