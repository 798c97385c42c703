//! Test harness around a [`GraphContainer`].
//!
//! Builds nodes whose ports sit at exact offsets, tracks node callbacks, and
//! offers helpers for simulating the drag-to-connect gestures.

#![allow(dead_code)]

use super::{init_logging, CallbackTracker, TrackingBehavior};
use slint_node_graph::{
    AddLinkOutcome, AllowAll, Edge, GraphConfig, GraphContainer, Item, LinkEnds, LinkId,
    LinkOptions, LinkState, LinkValidator, Node, NodeId, Point, Port, PortId, PortPressOutcome,
    Rect, RoutedLink,
};

/// Test harness owning one container and one callback tracker.
pub struct GraphHarness {
    pub graph: GraphContainer,
    pub tracker: CallbackTracker,
}

impl GraphHarness {
    /// Create a harness over an empty graph with default settings.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        init_logging();
        Self {
            graph: GraphContainer::with_config(config),
            tracker: CallbackTracker::new(),
        }
    }

    /// Build a node with one item per port, laid out so each port's offset is exact.
    pub fn build_node(&self, rect: Rect, ports: &[(Edge, f32)]) -> Node {
        let half = self.graph.config().port_size / 2.0;
        ports.iter().enumerate().fold(
            Node::new(rect.x, rect.y, rect.width, rect.height),
            |node, (i, &(edge, offset))| {
                // an item 20px tall (or wide) whose center sits at offset + half
                let center = offset + half;
                let item_rect = if edge.is_vertical() {
                    Rect::new(0.0, center - 10.0, rect.width, 20.0)
                } else {
                    Rect::new(center - 10.0, 0.0, 20.0, rect.height)
                };
                node.with_item(
                    Item::new("port", format!("port {i}"))
                        .with_rect(item_rect)
                        .with_port(Port::new(edge)),
                )
            },
        )
    }

    /// Add a node with ports at exact offsets. Returns the node and its ports in order.
    pub fn node_with_ports(&mut self, rect: Rect, ports: &[(Edge, f32)]) -> (NodeId, Vec<PortId>) {
        self.node_with_validator(rect, ports, AllowAll)
    }

    pub fn node_with_validator(
        &mut self,
        rect: Rect,
        ports: &[(Edge, f32)],
        validator: impl LinkValidator + 'static,
    ) -> (NodeId, Vec<PortId>) {
        let node = self.build_node(rect, ports);
        self.add(node, validator)
    }

    /// Add a prepared node with a tracking behavior.
    pub fn add(&mut self, node: Node, validator: impl LinkValidator + 'static) -> (NodeId, Vec<PortId>) {
        let behavior = TrackingBehavior::with_validator(&self.tracker, validator);
        let id = self.graph.add_node(node, behavior);
        (id, self.ports_of(id))
    }

    pub fn ports_of(&self, node: NodeId) -> Vec<PortId> {
        self.graph
            .node(node)
            .map(|n| n.ports().map(|p| p.id()).collect())
            .unwrap_or_default()
    }

    /// Add a bound link with default options and route it.
    pub fn connect(&mut self, a: PortId, b: PortId) -> LinkId {
        self.connect_styled(a, b, LinkOptions::default())
    }

    pub fn connect_styled(&mut self, a: PortId, b: PortId, options: LinkOptions) -> LinkId {
        let outcome = self
            .graph
            .create_link(Some(a), Some(b), None, None, Some(options))
            .expect("create_link failed");
        let AddLinkOutcome::Added(id) = outcome else {
            panic!("expected a bound link, got {outcome:?}");
        };
        self.graph.flush_deferred();
        id
    }

    /// Press on `from`, then on `to`.
    pub fn drag_connect(&mut self, from: PortId, to: PortId) -> PortPressOutcome {
        let started = self.press(from);
        assert!(matches!(started, PortPressOutcome::Started(_)), "got {started:?}");
        self.press(to)
    }

    pub fn press(&mut self, port: PortId) -> PortPressOutcome {
        self.graph.on_port_pressed(port).expect("unknown port")
    }

    /// Canvas-local center of a port's marker.
    pub fn anchor(&self, port: PortId) -> Point {
        let screen = self.graph.port_anchor_box(port).expect("port has no anchor").center();
        self.graph.viewport().to_local(screen)
    }

    pub fn routed(&self, link: LinkId) -> RoutedLink {
        self.graph
            .link(link)
            .and_then(|l| l.route())
            .cloned()
            .expect("link has not been routed")
    }

    /// Every port in the graph, in id order.
    pub fn all_ports(&self) -> Vec<PortId> {
        let mut ports: Vec<PortId> = self
            .graph
            .nodes()
            .flat_map(|n| n.ports().map(|p| p.id()).collect::<Vec<_>>())
            .collect();
        ports.sort();
        ports
    }

    /// Port→link registry and link ends agree in both directions.
    pub fn assert_registry_symmetric(&self) {
        for link in self.graph.links() {
            for port in link.ports() {
                assert!(
                    self.graph.links_for_port(port).contains(&link.id()),
                    "link {} missing from port {}",
                    link.id(),
                    port
                );
            }
        }
        for port in self.all_ports() {
            for id in self.graph.links_for_port(port) {
                let link = self.graph.link(id).expect("registry references a removed link");
                assert!(link.touches(port), "link {} does not end at port {}", id, port);
            }
            let active = self.graph.port(port).map(|p| p.is_active()).unwrap_or(false);
            assert_eq!(active, !self.graph.links_for_port(port).is_empty(), "port {port} active flag");
        }
    }

    /// At most one pending link, and it has exactly one bound end.
    pub fn assert_pending_invariant(&self) {
        let pending: Vec<_> = self
            .graph
            .links()
            .filter(|l| l.state() == LinkState::Pending)
            .collect();
        assert!(pending.len() <= 1);
        assert_eq!(pending.first().map(|l| l.id()), self.graph.pending_link());
        for link in pending {
            assert!(matches!(link.ends(), LinkEnds::Pending { .. }));
            assert_eq!(link.ports().count(), 1);
        }
        assert!(self.graph.links().all(|l| l.state() != LinkState::Unbound));
    }
}
