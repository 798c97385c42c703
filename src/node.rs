//! Nodes, their items, and the port placement algorithm.
//!
//! A node never owns ports directly: each [`Item`] declares its ports, and the
//! node's port set is the union of its items' ports. Every layout change runs
//! [`Node::update_port_offsets`] before anything downstream (link routing)
//! can observe the node again.

use crate::geometry::{Point, Rect};
use crate::ids::{NodeId, PortId};
use crate::port::{Align, Edge, Port, PortOptions};
use crate::validation::{ConnectionRequest, LinkValidator, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Horizontal placement of an item's content inside the node body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemPosition {
    #[default]
    Left,
    Right,
}

/// A row of node content that carries zero or more ports.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: String,
    pub label: String,
    pub position: ItemPosition,
    pub value: Value,
    pub options: PortOptions,
    pub(crate) ports: Vec<Port>,
    /// Box of the item's content in node-local coordinates, once the UI has laid it out.
    pub(crate) rect: Option<Rect>,
}

impl Item {
    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: label.into(),
            position: ItemPosition::Left,
            value: Value::Null,
            options: PortOptions::new(),
            ports: Vec::new(),
            rect: None,
        }
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_position(mut self, position: ItemPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }
}

/// A positioned, resizable, collapsible box of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    position: Point,
    width: f32,
    height: f32,
    collapsed: bool,
    /// Height while collapsed (title bar only).
    collapsed_height: f32,
    /// Height to restore on expand.
    expanded_height: f32,
    items: Vec<Item>,
}

impl Node {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: NodeId(0),
            position: Point::new(x, y),
            width,
            height,
            collapsed: false,
            collapsed_height: 30.0,
            expanded_height: height,
            items: Vec::new(),
        }
    }

    pub fn with_collapsed_height(mut self, height: f32) -> Self {
        self.collapsed_height = height;
        self
    }

    /// Height to restore when a node built collapsed is expanded.
    pub fn with_expanded_height(mut self, height: f32) -> Self {
        self.expanded_height = height;
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn collapsed_height(&self) -> f32 {
        self.collapsed_height
    }

    pub fn expanded_height(&self) -> f32 {
        self.expanded_height
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All ports in registration order (item order, then declaration order).
    pub fn ports(&self) -> impl Iterator<Item = &Port> + '_ {
        self.items.iter().flat_map(|item| item.ports.iter())
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports().find(|p| p.id == id)
    }

    pub(crate) fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.items
            .iter_mut()
            .flat_map(|item| item.ports.iter_mut())
            .find(|p| p.id == id)
    }

    /// Index of the item declaring `port`.
    pub fn item_of_port(&self, port: PortId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.ports.iter().any(|p| p.id == port))
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.items
    }

    pub(crate) fn set_position(&mut self, x: f32, y: f32) {
        self.position = Point::new(x, y);
    }

    pub(crate) fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        if !self.collapsed {
            self.expanded_height = height;
        }
    }

    /// Resize while keeping the node's center fixed.
    pub(crate) fn resize_centered(&mut self, width: f32, height: f32) {
        let center = self.rect().center();
        self.set_size(width, height);
        self.position = Point::new(center.x - width / 2.0, center.y - height / 2.0);
    }

    pub(crate) fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    /// Collapse or expand around the node's center, swapping in the matching height.
    ///
    /// Returns false when the node already was in the requested state.
    pub(crate) fn apply_collapsed(&mut self, collapsed: bool) -> bool {
        if self.collapsed == collapsed {
            return false;
        }
        let height = if collapsed {
            self.expanded_height = self.height;
            self.collapsed_height
        } else {
            self.expanded_height
        };
        self.collapsed = collapsed;
        self.resize_centered(self.width, height);
        true
    }

    fn edge_length(&self, edge: Edge) -> f32 {
        if edge.is_vertical() {
            self.height
        } else {
            self.width
        }
    }

    /// Recompute every port's offset from the current layout.
    ///
    /// Expanded: a port is centered on its item along the edge axis. Collapsed
    /// (or when the item has not been laid out yet): the ports of each edge are
    /// spread evenly, the k-th of n getting `edge_length * k / (n + 1)`.
    pub fn update_port_offsets(&mut self, port_size: f32) {
        let mut totals = [0usize; 4];
        for port in self.ports() {
            totals[edge_slot(port.edge)] += 1;
        }

        let collapsed = self.collapsed;
        let (width, height) = (self.width, self.height);
        let mut seen = [0usize; 4];

        for item in &mut self.items {
            let rect = item.rect;
            for port in &mut item.ports {
                let slot = edge_slot(port.edge);
                seen[slot] += 1;
                let length = if port.edge.is_vertical() { height } else { width };

                port.offset = match rect {
                    Some(rect) if !collapsed => {
                        let center = if port.edge.is_vertical() {
                            rect.y + rect.height / 2.0
                        } else {
                            rect.x + rect.width / 2.0
                        };
                        let from_start = center - port_size / 2.0;
                        match port.align {
                            Align::Start => from_start,
                            Align::End => length - from_start - port_size,
                        }
                    }
                    _ => length * seen[slot] as f32 / (totals[slot] + 1) as f32,
                };
            }
        }
    }

    /// Box of a port's marker in canvas-local coordinates.
    ///
    /// The marker straddles the edge line; its position along the edge comes
    /// from the port's offset and alignment.
    pub fn port_anchor(&self, port: &Port, port_size: f32) -> Rect {
        let half = port_size / 2.0;
        let along = match port.align {
            Align::Start => port.offset,
            Align::End => self.edge_length(port.edge) - port.offset - port_size,
        };
        let Point { x, y } = self.position;
        match port.edge {
            Edge::Left => Rect::new(x - half, y + along, port_size, port_size),
            Edge::Right => Rect::new(x + self.width - half, y + along, port_size, port_size),
            Edge::Top => Rect::new(x + along, y - half, port_size, port_size),
            Edge::Bottom => Rect::new(x + along, y + self.height - half, port_size, port_size),
        }
    }
}

fn edge_slot(edge: Edge) -> usize {
    match edge {
        Edge::Left => 0,
        Edge::Right => 1,
        Edge::Top => 2,
        Edge::Bottom => 3,
    }
}

/// Per-node customization point: validation and connection callbacks.
///
/// The container calls through this trait only; the default methods accept
/// every connection and ignore the callbacks.
pub trait NodeBehavior {
    /// Decide whether a pending link may be attached to one of this node's ports.
    fn is_connection_valid(&self, _request: &ConnectionRequest<'_>) -> ValidationResult {
        ValidationResult::Valid
    }

    /// A bound link now ends at `port`.
    fn on_port_connected(&mut self, _port: &Port) {}

    /// A bound link ending at `port` was removed.
    fn on_port_disconnected(&mut self, _port: &Port) {}
}

impl<B: NodeBehavior + ?Sized> NodeBehavior for Box<B> {
    fn is_connection_valid(&self, request: &ConnectionRequest<'_>) -> ValidationResult {
        (**self).is_connection_valid(request)
    }

    fn on_port_connected(&mut self, port: &Port) {
        (**self).on_port_connected(port)
    }

    fn on_port_disconnected(&mut self, port: &Port) {
        (**self).on_port_disconnected(port)
    }
}

/// Accepts every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBehavior;

impl NodeBehavior for DefaultBehavior {}

/// Behavior that delegates validation to a [`LinkValidator`].
///
/// ```
/// use slint_node_graph::{ValidatedBehavior, MaxConnections, MatchingOption, CompositeValidator};
///
/// let behavior = ValidatedBehavior::new(
///     CompositeValidator::new()
///         .add(MatchingOption::new("type"))
///         .add(MaxConnections::new(1)),
/// );
/// # let _ = behavior;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidatedBehavior<V> {
    validator: V,
}

impl<V: LinkValidator> ValidatedBehavior<V> {
    pub fn new(validator: V) -> Self {
        Self { validator }
    }
}

impl<V: LinkValidator> NodeBehavior for ValidatedBehavior<V> {
    fn is_connection_valid(&self, request: &ConnectionRequest<'_>) -> ValidationResult {
        self.validator.validate(request)
    }
}
