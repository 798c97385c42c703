//! The graph container: port/node/link registries, the link lifecycle and the
//! drag-to-connect protocol.
//!
//! The container is the only mutator of the registries. Nodes and ports stay
//! plain records; who owns a port and which links end at it is answered by
//! `node_by_port` and `links_by_port`.
//!
//! Link geometry is never computed from stale layout. Every layout change
//! recomputes port offsets on the spot and queues the affected links; the
//! queue is drained by [`GraphContainer::flush_deferred`], which the UI calls
//! on the next tick (see [`GraphController`](crate::GraphController)).

use crate::anchors::{find_port_at, AnchorCache};
use crate::collision::LineReservations;
use crate::config::GraphConfig;
use crate::decoration::EndKinds;
use crate::error::{GraphError, Result};
use crate::geometry::{Facing, Point, Rect, Viewport};
use crate::ids::{IdAllocator, LinkId, NodeId, PortId};
use crate::link::{EndSlot, Link, LinkEnds, LinkOptions, LinkState};
use crate::node::{Item, Node, NodeBehavior};
use crate::port::{filter_matches, OptionFilter, Port, PortOptions};
use crate::render::LinkPath;
use crate::route::{route_link, RouteInput};
use crate::validation::{ConnectionRequest, ValidationError, ValidationResult};
use std::collections::{BTreeMap, BTreeSet};

/// What happened to a link handed to [`GraphContainer::add_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddLinkOutcome {
    /// Both ends bound; routing is queued.
    Added(LinkId),
    /// One end bound; the link now follows the pointer.
    Pending(LinkId),
    /// Refused and logged (an end references a port nobody owns, or no end is bound).
    Dropped,
}

impl AddLinkOutcome {
    pub fn link(self) -> Option<LinkId> {
        match self {
            AddLinkOutcome::Added(id) | AddLinkOutcome::Pending(id) => Some(id),
            AddLinkOutcome::Dropped => None,
        }
    }
}

/// Result of a press or release on a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortPressOutcome {
    /// A new pending link starts at the port.
    Started(LinkId),
    /// The pending link is now bound.
    Connected(LinkId),
    /// The owning node refused; the link stays pending.
    Rejected(ValidationError),
    /// Nothing to do.
    Ignored,
}

/// One link seen from a node, as returned by the connection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Node at the other end.
    pub node: NodeId,
    pub link: LinkId,
    /// Port on the queried node.
    pub port: PortId,
    /// Port on the other node.
    pub other_port: PortId,
}

/// Options and end decorations for links started from a port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkTemplate {
    pub options: Option<LinkOptions>,
    pub end1: Option<String>,
    pub end2: Option<String>,
}

type TemplateFn = Box<dyn Fn(&Port, &Item) -> LinkTemplate>;

struct NodeEntry {
    node: Node,
    behavior: Box<dyn NodeBehavior>,
}

/// Canvas-level registry and lifecycle manager for nodes, ports and links.
pub struct GraphContainer {
    config: GraphConfig,
    ids: IdAllocator,
    nodes: BTreeMap<NodeId, NodeEntry>,
    node_by_port: BTreeMap<PortId, NodeId>,
    links_by_port: BTreeMap<PortId, BTreeSet<LinkId>>,
    links: BTreeMap<LinkId, Link>,
    pending: Option<LinkId>,
    reservations: LineReservations,
    end_kinds: EndKinds,
    viewport: Viewport,
    anchors: AnchorCache,
    deferred: BTreeSet<LinkId>,
    template: Option<TemplateFn>,
}

impl Default for GraphContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphContainer {
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        let reservations = LineReservations::new(
            config.grid_step,
            config.collision_step,
            config.max_collision_shift,
        );
        Self {
            config,
            ids: IdAllocator::default(),
            nodes: BTreeMap::new(),
            node_by_port: BTreeMap::new(),
            links_by_port: BTreeMap::new(),
            links: BTreeMap::new(),
            pending: None,
            reservations,
            end_kinds: EndKinds::new(),
            viewport: Viewport::default(),
            anchors: AnchorCache::new(),
            deferred: BTreeSet::new(),
            template: None,
        }
    }

    // === Configuration ===

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Options used by [`create_link`](Self::create_link) when none are given.
    pub fn set_default_link_options(&mut self, options: LinkOptions) {
        self.config.default_link = options;
    }

    /// Change the port marker size; every offset is recomputed and every link re-routed.
    pub fn set_port_size(&mut self, size: f32) {
        self.config.port_size = size;
        for entry in self.nodes.values_mut() {
            entry.node.update_port_offsets(size);
        }
        self.anchors.clear();
        self.deferred.extend(self.links.keys().copied());
    }

    pub fn set_hit_radius(&mut self, radius: f32) {
        self.config.hit_radius = radius;
    }

    pub fn set_corner_radius(&mut self, radius: f32) {
        self.config.corner_radius = radius;
        self.deferred.extend(self.links.keys().copied());
    }

    pub fn end_kinds(&self) -> &EndKinds {
        &self.end_kinds
    }

    /// Register custom end decorations here.
    pub fn end_kinds_mut(&mut self) -> &mut EndKinds {
        &mut self.end_kinds
    }

    /// Pick options and end decorations for links the user starts from a port.
    pub fn set_link_template<F>(&mut self, template: F)
    where
        F: Fn(&Port, &Item) -> LinkTemplate + 'static,
    {
        self.template = Some(Box::new(template));
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Update pan/zoom. Reported anchor boxes are in screen space, so they are dropped.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.anchors.clear();
        }
    }

    pub fn reservations(&self) -> &LineReservations {
        &self.reservations
    }

    // === Nodes ===

    /// Register a node. Port ids are assigned in item order, then declaration order.
    pub fn add_node(&mut self, mut node: Node, behavior: impl NodeBehavior + 'static) -> NodeId {
        let id = self.ids.node();
        node.id = id;
        for item in node.items_mut() {
            self.register_item_ports(id, item);
        }
        node.update_port_offsets(self.config.port_size);
        log::debug!("node {} added with {} ports", id, node.ports().count());
        self.nodes.insert(
            id,
            NodeEntry {
                node,
                behavior: Box::new(behavior),
            },
        );
        id
    }

    fn register_item_ports(&mut self, node: NodeId, item: &mut Item) {
        for port in &mut item.ports {
            port.id = self.ids.port();
            port.active = false;
            self.node_by_port.insert(port.id, node);
        }
    }

    /// Remove a node after deleting every link that touches its ports.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let ports: Vec<PortId> = self
            .nodes
            .get(&id)
            .ok_or(GraphError::UnknownNode(id))?
            .node
            .ports()
            .map(|p| p.id)
            .collect();
        self.detach_ports(&ports);
        self.anchors.forget_node(id);
        let entry = self.nodes.remove(&id).ok_or(GraphError::UnknownNode(id))?;
        log::debug!("node {} removed", id);
        Ok(entry.node)
    }

    /// Delete all links at `ports`, then forget the ports.
    fn detach_ports(&mut self, ports: &[PortId]) {
        let doomed: BTreeSet<LinkId> = ports
            .iter()
            .filter_map(|p| self.links_by_port.get(p))
            .flatten()
            .copied()
            .collect();
        for link in doomed {
            if let Err(e) = self.delete_link(link) {
                log::warn!("cascade delete: {}", e);
            }
        }
        if let Some(id) = self.pending {
            if self.links.get(&id).and_then(Link::hover_port).is_some_and(|h| ports.contains(&h)) {
                if let Some(link) = self.links.get_mut(&id) {
                    if let Err(e) = link.hover(None) {
                        log::warn!("link {}: hover not cleared: {}", id, e);
                    }
                }
                self.reroute_logged(id);
            }
        }
        for port in ports {
            self.node_by_port.remove(port);
            self.links_by_port.remove(port);
            self.anchors.forget_port(*port);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(|e| &e.node)
    }

    /// Nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(|e| &e.node)
    }

    pub fn behavior(&self, id: NodeId) -> Option<&dyn NodeBehavior> {
        self.nodes.get(&id).map(|e| e.behavior.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .map(|e| &mut e.node)
            .ok_or(GraphError::UnknownNode(id))
    }

    /// Offsets first, then queue links; anchors reported before the change are stale.
    fn layout_changed(&mut self, id: NodeId) -> Result<usize> {
        let port_size = self.config.port_size;
        self.node_mut(id)?.update_port_offsets(port_size);
        self.anchors.forget_node(id);
        self.on_node_constraints_changed(id)
    }

    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> Result<()> {
        self.node_mut(id)?.set_position(x, y);
        self.layout_changed(id).map(|_| ())
    }

    pub fn resize_node(&mut self, id: NodeId, width: f32, height: f32) -> Result<()> {
        self.node_mut(id)?.set_size(width, height);
        self.layout_changed(id).map(|_| ())
    }

    /// Collapse or expand around the node's center. Returns whether anything changed.
    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<bool> {
        if !self.node_mut(id)?.apply_collapsed(collapsed) {
            return Ok(false);
        }
        log::debug!("node {} {}", id, if collapsed { "collapsed" } else { "expanded" });
        self.layout_changed(id)?;
        Ok(true)
    }

    /// Flip the collapsed state; returns the new state.
    pub fn toggle_collapse(&mut self, id: NodeId) -> Result<bool> {
        let collapsed = !self.node_mut(id)?.is_collapsed();
        self.set_collapsed(id, collapsed)?;
        Ok(collapsed)
    }

    /// Toggle several nodes (e.g. the current selection); unknown ids are skipped.
    pub fn toggle_collapse_many<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut toggled = 0;
        for id in ids {
            match self.toggle_collapse(id) {
                Ok(_) => toggled += 1,
                Err(e) => log::warn!("toggle collapse: {}", e),
            }
        }
        toggled
    }

    /// Append an item; its ports get fresh ids. Returns the item index.
    pub fn add_item(&mut self, id: NodeId, mut item: Item) -> Result<usize> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::UnknownNode(id));
        }
        self.register_item_ports(id, &mut item);
        let items = self.node_mut(id)?.items_mut();
        items.push(item);
        let index = items.len() - 1;
        self.layout_changed(id)?;
        Ok(index)
    }

    /// Remove an item, deleting every link at its ports first.
    pub fn remove_item(&mut self, id: NodeId, index: usize) -> Result<Item> {
        let ports: Vec<PortId> = self
            .node(id)
            .ok_or(GraphError::UnknownNode(id))?
            .items()
            .get(index)
            .ok_or(GraphError::UnknownItem { node: id, index })?
            .ports()
            .iter()
            .map(|p| p.id)
            .collect();
        self.detach_ports(&ports);
        let item = self.node_mut(id)?.items_mut().remove(index);
        self.layout_changed(id)?;
        Ok(item)
    }

    /// Store an item's laid-out box (node-local) as measured by the UI.
    pub fn set_item_rect(&mut self, id: NodeId, index: usize, rect: Rect) -> Result<()> {
        let item = self
            .node_mut(id)?
            .items_mut()
            .get_mut(index)
            .ok_or(GraphError::UnknownItem { node: id, index })?;
        if item.rect == Some(rect) {
            return Ok(());
        }
        item.rect = Some(rect);
        self.layout_changed(id).map(|_| ())
    }

    /// Queue every link touching `id`'s ports for re-routing. Returns how many were queued.
    pub fn on_node_constraints_changed(&mut self, id: NodeId) -> Result<usize> {
        let node = self.node(id).ok_or(GraphError::UnknownNode(id))?;
        let touching: Vec<LinkId> = node
            .ports()
            .filter_map(|p| self.links_by_port.get(&p.id))
            .flatten()
            .copied()
            .collect();
        let count = touching.len();
        self.deferred.extend(touching);
        Ok(count)
    }

    // === Ports ===

    pub fn port(&self, id: PortId) -> Option<&Port> {
        let node = self.node_by_port.get(&id)?;
        self.nodes.get(node)?.node.port(id)
    }

    pub fn node_for_port(&self, port: PortId) -> Option<NodeId> {
        self.node_by_port.get(&port).copied()
    }

    /// Links registered at a port, in id order.
    pub fn links_for_port(&self, port: PortId) -> Vec<LinkId> {
        self.links_by_port
            .get(&port)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn set_port_active(&mut self, port: PortId, active: bool) {
        let Some(node) = self.node_by_port.get(&port) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(node).and_then(|e| e.node.port_mut(port)) {
            p.active = active;
        }
    }

    fn register_port(&mut self, port: PortId, link: LinkId) {
        self.links_by_port.entry(port).or_default().insert(link);
        self.set_port_active(port, true);
    }

    fn unregister_port(&mut self, port: PortId, link: LinkId) {
        let Some(set) = self.links_by_port.get_mut(&port) else {
            return;
        };
        set.remove(&link);
        if set.is_empty() {
            self.links_by_port.remove(&port);
            self.set_port_active(port, false);
        }
    }

    // === Anchors ===

    /// Store the on-screen marker box the UI measured for a port.
    pub fn handle_port_anchor(&mut self, port: PortId, screen: Rect) -> Result<()> {
        let node = self.node_for_port(port).ok_or(GraphError::UnknownPort(port))?;
        if self.anchors.get(port) == Some(screen) {
            return Ok(());
        }
        self.anchors.handle_port_report(port, node, screen);
        self.deferred.extend(self.links_for_port(port));
        Ok(())
    }

    /// Screen-space marker box: the last report, else computed from the model.
    pub fn port_anchor_box(&self, port: PortId) -> Option<Rect> {
        if let Some(rect) = self.anchors.get(port) {
            return Some(rect);
        }
        let node = self.node(self.node_for_port(port)?)?;
        let p = node.port(port)?;
        Some(
            self.viewport
                .rect_to_screen(node.port_anchor(p, self.config.port_size)),
        )
    }

    /// Port under a screen-space point, within `radius` screen pixels of a marker.
    pub fn find_port_at(&self, screen: Point, radius: f32) -> Option<PortId> {
        let candidates: Vec<(PortId, Rect)> = self
            .node_by_port
            .keys()
            .filter_map(|&p| Some((p, self.port_anchor_box(p)?)))
            .collect();
        find_port_at(screen, candidates, radius)
    }

    /// Canvas-local anchor center and facing of a port.
    fn anchor_point(&self, port: PortId) -> Option<(Point, Facing)> {
        let node = self.node(self.node_for_port(port)?)?;
        let p = node.port(port)?;
        let center = match self.anchors.get(port) {
            Some(screen) => self.viewport.to_local(screen.center()),
            None => node.port_anchor(p, self.config.port_size).center(),
        };
        Some((center, p.facing()))
    }

    // === Links ===

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Links in id order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// State of a link; ids the container no longer holds are `Removed`.
    pub fn link_state(&self, id: LinkId) -> LinkState {
        self.links.get(&id).map_or(LinkState::Removed, Link::state)
    }

    pub fn pending_link(&self) -> Option<LinkId> {
        self.pending
    }

    fn pending_bound_port(&self) -> Option<PortId> {
        match self.links.get(&self.pending?)?.ends() {
            LinkEnds::Pending { bound, .. } => Some(*bound),
            _ => None,
        }
    }

    /// Build a link from optional ends and add it.
    ///
    /// Without explicit options the container's default link options apply.
    pub fn create_link(
        &mut self,
        port: Option<PortId>,
        other: Option<PortId>,
        end1: Option<&str>,
        end2: Option<&str>,
        options: Option<LinkOptions>,
    ) -> Result<AddLinkOutcome> {
        let options = options.unwrap_or(self.config.default_link);
        let link = Link::from_ports(port, other, options)
            .with_ends(end1.map(str::to_owned), end2.map(str::to_owned));
        self.add_link(link)
    }

    /// Register a link.
    ///
    /// A link referencing a port with no owning node (partially restored
    /// state) or with no bound end is logged and dropped, never half
    /// registered. A link with one bound end becomes the pending link,
    /// replacing any previous one. An unknown end decoration kind is a
    /// programmer error.
    pub fn add_link(&mut self, mut link: Link) -> Result<AddLinkOutcome> {
        let (end1, end2) = link.end_kinds();
        self.end_kinds.resolve(end1)?;
        self.end_kinds.resolve(end2)?;

        let ports: Vec<PortId> = link.ports().collect();
        if ports.is_empty() {
            log::error!("link without any bound port dropped");
            return Ok(AddLinkOutcome::Dropped);
        }
        if let Some(missing) = ports.iter().find(|p| !self.node_by_port.contains_key(*p)) {
            log::error!("missing node for connection at port {}", missing);
            return Ok(AddLinkOutcome::Dropped);
        }
        if let [c1, c2] = ports.as_slice() {
            if c1 == c2 {
                log::error!("link from port {} to itself dropped", c1);
                return Ok(AddLinkOutcome::Dropped);
            }
        }

        let pending = link.state() == LinkState::Pending;
        if pending {
            if let Some(old) = self.pending {
                log::warn!("pending link {} replaced", old);
                self.delete_link(old)?;
            }
        }

        let id = self.ids.link();
        link.id = id;
        link.route = None;
        self.links.insert(id, link);
        for port in &ports {
            self.register_port(*port, id);
        }

        if pending {
            self.pending = Some(id);
            self.reroute_logged(id);
            log::debug!("link {} pending at port {}", id, ports[0]);
            Ok(AddLinkOutcome::Pending(id))
        } else {
            self.notify_connected(id);
            self.deferred.insert(id);
            log::debug!("link {} added: {} -> {}", id, ports[0], ports[1]);
            Ok(AddLinkOutcome::Added(id))
        }
    }

    /// Start a pending link at `port`, styled by the link template.
    pub fn start_link(&mut self, port: PortId) -> Result<LinkId> {
        let node_id = self.node_for_port(port).ok_or(GraphError::UnknownPort(port))?;
        let template = match (&self.template, self.node(node_id)) {
            (Some(template), Some(node)) => {
                let item = node.item_of_port(port).and_then(|i| node.items().get(i));
                match (node.port(port), item) {
                    (Some(p), Some(item)) => template(p, item),
                    _ => LinkTemplate::default(),
                }
            }
            _ => LinkTemplate::default(),
        };
        let LinkTemplate { options, end1, end2 } = template;
        match self.create_link(Some(port), None, end1.as_deref(), end2.as_deref(), options)? {
            AddLinkOutcome::Pending(id) => Ok(id),
            _ => Err(GraphError::UnknownPort(port)),
        }
    }

    /// Remove a link in any state and clean up after it.
    ///
    /// Ports are marked inactive only once no link is left at them. Both
    /// nodes hear about it if the link was bound.
    pub fn delete_link(&mut self, id: LinkId) -> Result<()> {
        let link = self.links.remove(&id).ok_or(GraphError::UnknownLink(id))?;
        if self.pending == Some(id) {
            self.pending = None;
        }
        for port in link.ports() {
            self.unregister_port(port, id);
        }
        if link.state() == LinkState::Bound {
            for port in link.ports() {
                self.notify_port(port, false);
            }
        }
        self.reservations.release(id);
        self.deferred.remove(&id);
        log::debug!("link {} removed", id);
        Ok(())
    }

    /// Drop the pending link (Escape). Returns the removed link.
    pub fn cancel_pending(&mut self) -> Option<LinkId> {
        let id = self.pending?;
        match self.delete_link(id) {
            Ok(()) => Some(id),
            Err(e) => {
                log::warn!("cancel pending: {}", e);
                self.pending = None;
                None
            }
        }
    }

    /// A click on empty canvas cancels the pending link.
    pub fn on_canvas_clicked(&mut self) -> Option<LinkId> {
        self.cancel_pending()
    }

    fn notify_connected(&mut self, id: LinkId) {
        let ports: Vec<PortId> = self.links.get(&id).map(|l| l.ports().collect()).unwrap_or_default();
        for port in ports {
            self.notify_port(port, true);
        }
    }

    fn notify_port(&mut self, port: PortId, connected: bool) {
        let Some(node) = self.node_by_port.get(&port) else {
            return;
        };
        let Some(NodeEntry { node, behavior }) = self.nodes.get_mut(node) else {
            return;
        };
        if let Some(p) = node.port(port) {
            if connected {
                behavior.on_port_connected(p);
            } else {
                behavior.on_port_disconnected(p);
            }
        }
    }

    // === Drag to connect ===

    /// A port was clicked: start a link, or try to finish the pending one.
    pub fn on_port_pressed(&mut self, port: PortId) -> Result<PortPressOutcome> {
        if !self.node_by_port.contains_key(&port) {
            return Err(GraphError::UnknownPort(port));
        }
        if self.pending.is_some() {
            self.resolve_pending(port)
        } else {
            Ok(PortPressOutcome::Started(self.start_link(port)?))
        }
    }

    /// The pointer entered (`Some`) or left (`None`) a port. Returns whether the preview changed.
    pub fn on_port_hover(&mut self, port: Option<PortId>) -> bool {
        let Some(id) = self.pending else {
            return false;
        };
        let bound = self.pending_bound_port();
        let hover = port.filter(|p| Some(*p) != bound && self.node_by_port.contains_key(p));
        let Some(link) = self.links.get_mut(&id) else {
            return false;
        };
        if link.hover_port() == hover || link.hover(hover).is_err() {
            return false;
        }
        self.reroute_logged(id);
        true
    }

    /// Pointer moved (screen coordinates). Returns whether a pending link followed it.
    pub fn on_pointer_moved(&mut self, screen: Point) -> bool {
        let Some(id) = self.pending else {
            return false;
        };
        let local = self.viewport.to_local(screen);
        let Some(link) = self.links.get_mut(&id) else {
            return false;
        };
        if link.track_pointer(local).is_err() {
            return false;
        }
        self.reroute_logged(id);
        true
    }

    /// Pointer released (screen coordinates).
    ///
    /// Over a port other than the origin this resolves the pending link;
    /// anywhere else the link stays pending so it can be finished by a click.
    pub fn on_pointer_released(&mut self, screen: Point) -> Result<PortPressOutcome> {
        if self.pending.is_none() {
            return Ok(PortPressOutcome::Ignored);
        }
        let Some(port) = self.find_port_at(screen, self.config.hit_radius) else {
            return Ok(PortPressOutcome::Ignored);
        };
        if Some(port) == self.pending_bound_port() {
            return Ok(PortPressOutcome::Ignored);
        }
        self.resolve_pending(port)
    }

    fn resolve_pending(&mut self, target: PortId) -> Result<PortPressOutcome> {
        let Some(id) = self.pending else {
            return Ok(PortPressOutcome::Ignored);
        };
        let target_node = self.node_for_port(target).ok_or(GraphError::UnknownPort(target))?;
        let Some(bound) = self.pending_bound_port() else {
            self.pending = None;
            return Ok(PortPressOutcome::Ignored);
        };

        if bound == target {
            let reason = ValidationError::SamePort;
            log::error!("invalid connection {} -> {}: {}", bound, target, reason);
            return Ok(PortPressOutcome::Rejected(reason));
        }
        if let ValidationResult::Invalid(reason) = self.validate(id, bound, target, target_node) {
            log::error!("invalid connection {} -> {}: {}", bound, target, reason);
            return Ok(PortPressOutcome::Rejected(reason));
        }

        self.links
            .get_mut(&id)
            .ok_or(GraphError::UnknownLink(id))?
            .resolve(target)?;
        self.register_port(target, id);
        self.pending = None;
        self.notify_connected(id);
        self.reroute_logged(id);
        log::debug!("link {} bound: {} -> {}", id, bound, target);
        Ok(PortPressOutcome::Connected(id))
    }

    /// Ask the target's node about a connection; link lists exclude `pending` itself.
    fn validate(&self, pending: LinkId, other: PortId, target: PortId, node: NodeId) -> ValidationResult {
        let without_pending = |port: PortId| -> Vec<LinkId> {
            self.links_for_port(port).into_iter().filter(|l| *l != pending).collect()
        };
        let other_links = without_pending(other);
        let links = without_pending(target);
        let empty = PortOptions::new();
        let request = ConnectionRequest {
            other_options: self.port(other).map_or(&empty, |p| &p.options),
            options: self.port(target).map_or(&empty, |p| &p.options),
            other_count: other_links.len(),
            count: links.len(),
            other_links: &other_links,
            links: &links,
        };
        match self.nodes.get(&node) {
            Some(entry) => entry.behavior.is_connection_valid(&request),
            None => ValidationResult::Invalid(ValidationError::Rejected),
        }
    }

    // === Routing ===

    /// Endpoints of a link in canvas-local space: (start, start facing, end, end facing).
    fn link_endpoints(&self, link: &Link) -> Option<(Point, Facing, Point, Facing)> {
        match *link.ends() {
            LinkEnds::Unbound => None,
            LinkEnds::Bound { c1, c2 } => {
                let (a, fa) = self.anchor_point(c1)?;
                let (b, fb) = self.anchor_point(c2)?;
                Some((a, fa, b, fb))
            }
            LinkEnds::Pending {
                bound,
                slot,
                pointer,
                hover,
            } => {
                let (b, fb) = self.anchor_point(bound)?;
                // a free end faces back towards its bound end
                let (free, ff) = hover
                    .and_then(|h| self.anchor_point(h))
                    .unwrap_or_else(|| (pointer.unwrap_or(b), fb.opposite()));
                match slot {
                    EndSlot::First => Some((b, fb, free, ff)),
                    EndSlot::Second => Some((free, ff, b, fb)),
                }
            }
        }
    }

    /// Re-route one link now. Returns false when its geometry is not measurable yet;
    /// the previous render is kept in that case.
    pub fn reroute_link(&mut self, id: LinkId) -> Result<bool> {
        let link = self.links.get(&id).ok_or(GraphError::UnknownLink(id))?;
        let Some((start, start_facing, end, end_facing)) = self.link_endpoints(link) else {
            return Ok(false);
        };
        let (end1, end2) = link.end_kinds();
        let (end1, end2) = (end1.map(str::to_owned), end2.map(str::to_owned));
        let options = *link.options();

        let input = RouteInput {
            link: id,
            start,
            end,
            start_facing,
            end_facing,
            end1: end1.as_deref(),
            end2: end2.as_deref(),
            options: &options,
        };
        let Some(routed) = route_link(&input, &mut self.reservations, &self.end_kinds, &self.config)? else {
            return Ok(false);
        };
        if let Some(link) = self.links.get_mut(&id) {
            link.route = Some(routed);
        }
        Ok(true)
    }

    fn reroute_logged(&mut self, id: LinkId) {
        if let Err(e) = self.reroute_link(id) {
            log::warn!("link {} not routed: {}", id, e);
        }
    }

    /// Re-route every queued link (the zero-delay tick after layout). Returns how many got new geometry.
    pub fn flush_deferred(&mut self) -> usize {
        let queued = std::mem::take(&mut self.deferred);
        let mut routed = 0;
        for id in queued {
            if !self.links.contains_key(&id) {
                continue;
            }
            match self.reroute_link(id) {
                Ok(true) => routed += 1,
                Ok(false) => log::trace!("link {} has no measurable geometry yet", id),
                Err(e) => log::warn!("link {} not routed: {}", id, e),
            }
        }
        routed
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Draw instructions for every routed link, in id order.
    pub fn paths(&self) -> Vec<LinkPath> {
        self.links.values().filter_map(LinkPath::from_link).collect()
    }

    pub fn link_path(&self, id: LinkId) -> Option<LinkPath> {
        self.links.get(&id).and_then(LinkPath::from_link)
    }

    // === Queries ===

    /// Links from `node`'s ports to other nodes, grouped by item index.
    ///
    /// `own` filters the node's ports, `other` the ports at the far end.
    /// Results follow item order, then port id, then link id; with
    /// `first_only` the search stops at the first match. Pending links have
    /// no far end and never match.
    pub fn connected_nodes(
        &self,
        node: NodeId,
        own: Option<&OptionFilter>,
        other: Option<&OptionFilter>,
        first_only: bool,
    ) -> Result<BTreeMap<usize, Vec<Connection>>> {
        let n = self.node(node).ok_or(GraphError::UnknownNode(node))?;
        let mut result: BTreeMap<usize, Vec<Connection>> = BTreeMap::new();

        for (index, item) in n.items().iter().enumerate() {
            for port in item.ports() {
                if !filter_matches(own, &port.options) {
                    continue;
                }
                let Some(ids) = self.links_by_port.get(&port.id) else {
                    continue;
                };
                for &link in ids {
                    let Some(other_port) = self.links.get(&link).and_then(|l| l.other_end(port.id))
                    else {
                        continue;
                    };
                    let Some(far) = self.port(other_port) else {
                        continue;
                    };
                    if !filter_matches(other, &far.options) {
                        continue;
                    }
                    let Some(other_node) = self.node_for_port(other_port) else {
                        continue;
                    };
                    result.entry(index).or_default().push(Connection {
                        node: other_node,
                        link,
                        port: port.id,
                        other_port,
                    });
                    if first_only {
                        return Ok(result);
                    }
                }
            }
        }
        Ok(result)
    }

    /// First match of [`connected_nodes`](Self::connected_nodes).
    pub fn connected_node(
        &self,
        node: NodeId,
        own: Option<&OptionFilter>,
        other: Option<&OptionFilter>,
    ) -> Result<Option<Connection>> {
        let found = self.connected_nodes(node, own, other, true)?;
        Ok(found.into_values().flatten().next())
    }

    /// Indices of items none of whose `own`-matching ports has a link.
    pub fn unconnected_item_indices(&self, node: NodeId, own: Option<&OptionFilter>) -> Result<Vec<usize>> {
        let n = self.node(node).ok_or(GraphError::UnknownNode(node))?;
        Ok(n.items()
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                !item.ports().iter().any(|p| {
                    filter_matches(own, &p.options)
                        && self.links_by_port.get(&p.id).is_some_and(|s| !s.is_empty())
                })
            })
            .map(|(index, _)| index)
            .collect())
    }
}
