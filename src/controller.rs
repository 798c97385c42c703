//! High-level controller wiring a [`GraphContainer`] to a Slint UI.
//!
//! The [`GraphController`] is a cloneable handle: every clone shares the same
//! container, so one can be moved into each Slint callback.
//!
//! # Example
//!
//! ```ignore
//! use slint_node_graph::GraphController;
//!
//! slint::include_modules!();
//!
//! fn main() {
//!     let window = MainWindow::new().unwrap();
//!     let ctrl = GraphController::new();
//!     ctrl.set_auto_flush(true);
//!
//!     let links = Rc::new(VecModel::default());
//!     window.set_links(links.clone().into());
//!     ctrl.bind_model(links, |p| LinkData {
//!         id: p.id.0 as i32,
//!         x: p.bounds.x,
//!         y: p.bounds.y,
//!         commands: p.commands.as_str().into(),
//!         color: p.color,
//!     });
//!
//!     // Interaction
//!     window.on_port_pressed(ctrl.port_pressed_callback());
//!     window.on_port_hover(ctrl.port_hover_callback());
//!     window.on_pointer_moved(ctrl.pointer_moved_callback());
//!     window.on_pointer_released(ctrl.pointer_released_callback());
//!     window.on_canvas_clicked(ctrl.canvas_clicked_callback());
//!
//!     // Layout reports
//!     window.on_node_rect_changed(ctrl.node_rect_changed_callback());
//!     window.on_item_rect_changed(ctrl.item_rect_changed_callback());
//!     window.on_port_anchor_changed(ctrl.port_anchor_changed_callback());
//!     window.on_update_viewport(ctrl.viewport_changed_callback());
//!
//!     window.run().unwrap();
//! }
//! ```

use crate::config::GraphConfig;
use crate::container::{GraphContainer, PortPressOutcome};
use crate::geometry::{Point, Rect, Viewport};
use crate::ids::{LinkId, NodeId, PortId};
use crate::render::{ConcreteModelSyncer, LinkPath, ModelSyncer};
use slint::{SharedString, VecModel};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Slint passes ids as `int`; non-positive values mean "none".
fn raw_id(raw: i32) -> Option<u64> {
    u64::try_from(raw).ok().filter(|id| *id > 0)
}

/// Controller that owns the graph and provides callback implementations.
///
/// This provides a high-level API that handles:
/// - Converting Slint's screen-space reports into container calls
/// - Running deferred re-routes on the next event-loop tick
/// - Keeping a bound `VecModel` of link paths in sync
///
/// Clone this controller to share it across callbacks.
#[derive(Clone)]
pub struct GraphController {
    graph: Rc<RefCell<GraphContainer>>,
    syncer: Rc<RefCell<Option<Box<dyn ModelSyncer>>>>,
    auto_flush: Rc<RefCell<bool>>,
    flush_scheduled: Rc<RefCell<bool>>,
}

impl Default for GraphController {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphController {
    /// Create a controller over an empty graph with default settings.
    pub fn new() -> Self {
        Self::from_container(GraphContainer::new())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self::from_container(GraphContainer::with_config(config))
    }

    pub fn from_container(container: GraphContainer) -> Self {
        Self {
            graph: Rc::new(RefCell::new(container)),
            syncer: Rc::new(RefCell::new(None)),
            auto_flush: Rc::new(RefCell::new(false)),
            flush_scheduled: Rc::new(RefCell::new(false)),
        }
    }

    /// Get access to the shared container.
    pub fn graph(&self) -> Rc<RefCell<GraphContainer>> {
        self.graph.clone()
    }

    /// Bind a Slint VecModel for automatic synchronization.
    ///
    /// After binding, every flush and every pointer-driven preview update
    /// rewrites the model's rows from the current link paths.
    ///
    /// # Arguments
    /// * `model` - The VecModel to sync to
    /// * `constructor` - Builds the Slint row type from a [`LinkPath`]
    pub fn bind_model<P, F>(&self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(&LinkPath) -> P + 'static,
    {
        *self.syncer.borrow_mut() = Some(Box::new(ConcreteModelSyncer { model, constructor }));
        self.sync();
    }

    /// Run deferred re-routes from a zero-delay Slint timer (requires a running event loop).
    pub fn set_auto_flush(&self, enabled: bool) {
        *self.auto_flush.borrow_mut() = enabled;
        if enabled {
            self.schedule_flush();
        }
    }

    /// Re-route everything queued and push the result to the bound model.
    ///
    /// # Returns
    /// How many links got new geometry
    pub fn flush(&self) -> usize {
        let routed = self.graph.borrow_mut().flush_deferred();
        self.sync();
        routed
    }

    fn sync(&self) {
        let paths = self.graph.borrow().paths();
        if let Some(syncer) = self.syncer.borrow().as_ref() {
            syncer.sync(&paths);
        }
    }

    fn schedule_flush(&self) {
        if !*self.auto_flush.borrow() || *self.flush_scheduled.borrow() {
            return;
        }
        if !self.graph.borrow().has_deferred() {
            return;
        }
        *self.flush_scheduled.borrow_mut() = true;
        let ctrl = self.clone();
        slint::Timer::single_shot(Duration::ZERO, move || {
            *ctrl.flush_scheduled.borrow_mut() = false;
            ctrl.flush();
        });
    }

    /// Common tail of every handler: queue a flush and refresh the model.
    fn changed(&self) {
        self.schedule_flush();
        self.sync();
    }

    pub fn paths(&self) -> Vec<LinkPath> {
        self.graph.borrow().paths()
    }

    /// SVG commands of one link, empty if it has not been routed.
    pub fn compute_link_path(&self, link: i32) -> SharedString {
        raw_id(link)
            .and_then(|id| self.graph.borrow().link_path(LinkId(id)))
            .map(|p| SharedString::from(p.commands.as_str()))
            .unwrap_or_default()
    }

    // === Callback factories ===

    /// Returns a callback for `compute-link-path`.
    pub fn compute_link_path_callback(&self) -> impl Fn(i32) -> SharedString {
        let ctrl = self.clone();
        move |link| ctrl.compute_link_path(link)
    }

    /// Returns a callback for `port-pressed(port-id)`.
    pub fn port_pressed_callback(&self) -> impl Fn(i32) {
        let ctrl = self.clone();
        move |port| {
            ctrl.handle_port_pressed(port);
        }
    }

    /// Returns a callback for `port-hover(port-id)`; 0 means the pointer left the port.
    pub fn port_hover_callback(&self) -> impl Fn(i32) {
        let ctrl = self.clone();
        move |port| ctrl.handle_port_hover(port)
    }

    /// Returns a callback for `pointer-moved(x, y)`.
    pub fn pointer_moved_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| ctrl.handle_pointer_moved(x, y)
    }

    /// Returns a callback for `pointer-released(x, y)`.
    pub fn pointer_released_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.handle_pointer_released(x, y);
        }
    }

    /// Returns a callback for `canvas-clicked()`.
    pub fn canvas_clicked_callback(&self) -> impl Fn() {
        let ctrl = self.clone();
        move || ctrl.handle_canvas_clicked()
    }

    /// Returns a callback for `node-rect-changed(node-id, x, y, width, height)`.
    pub fn node_rect_changed_callback(&self) -> impl Fn(i32, f32, f32, f32, f32) {
        let ctrl = self.clone();
        move |node, x, y, w, h| ctrl.handle_node_rect(node, x, y, w, h)
    }

    /// Returns a callback for `item-rect-changed(node-id, index, x, y, width, height)`.
    pub fn item_rect_changed_callback(&self) -> impl Fn(i32, i32, f32, f32, f32, f32) {
        let ctrl = self.clone();
        move |node, index, x, y, w, h| ctrl.handle_item_rect(node, index, x, y, w, h)
    }

    /// Returns a callback for `port-anchor-changed(port-id, x, y, width, height)`.
    pub fn port_anchor_changed_callback(&self) -> impl Fn(i32, f32, f32, f32, f32) {
        let ctrl = self.clone();
        move |port, x, y, w, h| ctrl.handle_port_anchor(port, x, y, w, h)
    }

    /// Returns a callback for `update-viewport(zoom, pan-x, pan-y)`.
    pub fn viewport_changed_callback(&self) -> impl Fn(f32, f32, f32) {
        let ctrl = self.clone();
        move |zoom, pan_x, pan_y| ctrl.set_viewport(zoom, pan_x, pan_y)
    }

    // === Direct handlers ===

    /// Start a link at the port, or try to finish the pending one there.
    pub fn handle_port_pressed(&self, port: i32) -> PortPressOutcome {
        let Some(port) = raw_id(port).map(PortId) else {
            return PortPressOutcome::Ignored;
        };
        let outcome = self.graph.borrow_mut().on_port_pressed(port);
        self.changed();
        outcome.unwrap_or_else(|e| {
            log::warn!("port press ignored: {}", e);
            PortPressOutcome::Ignored
        })
    }

    pub fn handle_port_hover(&self, port: i32) {
        let port = raw_id(port).map(PortId);
        if self.graph.borrow_mut().on_port_hover(port) {
            self.sync();
        }
    }

    /// Screen-space pointer position.
    pub fn handle_pointer_moved(&self, x: f32, y: f32) {
        if self.graph.borrow_mut().on_pointer_moved(Point::new(x, y)) {
            self.sync();
        }
    }

    pub fn handle_pointer_released(&self, x: f32, y: f32) -> PortPressOutcome {
        let outcome = self.graph.borrow_mut().on_pointer_released(Point::new(x, y));
        self.changed();
        outcome.unwrap_or_else(|e| {
            log::warn!("pointer release ignored: {}", e);
            PortPressOutcome::Ignored
        })
    }

    pub fn handle_canvas_clicked(&self) {
        if self.graph.borrow_mut().on_canvas_clicked().is_some() {
            self.sync();
        }
    }

    /// Escape: drop the pending link, if any.
    pub fn cancel_pending(&self) -> Option<LinkId> {
        let cancelled = self.graph.borrow_mut().cancel_pending();
        if cancelled.is_some() {
            self.sync();
        }
        cancelled
    }

    /// Handle node-rect-changed: convert screen→local and move/resize the node.
    pub fn handle_node_rect(&self, node: i32, x: f32, y: f32, w: f32, h: f32) {
        let Some(id) = raw_id(node).map(NodeId) else {
            return;
        };
        {
            let mut graph = self.graph.borrow_mut();
            let local = graph.viewport().rect_to_local(Rect::new(x, y, w, h));
            let Some(current) = graph.node(id).map(|n| n.rect()) else {
                log::warn!("rect reported for unknown node {}", id);
                return;
            };
            let mut result = Ok(());
            if (current.x, current.y) != (local.x, local.y) {
                result = graph.move_node(id, local.x, local.y);
            }
            if result.is_ok() && (current.width, current.height) != (local.width, local.height) {
                result = graph.resize_node(id, local.width, local.height);
            }
            if let Err(e) = result {
                log::warn!("node rect ignored: {}", e);
            }
        }
        self.changed();
    }

    /// Handle item-rect-changed. The box is node-local, in local pixels.
    pub fn handle_item_rect(&self, node: i32, index: i32, x: f32, y: f32, w: f32, h: f32) {
        let (Some(id), Ok(index)) = (raw_id(node).map(NodeId), usize::try_from(index)) else {
            return;
        };
        let result = self
            .graph
            .borrow_mut()
            .set_item_rect(id, index, Rect::new(x, y, w, h));
        if let Err(e) = result {
            log::warn!("item rect ignored: {}", e);
        }
        self.changed();
    }

    /// Handle port-anchor-changed: store the marker box the UI measured (screen space).
    pub fn handle_port_anchor(&self, port: i32, x: f32, y: f32, w: f32, h: f32) {
        let Some(port) = raw_id(port).map(PortId) else {
            return;
        };
        let result = self
            .graph
            .borrow_mut()
            .handle_port_anchor(port, Rect::new(x, y, w, h));
        if let Err(e) = result {
            log::warn!("port anchor ignored: {}", e);
        }
        self.changed();
    }

    /// Set viewport state: zoom, pan_x, pan_y.
    ///
    /// Links live in canvas-local space, so a pan or zoom never re-routes.
    pub fn set_viewport(&self, zoom: f32, pan_x: f32, pan_y: f32) {
        self.graph
            .borrow_mut()
            .set_viewport(Viewport { zoom, pan_x, pan_y });
    }

    pub fn zoom(&self) -> f32 {
        self.graph.borrow().viewport().zoom
    }
}
