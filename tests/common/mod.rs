//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use slint_node_graph::{
    AllowAll, ConnectionRequest, LinkValidator, NodeBehavior, Port, PortId, ValidationResult,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Install `env_logger` once per test binary; `RUST_LOG=debug` shows lifecycle logs.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Tracks node callback invocations for testing.
///
/// Each field records calls to the corresponding callback with their arguments.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// (port,) for on_port_connected
    pub connected: Rc<RefCell<Vec<PortId>>>,
    /// (port,) for on_port_disconnected
    pub disconnected: Rc<RefCell<Vec<PortId>>>,
    /// (other_count, count) for every validation request
    pub validated: Rc<RefCell<Vec<(usize, usize)>>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        self.connected.borrow_mut().clear();
        self.disconnected.borrow_mut().clear();
        self.validated.borrow_mut().clear();
    }

    pub fn connected_count(&self) -> usize {
        self.connected.borrow().len()
    }

    pub fn disconnected_count(&self) -> usize {
        self.disconnected.borrow().len()
    }
}

/// Node behavior that records every callback and delegates validation.
pub struct TrackingBehavior {
    tracker: CallbackTracker,
    validator: Box<dyn LinkValidator>,
}

impl TrackingBehavior {
    pub fn new(tracker: &CallbackTracker) -> Self {
        Self::with_validator(tracker, AllowAll)
    }

    pub fn with_validator(tracker: &CallbackTracker, validator: impl LinkValidator + 'static) -> Self {
        Self {
            tracker: tracker.clone(),
            validator: Box::new(validator),
        }
    }
}

impl NodeBehavior for TrackingBehavior {
    fn is_connection_valid(&self, request: &ConnectionRequest<'_>) -> ValidationResult {
        self.tracker
            .validated
            .borrow_mut()
            .push((request.other_count, request.count));
        self.validator.validate(request)
    }

    fn on_port_connected(&mut self, port: &Port) {
        self.tracker.connected.borrow_mut().push(port.id());
    }

    fn on_port_disconnected(&mut self, port: &Port) {
        self.tracker.disconnected.borrow_mut().push(port.id());
    }
}
