//! Opaque identifiers handed out by [`GraphContainer`](crate::GraphContainer).
//!
//! Ids are allocated monotonically, so comparing two ids of the same kind
//! compares their registration order.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifies a node in one container.
    NodeId
);
define_id!(
    /// Identifies a port (attachment point) in one container.
    PortId
);
define_id!(
    /// Identifies a link in one container.
    LinkId
);

/// Monotonic id source shared by all three id kinds.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn next_raw(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    pub(crate) fn node(&mut self) -> NodeId {
        NodeId(self.next_raw())
    }

    pub(crate) fn port(&mut self) -> PortId {
        PortId(self.next_raw())
    }

    pub(crate) fn link(&mut self) -> LinkId {
        LinkId(self.next_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_across_kinds() {
        let mut ids = IdAllocator::default();
        let node = ids.node();
        let port = ids.port();
        let link = ids.link();
        assert!(node.0 < port.0 && port.0 < link.0);
        assert!(ids.port() > port);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PortId(12).to_string(), "#12");
    }
}
