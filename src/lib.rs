//! # Slint Node Graph Library
//!
//! The link core of a visual node-graph editor: nodes with typed ports on
//! their edges, links between ports, and everything that keeps the links
//! drawn correctly while the user edits the graph.
//!
//! ## Features
//!
//! - **Port placement** - Ports follow their item, or spread evenly along the edge when collapsed
//! - **Link routing** - Straight, curved, angular and rounded links with decorated ends
//! - **Collision avoidance** - Parallel bend lines of different links are pushed apart on a grid
//! - **Drag to connect** - A pending link follows the pointer until a node accepts it
//! - **Per-node validation** - Each node decides which connections it accepts
//!
//! ## Quick Start
//!
//! ```
//! use slint_node_graph::{DefaultBehavior, Edge, GraphContainer, Item, Node, Port};
//!
//! let mut graph = GraphContainer::new();
//! let a = graph.add_node(
//!     Node::new(0.0, 0.0, 120.0, 60.0)
//!         .with_item(Item::new("out", "value").with_port(Port::new(Edge::Right))),
//!     DefaultBehavior,
//! );
//! let b = graph.add_node(
//!     Node::new(300.0, 0.0, 120.0, 60.0)
//!         .with_item(Item::new("in", "x").with_port(Port::new(Edge::Left))),
//!     DefaultBehavior,
//! );
//! let out = graph.node(a).unwrap().ports().next().unwrap().id();
//! let input = graph.node(b).unwrap().ports().next().unwrap().id();
//!
//! graph.on_port_pressed(out).unwrap();
//! graph.on_port_pressed(input).unwrap();
//! graph.flush_deferred();
//! assert_eq!(graph.paths().len(), 1);
//! ```
//!
//! ## Core Types
//!
//! - [`GraphContainer`] - Registry of nodes, ports and links; owns the link lifecycle
//! - [`GraphController`] - Cloneable handle that wires a container to Slint callbacks
//! - [`Node`], [`Item`], [`Port`] - The graph model
//! - [`Link`], [`LinkOptions`] - Connections and their style
//! - [`NodeBehavior`] - Per-node validation and connection callbacks
//!
//! ## Rust Helpers
//!
//! - [`route_link`] - Compute a link's polyline, SVG commands and bounds
//! - [`generate_line_path`], [`generate_curve_path`], [`generate_polyline_path`] - SVG path builders
//! - [`LineReservations`] - Grid of claimed bend lines used for collision avoidance
//! - [`find_port_at`] - Hit-test port markers at screen coordinates

pub mod anchors;
pub mod collision;
pub mod config;
pub mod container;
pub mod controller;
pub mod decoration;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod link;
pub mod node;
pub mod path;
pub mod port;
pub mod render;
pub mod route;
pub mod snapshot;
pub mod validation;

pub use anchors::{find_port_at, AnchorCache, ReportedAnchor};
pub use collision::LineReservations;
pub use config::GraphConfig;
pub use container::{AddLinkOutcome, Connection, GraphContainer, LinkTemplate, PortPressOutcome};
pub use controller::GraphController;
pub use decoration::{EndKinds, Glyph};
pub use error::{GraphError, Result};
pub use geometry::{Facing, Point, Rect, Viewport};
pub use ids::{LinkId, NodeId, PortId};
pub use link::{EndSlot, LineStyle, LineType, Link, LinkEnds, LinkOptions, LinkRecord, LinkState};
pub use node::{DefaultBehavior, Item, ItemPosition, Node, NodeBehavior, ValidatedBehavior};
pub use path::{curve_points, generate_curve_path, generate_line_path, generate_polyline_path};
pub use port::{Align, Edge, Match, OptionFilter, Port, PortOptions};
pub use render::LinkPath;
pub use route::{route_link, GlyphPlacement, RouteInput, RoutedLink};
pub use snapshot::{GraphSnapshot, ItemRecord, NodeRecord, PortRecord, PortRef, RestoreReport};
pub use validation::{
    AllowAll, CompositeValidator, ConnectionRequest, LinkValidator, MatchingOption, MaxConnections,
    ValidationError, ValidationResult,
};
