//! Ports: typed attachment points on a node's edge.

use crate::geometry::Facing;
use crate::ids::PortId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which side of the node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    /// True for ports whose offset runs along the node's vertical axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }
}

/// Which corner a port's offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    /// Top (left/right edges) or left (top/bottom edges).
    #[default]
    Start,
    /// Bottom (left/right edges) or right (top/bottom edges).
    End,
}

/// Opaque option bag used only by connection validators and query filters.
pub type PortOptions = BTreeMap<String, Value>;

/// An attachment point where links terminate.
///
/// The `offset` is derived by [`Node::update_port_offsets`](crate::Node::update_port_offsets)
/// and `active` is maintained by the container; neither is meant to be set by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub(crate) id: PortId,
    pub edge: Edge,
    pub align: Align,
    pub options: PortOptions,
    pub(crate) active: bool,
    pub(crate) offset: f32,
}

impl Port {
    /// Create a port description. The id is assigned when the owning node is added.
    pub fn new(edge: Edge) -> Self {
        Self {
            id: PortId(0),
            edge,
            align: Align::Start,
            options: PortOptions::new(),
            active: false,
            offset: 0.0,
        }
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Distance along the edge from the aligned corner, in local pixels.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn facing(&self) -> Facing {
        Facing::from_edge(self.edge)
    }
}

/// One clause of an [`OptionFilter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    Is(Value),
    AnyOf(Vec<Value>),
}

/// Predicate over a port's options: every clause must match.
///
/// ```
/// use slint_node_graph::{OptionFilter, Port, Edge};
///
/// let filter = OptionFilter::new().is("kind", "data").any_of("type", ["int", "float"]);
/// let port = Port::new(Edge::Left).with_option("kind", "data").with_option("type", "int");
/// assert!(filter.matches(&port.options));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionFilter {
    clauses: Vec<(String, Match)>,
}

impl OptionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((key.into(), Match::Is(value.into())));
        self
    }

    pub fn any_of<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((key.into(), Match::AnyOf(values)));
        self
    }

    pub fn matches(&self, options: &PortOptions) -> bool {
        self.clauses.iter().all(|(key, clause)| {
            let Some(actual) = options.get(key) else {
                return false;
            };
            match clause {
                Match::Is(expected) => actual == expected,
                Match::AnyOf(allowed) => allowed.contains(actual),
            }
        })
    }
}

/// Applies an optional filter; `None` matches everything.
pub(crate) fn filter_matches(filter: Option<&OptionFilter>, options: &PortOptions) -> bool {
    filter.map_or(true, |f| f.matches(options))
}
