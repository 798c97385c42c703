//! Links between ports and their lifecycle.
//!
//! A link moves through `Unbound -> Pending -> Bound`, and is `Removed` once
//! the container forgets it. The preview state used while dragging lives only
//! inside [`LinkEnds::Pending`], so a bound link's record can never carry it.

use crate::error::{GraphError, Result};
use crate::geometry::Point;
use crate::ids::{LinkId, PortId};
use crate::route::RoutedLink;
use serde::{Deserialize, Serialize};
use slint::Color;
use std::str::FromStr;

/// Stroke pattern of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// SVG `stroke-dasharray` value, if any.
    pub fn dash_array(self) -> Option<&'static str> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some("10,4"),
            LineStyle::Dotted => Some("1,4"),
        }
    }
}

impl FromStr for LineStyle {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            "dotted" => Ok(LineStyle::Dotted),
            _ => Err(GraphError::UnknownLineStyle(s.to_string())),
        }
    }
}

impl TryFrom<i32> for LineStyle {
    type Error = GraphError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(LineStyle::Solid),
            1 => Ok(LineStyle::Dashed),
            2 => Ok(LineStyle::Dotted),
            other => Err(GraphError::UnknownLineStyle(other.to_string())),
        }
    }
}

/// Shape of a link's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineType {
    /// Straight segment.
    #[default]
    Line,
    /// Horizontal S-curve.
    Curve,
    /// Axis-aligned polyline with sharp corners.
    Angular,
    /// Axis-aligned polyline with rounded corners.
    Rounded,
}

impl FromStr for LineType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "line" => Ok(LineType::Line),
            "curve" => Ok(LineType::Curve),
            "angular" => Ok(LineType::Angular),
            "rounded" => Ok(LineType::Rounded),
            _ => Err(GraphError::UnknownLineType(s.to_string())),
        }
    }
}

impl TryFrom<i32> for LineType {
    type Error = GraphError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(LineType::Line),
            1 => Ok(LineType::Curve),
            2 => Ok(LineType::Angular),
            3 => Ok(LineType::Rounded),
            other => Err(GraphError::UnknownLineType(other.to_string())),
        }
    }
}

/// Rendering options of a link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkOptions {
    pub line_style: LineStyle,
    pub line_type: LineType,
    #[serde(with = "argb")]
    pub color: Color,
    pub width: f32,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            line_style: LineStyle::Solid,
            line_type: LineType::Line,
            color: Color::from_rgb_u8(255, 255, 255),
            width: 2.0,
        }
    }
}

impl LinkOptions {
    pub fn with_line_type(mut self, line_type: LineType) -> Self {
        self.line_type = line_type;
        self
    }

    pub fn with_line_style(mut self, line_style: LineStyle) -> Self {
        self.line_style = line_style;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }
}

/// Colors are stored as a single ARGB word.
mod argb {
    use serde::{Deserialize, Deserializer, Serializer};
    use slint::Color;

    pub fn serialize<S: Serializer>(color: &Color, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(color.as_argb_encoded())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Color, D::Error> {
        u32::deserialize(d).map(Color::from_argb_encoded)
    }
}

/// Which end of a link a port is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndSlot {
    First,
    Second,
}

impl EndSlot {
    pub fn other(self) -> Self {
        match self {
            EndSlot::First => EndSlot::Second,
            EndSlot::Second => EndSlot::First,
        }
    }
}

/// The ports a link is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEnds {
    /// Freshly created, attached to nothing.
    Unbound,
    /// One end attached; the other follows the pointer or previews a hovered port.
    Pending {
        bound: PortId,
        slot: EndSlot,
        pointer: Option<Point>,
        hover: Option<PortId>,
    },
    /// Both ends attached.
    Bound { c1: PortId, c2: PortId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Unbound,
    Pending,
    Bound,
    Removed,
}

impl LinkState {
    pub fn name(self) -> &'static str {
        match self {
            LinkState::Unbound => "unbound",
            LinkState::Pending => "pending",
            LinkState::Bound => "bound",
            LinkState::Removed => "removed",
        }
    }
}

/// Persisted form of a bound link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord<P> {
    pub c1: P,
    pub c2: P,
    pub end1: Option<String>,
    pub end2: Option<String>,
    pub options: LinkOptions,
}

/// A connection between two ports, plus its last rendered route.
#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) id: LinkId,
    ends: LinkEnds,
    end1: Option<String>,
    end2: Option<String>,
    options: LinkOptions,
    pub(crate) route: Option<RoutedLink>,
}

impl Link {
    /// An unbound link; attach ends with [`start`](Self::start) or build with [`between`](Self::between).
    pub fn new(options: LinkOptions) -> Self {
        Self {
            id: LinkId(0),
            ends: LinkEnds::Unbound,
            end1: None,
            end2: None,
            options,
            route: None,
        }
    }

    /// A link from optional ends: both, one (pending), or none (unbound).
    pub fn from_ports(c1: Option<PortId>, c2: Option<PortId>, options: LinkOptions) -> Self {
        let mut link = Self::new(options);
        link.ends = match (c1, c2) {
            (Some(c1), Some(c2)) => LinkEnds::Bound { c1, c2 },
            (Some(bound), None) => LinkEnds::Pending {
                bound,
                slot: EndSlot::First,
                pointer: None,
                hover: None,
            },
            (None, Some(bound)) => LinkEnds::Pending {
                bound,
                slot: EndSlot::Second,
                pointer: None,
                hover: None,
            },
            (None, None) => LinkEnds::Unbound,
        };
        link
    }

    pub fn between(c1: PortId, c2: PortId, options: LinkOptions) -> Self {
        Self::from_ports(Some(c1), Some(c2), options)
    }

    pub fn with_ends(mut self, end1: Option<String>, end2: Option<String>) -> Self {
        self.end1 = end1;
        self.end2 = end2;
        self
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn ends(&self) -> &LinkEnds {
        &self.ends
    }

    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    pub fn end_kinds(&self) -> (Option<&str>, Option<&str>) {
        (self.end1.as_deref(), self.end2.as_deref())
    }

    pub fn route(&self) -> Option<&RoutedLink> {
        self.route.as_ref()
    }

    pub fn state(&self) -> LinkState {
        match self.ends {
            LinkEnds::Unbound => LinkState::Unbound,
            LinkEnds::Pending { .. } => LinkState::Pending,
            LinkEnds::Bound { .. } => LinkState::Bound,
        }
    }

    /// Port bound to the first end.
    pub fn c1(&self) -> Option<PortId> {
        self.slot_port(EndSlot::First)
    }

    /// Port bound to the second end.
    pub fn c2(&self) -> Option<PortId> {
        self.slot_port(EndSlot::Second)
    }

    fn slot_port(&self, wanted: EndSlot) -> Option<PortId> {
        match self.ends {
            LinkEnds::Unbound => None,
            LinkEnds::Pending { bound, slot, .. } => (slot == wanted).then_some(bound),
            LinkEnds::Bound { c1, c2 } => Some(if wanted == EndSlot::First { c1 } else { c2 }),
        }
    }

    /// Bound ports, first end first.
    pub fn ports(&self) -> impl Iterator<Item = PortId> {
        self.c1().into_iter().chain(self.c2())
    }

    pub fn touches(&self, port: PortId) -> bool {
        self.ports().any(|p| p == port)
    }

    /// Port at the other end from `port`, if bound.
    pub fn other_end(&self, port: PortId) -> Option<PortId> {
        match self.ends {
            LinkEnds::Bound { c1, c2 } if c1 == port => Some(c2),
            LinkEnds::Bound { c1, c2 } if c2 == port => Some(c1),
            _ => None,
        }
    }

    /// Hovered preview port while pending.
    pub fn hover_port(&self) -> Option<PortId> {
        match self.ends {
            LinkEnds::Pending { hover, .. } => hover,
            _ => None,
        }
    }

    pub fn pointer(&self) -> Option<Point> {
        match self.ends {
            LinkEnds::Pending { pointer, .. } => pointer,
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> GraphError {
        GraphError::InvalidTransition {
            action,
            state: self.state().name(),
        }
    }

    /// Unbound -> Pending: attach the first end to `port`.
    pub fn start(&mut self, port: PortId) -> Result<()> {
        match self.ends {
            LinkEnds::Unbound => {
                self.ends = LinkEnds::Pending {
                    bound: port,
                    slot: EndSlot::First,
                    pointer: None,
                    hover: None,
                };
                Ok(())
            }
            _ => Err(self.invalid("start")),
        }
    }

    /// Set or clear the preview port of a pending link.
    pub fn hover(&mut self, port: Option<PortId>) -> Result<()> {
        match &mut self.ends {
            LinkEnds::Pending { hover, .. } => {
                *hover = port;
                Ok(())
            }
            _ => Err(self.invalid("hover")),
        }
    }

    /// Move the free end of a pending link (canvas-local coordinates).
    pub fn track_pointer(&mut self, position: Point) -> Result<()> {
        match &mut self.ends {
            LinkEnds::Pending { pointer, .. } => {
                *pointer = Some(position);
                Ok(())
            }
            _ => Err(self.invalid("track the pointer")),
        }
    }

    /// Pending -> Bound: attach the free end to `port`.
    pub fn resolve(&mut self, port: PortId) -> Result<()> {
        match self.ends {
            LinkEnds::Pending { bound, slot, .. } => {
                self.ends = match slot {
                    EndSlot::First => LinkEnds::Bound { c1: bound, c2: port },
                    EndSlot::Second => LinkEnds::Bound { c1: port, c2: bound },
                };
                Ok(())
            }
            _ => Err(self.invalid("resolve")),
        }
    }

    /// Persisted form, available only once both ends are bound.
    pub fn to_record(&self) -> Option<LinkRecord<PortId>> {
        match self.ends {
            LinkEnds::Bound { c1, c2 } => Some(LinkRecord {
                c1,
                c2,
                end1: self.end1.clone(),
                end2: self.end2.clone(),
                options: self.options,
            }),
            _ => None,
        }
    }
}
