use crate::geometry::{Point, Rect};
use crate::ids::{NodeId, PortId};
use std::collections::HashMap;

/// Screen-space port marker box as last reported by the UI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportedAnchor {
    pub node: NodeId,
    pub rect: Rect,
}

/// Helper struct holding the port anchor boxes reported by the UI
///
/// Reports go stale as soon as their node's layout changes; the container
/// forgets them at that point and falls back to geometry computed from the
/// model until the UI reports again.
#[derive(Debug, Default)]
pub struct AnchorCache {
    reported: HashMap<PortId, ReportedAnchor>,
}

impl AnchorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a port's on-screen marker box (called from the UI after layout)
    pub fn handle_port_report(&mut self, port: PortId, node: NodeId, rect: Rect) {
        self.reported.insert(port, ReportedAnchor { node, rect });
    }

    pub fn get(&self, port: PortId) -> Option<Rect> {
        self.reported.get(&port).map(|a| a.rect)
    }

    pub fn forget_port(&mut self, port: PortId) {
        self.reported.remove(&port);
    }

    /// Drop every report belonging to `node`
    pub fn forget_node(&mut self, node: NodeId) {
        self.reported.retain(|_, a| a.node != node);
    }

    pub fn clear(&mut self) {
        self.reported.clear();
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }
}

/// Find the port whose marker is under `point`
///
/// A marker counts as hit when the point lies inside its box or within
/// `hit_radius` of its center. The closest center wins; ties go to the lower id.
pub fn find_port_at<I>(point: Point, anchors: I, hit_radius: f32) -> Option<PortId>
where
    I: IntoIterator<Item = (PortId, Rect)>,
{
    let hit_radius_sq = hit_radius * hit_radius;
    let mut best: Option<(f32, PortId)> = None;

    for (port, rect) in anchors {
        let center = rect.center();
        let dx = point.x - center.x;
        let dy = point.y - center.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > hit_radius_sq && !rect.contains(point) {
            continue;
        }
        let closer = match best {
            None => true,
            Some((d, id)) => dist_sq < d || (dist_sq == d && port < id),
        };
        if closer {
            best = Some((dist_sq, port));
        }
    }

    best.map(|(_, port)| port)
}
