//! Persisted shape of a graph.
//!
//! Only the shape is defined here; picking a file format is up to the caller
//! (everything is serde-serializable). Links reference ports by position in
//! the snapshot, so ids do not need to survive a save/load cycle.

use crate::container::{AddLinkOutcome, GraphContainer};
use crate::error::{GraphError, Result};
use crate::geometry::Rect;
use crate::ids::{LinkId, NodeId, PortId};
use crate::link::LinkRecord;
use crate::node::{Item, ItemPosition, Node, NodeBehavior};
use crate::port::{Align, Edge, Port, PortOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Position of a port in a [`GraphSnapshot`]: node index, item index, port index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub node: usize,
    pub item: usize,
    pub port: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    pub edge: Edge,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub options: PortOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: ItemPosition,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub options: PortOptions,
    #[serde(default)]
    pub ports: Vec<PortRecord>,
    #[serde(default)]
    pub rect: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default = "default_collapsed_height")]
    pub collapsed_height: f32,
    /// Height to restore on expand; only meaningful for collapsed nodes.
    #[serde(default)]
    pub expanded_height: Option<f32>,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

fn default_collapsed_height() -> f32 {
    30.0
}

/// Nodes plus the bound links between their ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord<PortRef>>,
}

/// What [`GraphContainer::restore`] rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// New ids, in snapshot order.
    pub nodes: Vec<NodeId>,
    pub links: Vec<LinkId>,
    /// Links skipped because an end could not be resolved.
    pub dropped: usize,
}

impl ItemRecord {
    fn from_item(item: &Item) -> Self {
        Self {
            kind: item.kind.clone(),
            label: item.label.clone(),
            position: item.position,
            value: item.value.clone(),
            options: item.options.clone(),
            ports: item
                .ports()
                .iter()
                .map(|p| PortRecord {
                    edge: p.edge,
                    align: p.align,
                    options: p.options.clone(),
                })
                .collect(),
            rect: item.rect(),
        }
    }

    fn to_item(&self) -> Item {
        let mut item = Item::new(self.kind.clone(), self.label.clone())
            .with_position(self.position)
            .with_value(self.value.clone());
        item.options = self.options.clone();
        item.rect = self.rect;
        for record in &self.ports {
            let mut port = Port::new(record.edge).with_align(record.align);
            port.options = record.options.clone();
            item = item.with_port(port);
        }
        item
    }
}

impl NodeRecord {
    fn from_node(node: &Node) -> Self {
        let position = node.position();
        let (width, height) = node.size();
        Self {
            x: position.x,
            y: position.y,
            width,
            height,
            collapsed: node.is_collapsed(),
            collapsed_height: node.collapsed_height(),
            expanded_height: node.is_collapsed().then(|| node.expanded_height()),
            items: node.items().iter().map(ItemRecord::from_item).collect(),
        }
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(self.x, self.y, self.width, self.height)
            .with_collapsed(self.collapsed)
            .with_collapsed_height(self.collapsed_height);
        if let Some(height) = self.expanded_height {
            node = node.with_expanded_height(height);
        }
        self.items
            .iter()
            .fold(node, |node, item| node.with_item(item.to_item()))
    }
}

impl GraphContainer {
    /// Export nodes and bound links. Pending links are never persisted.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut refs: HashMap<PortId, PortRef> = HashMap::new();
        let mut nodes = Vec::new();

        for (n, node) in self.nodes().enumerate() {
            for (i, item) in node.items().iter().enumerate() {
                for (p, port) in item.ports().iter().enumerate() {
                    refs.insert(port.id(), PortRef { node: n, item: i, port: p });
                }
            }
            nodes.push(NodeRecord::from_node(node));
        }

        let links = self
            .links()
            .filter_map(|link| link.to_record())
            .filter_map(|record| {
                let (Some(&c1), Some(&c2)) = (refs.get(&record.c1), refs.get(&record.c2)) else {
                    log::warn!("link between {} and {} skipped in snapshot", record.c1, record.c2);
                    return None;
                };
                Some(LinkRecord {
                    c1,
                    c2,
                    end1: record.end1,
                    end2: record.end2,
                    options: record.options,
                })
            })
            .collect();

        GraphSnapshot { nodes, links }
    }

    /// Rebuild a snapshot into this container.
    ///
    /// Every node is registered before any link, so link ends resolve
    /// against a complete port registry. A link whose reference does not
    /// resolve is logged and skipped. Fails only for an unknown end
    /// decoration kind, after the nodes have been added.
    ///
    /// # Arguments
    /// * `snapshot` - Graph to rebuild
    /// * `behavior_for` - Supplies the behavior of each restored node
    ///
    /// # Returns
    /// New ids and the number of skipped links
    pub fn restore<F>(&mut self, snapshot: &GraphSnapshot, mut behavior_for: F) -> Result<RestoreReport>
    where
        F: FnMut(&NodeRecord) -> Box<dyn NodeBehavior>,
    {
        let mut report = RestoreReport::default();
        let mut ports: Vec<Vec<Vec<PortId>>> = Vec::with_capacity(snapshot.nodes.len());

        for record in &snapshot.nodes {
            let id = self.add_node(record.to_node(), behavior_for(record));
            let node = self.node(id).ok_or(GraphError::UnknownNode(id))?;
            ports.push(
                node.items()
                    .iter()
                    .map(|item| item.ports().iter().map(Port::id).collect())
                    .collect(),
            );
            report.nodes.push(id);
        }

        let resolve = |r: PortRef| ports.get(r.node)?.get(r.item)?.get(r.port).copied();
        for record in &snapshot.links {
            let (Some(c1), Some(c2)) = (resolve(record.c1), resolve(record.c2)) else {
                log::error!("missing node for connection {:?} -> {:?}", record.c1, record.c2);
                report.dropped += 1;
                continue;
            };
            let outcome = self.create_link(
                Some(c1),
                Some(c2),
                record.end1.as_deref(),
                record.end2.as_deref(),
                Some(record.options),
            )?;
            match outcome {
                AddLinkOutcome::Added(id) => report.links.push(id),
                _ => report.dropped += 1,
            }
        }

        log::debug!(
            "restored {} nodes, {} links ({} dropped)",
            report.nodes.len(),
            report.links.len(),
            report.dropped
        );
        Ok(report)
    }
}
