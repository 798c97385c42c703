use crate::link::LinkOptions;
use serde::{Deserialize, Serialize};

/// Tunables shared by placement, routing and hit testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Edge length of a port marker, in local pixels.
    pub port_size: f32,
    /// Spacing of the collision grid.
    pub grid_step: f32,
    /// Smallest shift applied when a bend line collides.
    pub collision_step: f32,
    /// Largest shift applied when a bend line collides.
    pub max_collision_shift: f32,
    /// Radius of rounded polyline corners.
    pub corner_radius: f32,
    /// Minimum padding around a rendered link.
    pub min_padding: f32,
    /// Pointer distance (screen pixels) within which a port counts as hit.
    pub hit_radius: f32,
    /// Options merged into links that do not bring their own.
    pub default_link: LinkOptions,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            port_size: 10.0,
            grid_step: 10.0,
            collision_step: 11.0,
            max_collision_shift: 20.0,
            corner_radius: 10.0,
            min_padding: 10.0,
            hit_radius: 8.0,
            default_link: LinkOptions::default(),
        }
    }
}
