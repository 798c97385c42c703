//! Grid reservations that keep the middle segments of Z-shaped links apart.
//!
//! Each reservation is keyed by the bend position rounded up to the next grid
//! line. A link holds at most one key per axis; it must release it before
//! reserving again, or stale keys push unrelated links aside.

use crate::ids::LinkId;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy)]
struct Claim {
    link: LinkId,
    /// Start coordinate on the other axis.
    start: f32,
    /// Signed span on the other axis.
    delta: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, Default)]
struct Held {
    vertical: Option<i64>,
    horizontal: Option<i64>,
}

/// Shifts tried before a line is left unreserved.
const MAX_SHIFTS: usize = 1024;

/// Lines one link held, for putting back after an aborted re-route.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HeldLines {
    vertical: Option<(i64, Claim)>,
    horizontal: Option<(i64, Claim)>,
}

/// Per-canvas registry of occupied bend lines.
#[derive(Debug, Clone)]
pub struct LineReservations {
    grid: f32,
    min_step: f32,
    max_step: f32,
    vertical: BTreeMap<i64, Claim>,
    horizontal: BTreeMap<i64, Claim>,
    held: HashMap<LinkId, Held>,
}

impl Default for LineReservations {
    fn default() -> Self {
        Self::new(10.0, 11.0, 20.0)
    }
}

impl LineReservations {
    /// `min_step` must exceed `grid` so every shift lands on a new grid line.
    pub fn new(grid: f32, min_step: f32, max_step: f32) -> Self {
        let grid = if grid > 0.0 { grid } else { 10.0 };
        let min_step = min_step.max(grid + 1.0);
        Self {
            grid,
            min_step,
            max_step: max_step.max(min_step),
            vertical: BTreeMap::new(),
            horizontal: BTreeMap::new(),
            held: HashMap::new(),
        }
    }

    /// Grid line a position belongs to: `ceil(pos / grid) * grid`.
    pub fn grid_key(&self, pos: f32) -> i64 {
        ((pos / self.grid).ceil() * self.grid) as i64
    }

    /// Reserve a vertical bend line at `x` for `link`, shifting it until free.
    ///
    /// `y_start`/`y_delta` describe the link's vertical extent and steer the
    /// shift direction for later colliders. Returns the (possibly shifted) x.
    pub fn reserve_vertical(&mut self, link: LinkId, x: f32, y_start: f32, y_delta: f32) -> f32 {
        self.reserve(Axis::Vertical, link, x, y_start, y_delta)
    }

    /// Horizontal counterpart of [`reserve_vertical`](Self::reserve_vertical).
    pub fn reserve_horizontal(&mut self, link: LinkId, y: f32, x_start: f32, x_delta: f32) -> f32 {
        self.reserve(Axis::Horizontal, link, y, x_start, x_delta)
    }

    fn reserve(&mut self, axis: Axis, link: LinkId, mut pos: f32, start: f32, delta: f32) -> f32 {
        self.release_axis(axis, link);

        let (min_step, max_step) = (self.min_step, self.max_step);
        let mut key = self.grid_key(pos);
        let mut direction = None;
        let mut shifts = 0;
        loop {
            let lines = match axis {
                Axis::Vertical => &self.vertical,
                Axis::Horizontal => &self.horizontal,
            };
            let Some(other) = lines.get(&key) else {
                break;
            };
            let step = *direction.get_or_insert_with(|| {
                let distance = (other.start - start).abs().clamp(min_step, max_step);
                if other.delta > 0.0 {
                    -distance
                } else {
                    distance
                }
            });
            log::trace!("link {} collides with {} at {}, shifting by {}", link, other.link, key, step);
            let next = pos + step;
            shifts += 1;
            if next == pos || shifts > MAX_SHIFTS {
                log::warn!("link {}: no free bend line near {}, leaving it unreserved", link, key);
                return pos;
            }
            pos = next;
            key = self.grid_key(pos);
        }

        let claim = Claim { link, start, delta };
        let held = self.held.entry(link).or_default();
        match axis {
            Axis::Vertical => {
                self.vertical.insert(key, claim);
                held.vertical = Some(key);
            }
            Axis::Horizontal => {
                self.horizontal.insert(key, claim);
                held.horizontal = Some(key);
            }
        }
        pos
    }

    fn release_axis(&mut self, axis: Axis, link: LinkId) {
        let Some(held) = self.held.get_mut(&link) else {
            return;
        };
        let (slot, lines) = match axis {
            Axis::Vertical => (&mut held.vertical, &mut self.vertical),
            Axis::Horizontal => (&mut held.horizontal, &mut self.horizontal),
        };
        if let Some(key) = slot.take() {
            if lines.get(&key).is_some_and(|c| c.link == link) {
                lines.remove(&key);
            }
        }
    }

    /// Drop every reservation held by `link`.
    pub fn release(&mut self, link: LinkId) {
        self.release_axis(Axis::Vertical, link);
        self.release_axis(Axis::Horizontal, link);
        self.held.remove(&link);
    }

    pub(crate) fn held_lines(&self, link: LinkId) -> HeldLines {
        let held = self.held.get(&link).copied().unwrap_or_default();
        let owned = |key: Option<i64>, lines: &BTreeMap<i64, Claim>| {
            key.and_then(|k| lines.get(&k).filter(|c| c.link == link).map(|c| (k, *c)))
        };
        HeldLines {
            vertical: owned(held.vertical, &self.vertical),
            horizontal: owned(held.horizontal, &self.horizontal),
        }
    }

    /// Drop whatever `link` holds now and put `lines` back where still free.
    pub(crate) fn reinstate(&mut self, link: LinkId, lines: HeldLines) {
        self.release(link);
        if let Some((key, claim)) = lines.vertical {
            if !self.vertical.contains_key(&key) {
                self.vertical.insert(key, claim);
                self.held.entry(link).or_default().vertical = Some(key);
            }
        }
        if let Some((key, claim)) = lines.horizontal {
            if !self.horizontal.contains_key(&key) {
                self.horizontal.insert(key, claim);
                self.held.entry(link).or_default().horizontal = Some(key);
            }
        }
    }

    pub fn vertical_key(&self, link: LinkId) -> Option<i64> {
        self.held.get(&link).and_then(|h| h.vertical)
    }

    pub fn horizontal_key(&self, link: LinkId) -> Option<i64> {
        self.held.get(&link).and_then(|h| h.horizontal)
    }

    pub fn vertical_owner(&self, key: i64) -> Option<LinkId> {
        self.vertical.get(&key).map(|c| c.link)
    }

    pub fn horizontal_owner(&self, key: i64) -> Option<LinkId> {
        self.horizontal.get(&key).map(|c| c.link)
    }

    /// Total number of reserved lines on both axes.
    pub fn len(&self) -> usize {
        self.vertical.len() + self.horizontal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
