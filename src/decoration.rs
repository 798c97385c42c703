//! End decorations (arrow heads and friends) drawn where a link meets a port.

use crate::error::{GraphError, Result};
use std::collections::BTreeMap;

/// A pre-measured end glyph.
///
/// `commands` is an SVG path drawn pointing along +x, with its origin at the
/// glyph's left edge, vertically centered. `width` is how far the line is
/// pulled back from the port so it meets the glyph's base.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub width: f32,
    pub height: f32,
    pub commands: String,
    pub filled: bool,
}

impl Glyph {
    pub fn new(width: f32, height: f32, commands: impl Into<String>) -> Self {
        Self {
            width,
            height,
            commands: commands.into(),
            filled: true,
        }
    }

    pub fn outlined(mut self) -> Self {
        self.filled = false;
        self
    }
}

/// Registry of end decoration kinds by name.
#[derive(Debug, Clone)]
pub struct EndKinds {
    kinds: BTreeMap<String, Glyph>,
}

impl Default for EndKinds {
    fn default() -> Self {
        let mut kinds = Self::empty();
        kinds.register("arrow", Glyph::new(10.0, 10.0, "M 0 -5 L 10 0 L 0 5 Z"));
        kinds.register("open-arrow", Glyph::new(10.0, 10.0, "M 0 -5 L 10 0 L 0 5").outlined());
        kinds.register(
            "circle",
            Glyph::new(8.0, 8.0, "M 0 0 A 4 4 0 1 0 8 0 A 4 4 0 1 0 0 0 Z"),
        );
        kinds.register("diamond", Glyph::new(12.0, 8.0, "M 0 0 L 6 -4 L 12 0 L 6 4 Z"));
        kinds.register("bar", Glyph::new(2.0, 12.0, "M 0 -6 L 2 -6 L 2 6 L 0 6 Z"));
        kinds
    }
}

impl EndKinds {
    /// Registry with the built-in kinds: `arrow`, `open-arrow`, `circle`, `diamond`, `bar`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self { kinds: BTreeMap::new() }
    }

    /// Add or replace a kind.
    pub fn register(&mut self, name: impl Into<String>, glyph: Glyph) {
        self.kinds.insert(name.into(), glyph);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Glyph> {
        self.kinds
            .get(name)
            .ok_or_else(|| GraphError::UnknownEndKind(name.to_string()))
    }

    /// Resolve an optional kind; `None` means no decoration.
    pub fn resolve(&self, name: Option<&str>) -> Result<Option<&Glyph>> {
        name.map(|n| self.get(n)).transpose()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}
