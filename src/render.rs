//! Draw instructions for links, and syncing them into a Slint model.

use crate::geometry::Rect;
use crate::ids::LinkId;
use crate::link::{Link, LinkState};
use crate::route::GlyphPlacement;
use slint::{Color, Model, VecModel};
use std::rc::Rc;

/// Everything a UI needs to draw one link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPath {
    pub id: LinkId,
    /// SVG path commands relative to `bounds.x`/`bounds.y`.
    pub commands: String,
    /// Canvas-local box of the link element.
    pub bounds: Rect,
    pub color: Color,
    pub width: f32,
    /// `stroke-dasharray` for dashed and dotted lines.
    pub dash_array: Option<&'static str>,
    pub glyphs: Vec<GlyphPlacement>,
    /// Drawn above everything else while being dragged.
    pub pending: bool,
}

impl LinkPath {
    /// Draw instructions from a link's last successful route, if it has one.
    pub fn from_link(link: &Link) -> Option<Self> {
        let route = link.route()?;
        let options = link.options();
        Some(Self {
            id: link.id(),
            commands: route.commands.clone(),
            bounds: route.bounds,
            color: options.color,
            width: options.width,
            dash_array: options.line_style.dash_array(),
            glyphs: route.glyphs.clone(),
            pending: link.state() == LinkState::Pending,
        })
    }
}

/// Internal trait for auto-syncing to Slint models.
pub(crate) trait ModelSyncer {
    fn sync(&self, paths: &[LinkPath]);
}

/// Concrete implementation of ModelSyncer for a specific row type.
pub(crate) struct ConcreteModelSyncer<P, F> {
    pub(crate) model: Rc<VecModel<P>>,
    pub(crate) constructor: F,
}

impl<P, F> ModelSyncer for ConcreteModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(&LinkPath) -> P,
{
    fn sync(&self, paths: &[LinkPath]) {
        // Update existing rows or add new ones
        for (i, path) in paths.iter().enumerate() {
            let item = (self.constructor)(path);
            if i < self.model.row_count() {
                self.model.set_row_data(i, item);
            } else {
                self.model.push(item);
            }
        }
        // Remove excess rows
        while self.model.row_count() > paths.len() {
            self.model.remove(self.model.row_count() - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::ids::PortId;
    use crate::link::{LineStyle, LinkOptions};
    use crate::route::RoutedLink;

    fn routed_link(options: LinkOptions) -> Link {
        let mut link = Link::between(PortId(1), PortId(2), options);
        link.id = LinkId(7);
        link.route = Some(RoutedLink {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            commands: "M 10 10 L 20 10".into(),
            bounds: Rect::new(-10.0, -10.0, 30.0, 20.0),
            glyphs: Vec::new(),
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
        });
        link
    }

    #[test]
    fn test_unrouted_link_has_no_path() {
        let link = Link::between(PortId(1), PortId(2), LinkOptions::default());
        assert!(LinkPath::from_link(&link).is_none());
    }

    #[test]
    fn test_path_carries_style() {
        let link = routed_link(LinkOptions::default().with_line_style(LineStyle::Dashed).with_width(3.0));
        let path = LinkPath::from_link(&link).unwrap();
        assert_eq!(path.id, LinkId(7));
        assert_eq!(path.commands, "M 10 10 L 20 10");
        assert_eq!(path.dash_array, Some("10,4"));
        assert_eq!(path.width, 3.0);
        assert!(!path.pending);
    }

    #[test]
    fn test_syncer_grows_and_shrinks_model() {
        let model = Rc::new(VecModel::<i32>::default());
        let syncer = ConcreteModelSyncer {
            model: model.clone(),
            constructor: |p: &LinkPath| p.id.0 as i32,
        };
        let path = LinkPath::from_link(&routed_link(LinkOptions::default())).unwrap();
        let mut second = path.clone();
        second.id = LinkId(9);

        syncer.sync(&[path.clone(), second]);
        assert_eq!(model.row_count(), 2);
        assert_eq!(model.row_data(1), Some(9));

        syncer.sync(&[path]);
        assert_eq!(model.row_count(), 1);
        assert_eq!(model.row_data(0), Some(7));
    }
}
