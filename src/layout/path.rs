use serde::Serialize;

use super::{LinkLayout, NodeLayout};

/// Cubic curve from the source's right edge to the target's left edge, with
/// both control points at the vertical level of their own end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkPath {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// x of the control point next to the source.
    pub cx0: f64,
    /// x of the control point next to the target.
    pub cx1: f64,
    pub thickness: f64,
}

impl LinkPath {
    pub(super) fn new(
        source: &NodeLayout,
        target: &NodeLayout,
        link: &LinkLayout,
        curvature: f64,
    ) -> Self {
        let x0 = source.x + source.extent;
        let x1 = target.x;
        let lerp = |t: f64| x0 + (x1 - x0) * t;
        Self {
            x0,
            y0: source.depth + link.source_offset + link.span / 2.0,
            x1,
            y1: target.depth + link.target_offset + link.span / 2.0,
            cx0: lerp(curvature),
            cx1: lerp(1.0 - curvature),
            thickness: link.span,
        }
    }

    pub fn to_svg_path(&self) -> String {
        format!(
            "M{:.2},{:.2}C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
            self.x0, self.y0, self.cx0, self.y0, self.cx1, self.y1, self.x1, self.y1
        )
    }
}
