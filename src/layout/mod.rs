//! Sankey layout engine.
//!
//! [`compute_layout`] runs five passes in order: link indexing, value
//! aggregation, breadth assignment, depth relaxation and link depth
//! splitting. The result is a standalone [`SankeyLayout`]; the input
//! [`Graph`] is never modified.
//!
//! Breadth assignment requires an acyclic graph. Cycles are detected up front
//! and reported as [`GraphDefect::Cycle`].

mod breadth;
mod depth;
mod error;
mod link_depth;
mod links;
mod path;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::ir::{Graph, NodeId};

pub use error::{GraphDefect, LayoutError};
pub use path::LinkPath;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLayout {
    pub id: NodeId,
    pub label: String,
    /// Larger of the incoming and outgoing flow totals.
    pub value: f64,
    /// Column index.
    pub breadth: usize,
    /// Left edge, derived from `breadth`.
    pub x: f64,
    /// Column width.
    pub extent: f64,
    /// Top edge.
    pub depth: f64,
    /// Height, `value * vertical_scale`.
    pub span: f64,
    /// Indices into [`SankeyLayout::links`] where this node is the source,
    /// ordered by target depth after layout.
    pub outgoing: Vec<usize>,
    /// Indices into [`SankeyLayout::links`] where this node is the target,
    /// ordered by source depth after layout.
    pub incoming: Vec<usize>,
}

impl NodeLayout {
    pub fn center(&self) -> f64 {
        self.depth + self.span / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.depth + self.span
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkLayout {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub span: f64,
    /// Top of this link's band inside the source node, relative to its depth.
    pub source_offset: f64,
    /// Top of this link's band inside the target node, relative to its depth.
    pub target_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLayout {
    pub width: f64,
    pub height: f64,
    pub node_width: f64,
    pub node_padding: f64,
    pub vertical_scale: f64,
    /// Number of distinct breadth columns.
    pub columns: usize,
    /// Positions, among the ascending columns, of columns whose total value
    /// is zero. These are left out of `vertical_scale`.
    pub degenerate_columns: Vec<usize>,
    pub nodes: Vec<NodeLayout>,
    pub links: Vec<LinkLayout>,
}

impl SankeyLayout {
    /// Recomputes link offsets from the current node depths. Breadths, spans
    /// and depths are left alone.
    pub fn relayout(&mut self) {
        link_depth::compute_link_depths(self);
    }

    /// Moves a node vertically, clamped to the canvas, then refreshes link
    /// offsets.
    pub fn reposition_node(&mut self, index: usize, depth: f64) -> Result<(), LayoutError> {
        let height = self.height;
        let node = self
            .nodes
            .get_mut(index)
            .ok_or(GraphDefect::NoSuchNode(index))?;
        node.depth = depth.min(height - node.span).max(0.0);
        self.relayout();
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }

    /// Curve for one link, see [`LinkPath`].
    pub fn link_path(&self, link: usize, curvature: f64) -> Option<LinkPath> {
        let link = self.links.get(link)?;
        Some(LinkPath::new(
            &self.nodes[link.source],
            &self.nodes[link.target],
            link,
            curvature,
        ))
    }

    /// Node indices grouped by breadth, columns in ascending order.
    pub fn columns(&self) -> Vec<Vec<usize>> {
        depth::nodes_by_breadth(&self.nodes)
    }
}

/// Lays out `graph` on a `config.width` by `config.height` canvas.
///
/// Fails when a link points at a missing node, a node id repeats, the flows
/// contain a cycle, or the canvas cannot hold the nodes and their padding.
pub fn compute_layout(graph: &Graph, config: &LayoutConfig) -> Result<SankeyLayout, LayoutError> {
    validate_config(config)?;
    let mut layout = links::index_links(graph, config)?;
    links::compute_node_values(&mut layout);
    breadth::ensure_acyclic(&layout)?;
    breadth::compute_node_breadths(&mut layout, config);
    depth::compute_node_depths(&mut layout, config.iterations)?;
    link_depth::compute_link_depths(&mut layout);
    tracing::debug!(
        nodes = layout.nodes.len(),
        links = layout.links.len(),
        columns = layout.columns,
        scale = layout.vertical_scale,
        "sankey layout complete"
    );
    Ok(layout)
}

fn validate_config(config: &LayoutConfig) -> Result<(), LayoutError> {
    let dims = [
        ("width", config.width),
        ("height", config.height),
        ("nodeWidth", config.node_width),
        ("nodePadding", config.node_padding),
    ];
    for (name, value) in dims {
        if !(value.is_finite() && value >= 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "{name} must be a finite non-negative number, got {value}"
            )));
        }
    }
    if config.width < config.node_width {
        return Err(LayoutError::InvalidConfig(format!(
            "width {} is narrower than nodeWidth {}",
            config.width, config.node_width
        )));
    }
    Ok(())
}
