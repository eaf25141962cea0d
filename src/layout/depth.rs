use std::collections::BTreeMap;

use super::{LayoutError, NodeLayout, SankeyLayout};

const ALPHA_DECAY: f64 = 0.99;

pub(super) fn nodes_by_breadth(nodes: &[NodeLayout]) -> Vec<Vec<usize>> {
    let mut columns: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        columns.entry(node.breadth).or_default().push(idx);
    }
    columns.into_values().collect()
}

/// Positions nodes vertically: stack each column, then alternately pull nodes
/// toward the weighted centers of their neighbours while keeping columns free
/// of overlap.
pub(super) fn compute_node_depths(
    layout: &mut SankeyLayout,
    iterations: usize,
) -> Result<(), LayoutError> {
    let mut columns = nodes_by_breadth(&layout.nodes);

    initialize_node_depths(layout, &columns)?;
    resolve_collisions(layout, &mut columns);
    let mut alpha = 1.0;
    for _ in 0..iterations {
        alpha *= ALPHA_DECAY;
        relax_right_to_left(layout, &columns, alpha);
        resolve_collisions(layout, &mut columns);
        relax_left_to_right(layout, &columns, alpha);
        resolve_collisions(layout, &mut columns);
    }
    tracing::debug!(iterations, alpha, "relaxed node depths");
    Ok(())
}

fn initialize_node_depths(
    layout: &mut SankeyLayout,
    columns: &[Vec<usize>],
) -> Result<(), LayoutError> {
    let mut scale = f64::INFINITY;
    let mut degenerate = Vec::new();
    for (breadth, column) in columns.iter().enumerate() {
        let available = layout.height - (column.len() - 1) as f64 * layout.node_padding;
        if available < 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "{} nodes with padding {} do not fit in height {}",
                column.len(),
                layout.node_padding,
                layout.height
            )));
        }
        let total: f64 = column.iter().map(|&idx| layout.nodes[idx].value).sum();
        if total <= 0.0 {
            degenerate.push(breadth);
            continue;
        }
        scale = scale.min(available / total);
    }
    if !degenerate.is_empty() {
        tracing::warn!(columns = ?degenerate, "skipping zero-value columns in vertical scale");
    }
    if !scale.is_finite() {
        scale = 0.0;
    }

    for column in columns {
        for (i, &idx) in column.iter().enumerate() {
            let node = &mut layout.nodes[idx];
            node.depth = i as f64;
            node.span = node.value * scale;
        }
    }
    for link in &mut layout.links {
        link.span = link.value * scale;
    }
    layout.vertical_scale = scale;
    layout.columns = columns.len();
    layout.degenerate_columns = degenerate;
    Ok(())
}

/// Pulls each node with outgoing links toward the value-weighted center of its
/// targets, walking columns from right to left.
fn relax_right_to_left(layout: &mut SankeyLayout, columns: &[Vec<usize>], alpha: f64) {
    for column in columns.iter().rev() {
        for &idx in column {
            let node = &layout.nodes[idx];
            if node.outgoing.is_empty() {
                continue;
            }
            let (weighted, total) = node.outgoing.iter().fold((0.0, 0.0), |(w, t), &l| {
                let link = &layout.links[l];
                (w + layout.nodes[link.target].center() * link.value, t + link.value)
            });
            let shift = (weighted / total - node.center()) * alpha;
            layout.nodes[idx].depth += shift;
        }
    }
}

/// Pulls each node with incoming links toward the value-weighted center of its
/// sources, walking columns from left to right.
fn relax_left_to_right(layout: &mut SankeyLayout, columns: &[Vec<usize>], alpha: f64) {
    for column in columns {
        for &idx in column {
            let node = &layout.nodes[idx];
            if node.incoming.is_empty() {
                continue;
            }
            let (weighted, total) = node.incoming.iter().fold((0.0, 0.0), |(w, t), &l| {
                let link = &layout.links[l];
                (w + layout.nodes[link.source].center() * link.value, t + link.value)
            });
            let shift = (weighted / total - node.center()) * alpha;
            layout.nodes[idx].depth += shift;
        }
    }
}

fn resolve_collisions(layout: &mut SankeyLayout, columns: &mut [Vec<usize>]) {
    let padding = layout.node_padding;
    let height = layout.height;
    let nodes = &mut layout.nodes;
    for column in columns.iter_mut() {
        column.sort_by(|a, b| nodes[*a].depth.total_cmp(&nodes[*b].depth));

        // Push overlapping nodes down.
        let mut y0 = 0.0;
        for &idx in column.iter() {
            let node = &mut nodes[idx];
            let dy = y0 - node.depth;
            if dy > 0.0 {
                node.depth += dy;
            }
            y0 = node.depth + node.span + padding;
        }

        // If the bottom node left the canvas, push it and its neighbours back up.
        let Some(&last) = column.last() else {
            continue;
        };
        let dy = y0 - padding - height;
        if dy > 0.0 {
            nodes[last].depth -= dy;
            let mut y0 = nodes[last].depth;
            for &idx in column.iter().rev().skip(1) {
                let node = &mut nodes[idx];
                let dy = node.depth + node.span + padding - y0;
                if dy > 0.0 {
                    node.depth -= dy;
                }
                y0 = node.depth;
            }
        }
    }
}
