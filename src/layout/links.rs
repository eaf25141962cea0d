use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::ir::{Graph, LinkEndpoint, NodeId};

use super::{GraphDefect, LayoutError, LinkLayout, NodeLayout, SankeyLayout};

/// Resolves every link endpoint to a node index and fills each node's
/// outgoing and incoming link lists in input link order. Parallel links stay
/// separate entries.
pub(super) fn index_links(
    graph: &Graph,
    config: &LayoutConfig,
) -> Result<SankeyLayout, LayoutError> {
    let mut id_to_idx: HashMap<&NodeId, usize> = HashMap::with_capacity(graph.nodes.len());
    for (idx, node) in graph.nodes.iter().enumerate() {
        if id_to_idx.insert(&node.id, idx).is_some() {
            return Err(GraphDefect::DuplicateNode(node.id.to_string()).into());
        }
    }

    let mut nodes: Vec<NodeLayout> = graph
        .nodes
        .iter()
        .map(|node| NodeLayout {
            id: node.id.clone(),
            label: node.label.clone(),
            value: 0.0,
            breadth: 0,
            x: 0.0,
            extent: config.node_width,
            depth: 0.0,
            span: 0.0,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        })
        .collect();

    let resolve = |link_idx: usize, endpoint: &LinkEndpoint| -> Result<usize, GraphDefect> {
        match endpoint {
            LinkEndpoint::ByIndex(index) if *index < nodes.len() => Ok(*index),
            LinkEndpoint::ByIndex(index) => Err(GraphDefect::UnknownIndex {
                link: link_idx,
                index: *index,
                count: nodes.len(),
            }),
            LinkEndpoint::ByReference(id) => {
                id_to_idx
                    .get(id)
                    .copied()
                    .ok_or_else(|| GraphDefect::UnknownNode {
                        link: link_idx,
                        id: id.to_string(),
                    })
            }
        }
    };

    let mut links = Vec::with_capacity(graph.links.len());
    for (link_idx, link) in graph.links.iter().enumerate() {
        let source = resolve(link_idx, &link.source)?;
        let target = resolve(link_idx, &link.target)?;
        if !(link.value.is_finite() && link.value > 0.0) {
            return Err(LayoutError::NonPositiveValue {
                from: nodes[source].id.to_string(),
                to: nodes[target].id.to_string(),
                value: link.value,
            });
        }
        links.push(LinkLayout {
            source,
            target,
            value: link.value,
            span: 0.0,
            source_offset: 0.0,
            target_offset: 0.0,
        });
    }
    for (link_idx, link) in links.iter().enumerate() {
        nodes[link.source].outgoing.push(link_idx);
        nodes[link.target].incoming.push(link_idx);
    }

    tracing::debug!(nodes = nodes.len(), links = links.len(), "indexed links");
    Ok(SankeyLayout {
        width: config.width,
        height: config.height,
        node_width: config.node_width,
        node_padding: config.node_padding,
        vertical_scale: 0.0,
        columns: 0,
        degenerate_columns: Vec::new(),
        nodes,
        links,
    })
}

/// A node is as tall as the larger of its inflow and outflow.
pub(super) fn compute_node_values(layout: &mut SankeyLayout) {
    let links = &layout.links;
    for node in &mut layout.nodes {
        let out_total: f64 = node.outgoing.iter().map(|&l| links[l].value).sum();
        let in_total: f64 = node.incoming.iter().map(|&l| links[l].value).sum();
        node.value = out_total.max(in_total);
    }
}
