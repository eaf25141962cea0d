use std::collections::VecDeque;

use crate::config::{LayoutConfig, SinkPolicy, SourcePolicy};

use super::{GraphDefect, LayoutError, SankeyLayout};

/// Kahn's algorithm over the indexed links. Any node left with unresolved
/// incoming links sits on (or behind) a cycle.
pub(super) fn ensure_acyclic(layout: &SankeyLayout) -> Result<(), LayoutError> {
    let node_count = layout.nodes.len();
    let mut indegree: Vec<usize> = layout.nodes.iter().map(|n| n.incoming.len()).collect();
    let mut queue: VecDeque<usize> = indegree
        .iter()
        .enumerate()
        .filter_map(|(idx, deg)| (*deg == 0).then_some(idx))
        .collect();
    let mut visited = 0usize;
    while let Some(node_idx) = queue.pop_front() {
        visited += 1;
        for &link_idx in &layout.nodes[node_idx].outgoing {
            let to_idx = layout.links[link_idx].target;
            indegree[to_idx] -= 1;
            if indegree[to_idx] == 0 {
                queue.push_back(to_idx);
            }
        }
    }
    if visited == node_count {
        return Ok(());
    }
    let stuck = indegree
        .iter()
        .position(|deg| *deg > 0)
        .unwrap_or_default();
    Err(GraphDefect::Cycle(layout.nodes[stuck].id.to_string()).into())
}

/// Assigns columns by propagating from every node along outgoing links.
///
/// Each level overwrites the breadth of the nodes it reaches, so a node fed by
/// paths of different lengths ends up at the level of the last frontier that
/// contained it. The frontier is deduplicated per level; the set of nodes at
/// each level is the same either way.
pub(super) fn compute_node_breadths(layout: &mut SankeyLayout, config: &LayoutConfig) {
    let node_count = layout.nodes.len();
    let mut frontier: Vec<usize> = (0..node_count).collect();
    let mut in_next = vec![false; node_count];
    let mut levels = 0usize;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &node_idx in &frontier {
            let node = &mut layout.nodes[node_idx];
            node.breadth = levels;
            node.extent = config.node_width;
            for &link_idx in &node.outgoing {
                let target = layout.links[link_idx].target;
                if !in_next[target] {
                    in_next[target] = true;
                    next.push(target);
                }
            }
        }
        for &node_idx in &next {
            in_next[node_idx] = false;
        }
        frontier = next;
        levels += 1;
    }

    if config.source_policy == SourcePolicy::TowardTargets {
        move_sources_right(layout);
    }
    if config.sink_policy == SinkPolicy::Rightmost {
        move_sinks_right(layout, levels);
    }

    let columns = distinct_breadths(layout);
    layout.columns = columns;
    let max_breadth = layout.nodes.iter().map(|n| n.breadth).max().unwrap_or(0);
    let kx = if max_breadth > 0 {
        (config.width - config.node_width) / max_breadth as f64
    } else {
        0.0
    };
    scale_node_breadths(layout, kx);
    tracing::debug!(levels, columns, kx, "assigned node breadths");
}

fn move_sources_right(layout: &mut SankeyLayout) {
    for node_idx in 0..layout.nodes.len() {
        let node = &layout.nodes[node_idx];
        if !node.incoming.is_empty() {
            continue;
        }
        let nearest = node
            .outgoing
            .iter()
            .map(|&link_idx| layout.nodes[layout.links[link_idx].target].breadth)
            .min();
        if let Some(nearest) = nearest {
            layout.nodes[node_idx].breadth = nearest.saturating_sub(1);
        }
    }
}

fn move_sinks_right(layout: &mut SankeyLayout, levels: usize) {
    let last = levels.saturating_sub(1);
    for node in &mut layout.nodes {
        if node.outgoing.is_empty() {
            node.breadth = last;
        }
    }
}

fn scale_node_breadths(layout: &mut SankeyLayout, kx: f64) {
    for node in &mut layout.nodes {
        node.x = node.breadth as f64 * kx;
    }
}

fn distinct_breadths(layout: &SankeyLayout) -> usize {
    let mut breadths: Vec<usize> = layout.nodes.iter().map(|n| n.breadth).collect();
    breadths.sort_unstable();
    breadths.dedup();
    breadths.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FlowRecord, Graph};
    use crate::layout::links::{compute_node_values, index_links};

    fn prepare(records: &[(&str, &str)], config: &LayoutConfig) -> SankeyLayout {
        let records: Vec<FlowRecord> = records
            .iter()
            .map(|(s, t)| FlowRecord::new(*s, *t, 1.0))
            .collect();
        let graph = Graph::from_flows(&records).unwrap();
        let mut layout = index_links(&graph, config).unwrap();
        compute_node_values(&mut layout);
        layout
    }

    fn breadth_of(layout: &SankeyLayout, id: &str) -> usize {
        layout.node(id).unwrap().breadth
    }

    #[test]
    fn chain_places_nodes_by_length() {
        let config = LayoutConfig {
            width: 324.0,
            ..LayoutConfig::default()
        };
        let mut layout = prepare(&[("A", "B"), ("B", "C"), ("C", "D")], &config);
        ensure_acyclic(&layout).unwrap();
        compute_node_breadths(&mut layout, &config);
        assert_eq!(breadth_of(&layout, "A"), 0);
        assert_eq!(breadth_of(&layout, "B"), 1);
        assert_eq!(breadth_of(&layout, "C"), 2);
        assert_eq!(breadth_of(&layout, "D"), 3);
        assert_eq!(layout.columns, 4);
        assert_eq!(layout.node("D").unwrap().x, 300.0);
        assert_eq!(layout.node("B").unwrap().x, 100.0);
    }

    #[test]
    fn longer_path_overwrites_shorter_one() {
        let config = LayoutConfig::default();
        let mut layout = prepare(
            &[("A", "M"), ("A", "B"), ("B", "C"), ("C", "M"), ("M", "Z")],
            &config,
        );
        compute_node_breadths(&mut layout, &config);
        assert_eq!(breadth_of(&layout, "M"), 3);
        assert_eq!(breadth_of(&layout, "Z"), 4);
    }

    #[test]
    fn sinks_move_to_last_column() {
        let config = LayoutConfig::default();
        let mut layout = prepare(&[("A", "B"), ("B", "C"), ("A", "S")], &config);
        compute_node_breadths(&mut layout, &config);
        assert_eq!(breadth_of(&layout, "S"), 2);
        assert_eq!(breadth_of(&layout, "C"), 2);
    }

    #[test]
    fn sources_can_hug_their_targets() {
        let config = LayoutConfig {
            source_policy: SourcePolicy::TowardTargets,
            ..LayoutConfig::default()
        };
        let mut layout = prepare(&[("A", "B"), ("B", "C"), ("C", "D"), ("L", "C")], &config);
        compute_node_breadths(&mut layout, &config);
        assert_eq!(breadth_of(&layout, "A"), 0);
        assert_eq!(breadth_of(&layout, "L"), 1);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let config = LayoutConfig::default();
        let layout = prepare(&[("A", "B"), ("B", "B")], &config);
        assert_eq!(
            ensure_acyclic(&layout),
            Err(LayoutError::InvalidGraph(GraphDefect::Cycle("B".to_string())))
        );
    }

    #[test]
    fn parallel_links_are_not_cycles() {
        let config = LayoutConfig::default();
        let layout = prepare(&[("A", "B"), ("A", "B"), ("B", "C")], &config);
        assert!(ensure_acyclic(&layout).is_ok());
    }
}
