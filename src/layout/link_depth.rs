use super::SankeyLayout;

/// Orders every node's links by the depth of the node at the far end (link
/// index breaks ties) and stacks them from the node's top edge.
pub(super) fn compute_link_depths(layout: &mut SankeyLayout) {
    let nodes = &mut layout.nodes;
    let links = &mut layout.links;

    for idx in 0..nodes.len() {
        let mut outgoing = std::mem::take(&mut nodes[idx].outgoing);
        outgoing.sort_by(|a, b| {
            let da = nodes[links[*a].target].depth;
            let db = nodes[links[*b].target].depth;
            da.total_cmp(&db).then(a.cmp(b))
        });
        nodes[idx].outgoing = outgoing;

        let mut incoming = std::mem::take(&mut nodes[idx].incoming);
        incoming.sort_by(|a, b| {
            let da = nodes[links[*a].source].depth;
            let db = nodes[links[*b].source].depth;
            da.total_cmp(&db).then(a.cmp(b))
        });
        nodes[idx].incoming = incoming;
    }

    for node in nodes.iter() {
        let mut sy = 0.0;
        for &link_idx in &node.outgoing {
            links[link_idx].source_offset = sy;
            sy += links[link_idx].span;
        }
        let mut ty = 0.0;
        for &link_idx in &node.incoming {
            links[link_idx].target_offset = ty;
            ty += links[link_idx].span;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LinkLayout, NodeLayout};

    fn node(id: &str, depth: f64) -> NodeLayout {
        NodeLayout {
            id: id.into(),
            label: id.to_string(),
            value: 0.0,
            breadth: 0,
            x: 0.0,
            extent: 24.0,
            depth,
            span: 0.0,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    fn link(source: usize, target: usize, span: f64) -> LinkLayout {
        LinkLayout {
            source,
            target,
            value: span,
            span,
            source_offset: 0.0,
            target_offset: 0.0,
        }
    }

    fn layout() -> SankeyLayout {
        // hub (0) feeds low (1), high (2) and twice into mid (3)
        let mut nodes = vec![node("hub", 0.0), node("low", 80.0), node("high", 0.0), node("mid", 40.0)];
        let links = vec![link(0, 1, 5.0), link(0, 2, 7.0), link(0, 3, 2.0), link(0, 3, 3.0)];
        nodes[0].outgoing = vec![0, 1, 2, 3];
        nodes[1].incoming = vec![0];
        nodes[2].incoming = vec![1];
        nodes[3].incoming = vec![2, 3];
        SankeyLayout {
            width: 100.0,
            height: 100.0,
            node_width: 24.0,
            node_padding: 8.0,
            vertical_scale: 1.0,
            columns: 2,
            degenerate_columns: Vec::new(),
            nodes,
            links,
        }
    }

    #[test]
    fn outgoing_links_stack_by_target_depth() {
        let mut layout = layout();
        compute_link_depths(&mut layout);
        assert_eq!(layout.nodes[0].outgoing, vec![1, 2, 3, 0]);
        let offsets: Vec<f64> = layout.links.iter().map(|l| l.source_offset).collect();
        assert_eq!(offsets, vec![12.0, 0.0, 7.0, 9.0]);
    }

    #[test]
    fn parallel_links_keep_input_order_inside_target() {
        let mut layout = layout();
        compute_link_depths(&mut layout);
        assert_eq!(layout.links[2].target_offset, 0.0);
        assert_eq!(layout.links[3].target_offset, 2.0);
    }

    #[test]
    fn moving_a_target_reorders_bands() {
        let mut layout = layout();
        compute_link_depths(&mut layout);
        layout.nodes[1].depth = -10.0;
        layout.relayout();
        assert_eq!(layout.nodes[0].outgoing, vec![0, 1, 2, 3]);
        assert_eq!(layout.links[0].source_offset, 0.0);
        assert_eq!(layout.links[1].source_offset, 5.0);
    }
}
