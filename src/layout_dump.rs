use crate::layout::SankeyLayout;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f64,
    pub height: f64,
    pub node_width: f64,
    pub node_padding: f64,
    pub vertical_scale: f64,
    pub columns: usize,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub value: f64,
    pub breadth: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub source: String,
    pub target: String,
    pub value: f64,
    pub thickness: f64,
    pub source_offset: f64,
    pub target_offset: f64,
    pub path: String,
}

impl LayoutDump {
    pub fn from_layout(layout: &SankeyLayout, curvature: f64) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.to_string(),
                label: node.label.clone(),
                value: node.value,
                breadth: node.breadth,
                x: node.x,
                y: node.depth,
                width: node.extent,
                height: node.span,
            })
            .collect();

        let links = layout
            .links
            .iter()
            .enumerate()
            .map(|(idx, link)| {
                let path = layout.link_path(idx, curvature);
                LinkDump {
                    source: layout.nodes[link.source].id.to_string(),
                    target: layout.nodes[link.target].id.to_string(),
                    value: link.value,
                    thickness: path.map_or(link.span, |path| path.thickness),
                    source_offset: link.source_offset,
                    target_offset: link.target_offset,
                    path: path.map(|path| path.to_svg_path()).unwrap_or_default(),
                }
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            node_width: layout.node_width,
            node_padding: layout.node_padding,
            vertical_scale: layout.vertical_scale,
            columns: layout.columns,
            nodes,
            links,
        }
    }
}

pub fn write_layout_dump(
    output: Option<&Path>,
    layout: &SankeyLayout,
    curvature: f64,
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout, curvature);
    match output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{FlowRecord, Graph};
    use crate::layout::compute_layout;

    #[test]
    fn dump_names_link_endpoints() {
        let graph = Graph::from_flows(&[
            FlowRecord::new("Gen-Male", "Sex-No", 10580.0),
            FlowRecord::new("Gen-Male", "Sex-Yes", 1504.0),
        ])
        .unwrap();
        let layout = compute_layout(&graph, &LayoutConfig::default()).unwrap();
        let dump = LayoutDump::from_layout(&layout, 0.5);
        assert_eq!(dump.nodes.len(), 3);
        assert_eq!(dump.links[1].source, "Gen-Male");
        assert_eq!(dump.links[1].target, "Sex-Yes");
        assert!(dump.links[0].path.starts_with('M'));
        assert_eq!(dump.links[1].thickness, layout.links[1].span);
        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["nodes"][0]["breadth"], 0);
    }
}
