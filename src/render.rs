use crate::config::RenderConfig;
use crate::layout::SankeyLayout;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Draws a computed layout: links first (thickest at the bottom), then node
/// rectangles with their labels.
pub fn render_svg(
    layout: &SankeyLayout,
    curvature: f64,
    theme: &Theme,
    config: &RenderConfig,
) -> String {
    let margin = config.margin;
    let width = layout.width + margin.left + margin.right;
    let height = layout.height + margin.top + margin.bottom;
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<style>.link{{fill:none;stroke:{};stroke-opacity:{}}}.link:hover{{stroke-opacity:{}}}</style>",
        theme.link_color, theme.link_opacity, theme.link_hover_opacity
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));
    svg.push_str(&format!(
        "<g transform=\"translate({},{})\">",
        margin.left, margin.top
    ));

    let mut link_order: Vec<usize> = (0..layout.links.len()).collect();
    link_order.sort_by(|a, b| layout.links[*b].span.total_cmp(&layout.links[*a].span));

    svg.push_str("<g class=\"links\">");
    for idx in link_order {
        let Some(path) = layout.link_path(idx, curvature) else {
            continue;
        };
        let link = &layout.links[idx];
        let title = format!(
            "{} → {}\n{}",
            layout.nodes[link.source].label,
            layout.nodes[link.target].label,
            format_value(link.value, &config.units)
        );
        svg.push_str(&format!(
            "<path class=\"link\" d=\"{}\" stroke-width=\"{:.2}\"><title>{}</title></path>",
            path.to_svg_path(),
            path.thickness.max(1.0),
            escape_xml(&title)
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"nodes\">");
    for node in &layout.nodes {
        svg.push_str(&format!(
            "<g class=\"node\" transform=\"translate({:.2},{:.2})\">",
            node.x, node.depth
        ));
        let title = format!("{}\n{}", node.label, format_value(node.value, &config.units));
        svg.push_str(&format!(
            "<rect width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\"><title>{}</title></rect>",
            node.extent,
            node.span,
            theme.node_fill,
            theme.node_stroke,
            escape_xml(&title)
        ));

        // Nodes in the left half are labelled on their right, the rest on their left.
        let (label_x, anchor) = if node.x < layout.width / 2.0 {
            (node.extent + config.label_gap, "start")
        } else {
            (-config.label_gap, "end")
        };
        svg.push_str(&format!(
            "<text x=\"{label_x:.2}\" y=\"{:.2}\" dy=\".35em\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            node.span / 2.0,
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.text_color,
            escape_xml(format!("{} {}", node.label, format_value(node.value, &config.units)).trim_end())
        ));
        svg.push_str("</g>");
    }
    svg.push_str("</g>");

    svg.push_str("</g></svg>");
    svg
}

/// Rounds to a whole number with thousands separators, then appends `units`.
pub fn format_value(value: f64, units: &str) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    if units.is_empty() {
        grouped
    } else {
        format!("{grouped} {units}")
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme.font_family.clone();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires the `png` feature"
    ))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{FlowRecord, Graph};
    use crate::layout::compute_layout;

    #[test]
    fn render_svg_basic() {
        let graph = Graph::from_flows(&[
            FlowRecord::new("Cit-NA", "Exp-NA", 9580.0),
            FlowRecord::new("Exp-NA", "Gen-Female", 9580.0),
        ])
        .unwrap();
        let layout = compute_layout(&graph, &LayoutConfig::default()).unwrap();
        let config = RenderConfig {
            units: "Cases".to_string(),
            ..RenderConfig::default()
        };
        let svg = render_svg(&layout, 0.5, &Theme::classic(), &config);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("class=\"link\" d=").count(), 2);
        assert_eq!(svg.matches("<rect width=").count(), 4);
        assert!(svg.contains("Cit-NA → Exp-NA\n9,580 Cases"));
        assert!(svg.contains("text-anchor=\"start\""));
        assert!(svg.contains("text-anchor=\"end\""));
    }

    #[test]
    fn thin_links_still_get_a_visible_stroke() {
        let graph = Graph::from_flows(&[
            FlowRecord::new("A", "B", 10_000.0),
            FlowRecord::new("A", "C", 0.01),
        ])
        .unwrap();
        let layout = compute_layout(&graph, &LayoutConfig::default()).unwrap();
        let svg = render_svg(&layout, 0.5, &Theme::classic(), &RenderConfig::default());
        assert!(svg.contains("stroke-width=\"1.00\""));
    }

    #[test]
    fn format_value_groups_thousands() {
        assert_eq!(format_value(36866.0, "Cases"), "36,866 Cases");
        assert_eq!(format_value(999.4, ""), "999");
        assert_eq!(format_value(1_234_567.0, ""), "1,234,567");
        assert_eq!(format_value(-1500.0, ""), "-1,500");
    }

    #[test]
    fn labels_are_escaped() {
        let graph = Graph::from_flows(&[FlowRecord::new("R&D", "<out>", 1.0)]).unwrap();
        let layout = compute_layout(&graph, &LayoutConfig::default()).unwrap();
        let svg = render_svg(&layout, 0.5, &Theme::classic(), &RenderConfig::default());
        assert!(svg.contains("R&amp;D"));
        assert!(svg.contains("&lt;out&gt;"));
    }
}
