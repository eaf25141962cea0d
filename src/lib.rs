#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, SinkPolicy, SourcePolicy};
pub use ir::{FlowRecord, Graph, LinkEndpoint, NodeId};
pub use layout::{
    GraphDefect, LayoutError, LinkLayout, LinkPath, NodeLayout, SankeyLayout, compute_layout,
};
pub use parser::parse_sankey;
pub use render::render_svg;
pub use theme::Theme;

/// Everything needed to turn flow text into an SVG.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl RenderOptions {
    pub fn classic() -> Self {
        let config = Config::default();
        Self {
            theme: config.theme,
            layout: config.layout,
            render: config.render,
        }
    }

    pub fn modern() -> Self {
        let theme = Theme::modern();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..RenderConfig::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::classic()
    }
}

/// Parses `input`, lays it out and renders it. Layout knobs from an inline
/// init directive override those in `options`.
pub fn render_with_options(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let parsed = parse_sankey(input)?;
    let mut config = Config {
        theme: options.theme,
        layout: options.layout,
        render: options.render,
    };
    if let Some(init) = parsed.init_config {
        config = config::merge_init_config(config, init)?;
    }
    let layout = compute_layout(&parsed.graph, &config.layout)?;
    Ok(render_svg(
        &layout,
        config.layout.curvature,
        &config.theme,
        &config.render,
    ))
}
