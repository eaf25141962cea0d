use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where nodes without outgoing links end up after forward propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SinkPolicy {
    /// Force every sink into the last column.
    #[default]
    Rightmost,
    /// Keep the column found by propagation.
    Leave,
}

/// Where nodes without incoming links end up after forward propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourcePolicy {
    /// Keep sources where propagation put them (column 0).
    #[default]
    Leave,
    /// Move each source to one column left of its nearest target.
    TowardTargets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_padding: f64,
    pub width: f64,
    pub height: f64,
    pub iterations: usize,
    pub curvature: f64,
    pub sink_policy: SinkPolicy,
    pub source_policy: SourcePolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 24.0,
            node_padding: 8.0,
            width: 960.0,
            height: 500.0,
            iterations: 32,
            curvature: 0.5,
            sink_policy: SinkPolicy::Rightmost,
            source_policy: SourcePolicy::Leave,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 15.0,
            right: 10.0,
            bottom: 10.0,
            left: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub margin: Margin,
    pub background: String,
    pub units: String,
    pub label_gap: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            margin: Margin::default(),
            background: "#FFFFFF".to_string(),
            units: String::new(),
            label_gap: 6.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    node_fill: Option<String>,
    node_stroke: Option<String>,
    link_color: Option<String>,
    link_opacity: Option<f32>,
    text_color: Option<String>,
    background: Option<String>,
}

/// Layout knobs accepted from config files and init directives.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SankeyConfigFile {
    node_width: Option<f64>,
    node_padding: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    iterations: Option<usize>,
    curvature: Option<f64>,
    sink_policy: Option<SinkPolicy>,
    source_policy: Option<SourcePolicy>,
}

impl SankeyConfigFile {
    pub fn apply(self, layout: &mut LayoutConfig) {
        if let Some(v) = self.node_width {
            layout.node_width = v;
        }
        if let Some(v) = self.node_padding {
            layout.node_padding = v;
        }
        if let Some(v) = self.width {
            layout.width = v;
        }
        if let Some(v) = self.height {
            layout.height = v;
        }
        if let Some(v) = self.iterations {
            layout.iterations = v;
        }
        if let Some(v) = self.curvature {
            layout.curvature = v;
        }
        if let Some(v) = self.sink_policy {
            layout.sink_policy = v;
        }
        if let Some(v) = self.source_policy {
            layout.source_policy = v;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    margin: Option<Margin>,
    units: Option<String>,
    label_gap: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    sankey: Option<SankeyConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(contents)?,
    };

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        } else {
            tracing::warn!(theme = theme_name, "unknown theme, keeping default");
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_stroke {
            config.theme.node_stroke = v;
        }
        if let Some(v) = vars.link_color {
            config.theme.link_color = v;
        }
        if let Some(v) = vars.link_opacity {
            config.theme.link_opacity = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(sankey) = parsed.sankey {
        sankey.apply(&mut config.layout);
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.margin {
            config.render.margin = v;
        }
        if let Some(v) = render.units {
            config.render.units = v;
        }
        if let Some(v) = render.label_gap {
            config.render.label_gap = v;
        }
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}

/// Applies the `sankey` section of an inline `%%{init: ...}%%` directive.
pub fn merge_init_config(mut config: Config, init: serde_json::Value) -> anyhow::Result<Config> {
    if let Some(sankey) = init.get("sankey") {
        let overrides: SankeyConfigFile = serde_json::from_value(sankey.clone())?;
        overrides.apply(&mut config.layout);
    }
    if let Some(theme_vars) = init.get("themeVariables") {
        if let Some(val) = theme_vars.get("nodeFill").and_then(|v| v.as_str()) {
            config.theme.node_fill = val.to_string();
        }
        if let Some(val) = theme_vars.get("linkColor").and_then(|v| v.as_str()) {
            config.theme.link_color = val.to_string();
        }
        if let Some(val) = theme_vars.get("fontFamily").and_then(|v| v.as_str()) {
            config.theme.font_family = val.to_string();
        }
        if let Some(val) = theme_vars.get("fontSize").and_then(|v| v.as_f64()) {
            config.theme.font_size = val as f32;
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_knobs() {
        let config = LayoutConfig::default();
        assert_eq!(config.node_width, 24.0);
        assert_eq!(config.node_padding, 8.0);
        assert_eq!(config.sink_policy, SinkPolicy::Rightmost);
        assert_eq!(config.source_policy, SourcePolicy::Leave);
    }

    #[test]
    fn parse_config_overrides_fields() {
        let config = parse_config(
            r##"{
                "theme": "modern",
                "sankey": { "nodeWidth": 20, "nodePadding": 15, "sourcePolicy": "towardTargets" },
                "render": { "units": "Cases" },
                "themeVariables": { "linkColor": "#ff0000" }
            }"##,
        )
        .unwrap();
        assert_eq!(config.layout.node_width, 20.0);
        assert_eq!(config.layout.node_padding, 15.0);
        assert_eq!(config.layout.source_policy, SourcePolicy::TowardTargets);
        assert_eq!(config.layout.iterations, 32);
        assert_eq!(config.render.units, "Cases");
        assert_eq!(config.theme.link_color, "#ff0000");
        assert_eq!(config.theme.font_family, Theme::modern().font_family);
    }

    #[test]
    fn parse_config_accepts_json5() {
        let config = parse_config("{ sankey: { iterations: 20, }, }").unwrap();
        assert_eq!(config.layout.iterations, 20);
    }

    #[test]
    fn merge_init_config_applies_sankey_section() {
        let init = serde_json::json!({ "sankey": { "height": 375.0, "nodeWidth": 20 } });
        let config = merge_init_config(Config::default(), init).unwrap();
        assert_eq!(config.layout.height, 375.0);
        assert_eq!(config.layout.node_width, 20.0);
    }
}
