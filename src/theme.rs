use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub node_fill: String,
    pub node_stroke: String,
    pub link_color: String,
    pub link_opacity: f32,
    pub link_hover_opacity: f32,
    pub text_color: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 10.0,
            node_fill: "#1f77b4".to_string(),
            node_stroke: "#0f3c5a".to_string(),
            link_color: "#000000".to_string(),
            link_opacity: 0.2,
            link_hover_opacity: 0.5,
            text_color: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            node_fill: "#7A8AA6".to_string(),
            node_stroke: "#4A5670".to_string(),
            link_color: "#7A8AA6".to_string(),
            link_opacity: 0.3,
            link_hover_opacity: 0.6,
            text_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}
