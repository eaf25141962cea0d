use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("invalid graph: {0}")]
    InvalidGraph(#[from] GraphDefect),
    #[error("flow {from} -> {to} has non-positive value {value}")]
    NonPositiveValue { from: String, to: String, value: f64 },
    #[error("invalid layout config: {0}")]
    InvalidConfig(String),
}

/// Structural problems that make a graph unusable for layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphDefect {
    #[error("link {link} references node index {index}, but the graph has {count} nodes")]
    UnknownIndex {
        link: usize,
        index: usize,
        count: usize,
    },
    #[error("link {link} references unknown node `{id}`")]
    UnknownNode { link: usize, id: String },
    #[error("node `{0}` is declared more than once")]
    DuplicateNode(String),
    #[error("flows form a cycle through node `{0}`")]
    Cycle(String),
    #[error("no node at index {0}")]
    NoSuchNode(usize),
}
