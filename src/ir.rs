use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;

/// Stable identity of a node, usually its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One end of a link. Resolved to a node index once, when the layout indexes
/// links; nothing downstream looks at this again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkEndpoint {
    ByIndex(usize),
    ByReference(NodeId),
}

impl From<usize> for LinkEndpoint {
    fn from(value: usize) -> Self {
        Self::ByIndex(value)
    }
}

impl From<NodeId> for LinkEndpoint {
    fn from(value: NodeId) -> Self {
        Self::ByReference(value)
    }
}

impl From<&str> for LinkEndpoint {
    fn from(value: &str) -> Self {
        Self::ByReference(NodeId::from(value))
    }
}

impl fmt::Display for LinkEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEndpoint::ByIndex(idx) => write!(f, "#{idx}"),
            LinkEndpoint::ByReference(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: LinkEndpoint,
    pub target: LinkEndpoint,
    pub value: f64,
}

/// A raw `source -> target` flow as it appears in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub source: String,
    pub target: String,
    pub value: f64,
}

impl FlowRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    node_index: HashMap<NodeId, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from flow records. Each record contributes its source and
    /// then its target; the first appearance of a name fixes its node index.
    pub fn from_flows(records: &[FlowRecord]) -> Result<Self, LayoutError> {
        let mut graph = Self::new();
        for record in records {
            let source = graph.add_node(record.source.as_str(), None);
            let target = graph.add_node(record.target.as_str(), None);
            graph.add_link(source, target, record.value)?;
        }
        Ok(graph)
    }

    /// Returns the index of the node with this id, inserting it first if needed.
    /// A label given for an existing node replaces the old one.
    pub fn add_node(&mut self, id: impl Into<NodeId>, label: Option<String>) -> usize {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(&id) {
            if let Some(label) = label {
                self.nodes[idx].label = label;
            }
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(Node {
            label: label.unwrap_or_else(|| id.0.clone()),
            id: id.clone(),
        });
        self.node_index.insert(id, idx);
        idx
    }

    pub fn add_link(
        &mut self,
        source: impl Into<LinkEndpoint>,
        target: impl Into<LinkEndpoint>,
        value: f64,
    ) -> Result<usize, LayoutError> {
        let source = source.into();
        let target = target.into();
        if !(value.is_finite() && value > 0.0) {
            return Err(LayoutError::NonPositiveValue {
                from: source.to_string(),
                to: target.to_string(),
                value,
            });
        }
        self.links.push(Link {
            source,
            target,
            value,
        });
        Ok(self.links.len() - 1)
    }

    pub fn node_index(&self, id: &NodeId) -> Option<usize> {
        self.node_index.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flows_deduplicates_in_first_appearance_order() {
        let records = vec![
            FlowRecord::new("Cit-AS", "Exp-NA", 319.0),
            FlowRecord::new("Cit-EU", "Exp-AS", 4974.0),
            FlowRecord::new("Exp-AS", "Gen-Unk", 28.0),
            FlowRecord::new("Exp-AS", "Gen-Unk", 116.0),
        ];
        let graph = Graph::from_flows(&records).unwrap();
        let names: Vec<&str> = graph.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(names, vec!["Cit-AS", "Exp-NA", "Cit-EU", "Exp-AS", "Gen-Unk"]);
        assert_eq!(graph.links.len(), 4);
        assert_eq!(graph.links[2].source, LinkEndpoint::ByIndex(3));
        assert_eq!(graph.links[3].target, LinkEndpoint::ByIndex(4));
    }

    #[test]
    fn add_link_rejects_non_positive_values() {
        let mut graph = Graph::new();
        let a = graph.add_node("A", None);
        let b = graph.add_node("B", None);
        assert!(matches!(
            graph.add_link(a, b, 0.0),
            Err(LayoutError::NonPositiveValue { .. })
        ));
        assert!(graph.add_link(a, b, -3.0).is_err());
        assert!(graph.add_link(a, b, f64::NAN).is_err());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn add_node_keeps_existing_index_and_updates_label() {
        let mut graph = Graph::new();
        let first = graph.add_node("A", None);
        let again = graph.add_node("A", Some("Alpha".to_string()));
        assert_eq!(first, again);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.node_index(&NodeId::from("A")), Some(first));
        assert_eq!(graph.node_index(&NodeId::from("B")), None);
        assert_eq!(graph.nodes[0].label, "Alpha");
    }

    #[test]
    fn endpoints_deserialize_from_index_or_name() {
        let link: Link =
            serde_json::from_str(r#"{"source": 2, "target": "Sex-Yes", "value": 480}"#).unwrap();
        assert_eq!(link.source, LinkEndpoint::ByIndex(2));
        assert_eq!(link.target, LinkEndpoint::ByReference(NodeId::from("Sex-Yes")));
    }
}
