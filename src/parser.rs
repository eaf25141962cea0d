use crate::ir::{FlowRecord, Graph, LinkEndpoint, NodeId};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^sankey(-beta)?\s*$").unwrap());

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub graph: Graph,
    pub init_config: Option<serde_json::Value>,
}

/// Parses a flow dataset. JSON input (starting with `[` or `{`) is either an
/// array of `{source, target, value}` records or a `{nodes, links}` graph;
/// anything else is read as `source,target,value` lines.
pub fn parse_sankey(input: &str) -> Result<ParseOutput> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return parse_json_dataset(trimmed);
    }
    parse_flow_lines(input)
}

fn preprocess_input(input: &str) -> (Vec<(usize, String)>, Option<serde_json::Value>) {
    let mut init_config: Option<serde_json::Value> = None;
    let mut lines = Vec::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let trimmed_line = raw_line.trim();
        if trimmed_line.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(trimmed_line) {
            if let Some(json_str) = caps.get(1).map(|m| m.as_str()) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(json_str) {
                    init_config = Some(value);
                } else if let Ok(value) = json5::from_str::<serde_json::Value>(json_str) {
                    init_config = Some(value);
                } else {
                    tracing::warn!(line = idx + 1, "ignoring unparsable init directive");
                }
            }
            continue;
        }
        if trimmed_line.starts_with("%%") {
            continue;
        }
        lines.push((idx + 1, trimmed_line.to_string()));
    }

    (lines, init_config)
}

fn parse_flow_lines(input: &str) -> Result<ParseOutput> {
    let mut graph = Graph::new();
    let (lines, init_config) = preprocess_input(input);

    for (line_no, line) in lines {
        if HEADER_RE.is_match(&line) {
            continue;
        }
        let fields = split_record(&line)
            .ok_or_else(|| anyhow::anyhow!("line {line_no}: unterminated quoted field"))?;
        if fields.len() != 3 {
            return Err(anyhow::anyhow!(
                "line {line_no}: expected `source,target,value`, found {} field(s)",
                fields.len()
            ));
        }
        let from = fields[0].trim();
        let to = fields[1].trim();
        if from.is_empty() || to.is_empty() {
            return Err(anyhow::anyhow!("line {line_no}: empty node name"));
        }
        let value: f64 = fields[2]
            .trim()
            .parse()
            .with_context(|| format!("line {line_no}: invalid flow value `{}`", fields[2].trim()))?;
        let source = graph.add_node(from, None);
        let target = graph.add_node(to, None);
        graph
            .add_link(source, target, value)
            .with_context(|| format!("line {line_no}"))?;
    }

    tracing::debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "parsed flow lines"
    );
    Ok(ParseOutput { graph, init_config })
}

/// Splits one comma-separated record. Double-quoted fields may contain commas
/// and `""` for a literal quote. Returns `None` for an unterminated quote.
fn split_record(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
            continue;
        }
        match ch {
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrString::Number(val) => Some(*val),
            NumberOrString::String(val) => val.trim().parse::<f64>().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    source: String,
    target: String,
    value: NumberOrString,
}

#[derive(Debug, Deserialize)]
struct JsonNode {
    name: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonLink {
    source: LinkEndpoint,
    target: LinkEndpoint,
    value: NumberOrString,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDataset {
    Records(Vec<JsonRecord>),
    Graph {
        nodes: Vec<JsonNode>,
        links: Vec<JsonLink>,
    },
}

fn parse_json_dataset(input: &str) -> Result<ParseOutput> {
    let dataset: JsonDataset = match serde_json::from_str(input) {
        Ok(dataset) => dataset,
        Err(err) => json5::from_str(input)
            .map_err(|_| err)
            .context("invalid JSON flow dataset")?,
    };

    let graph = match dataset {
        JsonDataset::Records(records) => {
            let mut flows = Vec::with_capacity(records.len());
            for (idx, record) in records.into_iter().enumerate() {
                let value = record
                    .value
                    .as_f64()
                    .ok_or_else(|| anyhow::anyhow!("record {idx}: flow value is not a number"))?;
                flows.push(FlowRecord::new(record.source, record.target, value));
            }
            Graph::from_flows(&flows)?
        }
        JsonDataset::Graph { nodes, links } => {
            let mut graph = Graph::new();
            for node in nodes {
                let id = NodeId::from(node.name);
                if graph.node_index(&id).is_some() {
                    return Err(anyhow::anyhow!("node `{id}` is listed twice"));
                }
                graph.add_node(id, node.label);
            }
            for (idx, link) in links.into_iter().enumerate() {
                let value = link
                    .value
                    .as_f64()
                    .ok_or_else(|| anyhow::anyhow!("link {idx}: flow value is not a number"))?;
                graph
                    .add_link(link.source, link.target, value)
                    .with_context(|| format!("link {idx}"))?;
            }
            graph
        }
    };

    Ok(ParseOutput {
        graph,
        init_config: None,
    })
}
