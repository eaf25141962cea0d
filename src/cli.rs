use crate::config::{Config, load_config, merge_init_config};
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_sankey;
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "sankey", version, about = "Sankey flow diagram renderer")]
pub struct Args {
    /// Input file (`source,target,value` lines or JSON) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout width, excluding margins
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Layout height, excluding margins
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// Relaxation passes
    #[arg(long = "iterations")]
    pub iterations: Option<usize>,

    /// Node column width
    #[arg(long = "nodeWidth")]
    pub node_width: Option<f64>,

    /// Vertical gap between stacked nodes
    #[arg(long = "nodePadding")]
    pub node_padding: Option<f64>,

    /// Unit label appended to values in tooltips and labels
    #[arg(long = "units")]
    pub units: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    run_with_args(args)
}

pub fn run_with_args(args: Args) -> Result<()> {
    let base_config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let parsed = parse_sankey(&input)?;

    let mut config = base_config;
    if let Some(init_cfg) = parsed.init_config {
        config = merge_init_config(config, init_cfg)?;
    }
    apply_overrides(&mut config, &args);

    let layout = compute_layout(&parsed.graph, &config.layout)?;
    tracing::info!(
        nodes = layout.nodes.len(),
        links = layout.links.len(),
        "computed layout"
    );

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&layout, config.layout.curvature, &config.theme, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg(&layout, config.layout.curvature, &config.theme, &config.render);
            write_output_png(&svg, &output, &config.theme)?;
        }
        OutputFormat::Json => {
            write_layout_dump(args.output.as_deref(), &layout, config.layout.curvature)?;
        }
    }

    Ok(())
}

/// Command-line flags win over the config file and init directives.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(v) = args.width {
        config.layout.width = v;
    }
    if let Some(v) = args.height {
        config.layout.height = v;
    }
    if let Some(v) = args.iterations {
        config.layout.iterations = v;
    }
    if let Some(v) = args.node_width {
        config.layout.node_width = v;
    }
    if let Some(v) = args.node_padding {
        config.layout.node_padding = v;
    }
    if let Some(v) = &args.units {
        config.render.units = v.clone();
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "sankey",
            "-w",
            "780",
            "-H",
            "375",
            "--nodeWidth",
            "20",
            "--nodePadding",
            "15",
            "--iterations",
            "20",
            "--units",
            "Cases",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.layout.width, 780.0);
        assert_eq!(config.layout.height, 375.0);
        assert_eq!(config.layout.node_width, 20.0);
        assert_eq!(config.layout.node_padding, 15.0);
        assert_eq!(config.layout.iterations, 20);
        assert_eq!(config.render.units, "Cases");
    }

    #[test]
    fn missing_flags_keep_config_values() {
        let args = Args::parse_from(["sankey", "-e", "json"]);
        assert_eq!(args.output_format, OutputFormat::Json);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.layout, Config::default().layout);
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
    }
}
