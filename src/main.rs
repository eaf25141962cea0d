use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so SVG and JSON output on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = sankey_flow::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
