//! The `swaggen` executable.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const CRATE_TARGETS: [&str; 4] = ["swaggen", "swaggen_cli", "swaggen_core", "swaggen_common"];

fn main() {
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().collect();
    let code = runtime.block_on(swaggen_cli::run(args));
    tracing::debug!(code, "swaggen finished");
    std::process::exit(code);
}

/// Build the filter spec from `SWAGGEN_LOG`.
fn filter_spec(env: Option<&str>) -> String {
    // SWAGGEN_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "swaggen_core=debug,reqwest=warn"
    let level = match env {
        Some(level) if is_plain_level(level) => level.to_ascii_lowercase(),
        Some(spec) => return spec.to_string(),
        None => "warn".to_string(),
    };
    CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn init_tracing() {
    let env = std::env::var("SWAGGEN_LOG").ok();
    let filter = filter_spec(env.as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
