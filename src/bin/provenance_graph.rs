//! Provenance Graph CLI
//!
//! Builds the provenance graph of an extracted archive and writes the
//! emitted model as JSON to stdout. Logs go to stderr.
//!
//! ## Configuration
//!
//! Environment variables (flags take precedence):
//! - `PROVENANCE_MAX_FANOUT`: Concurrent resolves per action (default: 16)
//! - `PROVENANCE_BUILD_TIMEOUT_SECS`: Deadline for the build (default: 60)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin provenance_graph --features cli -- path/to/<root-uuid>/
//! cargo run --bin provenance_graph --features cli -- path/to/<root-uuid>/ --details <node-id>
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use provenance_kernel::{
    BuildError, BuilderConfig, DirectoryResolver, ProvenanceBuilder, GRAPH_MODEL_SCHEMA_VERSION,
};

/// Build the provenance graph of an extracted archive.
#[derive(Debug, Parser)]
#[command(name = "provenance_graph", version)]
struct Args {
    /// Extracted archive directory, named with the root artifact's UUID.
    archive: PathBuf,

    /// Concurrent resolves per action.
    #[arg(long)]
    max_fanout: Option<usize>,

    /// Deadline for the whole build, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the details of one node instead of the whole model.
    #[arg(long, value_name = "NODE_ID")]
    details: Option<String>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "provenance_graph=info,provenance_kernel=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let mut config = BuilderConfig::from_env();
    if let Some(max_fanout) = args.max_fanout {
        config = config.with_max_fanout(max_fanout);
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_build_timeout_secs(secs);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        schema = GRAPH_MODEL_SCHEMA_VERSION,
        archive = %args.archive.display(),
        max_fanout = config.fanout(),
        timeout_secs = config.build_timeout_secs,
        "Building provenance graph"
    );

    let resolver = match DirectoryResolver::open(&args.archive).await {
        Ok(resolver) => resolver,
        Err(e) => {
            error!(error = %e, "Failed to open archive");
            return Err(e.into());
        }
    };
    let root = resolver.root();
    let timeout = config.build_timeout();
    let timeout_secs = config.build_timeout_secs;
    let builder = ProvenanceBuilder::new(Arc::new(resolver), config);

    let start = Instant::now();
    let graph = match tokio::time::timeout(timeout, builder.build_graph(root)).await {
        Ok(Ok(graph)) => graph,
        Ok(Err(e)) => {
            error!(root = %root, error = %e, "Provenance build failed");
            return Err(e.into());
        }
        Err(_) => {
            let e = BuildError::Timeout(timeout_secs);
            error!(root = %root, error = %e, "Provenance build timed out");
            return Err(e.into());
        }
    };

    let kind = graph
        .root_kind()
        .map_or_else(|| "unknown".to_string(), |kind| kind.to_string());
    info!(
        root = %root,
        kind = %kind,
        height = graph.height(),
        resolver_calls = graph.stats().resolver_calls,
        latency_ms = start.elapsed().as_millis() as u64,
        "Provenance graph ready"
    );

    let output = match &args.details {
        Some(node_id) => match graph.details(node_id) {
            Some(details) => to_json(&details, args.pretty)?,
            None => {
                error!(node = %node_id, "No such node");
                return Err(format!("no node with id '{}'", node_id).into());
            }
        },
        None => to_json(graph.model(), args.pretty)?,
    };
    println!("{}", output);

    Ok(())
}
