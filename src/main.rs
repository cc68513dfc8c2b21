//! procsnap - version 0.1.0
//!
//! Thin CLI entry point: parses arguments, initializes logging, invokes the
//! core collection or termination operation, and prints the result record as
//! JSON on stdout. Exit code 0 means the operation reported success.

use anyhow::Context;
use clap::Parser;
use procsnap::cli::Args;
use procsnap::config::{resolve_config, resolve_log_level, Config};
use procsnap::process::{collect, PriorityPolicy, DEFAULT_RULES};
use procsnap::source::ProcfsSource;
use procsnap::terminate::terminate;
use serde::Serialize;
use tracing::Level;

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so stdout stays a clean JSON stream for the caller.
fn setup_logging(log_level: Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("failed to serialize result")
}

fn show_config(config: &Config) -> anyhow::Result<()> {
    let rendered = toml::to_string(config).context("failed to render config")?;
    println!("{}", rendered);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match resolve_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    };
    setup_logging(resolve_log_level(&args, &config));

    if args.show_config {
        show_config(&config)?;
        return Ok(());
    }

    let source = ProcfsSource::new();
    let rules = &*DEFAULT_RULES;

    let (output, success) = if let Some(pid) = args.kill {
        let result = terminate(&source, rules, &config, pid);
        (to_json(&result, args.pretty)?, result.success)
    } else {
        let result = collect(
            &source,
            &config,
            rules,
            PriorityPolicy::detect(),
            args.expand,
        );
        (to_json(&result, args.pretty)?, result.success)
    };

    println!("{}", output);
    std::process::exit(if success { 0 } else { 1 });
}
