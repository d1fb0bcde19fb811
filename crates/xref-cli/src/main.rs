//! # xref CLI entry point
//!
//! Parses arguments, opens the stores, dispatches one subcommand and
//! prints its JSON result.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use xref_cli::app::App;
use xref_cli::commands::{run, Command};
use xref_cli::logging::{init_tracing, LogFormat};
use xref_engine::EngineConfig;

/// Cross-framework requirement mapping and audit coverage.
#[derive(Parser, Debug)]
#[command(name = "xref", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "XREF_LOG_FORMAT", global = true)]
    log_format: LogFormat,

    /// Engine configuration file (YAML).
    #[arg(long, env = "XREF_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// JSON state file used instead of the database.
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "xref starting");

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let app = App::open(cli.fixture, config).await?;
    let value = run(&app, cli.command).await?;

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xref_cli::commands::Decision;

    #[test]
    fn parse_detect_with_globals() {
        let cli = Cli::try_parse_from([
            "xref",
            "-vv",
            "--fixture",
            "state.json",
            "detect",
            "ISO27001",
            "--force-regenerate",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.fixture, Some(PathBuf::from("state.json")));
        match cli.command {
            Command::Detect {
                framework,
                force_regenerate,
            } => {
                assert_eq!(framework, "ISO27001");
                assert!(force_regenerate);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_validate_decision() {
        let mapping = "6f1c2d3e-4b5a-4c6d-8e7f-001122334455";
        let validator = "0a0b0c0d-1e1f-4a2b-8c3d-4e5f60718293";
        let cli = Cli::try_parse_from([
            "xref",
            "validate",
            mapping,
            "reject",
            "--validator",
            validator,
            "--rationale",
            "scope differs",
        ])
        .unwrap();
        match cli.command {
            Command::Validate {
                decision, rationale, ..
            } => {
                assert_eq!(decision, Decision::Reject);
                assert_eq!(rationale.as_deref(), Some("scope differs"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn invalid_identifier_is_rejected() {
        assert!(Cli::try_parse_from(["xref", "coverage", "not-a-uuid"]).is_err());
    }

    #[test]
    fn compare_needs_an_audit() {
        assert!(Cli::try_parse_from(["xref", "compare"]).is_err());
    }

    #[test]
    fn link_type_parses_wire_form() {
        let cli = Cli::try_parse_from([
            "xref",
            "link",
            "6f1c2d3e-4b5a-4c6d-8e7f-001122334455",
            "7f1c2d3e-4b5a-4c6d-8e7f-001122334455",
            "--type",
            "weak_relation",
            "--validator",
            "0a0b0c0d-1e1f-4a2b-8c3d-4e5f60718293",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Link {
                mapping_type: xref_core::MappingType::WeakRelation,
                ..
            }
        ));
    }
}
