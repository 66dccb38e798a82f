use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use manifest::{lint, ComposeFile, Severity};
use tracing::{error, info, warn};

/// Check a docker-compose manifest for wiring mistakes before handing it to the orchestrator.
#[derive(Debug, Parser)]
#[command(name = "compose-lint", version)]
struct Cli {
    /// Manifest to check
    #[arg(default_value = "docker-compose.yml")]
    file: PathBuf,

    /// Print the canonical payments manifest and exit
    #[arg(long)]
    print_default: bool,

    /// Database name used by --print-default
    #[arg(long, env = "DATABASE_NAME", default_value = "payments")]
    database_name: String,
}

fn main() -> ExitCode {
    common::utils::logging::init_logging_from_env();
    let cli = Cli::parse();

    if cli.print_default {
        return match ComposeFile::payment_stack(&cli.database_name).to_yaml() {
            Ok(yaml) => {
                print!("{yaml}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(event = "render_failed", error = %e, "failed to render manifest");
                ExitCode::FAILURE
            }
        };
    }

    let file = match ComposeFile::load(&cli.file) {
        Ok(f) => f,
        Err(e) => {
            error!(event = "load_failed", path = %cli.file.display(), error = %e, "manifest could not be read");
            return ExitCode::FAILURE;
        }
    };

    let report = lint(&file);
    for finding in &report.findings {
        match finding.severity {
            Severity::Error => error!(rule = finding.rule, "{finding}"),
            Severity::Warning => warn!(rule = finding.rule, "{finding}"),
        }
    }
    info!(
        event = "lint_done",
        path = %cli.file.display(),
        services = file.services.len(),
        findings = report.findings.len(),
        "manifest checked"
    );

    if report.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
