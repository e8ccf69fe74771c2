pub mod cli;
pub mod config;
pub mod pipeline;

use std::process::ExitCode;

use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use cli::{Args, CliError};
use pipeline::enhancement::sources::SourceRegistry;
use pipeline::enhancement::MedicalRagService;

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// the JSON result.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Binary entry point.
pub fn run() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(&args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Enhancement run failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: &Args) -> Result<(), CliError> {
    let report = read_report(args).await?;
    let service = build_service(args, config::RagConfig::from_env()).await?;
    if let Some(update) = args.preferences_update() {
        service.update_user_preferences(update)?;
    }

    let result = service
        .enhance_medical_report(&report, &args.enhance_options())
        .await;
    if result.fallback_used {
        tracing::warn!("Pipeline fell back; output is the unmodified report");
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// HTTP sources when a catalog is given, the built-in knowledge base otherwise.
async fn build_service(
    args: &Args,
    config: config::RagConfig,
) -> Result<MedicalRagService, CliError> {
    let Some(path) = &args.sources else {
        tracing::info!("Using built-in knowledge base");
        return Ok(MedicalRagService::offline(config));
    };

    let json = tokio::fs::read_to_string(path).await?;
    let registry = SourceRegistry::from_json(&json)
        .map_err(|e| CliError::SourceCatalog(format!("{}: {e}", path.display())))?;
    if registry.all().is_empty() {
        return Err(CliError::SourceCatalog(format!(
            "{}: no sources defined",
            path.display()
        )));
    }

    tracing::info!(sources = registry.all().len(), "Using HTTP knowledge sources");
    Ok(MedicalRagService::with_http_clients(config, registry)?)
}

async fn read_report(args: &Args) -> Result<String, CliError> {
    match &args.file {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Reading report file");
            Ok(tokio::fs::read_to_string(path).await?)
        }
        None => {
            let mut report = String::new();
            tokio::io::stdin().read_to_string(&mut report).await?;
            Ok(report)
        }
    }
}
