//! hushcut binary.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use hushcut_cli::logging::init_tracing;
use hushcut_cli::{Cli, CliConfig, FileOutcome, Invocation, Orchestrator};
use hushcut_media::{FfmpegBackend, FfmpegRunner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_level());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_env().with_overrides(&cli);
    info!("Config: {:?}", config);

    let mut runner = FfmpegRunner::new(config.tool_paths()?);
    if let Some(secs) = config.ffmpeg_timeout_secs {
        runner = runner.with_timeout(secs);
    }
    let backend = FfmpegBackend::new(runner).with_encoding(config.encoding.clone());
    let orchestrator = Orchestrator::new(backend, config.silence.clone());

    match cli.invocation() {
        Invocation::File { input, output } => {
            let outcome = orchestrator
                .process_file(&input, output.as_deref())
                .await
                .with_context(|| format!("failed to process {}", input.display()))?;

            if let FileOutcome::Rendered { output, .. } = outcome {
                info!("Wrote {}", output.display());
            }
        }
        Invocation::Dir { input, output } => {
            orchestrator
                .process_dir(&input, output.as_deref())
                .await
                .with_context(|| format!("failed to process directory {}", input.display()))?;
        }
    }

    Ok(())
}
