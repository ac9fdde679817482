mod cli;
mod config;
mod report;

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use results_core::PollStatus;
use results_engine::{export_result, ResultsEngine};
use tokio::sync::mpsc;

use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log_destination(), cli.log_level());

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            engine_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let file = config::load_file_config(&cli.config);
    let config = config::resolve(cli, file).context("invalid configuration")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(watch(config))
}

async fn watch(config: AppConfig) -> anyhow::Result<u8> {
    let engine =
        ResultsEngine::from_config(config.engine).context("failed to build results client")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscription = engine.subscribe(config.job_id, config.persona, move |snapshot| {
        let _ = tx.send(snapshot.clone());
    });

    while let Some(snapshot) = rx.recv().await {
        println!("{}", report::status_line(&snapshot));
        if !snapshot.status.is_terminal() {
            continue;
        }

        if snapshot.status == PollStatus::Succeeded {
            if let (Some(result), Some(key)) = (snapshot.data.as_ref(), snapshot.key.as_ref()) {
                for line in report::summary(result) {
                    println!("{line}");
                }
                if let Some(dir) = config.export_dir.as_deref() {
                    let exported_at = chrono::Utc::now().to_rfc3339();
                    let path = export_result(dir, key, result, &exported_at)
                        .with_context(|| format!("failed to export results to {dir:?}"))?;
                    engine_info!("Exported results to {:?}", path);
                    println!("Exported to {}", path.display());
                }
            }
        }
        return Ok(report::exit_code(snapshot.status));
    }

    bail!("results engine stopped before reaching a final status")
}
