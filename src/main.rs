//! Alert Triage - Main Entry Point

mod cli;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;

use alert_triage::api::{self, AppState};
use alert_triage::constants::{APP_NAME, APP_VERSION};
use alert_triage::logic::artifacts::ArtifactStore;
use alert_triage::logic::pipeline::LabelSource;
use alert_triage::logic::triage::{LogNotifier, TriagePolicy};
use alert_triage::{AlertTable, Scorer, Trainer, TriageConfig};

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = TriageConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.model_dir {
        config.model_dir = dir;
    }

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);
    log::info!("Model dir: {}", config.model_dir.display());

    let result = match cli.command {
        Commands::Train { input, labeled } => train(&config, &input, labeled),
        Commands::Score { input, output } => score(&config, &input, output.as_deref()),
        Commands::Serve { host, port } => serve(&config, &host, port),
    };
    if let Err(e) = &result {
        log::error!("❌ {:#}", e);
    }
    result
}

fn train(config: &TriageConfig, input: &Path, labeled: bool) -> anyhow::Result<()> {
    let table = AlertTable::load(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let store = ArtifactStore::new(config.model_dir.clone());
    let labels = if labeled { LabelSource::Existing } else { LabelSource::Auto };

    let (outcome, manifest) = Trainer::new(config)
        .with_labels(labels)
        .train_and_save(&table, &store)
        .context("Training aborted")?;

    let diag = &outcome.diagnostics;
    match &diag.cv {
        Some(cv) => log::info!(
            "CV ({} folds): accuracy {:.4} ± {:.4}, F1 {:.4} ± {:.4}",
            cv.folds,
            cv.accuracy.mean,
            cv.accuracy.std,
            cv.f1.mean,
            cv.f1.std
        ),
        None => log::info!("CV skipped"),
    }
    log::info!(
        "✅ Saved run {} ({} features, backend {}) to {}",
        manifest.run_id,
        manifest.feature_width,
        manifest.backend,
        store.dir().display()
    );
    println!("{}", serde_json::to_string_pretty(diag)?);
    Ok(())
}

fn score(config: &TriageConfig, input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let table = AlertTable::load(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let scorer = Scorer::load(config);

    let Some(scores) = scorer.score(&table)? else {
        bail!("No trained model in {}", config.model_dir.display());
    };

    let report = TriagePolicy::from_config(config).triage(&table, &scores, &LogNotifier)?;
    log::info!(
        "{} rows: {} predicted threats, {} alerts, {} notices",
        scores.len(),
        scores.threat_count(),
        report.alerts,
        report.notices_sent
    );

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report.verdicts)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Verdicts written to {}", path.display());
    }
    Ok(())
}

fn serve(config: &TriageConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let scorer = Scorer::load(config);
    if !scorer.is_available() {
        log::warn!("⚠️ No model loaded, /analyze will answer 503 until artifacts exist");
    }
    let state = AppState::new(scorer, TriagePolicy::from_config(config), LogNotifier);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(api::serve(state, addr))?;
    Ok(())
}
