use std::path::Path;
use std::sync::Arc;

use alerts::InMemoryTriggerStore;
use anyhow::{Context, bail};
use chrono::Utc;
use monitor::{MonitorConfig, MonitorEngine, MonitorEvent};
use tokio::sync::{mpsc, watch};
use tracing::info;

use super::load;
use crate::providers;
use crate::reload::ConfigWatcher;
use crate::render::{self, RULE};

/// Runs the monitor until SIGINT/SIGTERM.
pub async fn run(path: &Path) -> anyhow::Result<()> {
    let cfg = load(path)?;
    let rules = cfg.rule_set();
    if rules.is_empty() {
        bail!("no rules configured; add one with `pricewatch add --symbol AAPL --price-above 200`");
    }

    let quotes = providers::quote_router(&cfg)?;
    let notifier = providers::notifier(&cfg)?;

    let (events_tx, mut events_rx) = mpsc::channel::<MonitorEvent>(64);
    let (reload_tx, reload_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine = MonitorEngine::new(
        MonitorConfig::default().with_interval(cfg.interval()),
        rules.clone(),
        Arc::new(quotes),
        Arc::new(InMemoryTriggerStore::new()),
    )
    .with_notifier(Arc::new(notifier))
    .with_events(events_tx);

    println!(
        "🔔 Watching {} symbol(s) every {}s (Ctrl-C to stop)",
        rules.len(),
        cfg.interval().as_secs()
    );
    println!("{RULE}");

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            for line in render::event_lines(&event, Utc::now()) {
                println!("{line}");
            }
        }
    });

    let watcher = ConfigWatcher::new(path.to_path_buf());
    let watcher_task = tokio::spawn(watcher.run(reload_tx, shutdown_rx.clone()));
    let engine_task = tokio::spawn(async move { engine.run(reload_rx, shutdown_rx).await });

    shutdown_signal().await?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    engine_task.await.context("monitor task panicked")?;
    watcher_task.await.context("config watcher task panicked")?;
    printer.await.context("printer task panicked")?;

    println!("👋 Stopped");
    Ok(())
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.context("failed to listen for ctrl-c")?,
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    Ok(())
}
