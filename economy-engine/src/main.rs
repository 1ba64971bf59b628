use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use economy::AccountId;
use economy_engine::events::EconomyEvent;
use economy_engine::io::{parse_line, Args, OutcomeWriter};
use economy_engine::market::{default_catalog, run_ticker, MarketSimulator};
use economy_engine::models::{Outcome, Settings, TransactionLogger};
use economy_engine::store::{MemoryStore, SNAPSHOT_FILE};
use economy_engine::Engine;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinSet;

const JOURNAL_FILE: &str = "journal.csv";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("=== Economy Engine Starting ===");

    let args = Args::parse();
    let settings = Settings::load(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?
        .with_authorized(args.authorize.iter().map(AccountId::new));
    debug!("Settings: {:?}", settings);

    // 1. Store
    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create {}", args.data_dir.display()))?;
    let snapshot_path = args.data_dir.join(SNAPSHOT_FILE);
    let store = Arc::new(if settings.persist_snapshot {
        MemoryStore::open(&snapshot_path)?
    } else {
        MemoryStore::new()
    });

    // 2. Engine
    let simulator = MarketSimulator::new(store.clone(), settings.max_price_delta);
    let mut engine = Engine::new(store.clone())
        .with_simulator(simulator)
        .with_authorized(settings.authorized_accounts.clone());
    if settings.journal {
        engine = engine.with_journal(TransactionLogger::new(args.data_dir.join(JOURNAL_FILE)));
    }
    let engine = Arc::new(engine);
    engine.seed_catalog(&default_catalog())?;

    // 3. Market board and ticker
    spawn_board(engine.events().subscribe());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = tokio::spawn(run_ticker(engine.clone(), settings.tick_interval(), shutdown_rx));

    // 4. Command loop: every command runs as its own task
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut output = OutcomeWriter::new(tokio::io::stdout());
    let mut tasks = JoinSet::new();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Outcome>();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut input_open = true;
    let mut fatal = false;

    info!("Ready for commands on stdin");
    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    None => {}
                    Some(Err(rejection)) => {
                        if !output.write(&rejection).await {
                            break;
                        }
                    }
                    Some(Ok(command)) => {
                        let engine = engine.clone();
                        let done = done_tx.clone();
                        tasks.spawn(async move {
                            let _ = done.send(engine.process(command).await);
                        });
                    }
                },
                Ok(None) => {
                    info!("Input closed");
                    input_open = false;
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    input_open = false;
                }
            },
            Some(outcome) = done_rx.recv() => {
                let written = output.write(&outcome).await;
                if outcome.is_fatal() {
                    error!("Stores are inconsistent, no further commands accepted");
                    fatal = true;
                    break;
                }
                if !written {
                    break;
                }
            }
            Some(joined) = tasks.join_next() => {
                if let Err(e) = joined {
                    error!("Command task failed: {}", e);
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupt received, shutting down");
                break;
            }
        }

        if !input_open && tasks.is_empty() {
            break;
        }
    }

    if output.is_broken() {
        warn!("Output closed, no further commands accepted");
    }

    // 5. Drain in-flight commands before the snapshot is taken
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("Command task failed: {}", e);
        }
    }
    drop(done_tx);
    while let Some(outcome) = done_rx.recv().await {
        output.write(&outcome).await;
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = ticker.await {
        error!("Market ticker task failed: {}", e);
    }

    if settings.persist_snapshot {
        if fatal {
            warn!("Saving snapshot of an inconsistent store for inspection");
        }
        store.save(&snapshot_path)?;
        info!("Snapshot saved to {}", snapshot_path.display());
    }

    if fatal {
        bail!("stopped after an unrecoverable store failure");
    }
    if let Some(e) = output.into_failure() {
        return Err(anyhow!(e).context("Failed to write outcomes"));
    }
    info!("=== Economy Engine Stopped ===");
    Ok(())
}

/// Logs the market board and settlements for whoever watches the log.
fn spawn_board(mut events: broadcast::Receiver<EconomyEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(EconomyEvent::MarketUpdated(snapshot)) => {
                    let board: Vec<String> = snapshot
                        .instruments
                        .iter()
                        .map(|i| format!("{} {} ({})", i.name(), i.price(), i.trend()))
                        .collect();
                    debug!("[tick {}] {}", snapshot.tick, board.join(" | "));
                }
                Ok(EconomyEvent::Settled(receipt)) => debug!("Settled {}", receipt.id()),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Board fell behind, skipped {} events", skipped)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
