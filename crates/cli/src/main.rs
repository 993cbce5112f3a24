use clap::Parser;
use config::Config;
use preloader::{
    HeadDocument, HintBootstrap, KeyValueStore, LinkHinter, MarkerAnalyzer, NoopStore,
    PreloadScheduler, ResourceHinter, Services, SqliteStore, StaticDirHinter, SystemClock,
};
use preloader_cli::cli::Cli;
use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound of bytes kept by the static directory warmer.
const STATIC_CACHE_BYTES: u64 = 64 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // NOTE: The verbosity flag takes precedence over the environment variable
    // for log control. `PRELOADER_LOG` can only tune levels per crate, eg.
    // `PRELOADER_LOG=preloader=trace preloader -v`.
    let env_filter = EnvFilter::builder()
        .with_default_directive("sqlx=warn".parse()?)
        .with_env_var("PRELOADER_LOG")
        .from_env()?
        .add_directive(cli.verbosity.log_level_filter().as_str().parse()?);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    // load config
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        _ => {
            let mut candidates = glob::glob("/etc/preloader/config.d/*.toml")?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            candidates.insert(0, "/etc/preloader/config.toml".into());
            trace!(?candidates, "config file candidates");
            Config::load_multiple(candidates)?
        }
    };
    if let Some(state) = &cli.state {
        config.persistence.state_path = Some(state.clone());
    }
    debug!(?config, ?cli);

    let head = Arc::new(Mutex::new(HeadDocument::default()));
    let report = HintBootstrap::new(&config.hints)
        .apply(&mut *head.lock().unwrap_or_else(PoisonError::into_inner));
    debug!(inserted = report.inserted(), "document hints installed");

    let hinter: Arc<dyn ResourceHinter> = match &cli.static_root {
        Some(root) => Arc::new(StaticDirHinter::new(root.clone(), STATIC_CACHE_BYTES)),
        None => Arc::new(LinkHinter::new(head.clone())),
    };
    let store: Arc<dyn KeyValueStore> = match &config.persistence.state_path {
        Some(path) => Arc::new(SqliteStore::open(path.clone()).await?),
        None => Arc::new(NoopStore),
    };

    let scheduler = PreloadScheduler::new(
        &config,
        Services {
            hinter,
            analyzer: Box::new(MarkerAnalyzer),
            store,
            clock: Box::new(SystemClock),
        },
    )?;

    if !cli.no_critical {
        scheduler.preload_critical();
    }

    let restored = scheduler.restore_behavior().await?;
    if restored > 0 {
        debug!(restored, "behavior log restored");
        scheduler.preload_on_behavior(&scheduler.behavior_log());
    }

    for route in &cli.routes {
        scheduler.preload_on_intent(route);
    }
    for interaction in &cli.interactions {
        scheduler.record_interaction(interaction.as_str());
    }

    if cli.stdin {
        let token = CancellationToken::new();
        let ctrl_c = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupted");
                ctrl_c.cancel();
            }
        });
        read_interactions(&scheduler, token).await?;
    }

    scheduler.flush().await;
    if let Err(err) = scheduler.sync_behavior().await {
        warn!(%err, "behavior log not saved");
    }

    let stats = scheduler.stats();
    info!(
        preloaded = stats.preloaded_count,
        queued = stats.queue_length,
        hit_rate = stats.hit_rate,
        "preload finished"
    );

    if cli.print_head {
        let html = head.lock().unwrap_or_else(PoisonError::into_inner).render();
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{html}")?;
    }

    Ok(())
}

/// Record every non-empty line of stdin as an interaction.
async fn read_interactions(
    scheduler: &PreloadScheduler,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let name = line.trim();
                if name.is_empty() {
                    continue;
                }
                trace!(name, "interaction");
                scheduler.record_interaction(name);
            }
        }
    }
    Ok(())
}
