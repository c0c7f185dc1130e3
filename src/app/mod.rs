pub mod shutdown;
pub mod tracing;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::adapter::{FsArtifactStore, RssReviewFetcher};
use crate::clock::{Clock, SystemClock};
use crate::config::{Cli, ConfigSource, LocalFileConfig, Settings};
use crate::publisher::{PublishJob, Publisher};
use crate::scheduler::{DailyCadence, Scheduler, SchedulerExit};

/// Application entry point. Loads settings, applies command line overrides
/// and either publishes once or runs the daily scheduler until a signal.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::init_tracing(cli.log_level.into());

    let settings = load_settings(&cli)?;
    let publisher = Arc::new(build_publisher(&cli, &settings)?);
    publisher
        .prepare()
        .await
        .context("failed to prepare digest directory")?;

    if cli.now {
        let outcome = publisher
            .publish_latest(SystemClock.now())
            .await
            .context("failed to publish digest")?;
        println!("Latest digest: {}", outcome.path().display());
        return Ok(());
    }

    let shutdown_token = CancellationToken::new();
    shutdown::cancel_on_signal(shutdown_token.clone());

    ::tracing::info!(
        app_id = settings.app_id(),
        publish_time = %settings.publish_time(),
        publish_interval = %settings.publish_interval(),
        location = %publisher.location().display(),
        "starting digest scheduler"
    );

    let cadence = DailyCadence::new(Local, settings.publish_time());
    let scheduler = Scheduler::new(cadence, Arc::new(SystemClock));
    let exit = scheduler
        .run(Arc::new(PublishJob::new(publisher)), shutdown_token)
        .await
        .context("digest scheduler stopped")?;

    match exit {
        SchedulerExit::Cancelled { runs } => {
            ::tracing::info!(runs, "digest scheduler shut down");
        }
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let file = LocalFileConfig::new(&cli.config);
    let loaded = file
        .load()
        .with_context(|| format!("failed to load settings from {}", file.path().display()))?;
    let (settings, changed) = cli
        .apply_to(loaded)
        .context("invalid command line override")?;
    if changed {
        file.save(&settings).context("failed to persist settings")?;
    }
    Ok(settings)
}

fn build_publisher(cli: &Cli, settings: &Settings) -> anyhow::Result<Publisher> {
    let fetcher = RssReviewFetcher::new(
        &cli.feed_base_url,
        settings.app_id(),
        Duration::from_secs(cli.fetch_timeout_secs),
    )
    .context("failed to build review fetcher")?;
    let store = FsArtifactStore::for_app(&cli.output_dir, settings.app_id());

    Ok(Publisher::from_config(
        settings,
        Arc::new(fetcher),
        Arc::new(store),
    ))
}
