use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use review_digest::publisher::{PublishJob, Publisher};
use review_digest::scheduler::{
    DailyCadence, JobError, ScheduledJob, Scheduler, SchedulerError, SchedulerExit,
};
use review_digest::test_support::{MemoryArtifactStore, StubFetcher, VirtualClock};
use review_digest::{ConfigSource, PublishInterval, Settings, TimeOfDay};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

/// Delegates to the publish job and cancels after `limit` runs.
struct LimitedJob {
    inner: PublishJob,
    runs: AtomicUsize,
    limit: usize,
    shutdown: CancellationToken,
}

#[async_trait]
impl ScheduledJob for LimitedJob {
    async fn run(&self, fired_at: DateTime<Utc>) -> Result<(), JobError> {
        let result = self.inner.run(fired_at).await;
        if self.runs.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit {
            self.shutdown.cancel();
        }
        result
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
}

async fn run_days(
    interval_days: u32,
    days: usize,
    store: Arc<MemoryArtifactStore>,
    fetcher: Arc<StubFetcher>,
) -> Result<SchedulerExit, SchedulerError> {
    let settings = Settings::new(
        TimeOfDay::new(9, 0).unwrap(),
        PublishInterval::from_days(interval_days).unwrap(),
        "42",
    )
    .unwrap();
    let publisher = Arc::new(Publisher::from_config(&settings, fetcher, store));
    let shutdown = CancellationToken::new();
    let job = Arc::new(LimitedJob {
        inner: PublishJob::new(publisher),
        runs: AtomicUsize::new(0),
        limit: days,
        shutdown: shutdown.clone(),
    });

    let cadence = DailyCadence::new(Utc, settings.publish_time());
    Scheduler::new(cadence, Arc::new(VirtualClock::new(start())))
        .run(job, shutdown)
        .await
}

#[tokio::test(start_paused = true)]
async fn daily_interval_produces_every_day() {
    let store = Arc::new(MemoryArtifactStore::new("out"));
    let fetcher = Arc::new(StubFetcher::default());

    let exit = run_days(1, 3, store.clone(), fetcher.clone()).await.unwrap();

    assert_eq!(exit, SchedulerExit::Cancelled { runs: 3 });
    let expected: Vec<String> = [2, 3, 4]
        .iter()
        .flat_map(|day| {
            let ts = Utc.with_ymd_and_hms(2024, 1, *day, 9, 0, 0).unwrap().timestamp();
            [format!("{ts}.json"), format!("{ts}.md")]
        })
        .collect();
    assert_eq!(store.names(), expected);
    assert_eq!(fetcher.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn two_day_interval_reuses_every_other_day() {
    let store = Arc::new(MemoryArtifactStore::new("out"));
    let fetcher = Arc::new(StubFetcher::default());

    run_days(2, 3, store.clone(), fetcher.clone()).await.unwrap();

    assert_eq!(fetcher.call_count(), 2);
    assert_eq!(store.write_count(), 4);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn failing_fetch_is_logged_and_scheduler_keeps_going() {
    let store = Arc::new(MemoryArtifactStore::new("out"));
    let fetcher = Arc::new(StubFetcher::default());
    fetcher.set_should_fail(true);

    let exit = run_days(1, 2, store.clone(), fetcher.clone()).await.unwrap();

    assert_eq!(exit, SchedulerExit::Cancelled { runs: 2 });
    assert_eq!(fetcher.call_count(), 2);
    assert!(store.names().is_empty());
    assert!(logs_contain("scheduled run failed, re-arming"));
}
