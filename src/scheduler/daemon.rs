use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::scheduler::cadence::{DailyCadence, ScheduleError};

/// Work the scheduler runs each time the alarm fires.
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    async fn run(&self, fired_at: DateTime<Utc>) -> Result<(), JobError>;
}

#[derive(Error, Debug)]
pub enum JobError {
    /// The run is skipped and the scheduler re-arms.
    #[error("transient job failure: {0}")]
    Transient(#[source] anyhow::Error),
    /// The scheduler stops.
    #[error("fatal job failure: {0}")]
    Fatal(#[source] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("scheduler stopped after {runs} run(s): {source}")]
    Job {
        runs: u64,
        #[source]
        source: JobError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    Cancelled { runs: u64 },
}

/// Wall clock that never reads earlier than the last scheduled fire.
struct NotBefore<'a> {
    clock: &'a dyn Clock,
    floor: Option<DateTime<Utc>>,
}

impl Clock for NotBefore<'_> {
    fn now(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        self.floor.map_or(now, |floor| now.max(floor))
    }
}

/// Single-shot alarm that re-arms itself after every run.
pub struct Scheduler<Tz: TimeZone> {
    cadence: DailyCadence<Tz>,
    clock: Arc<dyn Clock>,
}

impl<Tz> Scheduler<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Display + Send + Sync,
{
    pub fn new(cadence: DailyCadence<Tz>, clock: Arc<dyn Clock>) -> Self {
        Self { cadence, clock }
    }

    pub fn spawn<J: ScheduledJob>(
        self,
        job: Arc<J>,
        shutdown: CancellationToken,
    ) -> JoinHandle<Result<SchedulerExit, SchedulerError>> {
        tokio::spawn(self.run(job, shutdown))
    }

    /// Arms, waits, fires and re-arms until `shutdown` is cancelled or the
    /// job reports a fatal failure. A run in progress is never interrupted.
    pub async fn run<J: ScheduledJob>(
        self,
        job: Arc<J>,
        shutdown: CancellationToken,
    ) -> Result<SchedulerExit, SchedulerError> {
        let mut runs: u64 = 0;
        // A wall clock lagging the timer must not re-arm the target that just fired.
        let mut last_fire: Option<DateTime<Utc>> = None;

        loop {
            let tick = self.cadence.next_tick(&self.floored(last_fire))?;
            let next_local = tick.at.with_timezone(self.cadence.timezone());
            info!(
                next_run_utc = %tick.at.to_rfc3339(),
                next_run_local = %next_local.to_rfc3339(),
                wait_seconds = tick.wait.as_secs(),
                "scheduled next digest publication"
            );

            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!(runs, "scheduler cancelled");
                    return Ok(SchedulerExit::Cancelled { runs });
                }
                () = sleep(tick.wait) => {}
            }

            last_fire = Some(tick.at);
            let fired_at = self.floored(last_fire).now();
            runs += 1;

            let task_job = Arc::clone(&job);
            let outcome = tokio::spawn(async move { task_job.run(fired_at).await }).await;

            match outcome {
                Ok(Ok(())) => info!(
                    run = runs,
                    fired_at = %fired_at.to_rfc3339(),
                    "scheduled run completed"
                ),
                Ok(Err(JobError::Transient(err))) => {
                    warn!(run = runs, error = %err, "scheduled run failed, re-arming");
                }
                Ok(Err(fatal)) => {
                    error!(run = runs, error = %fatal, "scheduled run failed fatally, stopping");
                    return Err(SchedulerError::Job {
                        runs,
                        source: fatal,
                    });
                }
                Err(join_err) => {
                    error!(run = runs, error = %join_err, "scheduled run panicked, re-arming");
                }
            }
        }
    }

    fn floored(&self, floor: Option<DateTime<Utc>>) -> NotBefore<'_> {
        NotBefore {
            clock: self.clock.as_ref(),
            floor,
        }
    }
}
