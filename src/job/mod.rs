//! The single-flight "draw every satellite" batch job.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::predict::{EphemerisPort, Observer};
use crate::track::{render_view, RenderSink, ViewSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
    StopRequested,
}

/// One satellite to render.
pub struct ViewTask {
    pub name: String,
    pub ephemeris: Arc<dyn EphemerisPort>,
    pub settings: ViewSettings,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobFailure {
    pub satellite: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub rendered: Vec<String>,
    pub failed: Vec<JobFailure>,
    /// Ended by a stop request before every satellite was drawn.
    pub stopped: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobStatus {
    pub state: JobState,
    pub current: Option<String>,
    /// The running job's report, or the last finished one.
    pub report: Option<JobReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Accepted { run_id: Uuid },
    Busy,
}

struct Shared {
    state: JobState,
    current: Option<String>,
    report: Option<JobReport>,
    worker: Option<JoinHandle<()>>,
}

/// Coordinator owning the job state. Clones share the same job.
#[derive(Clone)]
pub struct BatchJob {
    shared: Arc<StdMutex<Shared>>,
}

impl Default for BatchJob {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchJob {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(StdMutex::new(Shared {
                state: JobState::Idle,
                current: None,
                report: None,
                worker: None,
            })),
        }
    }

    /// Starts rendering `tasks` on the blocking pool unless a job is already active.
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        tasks: Vec<ViewTask>,
        observer: Observer,
        sink: Arc<dyn RenderSink>,
    ) -> StartOutcome {
        let mut locked = lock(&self.shared);
        if locked.state != JobState::Idle {
            return StartOutcome::Busy;
        }

        let run_id = Uuid::new_v4();
        locked.state = JobState::Running;
        locked.current = None;
        locked.report = Some(JobReport {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            total: tasks.len(),
            rendered: Vec::new(),
            failed: Vec::new(),
            stopped: false,
        });
        log::info!("batch job {} started for {} satellites", run_id, tasks.len());

        let shared = self.shared.clone();
        locked.worker = Some(tokio::task::spawn_blocking(move || {
            run_batch(&shared, tasks, &observer, sink.as_ref())
        }));

        StartOutcome::Accepted { run_id }
    }

    /// Asks a running job to stop after the satellite in progress. Repeated calls and
    /// calls while idle have no further effect.
    pub fn stop(&self) -> JobState {
        let mut locked = lock(&self.shared);
        if locked.state == JobState::Running {
            locked.state = JobState::StopRequested;
            log::info!("batch job stop requested");
        }
        locked.state
    }

    pub fn status(&self) -> JobStatus {
        let locked = lock(&self.shared);
        JobStatus {
            state: locked.state,
            current: locked.current.clone(),
            report: locked.report.clone(),
        }
    }

    /// Waits for the current worker, if any, to finish.
    pub async fn join(&self) {
        let worker = lock(&self.shared).worker.take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                log::error!("batch job worker failed: {}", e);
                let mut locked = lock(&self.shared);
                locked.state = JobState::Idle;
                locked.current = None;
            }
        }
    }
}

fn run_batch(
    shared: &StdMutex<Shared>,
    tasks: Vec<ViewTask>,
    observer: &Observer,
    sink: &dyn RenderSink,
) {
    let mut stopped = false;

    for task in tasks {
        {
            let mut locked = lock(shared);
            if locked.state == JobState::StopRequested {
                stopped = true;
                break;
            }
            locked.current = Some(task.name.clone());
        }

        // a panicking render counts as that satellite's failure
        let result = match panic::catch_unwind(AssertUnwindSafe(|| {
            render_view(
                task.ephemeris.as_ref(),
                &task.name,
                observer,
                &task.settings,
                Utc::now(),
                sink,
            )
        })) {
            Ok(rendered) => rendered.map_err(|e| e.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        };

        let mut locked = lock(shared);
        let Some(report) = locked.report.as_mut() else {
            continue;
        };
        match result {
            Ok(summary) => {
                log::info!("{}: rendered to {}", task.name, summary.artifact);
                report.rendered.push(task.name);
            }
            Err(error) => {
                log::warn!("{}: render failed: {}", task.name, error);
                report.failed.push(JobFailure {
                    satellite: task.name,
                    error,
                });
            }
        }
    }

    let mut locked = lock(shared);
    if locked.state == JobState::StopRequested {
        stopped = true;
    }
    locked.state = JobState::Idle;
    locked.current = None;
    if let Some(report) = locked.report.as_mut() {
        report.finished_at = Some(Utc::now());
        report.stopped = stopped;
        log::info!(
            "batch job {} finished: {} rendered, {} failed{}",
            report.run_id,
            report.rendered.len(),
            report.failed.len(),
            if stopped { ", stopped" } else { "" }
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    format!("render panicked: {detail}")
}

/// Renders run outside the lock, so a poisoned guard still holds consistent state.
fn lock(shared: &StdMutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::fakes::{t0, ArcEphemeris};
    use crate::predict::{GeoPoint, PredictError, Topocentric};
    use crate::track::MemorySink;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    /// Takes a while per query.
    struct Slow(ArcEphemeris);

    impl EphemerisPort for Slow {
        fn subpoint(&self, t: DateTime<Utc>) -> Result<GeoPoint, PredictError> {
            std::thread::sleep(StdDuration::from_millis(10));
            self.0.subpoint(t)
        }

        fn topocentric(
            &self,
            observer: &Observer,
            t: DateTime<Utc>,
        ) -> Result<Topocentric, PredictError> {
            std::thread::sleep(StdDuration::from_millis(10));
            self.0.topocentric(observer, t)
        }

        fn epoch(&self) -> DateTime<Utc> {
            self.0.epoch()
        }
    }

    /// Panics on every query.
    struct Exploding;

    impl EphemerisPort for Exploding {
        fn subpoint(&self, _t: DateTime<Utc>) -> Result<GeoPoint, PredictError> {
            panic!("propagator blew up");
        }

        fn topocentric(
            &self,
            _observer: &Observer,
            _t: DateTime<Utc>,
        ) -> Result<Topocentric, PredictError> {
            panic!("propagator blew up");
        }

        fn epoch(&self) -> DateTime<Utc> {
            t0()
        }
    }

    fn tasks(n: usize, slow: bool) -> Vec<ViewTask> {
        (0..n)
            .map(|i| {
                let arc = ArcEphemeris {
                    epoch: t0(),
                    peaks: vec![(t0() + Duration::hours(1), 50.0)],
                    half_width_s: 300.0,
                };
                let ephemeris: Arc<dyn EphemerisPort> = if slow {
                    Arc::new(Slow(arc))
                } else {
                    Arc::new(arc)
                };
                ViewTask {
                    name: format!("SAT-{i}"),
                    ephemeris,
                    settings: ViewSettings {
                        path_resolution: 4,
                        ..ViewSettings::default()
                    },
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn second_start_is_busy() {
        let job = BatchJob::new();
        let sink = Arc::new(MemorySink::default());

        let first = job.start(tasks(20, true), Observer::default(), sink.clone());
        let second = job.start(tasks(20, true), Observer::default(), sink.clone());
        assert!(matches!(first, StartOutcome::Accepted { .. }));
        assert_eq!(second, StartOutcome::Busy);

        job.stop();
        job.join().await;
    }

    #[tokio::test]
    async fn stop_ends_the_job_early() {
        let job = BatchJob::new();
        let sink = Arc::new(MemorySink::default());

        let StartOutcome::Accepted { run_id } =
            job.start(tasks(20, true), Observer::default(), sink.clone())
        else {
            panic!("job should start");
        };
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        assert_eq!(job.stop(), JobState::StopRequested);
        assert_eq!(job.stop(), JobState::StopRequested);
        job.join().await;

        let status = job.status();
        assert_eq!(status.state, JobState::Idle);
        assert_eq!(status.current, None);
        let report = status.report.unwrap();
        assert_eq!(report.run_id, run_id);
        assert!(report.stopped);
        assert!(report.rendered.len() < 20);
        assert!(report.finished_at.is_some());
        assert_eq!(sink.views.lock().unwrap().len(), report.rendered.len());

        // idle again, so a new run is accepted
        let again = job.start(tasks(1, false), Observer::default(), sink.clone());
        assert!(matches!(again, StartOutcome::Accepted { .. }));
        job.join().await;
    }

    #[tokio::test]
    async fn failures_do_not_abort_siblings() {
        let job = BatchJob::new();
        let sink = Arc::new(MemorySink::default());
        let mut work = tasks(3, false);
        work[1].settings.path_resolution = 1;

        job.start(work, Observer::default(), sink);
        job.join().await;

        let report = job.status().report.unwrap();
        assert!(!report.stopped);
        assert_eq!(report.rendered, vec!["SAT-0".to_string(), "SAT-2".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].satellite, "SAT-1");
        assert_eq!(job.stop(), JobState::Idle);
    }

    #[tokio::test]
    async fn panicking_render_is_recorded_and_the_job_goes_idle() {
        let job = BatchJob::new();
        let sink = Arc::new(MemorySink::default());
        let mut work = tasks(3, false);
        work[1].ephemeris = Arc::new(Exploding);

        job.start(work, Observer::default(), sink.clone());
        // poll status the way the HTTP API does, without join()
        let mut state = job.status().state;
        for _ in 0..200 {
            if state == JobState::Idle {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
            state = job.status().state;
        }
        assert_eq!(state, JobState::Idle);

        let report = job.status().report.unwrap();
        assert_eq!(report.rendered, vec!["SAT-0".to_string(), "SAT-2".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].satellite, "SAT-1");
        assert!(report.failed[0].error.contains("propagator blew up"));
        assert!(report.finished_at.is_some());

        let again = job.start(tasks(1, false), Observer::default(), sink);
        assert!(matches!(again, StartOutcome::Accepted { .. }));
        job.join().await;
    }
}
