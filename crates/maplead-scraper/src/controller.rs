//! Lifecycle of the single scrape job the service runs at a time.
//!
//! [`ScrapeController`] owns the job state, the record buffer and the
//! cancellation token of the current job. `start` spawns the job on the tokio
//! runtime and returns immediately; the job exports its records once the loop
//! has ended and only then publishes its terminal state.

use crate::scrape_loop::{run_scrape, LoopSettings};
use crate::session::SessionLauncher;
use chrono::{DateTime, Utc};
use maplead_core::{JobParameters, JobState, Record, ScrapingConfig};
use maplead_export::{ExportOutcome, Exporter};
use serde::Serialize;
use std::any::Any;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Errors returned by [`ScrapeController::start`].
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A job is running or stopping
    #[error("a scrape job is already running")]
    AlreadyRunning,

    /// The parameters failed validation
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    /// No job was running; nothing changed
    NotRunning,
    /// Cancellation was signalled to the running job
    Stopping,
}

/// Settings the controller hands to every job.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Loop timing and termination
    pub loop_settings: LoopSettings,
    /// Capacity of the channel between loop and buffer
    pub channel_capacity: usize,
}

impl From<&ScrapingConfig> for ControllerSettings {
    fn from(config: &ScrapingConfig) -> Self {
        Self {
            loop_settings: LoopSettings::from(config),
            channel_capacity: config.channel_capacity.max(1),
        }
    }
}

/// Snapshot of the current (or last) job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    /// Lifecycle state, serialized as `state` plus an optional `message`
    #[serde(flatten)]
    pub state: JobState,
    /// Id of the current or last job
    pub job_id: Option<Uuid>,
    /// When the job was started
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached its terminal state
    pub finished_at: Option<DateTime<Utc>>,
    /// Records collected so far
    pub records: usize,
    /// Export result, once the job has finished
    pub export: Option<ExportOutcome>,
}

impl JobStatus {
    fn idle() -> Self {
        Self {
            state: JobState::Idle,
            job_id: None,
            started_at: None,
            finished_at: None,
            records: 0,
            export: None,
        }
    }

    fn running(job_id: Uuid) -> Self {
        Self {
            state: JobState::Running,
            job_id: Some(job_id),
            started_at: Some(Utc::now()),
            ..Self::idle()
        }
    }
}

struct Shared {
    status: watch::Sender<JobStatus>,
    records: RwLock<Vec<Record>>,
    cancel: Mutex<CancellationToken>,
}

impl Shared {
    fn push(&self, record: Record) {
        let count = {
            let mut records = self.records.write().expect("RwLock poisoned: records");
            records.push(record);
            records.len()
        };
        self.status.send_modify(|status| status.records = count);
    }

    fn snapshot(&self) -> Vec<Record> {
        self.records
            .read()
            .expect("RwLock poisoned: records")
            .clone()
    }
}

/// Runs at most one scrape job at a time.
pub struct ScrapeController {
    launcher: Arc<dyn SessionLauncher>,
    exporter: Arc<dyn Exporter>,
    settings: ControllerSettings,
    shared: Arc<Shared>,
}

impl ScrapeController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        exporter: Arc<dyn Exporter>,
        settings: ControllerSettings,
    ) -> Self {
        let (status, _) = watch::channel(JobStatus::idle());
        Self {
            launcher,
            exporter,
            settings,
            shared: Arc::new(Shared {
                status,
                records: RwLock::new(Vec::new()),
                cancel: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// Start a job and return its id.
    ///
    /// Must be called from within a tokio runtime. A rejected start leaves the
    /// current job untouched.
    pub fn start(&self, params: JobParameters) -> Result<Uuid, ControllerError> {
        params
            .validate()
            .map_err(|e| ControllerError::InvalidParameters(e.to_string()))?;

        let job_id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        // Claim, reset and install the token under the status lock so a
        // concurrent stop always sees this job's token.
        let mut claimed = false;
        self.shared.status.send_if_modified(|status| {
            if status.state.is_active() {
                return false;
            }
            self.shared
                .records
                .write()
                .expect("RwLock poisoned: records")
                .clear();
            *self.shared.cancel.lock().expect("Mutex poisoned: cancel") = cancel.clone();
            *status = JobStatus::running(job_id);
            claimed = true;
            true
        });
        if !claimed {
            tracing::warn!("Rejected start: a job is already running");
            return Err(ControllerError::AlreadyRunning);
        }

        tracing::info!(%job_id, "Scrape job started");
        let job = tokio::spawn(run_job(
            Arc::clone(&self.shared),
            Arc::clone(&self.launcher),
            Arc::clone(&self.exporter),
            self.settings.clone(),
            params,
            cancel,
        ));
        tokio::spawn(supervise(Arc::clone(&self.shared), job));
        Ok(job_id)
    }

    /// Ask the running job to stop. Does not wait for it.
    pub fn stop(&self) -> StopOutcome {
        let mut outcome = StopOutcome::NotRunning;
        self.shared.status.send_if_modified(|status| {
            if status.state != JobState::Running {
                return false;
            }
            self.shared
                .cancel
                .lock()
                .expect("Mutex poisoned: cancel")
                .cancel();
            status.state = JobState::Stopping;
            outcome = StopOutcome::Stopping;
            true
        });
        if outcome == StopOutcome::Stopping {
            tracing::info!("Stop requested");
        }
        outcome
    }

    /// Current job status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.shared.status.borrow().clone()
    }

    /// Records collected by the current or last job.
    #[must_use]
    pub fn results(&self) -> Vec<Record> {
        self.shared.snapshot()
    }

    /// Wait until no job is running and return the final status.
    pub async fn wait(&self) -> JobStatus {
        let mut rx = self.shared.status.subscribe();
        let status = match rx.wait_for(|status| !status.state.is_active()).await {
            Ok(status) => status.clone(),
            // The sender lives in `self`, so it cannot be gone while we borrow it.
            Err(_) => self.status(),
        };
        status
    }

    /// Where the exporter writes.
    #[must_use]
    pub fn output_path(&self) -> &std::path::Path {
        self.exporter.output_path()
    }
}

/// Publish an error state when the job task dies without finishing.
async fn supervise(shared: Arc<Shared>, job: JoinHandle<()>) {
    let Err(err) = job.await else {
        return;
    };
    let message = if err.is_panic() {
        format!("job panicked: {}", panic_message(err.into_panic().as_ref()))
    } else {
        format!("job aborted: {err}")
    };
    tracing::error!("Scrape job ended abnormally: {}", message);
    shared.status.send_modify(|status| {
        status.state = JobState::Error(message);
        status.finished_at = Some(Utc::now());
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

async fn run_job(
    shared: Arc<Shared>,
    launcher: Arc<dyn SessionLauncher>,
    exporter: Arc<dyn Exporter>,
    settings: ControllerSettings,
    params: JobParameters,
    cancel: CancellationToken,
) {
    let (tx, mut rx) = mpsc::channel(settings.channel_capacity);

    let scrape = run_scrape(
        launcher.as_ref(),
        &params,
        &settings.loop_settings,
        &cancel,
        tx,
    );
    let collect = async {
        while let Some(record) = rx.recv().await {
            shared.push(record);
        }
    };
    let (result, ()) = tokio::join!(scrape, collect);

    let mut state = match result {
        Ok(_) if cancel.is_cancelled() => JobState::Stopped,
        Ok(_) => JobState::Completed,
        Err(e) => JobState::Error(e.to_string()),
    };

    let records = shared.snapshot();
    let include_website = params.filters.include_website_column();
    let export = tokio::task::spawn_blocking(move || exporter.export(&records, include_website))
        .await
        .map_err(|e| e.to_string())
        .and_then(|res| res.map_err(|e| e.to_string()));

    let export = match export {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            if !matches!(state, JobState::Error(_)) {
                state = JobState::Error(format!("export failed: {e}"));
            }
            None
        }
    };

    tracing::info!(state = %state, "Scrape job finished");
    shared.status.send_modify(|status| {
        status.state = state;
        status.finished_at = Some(Utc::now());
        status.export = export;
    });
}
