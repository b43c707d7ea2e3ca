use std::{path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};

use crate::db::{Database, Workout, WorkoutInfo, WorkoutMode, WorkoutStatus};
use crate::engine::{FrameProcessor, FrameReport};
use crate::inference::{PoseSource, SharedClassifier};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::models::{ExerciseVariant, FrameMetrics, SessionSummary};
use crate::session::{process_upload, FrameSource, LiveSession, LiveUpdate, SessionOptions};
use crate::settings::SettingsStore;

use super::WorkoutState;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSnapshot {
    pub state: WorkoutState,
    pub latest: Option<FrameMetrics>,
    pub progress: Option<SessionSummary>,
    pub telemetry: MetricsSnapshot,
}

/// Owns at most one active workout at a time and records every workout it
/// runs in the database.
#[derive(Clone)]
pub struct WorkoutController {
    state: Arc<Mutex<WorkoutState>>,
    db: Database,
    settings: Arc<SettingsStore>,
    classifier: SharedClassifier,
    telemetry: MetricsCollector,
    live: Arc<Mutex<LiveSession>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl WorkoutController {
    pub fn new(db: Database, settings: Arc<SettingsStore>, classifier: SharedClassifier) -> Self {
        Self {
            state: Arc::new(Mutex::new(WorkoutState::new())),
            db,
            settings,
            classifier,
            telemetry: MetricsCollector::new(),
            live: Arc::new(Mutex::new(LiveSession::new())),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn get_state(&self) -> WorkoutState {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> WorkoutSnapshot {
        let state = self.get_state().await;
        let (latest, progress) = {
            let live = self.live.lock().await;
            (live.latest(), live.progress())
        };
        WorkoutSnapshot {
            state,
            latest,
            progress,
            telemetry: self.telemetry.get_snapshot().await,
        }
    }

    /// Receiver for the running live stream. The sender closes once the
    /// stream stops pulling frames.
    pub async fn subscribe(&self) -> Option<watch::Receiver<LiveUpdate>> {
        self.live.lock().await.subscribe()
    }

    /// Marks a workout left `Running` by a previous crash as `Interrupted`.
    pub async fn recover_incomplete(&self) -> Result<Option<WorkoutInfo>> {
        let Some(mut workout) = self.db.get_incomplete_workout().await? else {
            return Ok(None);
        };

        log_warn!(
            "Recovered incomplete workout {}; marking as Interrupted",
            workout.id
        );
        let stopped_at = Utc::now();
        self.db
            .mark_workout_interrupted(&workout.id, stopped_at)
            .await?;
        workout.status = WorkoutStatus::Interrupted;
        workout.stopped_at = Some(stopped_at);
        Ok(Some(WorkoutInfo::from(workout)))
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<WorkoutInfo>> {
        let workouts = self.db.list_workouts(limit).await?;
        Ok(workouts.into_iter().map(WorkoutInfo::from).collect())
    }

    fn processor<P: PoseSource>(
        &self,
        variant: ExerciseVariant,
        pose: P,
    ) -> Result<FrameProcessor<P>> {
        let config = self.settings.get().processor_config(variant);
        FrameProcessor::new(config, pose, self.classifier.clone())
    }

    /// Takes the idle controller for `workout`. The check and the claim share
    /// one lock so concurrent starts cannot both get through.
    async fn claim(&self, workout: &Workout) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.is_idle() {
            return Err(anyhow!("workout already active"));
        }
        state.begin(
            workout.id.clone(),
            workout.exercise,
            workout.mode,
            workout.started_at,
        );
        Ok(())
    }

    /// Returns to idle unless another workout has taken over since.
    async fn release(&self, workout_id: &str) {
        let mut state = self.state.lock().await;
        if state.holds(workout_id) {
            state.reset();
        }
    }

    /// Starts a live workout streaming from `source`.
    pub async fn start_live<S, P>(
        &self,
        variant: ExerciseVariant,
        source: S,
        pose: P,
    ) -> Result<WorkoutState>
    where
        S: FrameSource + Send + 'static,
        P: PoseSource + Send + 'static,
    {
        let settings = self.settings.get();
        let processor = self.processor(variant, pose)?;

        let workout = Workout::start(variant, WorkoutMode::Live, Utc::now());
        self.claim(&workout).await?;
        if let Err(err) = self.db.insert_workout(&workout).await {
            self.release(&workout.id).await;
            return Err(err);
        }

        self.telemetry.reset().await;
        let options = SessionOptions::live(settings.live.frame_delay_ms, settings.live.mirror);
        let started = self
            .live
            .lock()
            .await
            .start(source, processor, options, self.telemetry.clone());

        let updates = match started {
            Ok(updates) => updates,
            Err(err) => {
                self.release(&workout.id).await;
                self.db
                    .finish_workout(
                        &workout.id,
                        WorkoutStatus::Cancelled,
                        SessionSummary::default(),
                        Utc::now(),
                    )
                    .await?;
                return Err(err);
            }
        };

        self.spawn_ticker(workout.id.clone(), updates, settings.heartbeat_every_frames())
            .await;

        log_info!("live {} workout {} started", variant, workout.id);
        Ok(self.get_state().await)
    }

    /// Stops the live stream and records the final counts as `Completed`.
    ///
    /// A stream that died on a pose or classifier error is recorded as
    /// `Interrupted` with its last published counters and the error returned.
    pub async fn end_workout(&self) -> Result<WorkoutInfo> {
        let state_snapshot = {
            let state = self.state.lock().await;
            if state.is_idle() || state.mode != Some(WorkoutMode::Live) {
                return Err(anyhow!("no active live workout to end"));
            }
            state.clone()
        };
        let workout_id = state_snapshot
            .workout_id
            .clone()
            .ok_or_else(|| anyhow!("missing workout id"))?;

        self.cancel_ticker().await;
        let (last_progress, stopped) = {
            let mut live = self.live.lock().await;
            let last_progress = live.progress().unwrap_or_default();
            (last_progress, live.stop().await)
        };
        self.release(&workout_id).await;

        let stopped_at = Utc::now();
        let summary = match stopped {
            Ok(summary) => summary,
            Err(err) => {
                log_error!("live workout {workout_id} failed: {err:#}");
                self.db
                    .finish_workout(&workout_id, WorkoutStatus::Interrupted, last_progress, stopped_at)
                    .await?;
                return Err(err);
            }
        };

        self.db
            .finish_workout(&workout_id, WorkoutStatus::Completed, summary, stopped_at)
            .await?;
        log_info!("workout {workout_id} completed with {} reps", summary.reps);

        self.db
            .get_workout(&workout_id)
            .await?
            .map(WorkoutInfo::from)
            .ok_or_else(|| anyhow!("workout {workout_id} vanished after completion"))
    }

    /// Abandons the active live workout. A no-op when idle.
    pub async fn cancel_workout(&self) -> Result<()> {
        let workout_id = {
            let state = self.state.lock().await;
            if state.is_idle() || state.mode != Some(WorkoutMode::Live) {
                return Ok(());
            }
            state
                .workout_id
                .clone()
                .ok_or_else(|| anyhow!("no active workout to cancel"))?
        };

        self.cancel_ticker().await;
        let summary = {
            let mut live = self.live.lock().await;
            let last_progress = live.progress().unwrap_or_default();
            match live.stop().await {
                Ok(summary) => summary,
                Err(err) => {
                    log_warn!("live stream ended with an error while cancelling: {err:#}");
                    last_progress
                }
            }
        };
        self.release(&workout_id).await;

        self.db
            .finish_workout(&workout_id, WorkoutStatus::Cancelled, summary, Utc::now())
            .await?;
        log_info!("workout {workout_id} cancelled");
        Ok(())
    }

    /// Runs an uploaded clip to exhaustion as its own workout.
    ///
    /// The workout is `Completed` when the clip was processed and
    /// `Interrupted` when opening or processing it failed.
    pub async fn process_upload_workout<S, P, O, F>(
        &self,
        variant: ExerciseVariant,
        bytes: &[u8],
        suffix: &str,
        open: O,
        pose: P,
        mut on_frame: F,
    ) -> Result<WorkoutInfo>
    where
        S: FrameSource + Send + 'static,
        P: PoseSource + Send + 'static,
        O: FnOnce(&Path) -> Result<S>,
        F: FnMut(u64, &FrameReport) + Send,
    {
        let settings = self.settings.get();
        let processor = self.processor(variant, pose)?;

        let workout = Workout::start(variant, WorkoutMode::Upload, Utc::now());
        self.claim(&workout).await?;
        if let Err(err) = self.db.insert_workout(&workout).await {
            self.release(&workout.id).await;
            return Err(err);
        }

        self.telemetry.reset().await;
        let mut last_progress = SessionSummary::default();
        let result = process_upload(
            bytes,
            suffix,
            open,
            processor,
            SessionOptions::upload(settings.upload.frame_delay_ms),
            self.telemetry.clone(),
            |index, report| {
                last_progress = report.progress;
                on_frame(index, report);
            },
        )
        .await;

        self.release(&workout.id).await;
        let stopped_at = Utc::now();

        match result {
            Ok(summary) => {
                self.db
                    .finish_workout(&workout.id, WorkoutStatus::Completed, summary, stopped_at)
                    .await?;
                log_info!(
                    "upload workout {} completed with {} reps",
                    workout.id,
                    summary.reps
                );
                Ok(WorkoutInfo::from(Workout {
                    status: WorkoutStatus::Completed,
                    stopped_at: Some(stopped_at),
                    reps: summary.reps,
                    correct_form_frames: summary.correct_form_frames,
                    total_frames: summary.total_frames,
                    skipped_frames: summary.skipped_frames,
                    updated_at: stopped_at,
                    ..workout
                }))
            }
            Err(err) => {
                log_error!("upload workout {} failed: {err:#}", workout.id);
                self.db
                    .finish_workout(&workout.id, WorkoutStatus::Interrupted, last_progress, stopped_at)
                    .await?;
                Err(err)
            }
        }
    }

    async fn spawn_ticker(
        &self,
        workout_id: String,
        mut updates: watch::Receiver<LiveUpdate>,
        heartbeat_every_frames: u32,
    ) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let db = self.db.clone();
        let heartbeat_every = u64::from(heartbeat_every_frames.max(1));

        let handle = tokio::spawn(async move {
            let mut persisted_at_frame: u64 = 0;
            loop {
                let closed = updates.changed().await.is_err();
                let update = *updates.borrow_and_update();

                if closed {
                    // The stream ended on its own; keep the final counts until
                    // the workout is ended.
                    if let Err(err) = db
                        .update_workout_progress(&workout_id, update.progress, Utc::now())
                        .await
                    {
                        log_warn!("failed to persist final progress for {workout_id}: {err:#}");
                    }
                    let mut current = state.lock().await;
                    if current.holds(&workout_id) {
                        current.stop();
                    }
                    log_info!("live stream for workout {workout_id} ended");
                    break;
                }

                if update.frames_seen.saturating_sub(persisted_at_frame) >= heartbeat_every {
                    persisted_at_frame = update.frames_seen;
                    if let Err(err) = db
                        .update_workout_progress(&workout_id, update.progress, Utc::now())
                        .await
                    {
                        log_warn!("heartbeat for workout {workout_id} failed: {err:#}");
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
