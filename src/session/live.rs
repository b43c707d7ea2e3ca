use anyhow::{anyhow, bail, Context, Result};
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::FrameProcessor;
use crate::inference::PoseSource;
use crate::metrics::MetricsCollector;
use crate::models::{FrameMetrics, SessionSummary};

use super::pipeline::{run_session, SessionOptions};
use super::source::FrameSource;

/// What a live stream publishes after every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiveUpdate {
    /// Last frame with a detection; skipped frames leave it in place.
    pub latest: Option<FrameMetrics>,
    pub progress: SessionSummary,
    /// Frames pulled so far, skipped ones included.
    pub frames_seen: u64,
}

/// A live stream running on its own task until stopped.
pub struct LiveSession {
    handle: Option<JoinHandle<Result<SessionSummary>>>,
    cancel_token: Option<CancellationToken>,
    updates_rx: Option<watch::Receiver<LiveUpdate>>,
}

impl LiveSession {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            updates_rx: None,
        }
    }

    pub fn start<S, P>(
        &mut self,
        source: S,
        processor: FrameProcessor<P>,
        options: SessionOptions,
        telemetry: MetricsCollector,
    ) -> Result<watch::Receiver<LiveUpdate>>
    where
        S: FrameSource + Send + 'static,
        P: PoseSource + Send + 'static,
    {
        if self.handle.is_some() {
            bail!("live session already active");
        }

        let cancel_token = CancellationToken::new();
        let (updates_tx, updates_rx) = watch::channel(LiveUpdate::default());

        let handle = tokio::spawn(run_session(
            source,
            processor,
            options,
            cancel_token.clone(),
            telemetry,
            move |_, report| {
                // send_modify never fails, even with every receiver gone.
                updates_tx.send_modify(|update| {
                    if report.metrics.is_some() {
                        update.latest = report.metrics;
                    }
                    update.progress = report.progress;
                    update.frames_seen += 1;
                });
            },
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.updates_rx = Some(updates_rx.clone());
        Ok(updates_rx)
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Another receiver for the running stream's updates.
    pub fn subscribe(&self) -> Option<watch::Receiver<LiveUpdate>> {
        self.updates_rx.clone()
    }

    pub fn latest(&self) -> Option<FrameMetrics> {
        self.updates_rx.as_ref().and_then(|rx| rx.borrow().latest)
    }

    pub fn progress(&self) -> Option<SessionSummary> {
        self.updates_rx.as_ref().map(|rx| rx.borrow().progress)
    }

    /// Stops pulling frames and waits for the loop to hand back its summary.
    pub async fn stop(&mut self) -> Result<SessionSummary> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.updates_rx = None;

        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("no live session to stop"))?;
        let summary = handle.await.context("live session task failed to join")??;
        info!("live session stopped after {} reps", summary.reps);
        Ok(summary)
    }
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::engine::test_support::{arm_pose, ConstantClassifier, ScriptedPose};
    use crate::engine::ProcessorConfig;
    use crate::models::ExerciseVariant;
    use crate::session::PlaceholderFrames;

    fn processor(script: Vec<Option<crate::models::PoseLandmarks>>) -> FrameProcessor<ScriptedPose> {
        FrameProcessor::new(
            ProcessorConfig::for_variant(ExerciseVariant::BicepCurl),
            ScriptedPose::new(script),
            Arc::new(ConstantClassifier(0.9)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn reports_summary_after_source_exhausts() {
        let script = vec![Some(arm_pose(150.0)), None, Some(arm_pose(50.0))];
        let mut session = LiveSession::new();
        let mut rx = session
            .start(
                PlaceholderFrames::new(3),
                processor(script),
                SessionOptions::live(0, true),
                MetricsCollector::new(),
            )
            .unwrap();

        while rx.borrow_and_update().frames_seen < 3 {
            rx.changed().await.unwrap();
        }
        let update = *rx.borrow();
        assert_eq!(update.latest.unwrap().reps, 1);
        assert_eq!(update.progress.skipped_frames, 1);

        let summary = session.stop().await.unwrap();
        assert_eq!(summary.reps, 1);
        assert_eq!(summary.total_frames, 2);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn stop_cancels_an_endless_stream() {
        let script = (0..10_000).map(|_| Some(arm_pose(150.0))).collect();
        let mut session = LiveSession::new();
        session
            .start(
                PlaceholderFrames::new(10_000),
                processor(script),
                SessionOptions::live(5, false),
                MetricsCollector::new(),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(session.is_active());
        let summary = session.stop().await.unwrap();
        assert!(summary.total_frames < 10_000);
        assert_eq!(summary.reps, 0);
    }

    #[tokio::test]
    async fn refuses_second_start() {
        let mut session = LiveSession::new();
        session
            .start(
                PlaceholderFrames::new(100),
                processor(vec![]),
                SessionOptions::live(10, false),
                MetricsCollector::new(),
            )
            .unwrap();
        let second = session.start(
            PlaceholderFrames::new(1),
            processor(vec![]),
            SessionOptions::live(10, false),
            MetricsCollector::new(),
        );
        assert!(second.is_err());
        session.stop().await.unwrap();
    }
}
