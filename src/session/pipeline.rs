use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::engine::{FrameProcessor, FrameReport};
use crate::inference::PoseSource;
use crate::metrics::MetricsCollector;
use crate::models::SessionSummary;

use super::source::FrameSource;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Delay before each frame is pulled.
    pub pacing: Duration,
    /// Flip frames horizontally before pose detection (selfie view).
    pub mirror: bool,
}

impl SessionOptions {
    pub fn live(frame_delay_ms: u64, mirror: bool) -> Self {
        Self {
            pacing: Duration::from_millis(frame_delay_ms),
            mirror,
        }
    }

    pub fn upload(frame_delay_ms: u64) -> Self {
        Self {
            pacing: Duration::from_millis(frame_delay_ms),
            mirror: false,
        }
    }
}

enum Step {
    Processed { index: u64, report: FrameReport },
    Exhausted,
    SourceFailed(anyhow::Error),
}

struct Pipeline<S, P> {
    source: S,
    processor: FrameProcessor<P>,
    mirror: bool,
}

impl<S, P> Pipeline<S, P>
where
    S: FrameSource + Send + 'static,
    P: PoseSource + Send + 'static,
{
    fn step(&mut self) -> Result<Step> {
        let mut frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(Step::Exhausted),
            Err(err) => return Ok(Step::SourceFailed(err)),
        };
        if self.mirror {
            frame.mirror();
        }
        let report = self.processor.process_frame(&frame)?;
        Ok(Step::Processed {
            index: frame.index,
            report,
        })
    }

    /// Frame reads and model calls block; run them off the async workers.
    async fn step_blocking(mut self) -> Result<(Self, Result<Step>)> {
        tokio::task::spawn_blocking(move || {
            let step = self.step();
            (self, step)
        })
        .await
        .context("frame worker join failed")
    }
}

/// Pulls frames until the source ends, a read fails, or `cancel` fires.
///
/// A failed frame read ends the session cleanly with whatever was counted so
/// far; a processing error (pose or classifier) is returned. `on_frame` sees
/// every frame, including skipped ones.
pub async fn run_session<S, P, F>(
    source: S,
    processor: FrameProcessor<P>,
    options: SessionOptions,
    cancel: CancellationToken,
    telemetry: MetricsCollector,
    mut on_frame: F,
) -> Result<SessionSummary>
where
    S: FrameSource + Send + 'static,
    P: PoseSource + Send + 'static,
    F: FnMut(u64, &FrameReport) + Send,
{
    let variant = processor.config().variant;
    let mut pipeline = Pipeline {
        source,
        processor,
        mirror: options.mirror,
    };

    log_info!("{} session started", variant);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log_info!("session cancelled, no more frames pulled");
                break;
            }
            _ = tokio::time::sleep(options.pacing) => {}
        }

        let (returned, step) = pipeline.step_blocking().await?;
        pipeline = returned;

        match step? {
            Step::Processed { index, report } => {
                telemetry
                    .record_frame(index, report.metrics.is_some(), report.timings)
                    .await;
                on_frame(index, &report);
            }
            Step::Exhausted => {
                log_info!("frame source exhausted");
                break;
            }
            Step::SourceFailed(err) => {
                log_error!("failed to read frame, ending session: {err:#}");
                break;
            }
        }
    }

    let summary = pipeline.processor.summary();
    log_info!(
        "{} session finished: {} reps over {} frames ({} skipped), form accuracy {:.2}%",
        variant,
        summary.reps,
        summary.total_frames,
        summary.skipped_frames,
        summary.form_accuracy_percent
    );
    Ok(summary)
}
