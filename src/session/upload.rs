//! Uploaded clips: the bytes go to a temporary file, which is processed to
//! exhaustion and then removed.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::TempPath;
use tokio_util::sync::CancellationToken;

use crate::engine::{FrameProcessor, FrameReport};
use crate::inference::PoseSource;
use crate::metrics::MetricsCollector;
use crate::models::SessionSummary;

use super::pipeline::{run_session, SessionOptions};
use super::source::FrameSource;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// An upload materialized on disk. Call [`UploadedClip::release`] when done;
/// dropping it also removes the file, but silently.
pub struct UploadedClip {
    path: TempPath,
}

impl UploadedClip {
    pub fn materialize(bytes: &[u8], suffix: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("formcoach-upload-")
            .suffix(suffix)
            .tempfile()
            .context("failed to create temporary upload file")?;
        file.write_all(bytes)
            .context("failed to write temporary upload file")?;
        file.flush()?;

        let path = file.into_temp_path();
        log_info!("upload of {} bytes stored at {}", bytes.len(), path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file. Failure is logged, never escalated: a leftover temp
    /// file does not affect the session's results.
    pub fn release(self) {
        let display: PathBuf = self.path.to_path_buf();
        if let Err(err) = self.path.close() {
            log_warn!("unable to delete temporary file {}: {err}", display.display());
        }
    }
}

/// Processes an uploaded clip end to end.
///
/// `open` turns the temporary file into a frame source. The file is released
/// on every exit path, including when `open` or processing fails.
pub async fn process_upload<S, P, O, F>(
    bytes: &[u8],
    suffix: &str,
    open: O,
    processor: FrameProcessor<P>,
    options: SessionOptions,
    telemetry: MetricsCollector,
    on_frame: F,
) -> Result<SessionSummary>
where
    S: FrameSource + Send + 'static,
    P: PoseSource + Send + 'static,
    O: FnOnce(&Path) -> Result<S>,
    F: FnMut(u64, &FrameReport) + Send,
{
    let clip = UploadedClip::materialize(bytes, suffix)?;

    let result = match open(clip.path()) {
        Ok(source) => {
            run_session(
                source,
                processor,
                options,
                CancellationToken::new(),
                telemetry,
                on_frame,
            )
            .await
        }
        Err(err) => Err(err.context("failed to open uploaded clip")),
    };

    clip.release();
    result
}
