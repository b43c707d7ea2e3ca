//! Replays landmarks extracted offline by an external pose estimator.
//!
//! The trace is JSON Lines, one frame per line in stream order:
//!
//! ```text
//! {"landmarks": [{"x": 0.51, "y": 0.32, "z": -0.1, "visibility": 0.99}, ...]}
//! {"landmarks": null}
//! ```
//!
//! A `null` (or absent) `landmarks` field records a frame with no detection.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::Arc,
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::CoachError;
use crate::models::{Frame, PoseLandmarks};

use super::PoseSource;

#[derive(Deserialize)]
struct TraceLine {
    #[serde(default)]
    landmarks: Option<PoseLandmarks>,
}

#[derive(Debug, Clone, Default)]
pub struct LandmarkTrace {
    frames: Arc<Vec<Option<PoseLandmarks>>>,
}

impl LandmarkTrace {
    pub fn new(frames: Vec<Option<PoseLandmarks>>) -> Self {
        Self {
            frames: Arc::new(frames),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| CoachError::unavailable("landmark trace", path, err))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to read landmark trace {}", path.display()))
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut frames = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: TraceLine = serde_json::from_str(&line)
                .with_context(|| format!("invalid trace entry on line {}", line_no + 1))?;
            frames.push(parsed.landmarks);
        }
        Ok(Self::new(frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn pose_source(&self) -> TracePoseSource {
        TracePoseSource {
            trace: self.clone(),
        }
    }
}

/// Looks up the recorded detection by frame index; frames past the end of
/// the trace have no detection.
#[derive(Debug, Clone)]
pub struct TracePoseSource {
    trace: LandmarkTrace,
}

impl PoseSource for TracePoseSource {
    fn detect(&mut self, frame: &Frame) -> Result<Option<PoseLandmarks>> {
        let detection = usize::try_from(frame.index)
            .ok()
            .and_then(|index| self.trace.frames.get(index))
            .cloned()
            .flatten();
        Ok(detection)
    }
}
