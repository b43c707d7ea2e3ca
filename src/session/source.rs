//! Frame sources: where a session pulls its frames from.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader, Seek},
    path::Path,
};

use anyhow::{Context, Result};
use image::{codecs::gif::GifDecoder, AnimationDecoder, DynamicImage, RgbImage};

use crate::error::CoachError;
use crate::models::Frame;

pub trait FrameSource {
    /// `Ok(None)` ends the stream; `Err` is a read failure.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}

/// An animated GIF clip, decoded up front.
pub struct GifClip {
    frames: VecDeque<RgbImage>,
    next_index: u64,
}

impl GifClip {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| CoachError::unavailable("video clip", path, err))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to decode clip {}", path.display()))
    }

    pub fn from_reader<R: BufRead + Seek>(reader: R) -> Result<Self> {
        let decoder = GifDecoder::new(reader).context("not a GIF stream")?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .context("failed to decode GIF frames")?
            .into_iter()
            .map(|frame| DynamicImage::ImageRgba8(frame.into_buffer()).into_rgb8())
            .collect();

        Ok(Self {
            frames,
            next_index: 0,
        })
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for GifClip {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(image) = self.frames.pop_front() else {
            return Ok(None);
        };
        let frame = Frame::new(self.next_index, image);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// A fixed number of 1x1 frames, for landmark traces replayed without video.
pub struct PlaceholderFrames {
    next_index: u64,
    count: u64,
}

impl PlaceholderFrames {
    pub fn new(count: u64) -> Self {
        Self {
            next_index: 0,
            count,
        }
    }
}

impl FrameSource for PlaceholderFrames {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next_index >= self.count {
            return Ok(None);
        }
        let frame = Frame::placeholder(self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}
