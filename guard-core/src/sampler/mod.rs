//! Representative frame sampling.
//!
//! A video is reduced to four stills taken at fixed relative positions plus
//! one small preview thumbnail. The four positions are
//! `{0.1s, 40%, 70%, 90%}` of the duration; the thumbnail is derived from the
//! second position.
//!
//! Frames are produced by a [`FrameSource`]. The production source is
//! [`FfmpegSampler`]; [`StaticFrameSource`] replays a prepared [`FrameSet`].

mod encode;
mod ffmpeg;

pub use encode::{encode_jpeg, from_data_uri, make_thumbnail, thumbnail_dimensions, to_data_uri};
pub use ffmpeg::FfmpegSampler;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{GuardError, Result};

/// Number of analysis frames per video.
pub const FRAME_COUNT: usize = 4;

/// Duration assumed when the container does not report one.
pub const FALLBACK_DURATION_SECS: f64 = 8.0;

/// Sample index the preview thumbnail is taken from.
pub const THUMBNAIL_SAMPLE: usize = 1;

/// An uploaded video, validated and kept for the whole attempt so a failed
/// analysis can be retried with the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInput {
    path: PathBuf,
    bytes: u64,
}

impl VideoInput {
    /// Validate that `path` names a readable, non-empty file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path).map_err(|e| {
            GuardError::Video(format!("Failed to read file: {}: {e}", path.display()))
        })?;

        if !metadata.is_file() {
            return Err(GuardError::Video(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() == 0 {
            return Err(GuardError::Video(format!("File is empty: {}", path.display())));
        }

        Ok(Self {
            path,
            bytes: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Four ordered analysis frames and one preview thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSet {
    /// JPEG-encoded stills, in sample order
    pub frames: [Vec<u8>; FRAME_COUNT],
    /// `data:image/jpeg;base64,...`
    pub thumbnail: String,
}

/// Produces a [`FrameSet`] from a video.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn sample(&self, video: &VideoInput) -> Result<FrameSet>;
}

/// Replays a fixed frame set regardless of input. Used in tests.
#[derive(Debug, Clone)]
pub struct StaticFrameSource {
    frames: FrameSet,
}

impl StaticFrameSource {
    pub fn new(frames: FrameSet) -> Self {
        Self { frames }
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn sample(&self, _video: &VideoInput) -> Result<FrameSet> {
        Ok(self.frames.clone())
    }
}

/// Seek positions, in seconds, for a video of the given duration.
///
/// Unknown, zero, negative or non-finite durations fall back to
/// [`FALLBACK_DURATION_SECS`].
pub fn sample_offsets(duration_secs: Option<f64>) -> [f64; FRAME_COUNT] {
    let duration = duration_secs
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(FALLBACK_DURATION_SECS);

    [0.1, duration * 0.4, duration * 0.7, duration * 0.9]
}
