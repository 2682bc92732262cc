//! `ffprobe`/`ffmpeg` backed frame source.
//!
//! Frames are extracted one seek at a time, strictly in order, and streamed
//! back over a pipe as PNG so no temporary files are written. Every child
//! process is bounded by [`SamplerConfig::timeout`] and killed when it
//! expires.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Instant;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::encode::{encode_jpeg, make_thumbnail};
use super::{
    sample_offsets, FrameSet, FrameSource, VideoInput, FRAME_COUNT, THUMBNAIL_SAMPLE,
};
use crate::config::SamplerConfig;
use crate::error::{GuardError, Result};

/// Frame source driving the system `ffmpeg` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSampler {
    config: SamplerConfig,
}

impl FfmpegSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Container duration in seconds, or `None` when it cannot be determined.
    pub async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let mut command = Command::new(&self.config.ffprobe);
        command
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path);

        let output = match self.run(command, "ffprobe").await {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "ffprobe failed, assuming fallback duration"
                );
                return None;
            }
            Err(e) => {
                warn!(error = %e, "ffprobe unavailable, assuming fallback duration");
                return None;
            }
        };

        let duration = String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .ok();
        debug!(duration = ?duration, "Probed duration");
        duration
    }

    /// Decode the frame at `offset_secs`.
    ///
    /// A seek past the end of a short clip yields no frame; in that case the
    /// last frame of the stream is taken instead.
    pub async fn extract_frame(&self, path: &Path, offset_secs: f64) -> Result<DynamicImage> {
        let seek = format!("{offset_secs:.3}");
        let output = self.run(self.frame_command(path, "-ss", &seek), "ffmpeg").await?;
        if output.status.success() && !output.stdout.is_empty() {
            return decode_png(&output.stdout);
        }

        warn!(
            offset_secs,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "No frame at offset, retrying from end of stream"
        );

        let retry = self.run(self.frame_command(path, "-sseof", "-0.1"), "ffmpeg").await?;
        if retry.status.success() && !retry.stdout.is_empty() {
            return decode_png(&retry.stdout);
        }

        Err(GuardError::Sampling(format!(
            "ffmpeg produced no frame at {seek}s: {}",
            String::from_utf8_lossy(&retry.stderr).trim()
        )))
    }

    fn frame_command(&self, path: &Path, seek_flag: &str, seek: &str) -> Command {
        let mut command = Command::new(&self.config.ffmpeg);
        command
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .args([seek_flag, seek])
            .arg("-i")
            .arg(path)
            .args(["-an", "-sn"])
            .args(["-frames:v", "1"])
            .args(["-f", "image2pipe", "-vcodec", "png", "-"]);
        command
    }

    async fn run(&self, mut command: Command, program: &str) -> Result<Output> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(self.config.timeout, command.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(GuardError::Sampling(format!(
                "Failed to spawn {program}: {e}"
            ))),
            Err(_) => Err(GuardError::Sampling(format!(
                "{program} did not finish within {}s",
                self.config.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegSampler {
    #[instrument(skip(self, video), fields(path = %video.path().display()))]
    async fn sample(&self, video: &VideoInput) -> Result<FrameSet> {
        let start = Instant::now();
        let duration = self.probe_duration(video.path()).await;
        let offsets = sample_offsets(duration);

        let mut frames: Vec<Vec<u8>> = Vec::with_capacity(offsets.len());
        let mut thumbnail = None;

        for (index, offset) in offsets.iter().enumerate() {
            let image = self.extract_frame(video.path(), *offset).await?;
            frames.push(encode_jpeg(&image, self.config.frame_quality)?);

            if index == THUMBNAIL_SAMPLE {
                thumbnail = Some(make_thumbnail(
                    &image,
                    self.config.thumbnail_width,
                    self.config.thumbnail_quality,
                )?);
            }
            debug!(index, offset, "Frame sampled");
        }

        let frames: [Vec<u8>; FRAME_COUNT] = frames
            .try_into()
            .map_err(|v: Vec<Vec<u8>>| {
                GuardError::Sampling(format!("Expected 4 frames, got {}", v.len()))
            })?;
        let thumbnail = thumbnail
            .ok_or_else(|| GuardError::Sampling("Preview thumbnail was not produced".into()))?;

        info!(
            duration = ?duration,
            latency_ms = start.elapsed().as_millis() as u64,
            "Frames sampled"
        );
        Ok(FrameSet { frames, thumbnail })
    }
}

fn decode_png(data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory_with_format(data, ImageFormat::Png)
        .map_err(|e| GuardError::Sampling(format!("Failed to decode extracted frame: {e}")))
}
