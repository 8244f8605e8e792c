//! Stacking several images into one JPEG with ffmpeg.
//!
//! Chat clients show one preview image per link, so multi-image posts are
//! rendered as a vertical strip. Each input is scaled to the average declared
//! width and the results are stacked with `vstack`.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::normalize::Image;

/// Width used when no image declares an aspect ratio.
const FALLBACK_WIDTH: u32 = 1000;

/// Longest stderr excerpt kept in logs.
const STDERR_LOG_LIMIT: usize = 2048;

/// Compositor failures.
#[derive(Debug, thiserror::Error)]
pub enum MosaicError {
    #[error("no images to composite")]
    NoImages,

    #[error("failed to start ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with {0}")]
    Exit(ExitStatus),

    #[error("ffmpeg produced no output")]
    EmptyOutput,
}

/// What to send back for an image set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mosaic {
    /// A single image needs no compositing.
    Redirect(String),
    /// Composited JPEG bytes.
    Jpeg(Vec<u8>),
}

/// The ffmpeg invocation for two or more images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicPlan {
    inputs: Vec<String>,
    width: u32,
}

impl MosaicPlan {
    /// `None` unless there are at least two images.
    pub fn new(images: &[Image]) -> Option<Self> {
        if images.len() < 2 {
            return None;
        }

        let total: u64 = images.iter().map(|image| u64::from(image.width)).sum();
        let average = (total / images.len() as u64) as u32;
        let width = if average == 0 { FALLBACK_WIDTH } else { average };

        Some(Self {
            inputs: images.iter().map(|image| image.url.clone()).collect(),
            width,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// `[0:v]scale=W:-2[m0];...[m0][m1]...vstack=inputs=N`.
    pub fn filter_graph(&self) -> String {
        let mut graph = String::new();
        for i in 0..self.inputs.len() {
            graph.push_str(&format!("[{i}:v]scale={}:-2[m{i}];", self.width));
        }
        for i in 0..self.inputs.len() {
            graph.push_str(&format!("[m{i}]"));
        }
        graph.push_str(&format!("vstack=inputs={}", self.inputs.len()));
        graph
    }

    /// Full ffmpeg argument list, writing MJPEG to stdout.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-loglevel".to_string(), "error".to_string()];
        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.clone());
        }
        args.push("-filter_complex".to_string());
        args.push(self.filter_graph());
        args.extend(
            ["-f", "image2pipe", "-c:v", "mjpeg", "pipe:1"]
                .into_iter()
                .map(str::to_string),
        );
        args
    }
}

/// Runs ffmpeg for image sets.
#[derive(Debug, Clone)]
pub struct Compositor {
    ffmpeg: String,
}

impl Compositor {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Produce a single preview for `images`.
    ///
    /// The whole JPEG is buffered before returning. The child is killed if
    /// this future is dropped.
    pub async fn composite(&self, images: &[Image]) -> Result<Mosaic, MosaicError> {
        let plan = match images {
            [] => return Err(MosaicError::NoImages),
            [single] => return Ok(Mosaic::Redirect(single.url.clone())),
            _ => MosaicPlan::new(images).ok_or(MosaicError::NoImages)?,
        };

        tracing::debug!(inputs = images.len(), width = plan.width(), "running ffmpeg");

        let output = Command::new(&self.ffmpeg)
            .args(plan.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(MosaicError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.chars().take(STDERR_LOG_LIMIT).collect();
            tracing::warn!(status = %output.status, stderr = %excerpt.trim(), "ffmpeg failed");
            return Err(MosaicError::Exit(output.status));
        }

        if output.stdout.is_empty() {
            return Err(MosaicError::EmptyOutput);
        }

        Ok(Mosaic::Jpeg(output.stdout))
    }
}
