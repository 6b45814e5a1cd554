use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{AudioPreprocessor, CanonicalAudio, CommandFailure, output_with_timeout};
use crate::app_config::Config;
use crate::errors::DecodeError;

/// Decodes media through an `ffmpeg` binary into 16-bit mono WAV
#[derive(Debug, Clone)]
pub struct FfmpegPreprocessor {
    executable: String,
    sample_rate: u32,
    timeout: Option<Duration>,
}

impl FfmpegPreprocessor {
    pub fn new(executable: impl Into<String>, sample_rate: u32, timeout: Option<Duration>) -> Self {
        Self {
            executable: executable.into(),
            sample_rate,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.decoder_executable.clone(),
            config.sample_rate,
            config.decode_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Output path of the canonical WAV for `input`
    fn output_path(input: &Path, work_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        work_dir.join(format!("{}.wav", stem))
    }

    /// Arguments for the conversion, in invocation order
    pub fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Filter ffmpeg stderr to only show meaningful error lines, stripping the
    /// version banner, build configuration, and stream metadata noise.
    pub fn filter_stderr(stderr: &str) -> String {
        let noise_prefixes = [
            "ffmpeg version",
            "built with",
            "configuration:",
            "lib",
            "Input #",
            "Metadata:",
            "Duration:",
            "Stream #",
            "Output #",
            "Stream mapping:",
            "Press [q]",
        ];

        let meaningful: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !noise_prefixes.iter().any(|p| line.starts_with(p)))
            .collect();

        if meaningful.is_empty() {
            "unknown ffmpeg error (stderr was empty after filtering)".to_string()
        } else {
            meaningful.join("\n")
        }
    }
}

#[async_trait]
impl AudioPreprocessor for FfmpegPreprocessor {
    async fn preprocess(&self, input: &Path, work_dir: &Path) -> Result<CanonicalAudio, DecodeError> {
        let output_path = Self::output_path(input, work_dir);

        let mut command = Command::new(&self.executable);
        command
            .args(self.build_args(input, &output_path))
            .stdin(Stdio::null());

        debug!("Decoding {:?} to {:?}", input, output_path);

        let output = output_with_timeout(command, self.timeout)
            .await
            .map_err(|failure| match failure {
                CommandFailure::NotFound => DecodeError::ToolNotFound(self.executable.clone()),
                CommandFailure::TimedOut(secs) => DecodeError::TimedOut {
                    path: input.to_path_buf(),
                    secs,
                },
                CommandFailure::Io(e) => DecodeError::Io(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecodeError::Failed {
                path: input.to_path_buf(),
                message: Self::filter_stderr(&stderr),
            });
        }

        let size = tokio::fs::metadata(&output_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            return Err(DecodeError::EmptyOutput(input.to_path_buf()));
        }

        Ok(CanonicalAudio {
            source: input.to_path_buf(),
            path: output_path,
            sample_rate: self.sample_rate,
        })
    }

    async fn check_available(&self) -> Result<(), DecodeError> {
        let mut command = Command::new(&self.executable);
        command
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match output_with_timeout(command, Some(Duration::from_secs(30))).await {
            Ok(_) => Ok(()),
            Err(CommandFailure::NotFound) => Err(DecodeError::ToolNotFound(self.executable.clone())),
            Err(CommandFailure::TimedOut(secs)) => Err(DecodeError::Io(format!(
                "'{} -version' did not answer within {}s",
                self.executable, secs
            ))),
            Err(CommandFailure::Io(e)) => Err(DecodeError::Io(e.to_string())),
        }
    }
}
