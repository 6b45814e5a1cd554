/*!
 * Adapters around the external decoding tool and recognition engine.
 *
 * Both collaborators sit behind capability traits so the batch controller
 * can be driven by real binaries (`ffmpeg`, `whisper-cli`) or by the fakes
 * in [`mock`]:
 * - `AudioPreprocessor`: any media file -> canonical mono PCM WAV
 * - `TranscriptionInvoker`: canonical audio -> timestamped text segments
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::Config;
use crate::errors::{DecodeError, EngineError};

pub mod ffmpeg;
pub mod mock;
pub mod whisper_cli;

pub use ffmpeg::FfmpegPreprocessor;
pub use whisper_cli::WhisperCli;

/// A timestamped unit of recognized text, times in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Canonical audio produced by the preprocessor
#[derive(Debug, Clone)]
pub struct CanonicalAudio {
    /// Media file the audio was decoded from
    pub source: PathBuf,
    /// Mono 16-bit PCM WAV in the work directory
    pub path: PathBuf,
    pub sample_rate: u32,
}

/// Settings handed to the recognition engine for each file
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOptions {
    pub language: String,
    pub model_path: PathBuf,
    /// 0 lets the engine pick
    pub threads: usize,
}

impl TranscriptionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.language.clone(),
            model_path: config.expanded_model_path(),
            threads: config.threads,
        }
    }
}

/// Converts media files into the canonical audio stream
#[async_trait]
pub trait AudioPreprocessor: Send + Sync + Debug {
    /// Decode `input` into a canonical WAV inside `work_dir`
    async fn preprocess(&self, input: &Path, work_dir: &Path) -> Result<CanonicalAudio, DecodeError>;

    /// Make sure the decoder can be started at all
    async fn check_available(&self) -> Result<(), DecodeError>;
}

/// Runs speech recognition on canonical audio
#[async_trait]
pub trait TranscriptionInvoker: Send + Sync + Debug {
    /// Transcribe `audio`, using `work_dir` for engine output files
    async fn transcribe(
        &self,
        audio: &CanonicalAudio,
        options: &TranscriptionOptions,
        work_dir: &Path,
    ) -> Result<Vec<TranscriptSegment>, EngineError>;

    /// Make sure the engine and its model are usable
    async fn check_available(&self) -> Result<(), EngineError>;
}

/// Why an external command produced no output
#[derive(Debug)]
pub(crate) enum CommandFailure {
    NotFound,
    TimedOut(u64),
    Io(io::Error),
}

/// Run a command to completion, killing it if the timeout expires
pub(crate) async fn output_with_timeout(
    mut command: Command,
    timeout: Option<Duration>,
) -> Result<Output, CommandFailure> {
    command.kill_on_drop(true);
    let future = command.output();

    let result = match timeout {
        Some(timeout_duration) => tokio::select! {
            result = future => result,
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(CommandFailure::TimedOut(timeout_duration.as_secs()));
            }
        },
        None => future.await,
    };

    result.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CommandFailure::NotFound
        } else {
            CommandFailure::Io(e)
        }
    })
}

/// Keep only the last lines of a noisy stderr for error messages
pub(crate) fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
