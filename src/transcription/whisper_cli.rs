use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{
    CanonicalAudio, CommandFailure, TranscriptSegment, TranscriptionInvoker, TranscriptionOptions,
    output_with_timeout, tail_lines,
};
use crate::app_config::Config;
use crate::errors::EngineError;

/// Runs the whisper.cpp command line tool and reads its JSON output
#[derive(Debug, Clone)]
pub struct WhisperCli {
    executable: String,
    model_path: PathBuf,
    timeout: Option<Duration>,
}

/// Top level of the `--output-json` document
#[derive(Debug, Deserialize)]
struct WhisperJson {
    transcription: Vec<WhisperJsonSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperJsonSegment {
    offsets: WhisperJsonOffsets,
    text: String,
}

/// Segment bounds in milliseconds
#[derive(Debug, Deserialize)]
struct WhisperJsonOffsets {
    from: i64,
    to: i64,
}

impl WhisperCli {
    pub fn new(executable: impl Into<String>, model_path: PathBuf, timeout: Option<Duration>) -> Self {
        Self {
            executable: executable.into(),
            model_path,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.engine_executable.clone(),
            config.expanded_model_path(),
            config.engine_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Output prefix; the engine appends `.json`
    fn output_prefix(audio: &CanonicalAudio, work_dir: &Path) -> PathBuf {
        let stem = audio
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "transcript".to_string());
        work_dir.join(stem)
    }

    /// Arguments for one transcription, in invocation order
    pub fn build_args(&self, audio: &Path, options: &TranscriptionOptions, output_prefix: &Path) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            options.model_path.to_string_lossy().to_string(),
            "-l".to_string(),
            options.language.clone(),
            "--output-json".to_string(),
            "-of".to_string(),
            output_prefix.to_string_lossy().to_string(),
        ];

        if options.threads > 0 {
            args.push("-t".to_string());
            args.push(options.threads.to_string());
        }

        args.push("-f".to_string());
        args.push(audio.to_string_lossy().to_string());
        args
    }

    /// Parse the engine's JSON output into segments (seconds)
    pub fn parse_output(content: &str) -> Result<Vec<TranscriptSegment>, EngineError> {
        let document: WhisperJson = serde_json::from_str(content)
            .map_err(|e| EngineError::InvalidOutput(format!("failed to parse engine JSON: {}", e)))?;

        let segments = document
            .transcription
            .into_iter()
            .map(|segment| {
                TranscriptSegment::new(
                    segment.offsets.from.max(0) as f64 / 1000.0,
                    segment.offsets.to.max(0) as f64 / 1000.0,
                    segment.text,
                )
            })
            .collect();

        Ok(segments)
    }
}

#[async_trait]
impl TranscriptionInvoker for WhisperCli {
    async fn transcribe(
        &self,
        audio: &CanonicalAudio,
        options: &TranscriptionOptions,
        work_dir: &Path,
    ) -> Result<Vec<TranscriptSegment>, EngineError> {
        let prefix = Self::output_prefix(audio, work_dir);
        let mut json_name = prefix.clone().into_os_string();
        json_name.push(".json");
        let json_path = PathBuf::from(json_name);

        let mut command = Command::new(&self.executable);
        command
            .args(self.build_args(&audio.path, options, &prefix))
            .stdin(Stdio::null());

        debug!("Running {} on {:?}", self.executable, audio.path);

        let output = output_with_timeout(command, self.timeout)
            .await
            .map_err(|failure| match failure {
                CommandFailure::NotFound => EngineError::ExecutableNotFound(self.executable.clone()),
                CommandFailure::TimedOut(secs) => EngineError::TimedOut(secs),
                CommandFailure::Io(e) => EngineError::Io(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                message: tail_lines(&stderr, 5),
            });
        }

        // whisper.cpp may emit invalid UTF-8 when a token splits a multibyte char
        let bytes = tokio::fs::read(&json_path).await.map_err(|e| {
            EngineError::InvalidOutput(format!("expected engine output at {:?}: {}", json_path, e))
        })?;
        let content = String::from_utf8_lossy(&bytes);

        let segments = Self::parse_output(&content)?;
        if segments.is_empty() {
            return Err(EngineError::NoSegments);
        }

        debug!("Engine returned {} segments for {:?}", segments.len(), audio.source);
        Ok(segments)
    }

    async fn check_available(&self) -> Result<(), EngineError> {
        if !self.model_path.is_file() {
            return Err(EngineError::ModelNotFound(self.model_path.clone()));
        }

        let mut command = Command::new(&self.executable);
        command
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match output_with_timeout(command, Some(Duration::from_secs(30))).await {
            Ok(_) => Ok(()),
            Err(CommandFailure::NotFound) => Err(EngineError::ExecutableNotFound(self.executable.clone())),
            Err(CommandFailure::TimedOut(secs)) => Err(EngineError::TimedOut(secs)),
            Err(CommandFailure::Io(e)) => Err(EngineError::Io(e.to_string())),
        }
    }
}
