/*!
 * Fake collaborators for testing.
 *
 * These stand in for the decoder and the recognition engine so the batch
 * controller can be exercised without external binaries:
 * - `FakePreprocessor` writes a placeholder WAV, or fails for chosen files
 * - `FakeEngine` returns canned segments, or fails for chosen files
 *
 * Both count invocations so tests can assert which files reached them.
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{AudioPreprocessor, CanonicalAudio, TranscriptSegment, TranscriptionInvoker, TranscriptionOptions};
use crate::errors::{DecodeError, EngineError};

/// True when the file name of `path` contains any of the markers
fn matches_marker(path: &Path, markers: &[String]) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    markers.iter().any(|m| name.contains(m.as_str()))
}

/// Fake decoder
#[derive(Debug, Default)]
pub struct FakePreprocessor {
    fail_on: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl FakePreprocessor {
    /// A decoder that accepts every file
    pub fn working() -> Self {
        Self::default()
    }

    /// Fail for files whose name contains `marker`
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_on.push(marker.into());
        self
    }

    /// Shared invocation counter
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl AudioPreprocessor for FakePreprocessor {
    async fn preprocess(&self, input: &Path, work_dir: &Path) -> Result<CanonicalAudio, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if matches_marker(input, &self.fail_on) {
            return Err(DecodeError::Failed {
                path: input.to_path_buf(),
                message: "Invalid data found when processing input".to_string(),
            });
        }

        let path = work_dir.join("canonical.wav");
        tokio::fs::write(&path, b"RIFF")
            .await
            .map_err(|e| DecodeError::Io(e.to_string()))?;

        Ok(CanonicalAudio {
            source: input.to_path_buf(),
            path,
            sample_rate: 16_000,
        })
    }

    async fn check_available(&self) -> Result<(), DecodeError> {
        Ok(())
    }
}

/// Fake recognition engine
#[derive(Debug)]
pub struct FakeEngine {
    segments: Vec<TranscriptSegment>,
    fail_on: Vec<String>,
    empty_on: Vec<String>,
    available: bool,
    calls: Arc<AtomicUsize>,
    transcribed: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeEngine {
    /// An engine that returns `segments` for every file
    pub fn with_segments(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments,
            fail_on: Vec::new(),
            empty_on: Vec::new(),
            available: true,
            calls: Arc::new(AtomicUsize::new(0)),
            transcribed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An engine with a short two-segment transcript
    pub fn working() -> Self {
        Self::with_segments(vec![
            TranscriptSegment::new(0.0, 2.5, " Hello there, this is a test."),
            TranscriptSegment::new(2.5, 5.0, " It has two segments."),
        ])
    }

    /// Exit non-zero for files whose name contains `marker`
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_on.push(marker.into());
        self
    }

    /// Return only blank segments for files whose name contains `marker`
    pub fn silent_on(mut self, marker: impl Into<String>) -> Self {
        self.empty_on.push(marker.into());
        self
    }

    /// Simulate a missing executable during preflight
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Shared invocation counter
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Shared list of transcribed source files, in call order
    pub fn transcribed(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.transcribed)
    }
}

#[async_trait]
impl TranscriptionInvoker for FakeEngine {
    async fn transcribe(
        &self,
        audio: &CanonicalAudio,
        _options: &TranscriptionOptions,
        _work_dir: &Path,
    ) -> Result<Vec<TranscriptSegment>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut transcribed) = self.transcribed.lock() {
            transcribed.push(audio.source.clone());
        }

        if matches_marker(&audio.source, &self.fail_on) {
            return Err(EngineError::Failed {
                status: "exit status: 1".to_string(),
                message: "failed to process audio".to_string(),
            });
        }

        if matches_marker(&audio.source, &self.empty_on) {
            return Ok(vec![TranscriptSegment::new(0.0, 1.0, "   ")]);
        }

        Ok(self.segments.clone())
    }

    async fn check_available(&self) -> Result<(), EngineError> {
        if self.available {
            Ok(())
        } else {
            Err(EngineError::ExecutableNotFound("fake-engine".to_string()))
        }
    }
}
