/*!
 * Error types for the subgen application.
 *
 * Per-file failures (decode, engine, reflow, serialization) are caught by the
 * batch controller and recorded in the ledger. Ledger and configuration
 * failures abort the whole run.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while converting a media file to canonical audio
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The decoding tool could not be started
    #[error("Decoder executable not found: {0}")]
    ToolNotFound(String),

    /// The decoder ran but rejected the input
    #[error("Failed to decode {path:?}: {message}")]
    Failed {
        /// Input media file
        path: PathBuf,
        /// Filtered decoder stderr
        message: String,
    },

    /// The decoder did not finish in time
    #[error("Decoding {path:?} timed out after {secs}s")]
    TimedOut { path: PathBuf, secs: u64 },

    /// The decoder exited successfully but wrote nothing
    #[error("Decoder produced no audio for {0:?}")]
    EmptyOutput(PathBuf),

    /// Any other I/O failure around the decoder process
    #[error("Decoder I/O error: {0}")]
    Io(String),
}

/// Errors raised by the speech-recognition engine adapter
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine binary could not be started
    #[error("Recognition engine executable not found: {0}")]
    ExecutableNotFound(String),

    /// The configured model file does not exist
    #[error("Model file not found at {0:?}")]
    ModelNotFound(PathBuf),

    /// The engine exited with a non-zero status
    #[error("Recognition engine failed ({status}): {message}")]
    Failed { status: String, message: String },

    /// The engine did not finish in time
    #[error("Recognition engine timed out after {0}s")]
    TimedOut(u64),

    /// The engine output could not be read or parsed
    #[error("Invalid engine output: {0}")]
    InvalidOutput(String),

    /// The engine finished without recognizing anything
    #[error("Recognition engine produced no segments")]
    NoSegments,

    /// Any other I/O failure around the engine process
    #[error("Engine I/O error: {0}")]
    Io(String),
}

/// Errors raised by the caption reflow engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReflowError {
    /// Segment text is empty once trimmed
    #[error("Segment {segment} has no text, skipped")]
    EmptySegment { segment: usize },

    /// Segment timestamps are NaN or infinite
    #[error("Segment {segment} has invalid timestamps, skipped")]
    InvalidTiming { segment: usize },

    /// Line limits that cannot produce any caption
    #[error("Invalid reflow options: {0}")]
    InvalidOptions(String),

    /// Nothing was left to write once degenerate segments were dropped
    #[error("No captions left after reflow")]
    NoCues,
}

/// Errors raised while writing a subtitle file
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Failed to write subtitle file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the completion ledger. Always fatal for the run.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to read ledger {path:?}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Ledger {path:?} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Unsupported ledger version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Failed to write ledger {path:?}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Failure of the pipeline for a single media file
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Reflow error: {0}")]
    Reflow(#[from] ReflowError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("File error: {0}")]
    Io(String),
}

/// Main application error type for run-level failures
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Environment check failed before any file was processed
    #[error("Preflight check failed: {0}")]
    Preflight(String),

    /// Error from the completion ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Error from the recognition engine during preflight
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error from the decoder during preflight
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<std::io::Error> for FileError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
