/*!
 * # subgen - batch subtitle generation
 *
 * A Rust library that walks a directory tree of audio and video files,
 * transcribes each one with a local whisper.cpp model and writes SubRip
 * subtitles next to the media.
 *
 * ## Features
 *
 * - Recursive discovery of audio and video files
 * - Decoding to 16 kHz mono PCM with ffmpeg
 * - Transcription with the whisper.cpp command line tool
 * - Caption reflow with per-line and per-cue length limits
 * - Atomic subtitle writes
 * - Resumable runs backed by a JSON completion ledger
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Folder run orchestration
 * - `eligibility`: Process-or-skip rule for a single file
 * - `ledger`: Persistent per-file completion state
 * - `transcription`: Decoder and recognition engine adapters:
 *   - `transcription::ffmpeg`: Audio decoding
 *   - `transcription::whisper_cli`: whisper.cpp invocation
 *   - `transcription::mock`: Fakes for tests
 * - `reflow`: Segment to caption cue conversion
 * - `subtitle_processor`: SubRip rendering and parsing
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod eligibility;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod ledger;
pub mod reflow;
pub mod subtitle_processor;
pub mod transcription;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use ledger::{CompletionLedger, LedgerStatus};
pub use reflow::{reflow, ReflowOptions, ReflowOutcome};
pub use subtitle_processor::{CaptionCue, SubtitleCollection};
pub use transcription::TranscriptSegment;
pub use errors::{AppError, DecodeError, EngineError, FileError, LedgerError, ReflowError};
