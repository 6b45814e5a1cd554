use log::{error, warn, info, debug};
use std::fmt;
use std::path::{Path, PathBuf};
use indicatif::{ProgressBar, ProgressStyle};
use crate::app_config::Config;
use crate::eligibility::{self, Decision, RunFlags, SkipReason, SubtitleState};
use crate::errors::{AppError, FileError, ReflowError};
use crate::file_utils::{FileManager, MediaFile};
use crate::ledger::CompletionLedger;
use crate::reflow::{self, ReflowOptions};
use crate::subtitle_processor::SubtitleCollection;
use crate::transcription::{
    AudioPreprocessor, FfmpegPreprocessor, TranscriptionInvoker, TranscriptionOptions, WhisperCli,
};

// @module: Application controller for batch subtitle generation

/// Name of the run log written to the root directory
pub const RUN_LOG_FILE_NAME: &str = "subgen.log";

/// Counts reported at the end of a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Media files found under the root
    pub total: usize,
    /// Files whose subtitle was written in this run
    pub processed: usize,
    /// Files left alone
    pub skipped: usize,
    /// Files that raised a per-file error
    pub failed: usize,
    /// Files not reached because the file limit stopped the run
    pub remaining: usize,
    pub failed_files: Vec<PathBuf>,
}

impl RunSummary {
    /// True when nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Folder processing completed: {} files, {} processed, {} skipped, {} failed",
            self.total, self.processed, self.skipped, self.failed
        )?;
        if self.remaining > 0 {
            write!(f, ", {} left for the next run", self.remaining)?;
        }
        Ok(())
    }
}

/// Main application controller for subtitle generation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Decoder producing engine-ready audio
    preprocessor: Box<dyn AudioPreprocessor>,

    // @field: Recognition engine
    engine: Box<dyn TranscriptionInvoker>,

    // @field: Show the folder progress bar
    show_progress: bool,

    // @field: Stop after this many files were attempted
    file_limit: Option<usize>,
}

impl Controller {
    // @method: Create a controller driving ffmpeg and whisper-cli
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let preprocessor = Box::new(FfmpegPreprocessor::from_config(&config));
        let engine = Box::new(WhisperCli::from_config(&config));
        Self::with_components(config, preprocessor, engine)
    }

    /// Create a controller with explicit decoder and engine implementations
    pub fn with_components(
        mut config: Config,
        preprocessor: Box<dyn AudioPreprocessor>,
        engine: Box<dyn TranscriptionInvoker>,
    ) -> Result<Self, AppError> {
        config.normalize();
        config
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            config,
            preprocessor,
            engine,
            show_progress: true,
            file_limit: None,
        })
    }

    /// Stop after `limit` files were attempted; skipped files don't count
    pub fn with_file_limit(mut self, limit: Option<usize>) -> Self {
        self.file_limit = limit;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Check the environment before touching any file.
    ///
    /// Returns the canonical root directory.
    pub async fn preflight<P: AsRef<Path>>(&self, root: P) -> Result<PathBuf, AppError> {
        let root = root.as_ref();

        if !root.exists() {
            return Err(AppError::Preflight(format!("Input directory does not exist: {:?}", root)));
        }
        if !FileManager::dir_exists(root) {
            return Err(AppError::Preflight(format!("Input path is not a directory: {:?}", root)));
        }

        let root = root
            .canonicalize()
            .map_err(|e| AppError::Preflight(format!("Cannot resolve {:?}: {}", root, e)))?;

        FileManager::check_writable(&root)
            .map_err(|e| AppError::Preflight(format!("Directory {:?} is not writable: {}", root, e)))?;

        self.engine.check_available().await?;
        self.preprocessor.check_available().await?;

        debug!("Preflight checks passed for {:?}", root);
        Ok(root)
    }

    /// Generate subtitles for every eligible media file under `root`.
    ///
    /// Per-file errors are recorded in the ledger and the batch goes on.
    /// Preflight and ledger errors abort the run.
    pub async fn run_folder<P: AsRef<Path>>(&self, root: P) -> Result<RunSummary, AppError> {
        let start_time = std::time::Instant::now();

        let root = self.preflight(root).await?;
        let mut ledger = CompletionLedger::open_in(&root, &self.config.ledger_file_name)?;

        let removed = FileManager::remove_stale_partials(&root);
        if removed > 0 {
            info!("Removed {} partial files left by an interrupted run", removed);
        }

        let media_files = FileManager::find_media_files(&root, &self.config.language);
        let mut summary = RunSummary {
            total: media_files.len(),
            ..RunSummary::default()
        };

        if media_files.is_empty() {
            info!("No supported media files found in {:?}", root);
            return Ok(summary);
        }

        info!(
            "Found {} media files, ledger has {} entries ({})",
            media_files.len(),
            ledger.len(),
            ledger.counts()
        );

        let flags = RunFlags::from_config(&self.config);
        let options = TranscriptionOptions::from_config(&self.config);
        let reflow_options = ReflowOptions::from_config(&self.config)
            .map_err(|e| AppError::Config(e.to_string()))?;

        let folder_pb = self.folder_progress_bar(media_files.len() as u64);
        let mut attempted = 0;

        for (position, media) in media_files.iter().enumerate() {
            let file_name = media
                .path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            let decision = eligibility::decide(
                flags,
                ledger.status(&media.path),
                SubtitleState::probe(&media.subtitle_path),
            );

            if let Decision::Skip(reason) = decision {
                self.skip_file(&mut ledger, media, &file_name, reason)?;
                summary.skipped += 1;
                folder_pb.inc(1);
                continue;
            }

            if let Some(limit) = self.file_limit {
                if attempted >= limit {
                    summary.remaining = media_files.len() - position;
                    info!(
                        "File limit of {} reached, {} files left for the next run",
                        limit, summary.remaining
                    );
                    break;
                }
            }
            attempted += 1;

            folder_pb.set_message(format!("Processing: {}", file_name));
            debug!("Processing {} ({})", file_name, decision);

            ledger.mark_pending(&media.path, &media.subtitle_path)?;

            match self.process_file(media, &options, &reflow_options).await {
                Ok(cue_count) => {
                    ledger.mark_done(&media.path, &media.subtitle_path)?;
                    info!("Success: {} ({} cues)", media.subtitle_path.display(), cue_count);
                    summary.processed += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    ledger.mark_failed(&media.path, &media.subtitle_path, &e.to_string())?;
                    summary.failed += 1;
                    summary.failed_files.push(media.path.clone());
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let duration = start_time.elapsed();
        info!("{}", summary);
        for failed in &summary.failed_files {
            warn!("Failed: {}", failed.display());
        }

        if self.config.write_run_log {
            let log_file_path = root.join(RUN_LOG_FILE_NAME);
            let line = format!("{} - Duration: {}", summary, Self::format_duration(duration));
            if let Err(e) = FileManager::append_to_log_file(&log_file_path, &line) {
                warn!("Failed to write run log: {}", e);
            }
        }

        Ok(summary)
    }

    fn skip_file(
        &self,
        ledger: &mut CompletionLedger,
        media: &MediaFile,
        file_name: &str,
        reason: SkipReason,
    ) -> Result<(), AppError> {
        match reason {
            SkipReason::LedgerDone => debug!("Skipping {}, already done", file_name),
            SkipReason::LedgerDoneSubtitleMissing => warn!(
                "Skipping {}, marked done but {} is missing (use -f to regenerate)",
                file_name,
                media.subtitle_path.display()
            ),
            SkipReason::SubtitleExists => {
                info!("Skipping {}, subtitle already exists (use -f to force overwrite)", file_name)
            }
            SkipReason::InterruptedButWritten => {
                info!("Subtitle for {} was written before the last run stopped, marking done", file_name);
                ledger.mark_done(&media.path, &media.subtitle_path)?;
            }
        }
        Ok(())
    }

    /// Run decode, recognition, reflow and the atomic write for one file.
    ///
    /// Returns the number of cues written.
    async fn process_file(
        &self,
        media: &MediaFile,
        options: &TranscriptionOptions,
        reflow_options: &ReflowOptions,
    ) -> Result<usize, FileError> {
        let work_dir = tempfile::Builder::new().prefix("subgen-").tempdir()?;

        let audio = self.preprocessor.preprocess(&media.path, work_dir.path()).await?;
        let segments = self.engine.transcribe(&audio, options, work_dir.path()).await?;
        debug!("Engine returned {} segments for {:?}", segments.len(), media.path);

        let outcome = reflow::reflow(&segments, reflow_options);
        if !outcome.skipped.is_empty() {
            debug!("{} segments skipped during reflow", outcome.skipped.len());
        }
        if outcome.cues.is_empty() {
            return Err(ReflowError::NoCues.into());
        }

        let mut subtitles = SubtitleCollection::new(media.path.clone(), self.config.language.clone());
        subtitles.cues = outcome.cues;
        subtitles.write_to_srt(&media.subtitle_path)?;

        Ok(subtitles.cues.len())
    }

    fn folder_progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let folder_pb = ProgressBar::new(len);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");
        folder_pb
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
