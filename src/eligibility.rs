/*!
 * Per-file eligibility rule.
 *
 * Decides whether a media file is processed or skipped from the run flags,
 * the file's ledger status and the state of its subtitle on disk. The
 * function touches nothing; the controller gathers the inputs and acts on
 * the decision.
 */

use std::fmt;
use std::path::Path;

use crate::app_config::Config;
use crate::ledger::LedgerStatus;

/// Flags of the current run that influence eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunFlags {
    pub force: bool,
    pub skip_existing: bool,
}

impl RunFlags {
    pub fn from_config(config: &Config) -> Self {
        Self {
            force: config.force,
            skip_existing: config.skip_existing,
        }
    }
}

/// State of the target subtitle file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleState {
    Missing,
    /// Exists with zero length
    Empty,
    Present,
}

impl SubtitleState {
    /// Inspect the subtitle path on disk
    pub fn probe<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::metadata(path.as_ref()) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => SubtitleState::Present,
            Ok(meta) if meta.is_file() => SubtitleState::Empty,
            _ => SubtitleState::Missing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessReason {
    Forced,
    SkipDisabled,
    RetryFailed,
    ResumeInterrupted,
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Ledger says done and the subtitle is there
    LedgerDone,
    /// Ledger says done but the subtitle was removed since
    LedgerDoneSubtitleMissing,
    /// A subtitle exists that the ledger knows nothing about
    SubtitleExists,
    /// Interrupted after the subtitle was written; the entry should be adopted as done
    InterruptedButWritten,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Process(ProcessReason),
    Skip(SkipReason),
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Decision::Process(ProcessReason::Forced) => "forced",
            Decision::Process(ProcessReason::SkipDisabled) => "skip-existing disabled",
            Decision::Process(ProcessReason::RetryFailed) => "retrying failed file",
            Decision::Process(ProcessReason::ResumeInterrupted) => "resuming interrupted file",
            Decision::Process(ProcessReason::New) => "new file",
            Decision::Skip(SkipReason::LedgerDone) => "already done",
            Decision::Skip(SkipReason::LedgerDoneSubtitleMissing) => "done in ledger, subtitle missing",
            Decision::Skip(SkipReason::SubtitleExists) => "subtitle exists",
            Decision::Skip(SkipReason::InterruptedButWritten) => "interrupted after subtitle was written",
        };
        write!(f, "{}", text)
    }
}

/// Decide what to do with one media file.
///
/// Precedence: force, then skip-existing off, then a failed entry (always
/// retried), then a done entry, then an existing subtitle, then a pending
/// entry, then a new file. Only a non-empty subtitle counts as existing.
pub fn decide(flags: RunFlags, status: Option<LedgerStatus>, subtitle: SubtitleState) -> Decision {
    if flags.force {
        return Decision::Process(ProcessReason::Forced);
    }
    if !flags.skip_existing {
        return Decision::Process(ProcessReason::SkipDisabled);
    }

    let has_subtitle = subtitle == SubtitleState::Present;

    match status {
        Some(LedgerStatus::Failed) => Decision::Process(ProcessReason::RetryFailed),
        Some(LedgerStatus::Done) if has_subtitle => Decision::Skip(SkipReason::LedgerDone),
        Some(LedgerStatus::Done) => Decision::Skip(SkipReason::LedgerDoneSubtitleMissing),
        Some(LedgerStatus::Pending) if has_subtitle => Decision::Skip(SkipReason::InterruptedButWritten),
        Some(LedgerStatus::Pending) => Decision::Process(ProcessReason::ResumeInterrupted),
        None if has_subtitle => Decision::Skip(SkipReason::SubtitleExists),
        None => Decision::Process(ProcessReason::New),
    }
}
