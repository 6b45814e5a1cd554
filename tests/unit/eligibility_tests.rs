/*!
 * Tests for the process-or-skip rule
 */

use anyhow::Result;
use subgen::eligibility::{decide, Decision, ProcessReason, RunFlags, SkipReason, SubtitleState};
use subgen::ledger::LedgerStatus;
use crate::common;

const DEFAULT: RunFlags = RunFlags { force: false, skip_existing: true };
const FORCE: RunFlags = RunFlags { force: true, skip_existing: true };
const NO_SKIP: RunFlags = RunFlags { force: false, skip_existing: false };

const STATUSES: [Option<LedgerStatus>; 4] = [
    None,
    Some(LedgerStatus::Pending),
    Some(LedgerStatus::Done),
    Some(LedgerStatus::Failed),
];
const STATES: [SubtitleState; 3] = [SubtitleState::Missing, SubtitleState::Empty, SubtitleState::Present];

/// Test that force processes every combination
#[test]
fn test_decide_withForce_shouldAlwaysProcess() {
    for status in STATUSES {
        for state in STATES {
            assert_eq!(decide(FORCE, status, state), Decision::Process(ProcessReason::Forced));
        }
    }
}

/// Test that disabling skip-existing processes every combination
#[test]
fn test_decide_withSkipDisabled_shouldAlwaysProcess() {
    for status in STATUSES {
        for state in STATES {
            assert_eq!(decide(NO_SKIP, status, state), Decision::Process(ProcessReason::SkipDisabled));
        }
    }
}

/// Test the default flags against every ledger and disk state
#[test]
fn test_decide_withDefaultFlags_shouldFollowPrecedence() {
    use SubtitleState::*;

    let cases = [
        (None, Missing, Decision::Process(ProcessReason::New)),
        (None, Empty, Decision::Process(ProcessReason::New)),
        (None, Present, Decision::Skip(SkipReason::SubtitleExists)),
        (Some(LedgerStatus::Pending), Missing, Decision::Process(ProcessReason::ResumeInterrupted)),
        (Some(LedgerStatus::Pending), Empty, Decision::Process(ProcessReason::ResumeInterrupted)),
        (Some(LedgerStatus::Pending), Present, Decision::Skip(SkipReason::InterruptedButWritten)),
        (Some(LedgerStatus::Done), Missing, Decision::Skip(SkipReason::LedgerDoneSubtitleMissing)),
        (Some(LedgerStatus::Done), Empty, Decision::Skip(SkipReason::LedgerDoneSubtitleMissing)),
        (Some(LedgerStatus::Done), Present, Decision::Skip(SkipReason::LedgerDone)),
        (Some(LedgerStatus::Failed), Missing, Decision::Process(ProcessReason::RetryFailed)),
        (Some(LedgerStatus::Failed), Empty, Decision::Process(ProcessReason::RetryFailed)),
        (Some(LedgerStatus::Failed), Present, Decision::Process(ProcessReason::RetryFailed)),
    ];

    for (status, state, expected) in cases {
        assert_eq!(decide(DEFAULT, status, state), expected, "status {:?}, subtitle {:?}", status, state);
    }
}

/// Test the reasons shown in logs
#[test]
fn test_decision_display_withVariants_shouldDescribeReason() {
    assert_eq!(Decision::Process(ProcessReason::RetryFailed).to_string(), "retrying failed file");
    assert_eq!(Decision::Skip(SkipReason::SubtitleExists).to_string(), "subtitle exists");
}

/// Test subtitle probing on disk
#[test]
fn test_probe_withFiles_shouldDetectState() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let present = common::create_test_subtitle(temp_dir.path(), "a.en.srt")?;
    let empty = common::create_test_file(temp_dir.path(), "b.en.srt", "")?;

    assert_eq!(SubtitleState::probe(&present), SubtitleState::Present);
    assert_eq!(SubtitleState::probe(&empty), SubtitleState::Empty);
    assert_eq!(SubtitleState::probe(temp_dir.path().join("c.en.srt")), SubtitleState::Missing);
    assert_eq!(SubtitleState::probe(temp_dir.path()), SubtitleState::Missing);
    Ok(())
}
