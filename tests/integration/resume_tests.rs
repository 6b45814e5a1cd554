/*!
 * Integration tests for idempotent reruns and resuming interrupted runs
 */

use std::fs;
use std::sync::atomic::Ordering;
use anyhow::Result;
use subgen::ledger::{CompletionLedger, LedgerStatus};
use subgen::transcription::mock::{FakeEngine, FakePreprocessor};
use crate::common;

const LEDGER_NAME: &str = ".subgen.ledger.json";

/// Test that a second run with skip-existing does no work and leaves the ledger untouched
#[tokio::test]
async fn test_second_run_withSkipExisting_shouldBeIdempotent() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let media = common::create_media_files(root, &["a.mp4", "b.flac", "nested/c.webm"])?;

    let first = common::fake_controller(common::test_config(), FakePreprocessor::working(), FakeEngine::working())?;
    first.run_folder(root).await?;
    let ledger_before = fs::read(root.join(LEDGER_NAME))?;
    let subtitles_before: Vec<String> = media
        .iter()
        .map(|m| fs::read_to_string(common::subtitle_for(m)))
        .collect::<std::io::Result<_>>()?;

    let pre = FakePreprocessor::working();
    let engine = FakeEngine::working();
    let decode_calls = pre.calls();
    let engine_calls = engine.calls();
    let second = common::fake_controller(common::test_config(), pre, engine)?;

    let summary = second.run_folder(root).await?;

    assert_eq!((summary.processed, summary.skipped, summary.failed), (0, 3, 0));
    assert_eq!(decode_calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fs::read(root.join(LEDGER_NAME))?, ledger_before);
    for (m, before) in media.iter().zip(&subtitles_before) {
        assert_eq!(&fs::read_to_string(common::subtitle_for(m))?, before);
    }
    Ok(())
}

/// Test that a run stopped after N files resumes with the rest and never redoes the first N
#[tokio::test]
async fn test_resume_afterFileLimit_shouldFinishRemainingFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let media = common::create_media_files(root, &["01.mp4", "02.mp4", "03.mp4", "04.mp4", "05.mp4"])?;

    let first = common::fake_controller(common::test_config(), FakePreprocessor::working(), FakeEngine::working())?
        .with_file_limit(Some(2));
    let summary = first.run_folder(root).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.remaining, 3);
    assert_eq!(summary.total, summary.processed + summary.skipped + summary.failed + summary.remaining);
    assert!(summary.to_string().ends_with("3 left for the next run"));
    let written = media.iter().filter(|m| common::subtitle_for(m).exists()).count();
    assert_eq!(written, 2);

    let engine = FakeEngine::working();
    let transcribed = engine.transcribed();
    let second = common::fake_controller(common::test_config(), FakePreprocessor::working(), engine)?;
    let summary = second.run_folder(root).await?;

    assert_eq!((summary.processed, summary.skipped, summary.remaining), (3, 2, 0));
    assert!(media.iter().all(|m| common::subtitle_for(m).exists()));
    let names: Vec<String> = transcribed
        .lock()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["03.mp4", "04.mp4", "05.mp4"]);

    let ledger = CompletionLedger::open_in(root, LEDGER_NAME)?;
    assert_eq!(ledger.counts().done, 5);
    Ok(())
}

/// Test that a file left pending by a killed run is processed again
#[tokio::test]
async fn test_resume_withPendingEntry_shouldReprocessFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let media = common::create_media_files(root, &["interrupted.mkv"])?;
    let subtitle = common::subtitle_for(&media[0]);

    let mut ledger = CompletionLedger::open_in(root, LEDGER_NAME)?;
    ledger.mark_pending(&media[0], &subtitle)?;

    let engine = FakeEngine::working();
    let engine_calls = engine.calls();
    let controller = common::fake_controller(common::test_config(), FakePreprocessor::working(), engine)?;

    let summary = controller.run_folder(root).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(engine_calls.load(Ordering::SeqCst), 1);
    assert!(subtitle.exists());
    let ledger = CompletionLedger::open_in(root, LEDGER_NAME)?;
    let entry = ledger.get(&media[0]).unwrap();
    assert_eq!(entry.status, LedgerStatus::Done);
    assert_eq!(entry.attempts, 2);
    Ok(())
}

/// Test that a pending entry whose subtitle already landed is adopted as done
#[tokio::test]
async fn test_resume_withPendingEntryAndSubtitle_shouldAdoptAsDone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let media = common::create_media_files(root, &["a.mp4"])?;
    let subtitle = common::create_test_subtitle(root, "a.en.srt")?;

    let mut ledger = CompletionLedger::open_in(root, LEDGER_NAME)?;
    ledger.mark_pending(&media[0], &subtitle)?;

    let engine = FakeEngine::working();
    let engine_calls = engine.calls();
    let controller = common::fake_controller(common::test_config(), FakePreprocessor::working(), engine)?;

    let summary = controller.run_folder(root).await?;

    assert_eq!(summary.skipped, 1);
    assert_eq!(engine_calls.load(Ordering::SeqCst), 0);
    let ledger = CompletionLedger::open_in(root, LEDGER_NAME)?;
    assert_eq!(ledger.status(&media[0]), Some(LedgerStatus::Done));
    Ok(())
}

/// Test that failed files are retried on the next plain run
#[tokio::test]
async fn test_resume_withFailedEntry_shouldRetryFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let media = common::create_media_files(root, &["a.mp4", "b.mp4"])?;

    let failing = FakeEngine::working().failing_on("b.mp4");
    let first = common::fake_controller(common::test_config(), FakePreprocessor::working(), failing)?;
    let summary = first.run_folder(root).await?;
    assert_eq!(summary.failed, 1);

    let engine = FakeEngine::working();
    let transcribed = engine.transcribed();
    let second = common::fake_controller(common::test_config(), FakePreprocessor::working(), engine)?;
    let summary = second.run_folder(root).await?;

    assert_eq!((summary.processed, summary.skipped, summary.failed), (1, 1, 0));
    assert_eq!(transcribed.lock().unwrap().len(), 1);
    let ledger = CompletionLedger::open_in(root, LEDGER_NAME)?;
    let entry = ledger.get(&media[1]).unwrap();
    assert_eq!(entry.status, LedgerStatus::Done);
    assert!(entry.error.is_none());
    Ok(())
}

/// Test that a done file whose subtitle was deleted is not regenerated without force
#[tokio::test]
async fn test_resume_withDoneEntryAndMissingSubtitle_shouldSkip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let media = common::create_media_files(root, &["a.mp4"])?;

    let first = common::fake_controller(common::test_config(), FakePreprocessor::working(), FakeEngine::working())?;
    first.run_folder(root).await?;
    fs::remove_file(common::subtitle_for(&media[0]))?;

    let engine = FakeEngine::working();
    let engine_calls = engine.calls();
    let second = common::fake_controller(common::test_config(), FakePreprocessor::working(), engine)?;
    let summary = second.run_folder(root).await?;

    assert_eq!(summary.skipped, 1);
    assert_eq!(engine_calls.load(Ordering::SeqCst), 0);
    assert!(!common::subtitle_for(&media[0]).exists());
    Ok(())
}
