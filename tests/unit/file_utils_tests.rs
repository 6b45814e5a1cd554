/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::Path;
use anyhow::Result;
use subgen::file_utils::{FileManager, MediaKind, PARTIAL_PREFIX};
use crate::common;

/// Test that generate_output_path creates the correct path
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let input_file = Path::new("/tmp/input/video.mkv");
    let output_dir = Path::new("/tmp/input");

    let output_path = FileManager::generate_output_path(input_file, output_dir, "en", "srt");

    assert_eq!(output_path, Path::new("/tmp/input/video.en.srt"));
}

/// Test that dotted stems keep everything but the last extension
#[test]
fn test_generate_output_path_withDottedStem_shouldKeepStem() {
    let output_path = FileManager::generate_output_path("/m/show.s01e02.final.mp4", "/m", "de", "srt");
    assert_eq!(output_path, Path::new("/m/show.s01e02.final.de.srt"));
}

/// Test that dir_exists returns false for non-existent directories
#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
    assert!(FileManager::dir_exists("."));
}

/// Test extension classification
#[test]
fn test_media_kind_withExtensions_shouldClassifyCaseInsensitively() {
    assert_eq!(FileManager::media_kind("a.MKV"), Some(MediaKind::Video));
    assert_eq!(FileManager::media_kind("b.webm"), Some(MediaKind::Video));
    assert_eq!(FileManager::media_kind("c.m4a"), Some(MediaKind::Audio));
    assert_eq!(FileManager::media_kind("d.Flac"), Some(MediaKind::Audio));
    assert_eq!(FileManager::media_kind("e.srt"), None);
    assert_eq!(FileManager::media_kind("noext"), None);
}

/// Test recursive discovery and ordering
#[test]
fn test_find_media_files_withNestedTree_shouldReturnSortedMedia() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_media_files(root, &["b.mp4", "a.wav", "sub/c.MKV", "sub/deeper/d.ogg"])?;
    common::create_test_file(root, "notes.txt", "ignore")?;
    common::create_test_subtitle(root, "b.en.srt")?;
    fs::create_dir_all(root.join("folder.mp4"))?;

    let media = FileManager::find_media_files(root, "en");

    let names: Vec<String> = media
        .iter()
        .map(|m| m.path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["a.wav", "b.mp4", "sub/c.MKV", "sub/deeper/d.ogg"]);
    assert_eq!(media[2].kind, MediaKind::Video);
    assert_eq!(media[2].subtitle_path, root.join("sub").join("c.en.srt"));
    Ok(())
}

/// Test that media files sharing a stem are reported as colliding
#[test]
fn test_subtitle_collisions_withSameStem_shouldReportBothSources() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_media_files(root, &["a.mp4", "a.mkv", "b.wav", "sub/a.mp3"])?;

    let media = FileManager::find_media_files(root, "en");
    let collisions = FileManager::subtitle_collisions(&media);

    assert_eq!(media.len(), 4);
    assert_eq!(collisions.len(), 1);
    let (subtitle, sources) = &collisions[0];
    assert_eq!(subtitle, &root.join("a.en.srt"));
    assert_eq!(sources, &vec![root.join("a.mkv"), root.join("a.mp4")]);
    Ok(())
}

/// Test that distinct stems never collide
#[test]
fn test_subtitle_collisions_withDistinctStems_shouldBeEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_media_files(temp_dir.path(), &["a.mp4", "b.mkv"])?;

    let media = FileManager::find_media_files(temp_dir.path(), "en");

    assert!(FileManager::subtitle_collisions(&media).is_empty());
    Ok(())
}

/// Test that an empty tree yields nothing
#[test]
fn test_find_media_files_withEmptyDir_shouldReturnEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(FileManager::find_media_files(temp_dir.path(), "en").is_empty());
    Ok(())
}

/// Test atomic writes replace content and leave no temporary files
#[test]
fn test_write_atomically_withExistingFile_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = common::create_test_file(temp_dir.path(), "out.srt", "old")?;

    FileManager::write_atomically(&target, b"new content")?;

    assert_eq!(fs::read_to_string(&target)?, "new content");
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);
    Ok(())
}

/// Test that partial files from a killed run are removed
#[test]
fn test_remove_stale_partials_withLeftovers_shouldDeleteOnlyPartials() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, &format!("{}abc", PARTIAL_PREFIX), "half")?;
    common::create_test_file(root, &format!("sub/{}xyz", PARTIAL_PREFIX), "half")?;
    let keep = common::create_test_file(root, "keep.en.srt", "1")?;

    let removed = FileManager::remove_stale_partials(root);

    assert_eq!(removed, 2);
    assert!(keep.exists());
    assert!(FileManager::find_media_files(root, "en").is_empty());
    Ok(())
}

/// Test the writability probe cleans up after itself
#[test]
fn test_check_writable_withTempDir_shouldSucceedWithoutLeftovers() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    FileManager::check_writable(temp_dir.path())?;

    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 0);
    assert!(FileManager::check_writable(temp_dir.path().join("missing")).is_err());
    Ok(())
}

/// Test appending to a log file
#[test]
fn test_append_to_log_file_withTwoLines_shouldAppendBoth() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = temp_dir.path().join("logs").join("subgen.log");

    FileManager::append_to_log_file(&log_path, "first")?;
    FileManager::append_to_log_file(&log_path, "second")?;

    let content = fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("second"));
    Ok(())
}
