/*!
 * Common test utilities for the subgen test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;

use subgen::app_config::Config;
use subgen::app_controller::Controller;
use subgen::transcription::mock::{FakeEngine, FakePreprocessor};

/// Route library logs to the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates an executable shell script standing in for an external tool
#[cfg(unix)]
pub fn create_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let path = dir.join(name);
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o755)
        .open(&path)?;
    writeln!(file, "#!/bin/sh")?;
    file.write_all(body.as_bytes())?;
    file.sync_all()?;
    Ok(path)
}

/// Creates placeholder media files; the fakes never read their content
pub fn create_media_files(dir: &Path, names: &[&str]) -> Result<Vec<PathBuf>> {
    names
        .iter()
        .map(|name| create_test_file(dir, name, "not really media"))
        .collect()
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;
    create_test_file(dir, filename, content)
}

/// Expected subtitle path for a media file under the default language
pub fn subtitle_for(media: &Path) -> PathBuf {
    let stem = media.file_stem().unwrap().to_string_lossy().to_string();
    media.with_file_name(format!("{}.en.srt", stem))
}

/// Configuration used by controller tests: no run log, defaults otherwise
pub fn test_config() -> Config {
    Config {
        write_run_log: false,
        ..Config::default()
    }
}

/// Controller wired to the given fakes, with the progress bar hidden
pub fn fake_controller(config: Config, preprocessor: FakePreprocessor, engine: FakeEngine) -> Result<Controller> {
    Ok(Controller::with_components(config, Box::new(preprocessor), Box::new(engine))?.with_progress(false))
}
