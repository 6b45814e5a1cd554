use anyhow::{Result, Context};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use std::fs::OpenOptions;
use std::io::{self, Write};
use chrono::Local;
use log::{debug, warn};

// @module: File and directory utilities

/// Name prefix of temporary files written next to their final destination
pub const PARTIAL_PREFIX: &str = ".subgen-partial-";

/// Video extensions picked up by the traversal (lower case)
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "wmv", "flv", "webm"];

/// Audio extensions picked up by the traversal (lower case)
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a"];

/// Kind of a discovered media file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// A media file found during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
    /// `<stem>.<lang>.srt` next to the media file
    pub subtitle_path: PathBuf,
}

impl MediaFile {
    /// Build a media file record if `path` has a supported extension
    pub fn from_path(path: &Path, language: &str) -> Option<Self> {
        let kind = FileManager::media_kind(path)?;
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        Some(MediaFile {
            path: path.to_path_buf(),
            kind,
            subtitle_path: FileManager::generate_output_path(path, parent, language, "srt"),
        })
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a subtitle
    // @params: input_file, output_dir, language, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        language: &str,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        // Get the file stem (filename without extension)
        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(language);
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.join(output_filename)
    }

    /// Classify a path by its extension, case-insensitively
    pub fn media_kind<P: AsRef<Path>>(path: P) -> Option<MediaKind> {
        let ext = path.as_ref().extension()?.to_string_lossy().to_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }

    /// Find all supported media files under `dir`, in lexicographic path order
    pub fn find_media_files<P: AsRef<Path>>(dir: P, language: &str) -> Vec<MediaFile> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if let Some(media) = MediaFile::from_path(entry.path(), language) {
                result.push(media);
            }
        }

        result.sort_by(|a, b| a.path.cmp(&b.path));

        for (subtitle, sources) in Self::subtitle_collisions(&result) {
            warn!(
                "{} media files share the subtitle {:?}, the later one overwrites it: {:?}",
                sources.len(),
                subtitle,
                sources
            );
        }

        result
    }

    /// Subtitle paths claimed by more than one media file, e.g. `a.mp4` and `a.mkv`
    pub fn subtitle_collisions(media: &[MediaFile]) -> Vec<(PathBuf, Vec<PathBuf>)> {
        let mut by_subtitle: BTreeMap<&Path, Vec<PathBuf>> = BTreeMap::new();
        for file in media {
            by_subtitle
                .entry(file.subtitle_path.as_path())
                .or_default()
                .push(file.path.clone());
        }

        by_subtitle
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(subtitle, sources)| (subtitle.to_path_buf(), sources))
            .collect()
    }

    /// Write `content` to a temporary file in the target directory, flush it
    /// to disk, then rename it over `path`
    pub fn write_atomically<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(&parent)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }

    /// Remove partial files left behind by a killed run
    pub fn remove_stale_partials<P: AsRef<Path>>(dir: P) -> usize {
        let mut removed = 0;

        for entry in WalkDir::new(dir.as_ref()).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let is_partial = entry
                .file_name()
                .to_string_lossy()
                .starts_with(PARTIAL_PREFIX);
            if !is_partial {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("Removed stale partial file {:?}", entry.path());
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove stale partial file {:?}: {}", entry.path(), e),
            }
        }

        removed
    }

    /// Check that files can be created in `dir`
    pub fn check_writable<P: AsRef<Path>>(dir: P) -> io::Result<()> {
        let probe = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(dir.as_ref())?;
        probe.close()
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
