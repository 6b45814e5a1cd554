use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use std::path::{Path, PathBuf};
use log::warn;

use crate::errors::SerializationError;
use crate::file_utils::FileManager;

// @module: SubRip rendering and parsing

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @struct: Single caption cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionCue {
    // @field: 1-based position in the file
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Display lines, top to bottom
    pub lines: Vec<String>,
}

impl CaptionCue {
    pub fn new(index: usize, start_ms: u64, end_ms: u64, lines: Vec<String>) -> Self {
        CaptionCue {
            index,
            start_ms,
            end_ms,
            lines,
        }
    }

    /// Lines joined with line breaks
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// True when no line carries visible text
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    /// Parse an SRT timestamp to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        // Parse HH:MM:SS,mmm format
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for CaptionCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms)
        )?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Caption cues for one media file
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Media file the cues were transcribed from
    pub source_file: PathBuf,

    /// Ordered cues
    pub cues: Vec<CaptionCue>,

    /// Language code of the captions
    pub language: String,
}

impl SubtitleCollection {
    /// Create an empty subtitle collection
    pub fn new(source_file: PathBuf, language: String) -> Self {
        SubtitleCollection {
            source_file,
            cues: Vec::new(),
            language,
        }
    }

    /// Render all cues in SubRip format
    pub fn render(&self) -> String {
        self.cues.iter().map(|cue| cue.to_string()).collect()
    }

    /// Write subtitles to an SRT file.
    ///
    /// The content goes to a temporary file next to `path` first and is
    /// renamed over it, so the target is either the old file or the full new one.
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<(), SerializationError> {
        let path = path.as_ref();
        FileManager::write_atomically(path, self.render().as_bytes())
            .map_err(|source| SerializationError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Parse SRT format string into caption cues
    pub fn parse_srt_string(content: &str) -> Result<Vec<CaptionCue>> {
        let mut cues = Vec::new();

        // State variables for parsing
        let mut current_index: Option<usize> = None;
        let mut current_times: Option<(u64, u64)> = None;
        let mut current_lines: Vec<String> = Vec::new();

        let content = content.trim_start_matches('\u{feff}');

        for (line_no, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim_end_matches('\r');
            let trimmed = line.trim();

            if trimmed.is_empty() {
                if let (Some(index), Some((start_ms, end_ms))) = (current_index, current_times) {
                    if !current_lines.is_empty() {
                        cues.push(CaptionCue::new(index, start_ms, end_ms, std::mem::take(&mut current_lines)));
                        current_index = None;
                        current_times = None;
                    }
                }
                continue;
            }

            if current_index.is_none() {
                match trimmed.parse::<usize>() {
                    Ok(num) => current_index = Some(num),
                    Err(_) => warn!("Unexpected text at line {} before sequence number: {}", line_no + 1, trimmed),
                }
                continue;
            }

            if current_times.is_none() {
                match TIMESTAMP_REGEX.captures(trimmed) {
                    Some(caps) => {
                        let start_ms = Self::parse_timestamp_to_ms(&caps, 1)?;
                        let end_ms = Self::parse_timestamp_to_ms(&caps, 5)?;
                        current_times = Some((start_ms, end_ms));
                    }
                    None => {
                        warn!("Invalid timestamp format at line {}: {}", line_no + 1, trimmed);
                        current_index = None;
                    }
                }
                continue;
            }

            current_lines.push(trimmed.to_string());
        }

        // Add the last cue if there is one
        if let (Some(index), Some((start_ms, end_ms))) = (current_index, current_times) {
            if !current_lines.is_empty() {
                cues.push(CaptionCue::new(index, start_ms, end_ms, current_lines));
            }
        }

        if cues.is_empty() {
            return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
        }

        cues.sort_by_key(|cue| (cue.start_ms, cue.index));

        let overlap_count = cues.windows(2).filter(|pair| pair[0].end_ms > pair[1].start_ms).count();
        if overlap_count > 0 {
            warn!("Found {} overlapping subtitle entries", overlap_count);
        }

        for (i, cue) in cues.iter_mut().enumerate() {
            cue.index = i + 1;
        }

        Ok(cues)
    }

    /// Parse timestamp to milliseconds
    fn parse_timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> Result<u64> {
        let field = |offset: usize| -> Result<u64> {
            caps.get(start_idx + offset)
                .ok_or_else(|| anyhow!("Missing timestamp component"))?
                .as_str()
                .parse::<u64>()
                .context("Failed to parse timestamp component")
        };

        let hours = field(0)?;
        let minutes = field(1)?;
        let seconds = field(2)?;
        let millis = field(3)?;

        Ok((hours * 3600 + minutes * 60 + seconds) * 1000 + millis)
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Language: {}", self.language)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}
