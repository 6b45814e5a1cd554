use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module holds the run configuration: recognition settings, caption
/// layout limits and the skip/force policy. A configuration is loaded once,
/// overridden from the command line, validated, and then stays immutable
/// for the whole run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Language code passed to the recognition engine and used in output names
    #[serde(default = "default_language")]
    pub language: String,

    /// Path to the GGML model file (a leading `~/` is expanded)
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Path or name of the recognition engine executable
    #[serde(default = "default_engine_executable")]
    pub engine_executable: String,

    /// Path or name of the decoding tool
    #[serde(default = "default_decoder_executable")]
    pub decoder_executable: String,

    /// Engine thread count (0 lets the engine decide)
    #[serde(default)]
    pub threads: usize,

    /// Maximum characters per caption line
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Maximum lines per caption
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Skip files that already have subtitles or are marked done
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    /// Reprocess everything regardless of subtitles and ledger state
    #[serde(default)]
    pub force: bool,

    /// Sample rate of the canonical audio handed to the engine
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Ledger file name, created in the run root
    #[serde(default = "default_ledger_file_name")]
    pub ledger_file_name: String,

    /// Kill the decoder after this many seconds
    #[serde(default)]
    pub decode_timeout_secs: Option<u64>,

    /// Kill the recognition engine after this many seconds
    #[serde(default)]
    pub engine_timeout_secs: Option<u64>,

    /// Append a run summary to `subgen.log` in the run root
    #[serde(default = "default_true")]
    pub write_run_log: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("~/whisper-models/ggml-medium.bin")
}

fn default_engine_executable() -> String {
    "whisper-cli".to_string()
}

fn default_decoder_executable() -> String {
    "ffmpeg".to_string()
}

fn default_max_line_length() -> usize {
    42
}

fn default_max_lines() -> usize {
    2
}

fn default_true() -> bool {
    true
}

// whisper.cpp expects 16 kHz input
fn default_sample_rate() -> u32 {
    16_000
}

fn default_ledger_file_name() -> String {
    ".subgen.ledger.json".to_string()
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Canonical form of user-supplied values; the language code is used
    /// verbatim in engine arguments and subtitle names
    pub fn normalize(&mut self) {
        self.language = self.language.trim().to_lowercase();
    }

    /// Model path with `~` expanded
    pub fn expanded_model_path(&self) -> PathBuf {
        expand_home(&self.model_path)
    }

    /// Thread count as shown to the user
    pub fn thread_display(&self) -> String {
        if self.threads > 0 {
            self.threads.to_string()
        } else {
            "auto".to_string()
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !crate::language_utils::is_engine_language(&self.language) {
            return Err(anyhow!("Invalid language code: {}", self.language));
        }

        if self.max_line_length == 0 {
            return Err(anyhow!("max_line_length must be at least 1"));
        }

        if self.max_lines == 0 {
            return Err(anyhow!("max_lines must be at least 1"));
        }

        if self.engine_executable.trim().is_empty() {
            return Err(anyhow!("Recognition engine executable must not be empty"));
        }

        if self.decoder_executable.trim().is_empty() {
            return Err(anyhow!("Decoder executable must not be empty"));
        }

        if self.sample_rate == 0 {
            return Err(anyhow!("sample_rate must be positive"));
        }

        let ledger_name = Path::new(&self.ledger_file_name);
        if self.ledger_file_name.is_empty() || ledger_name.components().count() != 1 {
            return Err(anyhow!(
                "ledger_file_name must be a plain file name, got '{}'",
                self.ledger_file_name
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            language: default_language(),
            model_path: default_model_path(),
            engine_executable: default_engine_executable(),
            decoder_executable: default_decoder_executable(),
            threads: 0,
            max_line_length: default_max_line_length(),
            max_lines: default_max_lines(),
            skip_existing: true,
            force: false,
            sample_rate: default_sample_rate(),
            ledger_file_name: default_ledger_file_name(),
            decode_timeout_secs: None,
            engine_timeout_secs: None,
            write_run_log: true,
            log_level: LogLevel::default(),
        }
    }
}
