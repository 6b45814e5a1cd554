// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subgen::app_config::{self, Config};
use subgen::app_controller::Controller;
use subgen::language_utils;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for subgen
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subgen - batch subtitle generation with whisper.cpp
///
/// Walks a directory tree, transcribes every audio and video file with a
/// local speech recognition model and writes a SubRip subtitle next to it.
#[derive(Parser, Debug)]
#[command(name = "subgen")]
#[command(version)]
#[command(about = "Generate subtitles for a folder of media files")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "subgen transcribes every media file under a directory with whisper.cpp and
writes <name>.<language>.srt next to each one. Progress is kept in a ledger in
the root directory, so an interrupted run picks up where it stopped.

EXAMPLES:
    subgen ~/Videos                              # Transcribe in English with defaults
    subgen -l de --model-path ~/m/ggml-large.bin .  # German with a specific model
    subgen --max-line-length 32 --max-lines 1 .  # One short line per caption
    subgen -f ~/Videos                           # Regenerate every subtitle
    subgen --limit 5 ~/Videos                    # Process five files, resume later
    subgen completions bash > subgen.bash        # Generate bash completions

CONFIGURATION:
    Settings can be loaded from a JSON file with --config. Command line
    options override values from the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Root directory to scan for media files
    #[arg(value_name = "ROOT_DIRECTORY")]
    root_directory: Option<PathBuf>,

    /// Language code for recognition and output file names (e.g. 'en', 'de', 'auto')
    #[arg(short, long)]
    language: Option<String>,

    /// Path to the GGML model file
    #[arg(long, env = "SUBGEN_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Recognition engine executable
    #[arg(long)]
    cli_executable: Option<String>,

    /// Decoder executable
    #[arg(long)]
    ffmpeg_executable: Option<String>,

    /// Engine threads (0 lets the engine decide)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Maximum characters per caption line
    #[arg(long)]
    max_line_length: Option<usize>,

    /// Maximum lines per caption
    #[arg(long)]
    max_lines: Option<usize>,

    /// Skip files that already have a subtitle (default)
    #[arg(long, overrides_with = "no_skip_existing")]
    skip_existing: bool,

    /// Process files even if a subtitle exists
    #[arg(long)]
    no_skip_existing: bool,

    /// Reprocess every file, overwriting subtitles and ledger entries
    #[arg(short, long)]
    force: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Stop after this many files were processed
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl CommandLineOptions {
    /// Resolved skip-existing override, if any was given
    fn skip_existing_override(&self) -> Option<bool> {
        if self.no_skip_existing {
            Some(false)
        } else if self.skip_existing {
            Some(true)
        } else {
            None
        }
    }

    /// Apply command line overrides on top of a loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(model_path) = &self.model_path {
            config.model_path = model_path.clone();
        }
        if let Some(executable) = &self.cli_executable {
            config.engine_executable = executable.clone();
        }
        if let Some(executable) = &self.ffmpeg_executable {
            config.decoder_executable = executable.clone();
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(max_line_length) = self.max_line_length {
            config.max_line_length = max_line_length;
        }
        if let Some(max_lines) = self.max_lines {
            config.max_lines = max_lines;
        }
        if let Some(skip_existing) = self.skip_existing_override() {
            config.skip_existing = skip_existing;
        }
        if self.force {
            config.force = true;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone().into();
        }
    }
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set via max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subgen", &mut std::io::stdout());
            Ok(())
        }
        None => run_generate(cli).await,
    }
}

/// Load the configuration file, creating a default one if it is missing
fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return Config::load_from_file(path);
    }

    warn!("Config file not found at '{}', creating default config.", path.display());
    let config = Config::default();
    let config_json = serde_json::to_string_pretty(&config)
        .context("Failed to serialize default config to JSON")?;
    std::fs::write(path, config_json)
        .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

    Ok(config)
}

async fn run_generate(options: CommandLineOptions) -> Result<()> {
    let root = options
        .root_directory
        .clone()
        .ok_or_else(|| anyhow!("ROOT_DIRECTORY is required when no subcommand is specified"))?;

    // If log level is set via command line, apply it before loading anything
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = match &options.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    options.apply_to(&mut config);
    config.normalize();

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let language_name = language_utils::get_language_name(&config.language)
        .unwrap_or_else(|_| config.language.clone());
    info!("🎙️ subgen: {} ({})", root.display(), language_name);
    info!(
        "Model: {} | Engine: {} | Threads: {}",
        config.expanded_model_path().display(),
        config.engine_executable,
        config.thread_display()
    );
    info!(
        "Captions: {} chars x {} lines | Skip existing: {} | Force: {}",
        config.max_line_length, config.max_lines, config.skip_existing, config.force
    );

    let controller = Controller::with_config(config)?
        .with_file_limit(options.limit)
        .with_progress(!options.no_progress);

    let summary = controller.run_folder(&root).await?;

    if !summary.is_clean() {
        return Err(anyhow!(
            "{} of {} files failed, see the ledger for details",
            summary.failed,
            summary.total
        ));
    }

    Ok(())
}
