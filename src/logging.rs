/// Structured logging for the lake preprocessor
///
/// Provides context-rich logging tagged with the pipeline stage and, where
/// relevant, the series key (variable/location/category). Supports console
/// output and an append-only log file for batch runs.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Grid,
    Series,
    Export,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ingest => write!(f, "INGEST"),
            Stage::Grid => write!(f, "GRID"),
            Stage::Series => write!(f, "SERIES"),
            Stage::Export => write!(f, "EXPORT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, stage: Stage, key: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let key_part = key.map(|k| format!(" [{}]", k)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, key_part, message)
    }

    fn log(&self, level: LogLevel, stage: Stage, key: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, stage, key, message);
        let key_part = key.map(|k| format!(" [{}]", k)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, key_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, key_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG]{} {}", key_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, stage: Stage, key: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, key, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, key: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, stage, key, message);
}

/// Log a warning message
pub fn warn(stage: Stage, key: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, stage, key, message);
}

/// Log an error message
pub fn error(stage: Stage, key: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, stage, key, message);
}

/// Log a debug message
pub fn debug(stage: Stage, key: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, stage, key, message);
}

/// Formats a series key as `VAR/LOC` or `VAR/LOC/CAT`.
pub fn series_key(variable: &str, location: Option<&str>, category: Option<&str>) -> String {
    match (location, category) {
        (Some(loc), Some(cat)) => format!("{}/{}/{}", variable, loc, cat),
        (Some(loc), None) => format!("{}/{}", variable, loc),
        _ => variable.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Log how much of a variable's tensor ended up populated.
///
/// An entirely empty tensor is a warning: usually a column name mismatch or
/// a dataset with too few samples everywhere.
pub fn log_variable_summary(variable: &str, filled: usize, total: usize, masked: usize) {
    let message = format!(
        "{}/{} cells filled, {} masked by seasonal gaps",
        filled,
        total,
        masked
    );

    if filled == 0 && total > 0 {
        warn(Stage::Series, Some(variable), &message);
    } else {
        info(Stage::Series, Some(variable), &message);
    }
}

/// Log a summary of a dataset load
pub fn log_ingest_summary(dataset: &str, rows: usize, skipped: usize) {
    let message = format!("Loaded {} rows, {} skipped", rows, skipped);

    if rows == 0 {
        error(Stage::Ingest, Some(dataset), &message);
    } else if skipped > 0 {
        warn(Stage::Ingest, Some(dataset), &message);
    } else {
        info(Stage::Ingest, Some(dataset), &message);
    }
}
