//! Logger setup for the boat executables
//!
//! Every record goes to stdout and to the session log file, prefixed with the seconds elapsed
//! since the session epoch and a coloured level tag.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{info, Level, Record};
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Level overrides applied on top of the minimum level.
///
/// zmq is noisy below info, and dropped frames are always worth recording.
const TARGET_LEVELS: [(&str, LevelFilter); 2] = [
    ("zmq", LevelFilter::Info),
    ("comms_if::frame", LevelFilter::Debug)
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must include `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error opening the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `min_level` must be at least as verbose as `Info`, since mission state changes are logged
///   at info level and have to reach the log file.
/// - Only the first call succeeds.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let dispatch = TARGET_LEVELS
        .iter()
        .fold(
            fern::Dispatch::new().level(min_level),
            |d, &(target, level)| d.level_for(target, level)
        );

    dispatch
        .format(|out, message, record| out.finish(format_args!(
            "{} {}",
            prefix(record),
            message
        )))
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Parse a log level filter from its name (e.g. `"debug"`), defaulting to `Info` if unknown.
pub fn level_from_str(name: &str) -> LevelFilter {
    name.parse().unwrap_or(LevelFilter::Info)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the prefix of a record. Debug and trace records also name their target.
fn prefix(record: &Record) -> String {
    let elapsed = session::get_elapsed_seconds();

    match record.level() {
        Level::Debug | Level::Trace => format!(
            "[{:10.6} {}] {}:",
            elapsed,
            level_tag(record.level()),
            record.target()
        ),
        l => format!("[{:10.6} {}]", elapsed, level_tag(l))
    }
}

/// Coloured three letter tag for a level
fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_from_str() {
        assert_eq!(level_from_str("trace"), LevelFilter::Trace);
        assert_eq!(level_from_str("DEBUG"), LevelFilter::Debug);
        assert_eq!(level_from_str("loud"), LevelFilter::Info);
    }

    #[test]
    fn test_level_tags() {
        assert!(level_tag(Level::Warn).to_string().contains("WRN"));
        assert!(level_tag(Level::Error).to_string().contains("ERR"));
    }
}
