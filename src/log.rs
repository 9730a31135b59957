//! Diagnostic logging for meshflow runs.
//!
//! This is separate from the timing log: it records what the orchestrator
//! decided and invoked, while the timing log only records successful phases.
//!
//! Log levels:
//! - ERROR: A step or phase failed and the run is aborting
//! - WARN: Suspicious but accepted configuration (overlapping cases, missing revision)
//! - INFO: Phase start/finish, repetitions
//! - DEBUG: Target resolution, resolved parameters, command lines
//! - TRACE: Per work-item detail
//!
//! Debug mode can be enabled with `--debug` or `MESHFLOW_DEBUG=1`;
//! `MESHFLOW_DEBUG=trace` also records every work item.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Initialize logging to ~/.meshflow/meshflow.log.
///
/// The diagnostic log only covers the latest invocation, so it is
/// truncated here. The timing log is never touched by this module.
pub fn init_with_debug(debug: bool) {
    let env = std::env::var("MESHFLOW_DEBUG").ok();
    set_level(level_for(debug, env.as_deref()));

    if let Some(dir) = dirs::home_dir().map(|h| h.join(".meshflow")) {
        let _ = std::fs::create_dir_all(&dir);
        init_at(&dir.join("meshflow.log"));
    }
}

/// Direct diagnostics to an explicit file. Only the first call wins.
pub fn init_at(path: &Path) {
    let _ = std::fs::write(path, "");
    LOG_PATH.set(path.to_path_buf()).ok();
}

pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn get_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Level selected by the `--debug` flag and the `MESHFLOW_DEBUG` value.
fn level_for(debug: bool, env: Option<&str>) -> LogLevel {
    match env.map(str::to_lowercase).as_deref() {
        Some("trace") => LogLevel::Trace,
        Some("1") | Some("true") => LogLevel::Debug,
        _ if debug => LogLevel::Debug,
        _ => LogLevel::Info,
    }
}

/// Log a message at the specified level.
pub fn log_at(level: LogLevel, msg: &str) {
    if level > get_level() {
        return;
    }

    if let Some(path) = LOG_PATH.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{}] {}", timestamp, level.as_str(), msg);
        }
    }
}

pub fn error(msg: &str) {
    log_at(LogLevel::Error, msg);
}

pub fn warn(msg: &str) {
    log_at(LogLevel::Warn, msg);
}

pub fn info(msg: &str) {
    log_at(LogLevel::Info, msg);
}

pub fn debug(msg: &str) {
    log_at(LogLevel::Debug, msg);
}

pub fn trace(msg: &str) {
    log_at(LogLevel::Trace, msg);
}

/// Log macro for INFO level.
#[macro_export]
macro_rules! mlog {
    ($($arg:tt)*) => {
        $crate::log::info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! mlog_error {
    ($($arg:tt)*) => {
        $crate::log::error(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! mlog_warn {
    ($($arg:tt)*) => {
        $crate::log::warn(&format!($($arg)*))
    };
}

/// Log macro for DEBUG level (only logs when debug mode is enabled).
#[macro_export]
macro_rules! mlog_debug {
    ($($arg:tt)*) => {
        $crate::log::debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! mlog_trace {
    ($($arg:tt)*) => {
        $crate::log::trace(&format!($($arg)*))
    };
}
