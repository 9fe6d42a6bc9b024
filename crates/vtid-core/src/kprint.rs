//! Kernel-style print macros for vtid
//!
//! Leveled, line-atomic output to stderr. When called from a runtime
//! machine the line is tagged with the machine id (`[m3]`).
//!
//! # Environment Variables
//!
//! - `VTID_FLUSH_EPRINT=1` - Flush stderr after each line
//! - `VTID_LOG_LEVEL=<level>` - off, error, warn, info, debug, trace (or 0-5)
//!
//! # Usage
//!
//! ```ignore
//! use vtid_core::{kinfo, kdebug};
//!
//! kinfo!("machine {} started", id);
//! kdebug!("resolved offsets: {}", cache);
//! ```

use std::cell::Cell;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Once;

/// Log levels
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a level name or number; unknown input yields `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "1" => Some(LogLevel::Error),
            "warn" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static INIT: Once = Once::new();
static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

/// Sentinel for "not on a machine"
const NO_MACHINE: u32 = u32::MAX;

thread_local! {
    static MACHINE_ID: Cell<u32> = const { Cell::new(NO_MACHINE) };
}

/// Initialize logging from environment variables
///
/// Runs on first log automatically; explicit calls are harmless.
pub fn init() {
    INIT.call_once(|| {
        FLUSH_ENABLED.store(crate::env::env_get_bool("VTID_FLUSH_EPRINT", false), Ordering::Relaxed);
        if let Some(level) = std::env::var("VTID_LOG_LEVEL").ok().and_then(|v| LogLevel::parse(&v)) {
            LOG_LEVEL.store(level as u8, Ordering::Relaxed);
        }
    });
}

#[inline]
pub fn log_level() -> LogLevel {
    init();
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level programmatically (overrides the environment)
pub fn set_log_level(level: LogLevel) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn set_flush_enabled(enabled: bool) {
    init();
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}

#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= log_level()
}

/// Tag log lines from this thread with a machine id
pub fn set_machine_id(id: u32) {
    MACHINE_ID.with(|c| c.set(id));
}

pub fn clear_machine_id() {
    MACHINE_ID.with(|c| c.set(NO_MACHINE));
}

#[doc(hidden)]
pub fn _kprintln_impl(args: std::fmt::Arguments<'_>) {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    if FLUSH_ENABLED.load(Ordering::Relaxed) {
        let _ = handle.flush();
    }
}

#[doc(hidden)]
pub fn _klog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let machine = MACHINE_ID.with(|c| c.get());
    if machine == NO_MACHINE {
        _kprintln_impl(format_args!("{} {}", level.prefix(), args));
    } else {
        _kprintln_impl(format_args!("{} [m{}] {}", level.prefix(), machine, args));
    }
}

// ============================================================================
// Public Macros
// ============================================================================

/// Print to stderr with newline, regardless of level
#[macro_export]
macro_rules! kprintln {
    () => {{
        $crate::kprint::_kprintln_impl(format_args!(""));
    }};
    ($($arg:tt)*) => {{
        $crate::kprint::_kprintln_impl(format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Error, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Warn, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Info, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Debug, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Trace, format_args!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse(" 2 "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::from_u8(99), LogLevel::Trace);
    }

    #[test]
    fn test_off_is_never_enabled() {
        assert!(!level_enabled(LogLevel::Off));
        assert!(LogLevel::Error < LogLevel::Trace);
    }

    #[test]
    fn test_macros_compile() {
        set_machine_id(3);
        kerror!("error {}", "msg");
        kwarn!("warn");
        kinfo!("info");
        kdebug!("debug {}", 1);
        ktrace!("trace");
        clear_machine_id();
        kprintln!("plain {}", 42);
    }
}
