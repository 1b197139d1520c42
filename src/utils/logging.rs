//! Structured Logging
//!
//! Provides `key=value` log lines on stderr that keep large values short:
//! - Digests and hex blobs (abbreviated)
//! - Message contents (truncated)

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag to enable/disable debug logging
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Longest field value printed verbatim
const MAX_FIELD_LEN: usize = 96;

/// Enable debug logging
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

/// Check if debug logging is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the log entry (digests are abbreviated, long values truncated)
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value_str = value.to_string();
        let shortened = shorten_for_key(key, &value_str);
        self.fields.push((key, shortened));
        self
    }

    /// Render the entry without timestamp
    pub fn render(&self) -> String {
        let fields_str = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        if fields_str.is_empty() {
            format!("{} [{}] {}", self.level, self.module, self.message)
        } else {
            format!("{} [{}] {} | {}", self.level, self.module, self.message, fields_str)
        }
    }

    /// Log the entry
    pub fn log(self) {
        // Skip debug logs if not enabled
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

/// Shorten a value if the key suggests it is a digest, or if it is too long
fn shorten_for_key(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    let hash_keys = ["hash", "separator", "digest", "preimage"];
    for hash_key in &hash_keys {
        if key_lower.contains(hash_key) {
            return abbreviate_hash(value);
        }
    }

    truncate_value(value)
}

/// Cut a value to `MAX_FIELD_LEN` characters
fn truncate_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count <= MAX_FIELD_LEN {
        return value.to_string();
    }

    let head: String = value.chars().take(MAX_FIELD_LEN).collect();
    format!("{}...[{}chars]", head, char_count)
}

/// Partially display a hash (show first 10 and last 6 chars)
fn abbreviate_hash(hash: &str) -> String {
    let trimmed = hash.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    if trimmed.len() <= 20 || !trimmed.is_ascii() {
        return truncate_value(trimmed);
    }

    let prefix_len = if trimmed.starts_with("0x") { 12 } else { 10 };
    let suffix_len = 6;

    let prefix = &trimmed[..prefix_len];
    let suffix = &trimmed[trimmed.len() - suffix_len..];

    format!("{}...{}", prefix, suffix)
}

/// Convenience macro for debug logging
#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr) => {
        if $crate::utils::logging::is_debug_enabled() {
            $crate::utils::logging::LogEntry::new(
                $crate::utils::logging::LogLevel::Debug,
                $module,
                $msg
            ).log()
        }
    };
    // Field expressions are only evaluated when debug output is on
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        if $crate::utils::logging::is_debug_enabled() {
            $crate::utils::logging::LogEntry::new(
                $crate::utils::logging::LogLevel::Debug,
                $module,
                $msg
            )
            $(.field(stringify!($key), &$value))*
            .log()
        }
    };
}

/// Convenience macro for info logging
#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for warning logging
#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for error logging
#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate_hash() {
        let hash = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        let shortened = abbreviate_hash(hash);
        assert!(shortened.starts_with("0x1234567890"));
        assert!(shortened.ends_with("abcdef"));
        assert!(shortened.contains("..."));

        assert_eq!(abbreviate_hash(""), "[EMPTY]");
        assert_eq!(abbreviate_hash("0xabc"), "0xabc");
    }

    #[test]
    fn test_truncate_value() {
        assert_eq!(truncate_value("Mail"), "Mail");

        let long = "a".repeat(200);
        let truncated = truncate_value(&long);
        assert!(truncated.starts_with(&"a".repeat(MAX_FIELD_LEN)));
        assert!(truncated.ends_with("...[200chars]"));
    }

    #[test]
    fn test_shorten_for_key() {
        let digest = "f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f";
        assert!(shorten_for_key("domain_separator", digest).contains("..."));
        assert!(shorten_for_key("struct_hash", digest).contains("..."));
        assert_eq!(shorten_for_key("primary_type", "Mail"), "Mail");
    }

    #[test]
    fn test_debug_fields_not_evaluated_when_disabled() {
        use std::cell::Cell;

        assert!(!is_debug_enabled());
        let evaluated = Cell::new(0);
        let expensive = || {
            evaluated.set(evaluated.get() + 1);
            "deadbeef".repeat(8)
        };

        crate::log_debug!("test", "Skipped", struct_hash = expensive());
        assert_eq!(evaluated.get(), 0);
    }

    #[test]
    fn test_warn_entry() {
        let entry = LogEntry::new(LogLevel::Warn, "eip712", "Ignoring undeclared fields")
            .field("type_name", "Mail")
            .field("ignored", "extra,other");

        assert_eq!(
            entry.render(),
            "WARN [eip712] Ignoring undeclared fields | type_name=Mail ignored=extra,other"
        );
    }

    #[test]
    fn test_log_entry() {
        let entry = LogEntry::new(LogLevel::Info, "test", "Encoded")
            .field("primary_type", "Mail")
            .field("type_count", 2)
            .field(
                "digest",
                "0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2",
            );

        assert_eq!(
            entry.render(),
            "INFO [test] Encoded | primary_type=Mail type_count=2 digest=0xbe609aee34...957bd2"
        );
    }
}
