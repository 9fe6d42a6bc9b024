//! Environment variable utilities
//!
//! ```ignore
//! use vtid_core::env::{env_get, env_get_bool, env_get_ms};
//!
//! let workers: usize = env_get("VTID_NUM_WORKERS", 4);
//! let debug = env_get_bool("VTID_DEBUG", false);
//! let park = env_get_ms("VTID_PARK_TIMEOUT_MS", 50);
//! ```

use std::str::FromStr;
use std::time::Duration;

/// Get environment variable parsed as `T`, or `default` if unset or unparsable
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable parsed as `T`, `None` if unset or unparsable
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Get environment variable as boolean
///
/// "1", "true", "yes", "on" (any case) are true; anything else set is false.
/// Unset returns `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as a millisecond duration
#[inline]
pub fn env_get_ms(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_get(key, default_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_defaults() {
        let n: usize = env_get("__VTID_TEST_UNSET__", 42);
        assert_eq!(n, 42);
        assert!(env_get_bool("__VTID_TEST_UNSET__", true));
        assert!(env_get_opt::<u32>("__VTID_TEST_UNSET__").is_none());
        assert_eq!(env_get_ms("__VTID_TEST_UNSET__", 7), Duration::from_millis(7));
    }

    #[test]
    fn test_set_values() {
        std::env::set_var("__VTID_TEST_NUM__", " 12 ");
        assert_eq!(env_get::<usize>("__VTID_TEST_NUM__", 0), 12);
        assert_eq!(env_get_ms("__VTID_TEST_NUM__", 0), Duration::from_millis(12));
        std::env::remove_var("__VTID_TEST_NUM__");

        std::env::set_var("__VTID_TEST_BAD__", "twelve");
        assert_eq!(env_get::<usize>("__VTID_TEST_BAD__", 5), 5);
        std::env::remove_var("__VTID_TEST_BAD__");
    }

    #[test]
    fn test_bool_variants() {
        for (val, want) in [("1", true), ("ON", true), ("Yes", true), ("0", false), ("nope", false)] {
            std::env::set_var("__VTID_TEST_BOOL__", val);
            assert_eq!(env_get_bool("__VTID_TEST_BOOL__", !want), want, "value {:?}", val);
        }
        std::env::remove_var("__VTID_TEST_BOOL__");
    }
}
