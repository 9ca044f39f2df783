//! Environment-derived runtime settings.
//!
//! One knob matters to this endpoint: the stack size of the coroutines the
//! HTTP host spawns per connection. `GRAPHQL_ENDPOINT_STACK_SIZE` accepts
//! decimal (`16384`) or `0x`-prefixed hex (`0x4000`) byte counts; the
//! default of 16 KB covers the dispatch pipeline with room for engine
//! resolvers of moderate depth.

use std::env;

const STACK_SIZE_VAR: &str = "GRAPHQL_ENDPOINT_STACK_SIZE";
const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup with [`RuntimeConfig::from_env()`] before spawning
/// the server.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = match env::var(STACK_SIZE_VAR) {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_STACK_SIZE)
                } else {
                    val.parse().unwrap_or(DEFAULT_STACK_SIZE)
                }
            }
            Err(_) => DEFAULT_STACK_SIZE,
        };
        RuntimeConfig { stack_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global; the lock keeps these cases from racing.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn with_var(value: Option<&str>, check: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        match value {
            Some(v) => env::set_var(STACK_SIZE_VAR, v),
            None => env::remove_var(STACK_SIZE_VAR),
        }
        check();
        env::remove_var(STACK_SIZE_VAR);
    }

    #[test]
    fn default_when_unset() {
        with_var(None, || {
            assert_eq!(RuntimeConfig::from_env().stack_size, DEFAULT_STACK_SIZE);
        });
    }

    #[test]
    fn parses_decimal_and_hex() {
        with_var(Some("32768"), || {
            assert_eq!(RuntimeConfig::from_env().stack_size, 32768);
        });
        with_var(Some("0x8000"), || {
            assert_eq!(RuntimeConfig::from_env().stack_size, 0x8000);
        });
    }

    #[test]
    fn garbage_falls_back_to_default() {
        with_var(Some("lots"), || {
            assert_eq!(RuntimeConfig::from_env().stack_size, DEFAULT_STACK_SIZE);
        });
    }
}
