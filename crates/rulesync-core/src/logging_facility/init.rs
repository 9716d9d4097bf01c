//! Logging initialization

use serde::Deserialize;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Human-readable output, `rulesync=debug`
    Development,
    /// JSON output, `rulesync=info`
    Production,
    /// Installs nothing; tests install their own layer via `init_test_capture()`
    Test,
}

impl Profile {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "rulesync=debug",
            Profile::Production => "rulesync=info",
            Profile::Test => "off",
        }
    }
}

static INIT_ONCE: Once = Once::new();

fn env_filter(profile: Profile) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(profile.default_directive()))
}

/// Initialize the logging facility.
///
/// Only the first call installs a subscriber; later calls are ignored, so
/// library consumers and tests may call it freely. `RUST_LOG` overrides the
/// profile's default filter.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            // try_init: another subscriber may already be installed by the host
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter(profile))
                .try_init();
        }
        Profile::Production => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter(profile))
                .try_init();
        }
        Profile::Test => {}
    });
}
