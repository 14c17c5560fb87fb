//! Structured logging setup.
//!
//! Builds tracing filter directives from [`LoggingConfig`], including
//! component-specific levels, and initializes the global subscriber for
//! binaries. The library itself only emits `tracing` events and never
//! installs a subscriber.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level and
/// any component-specific levels, in the form
/// `"info,atrium::backend=debug"`.
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        for (component, level) in component_levels {
            filter_str.push_str(&format!(",atrium::{}={}", component, level));
        }
    }

    filter_str
}

/// Install the global subscriber for a binary entry point.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(build_filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn base_level_only() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn component_levels_are_appended() {
        let mut component_levels = HashMap::new();
        component_levels.insert("backend".to_string(), "debug".to_string());

        let config = LoggingConfig {
            level: "info".to_string(),
            component_levels: Some(component_levels),
            ..Default::default()
        };

        assert_eq!(build_filter_directives(&config), "info,atrium::backend=debug");
    }
}
