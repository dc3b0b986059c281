use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::model::config::LogConfig;

pub const LOG_ENV: &str = "SHELF_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Only write if `[log] file` is set; stderr belongs to the terminal UI
    FileOnly,
}

/// Filter directives: `$SHELF_LOG`, then `[log] filter`, then `warn`
pub fn filter_directives(env_value: Option<String>, config: &LogConfig) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| config.filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("warning: bad log filter '{}': {}", directives, e);
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(config: &LogConfig, target: LogTarget) -> io::Result<()> {
    let directives = filter_directives(std::env::var(LOG_ENV).ok(), config);
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(&directives));

    let installed = match (target, &config.file) {
        (_, Some(path)) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .is_ok()
        }
        (LogTarget::Stderr, None) => builder.with_writer(io::stderr).try_init().is_ok(),
        (LogTarget::FileOnly, None) => return Ok(()),
    };
    if installed {
        tracing::debug!(filter = %directives, "logging initialised");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_precedence() {
        let config = LogConfig {
            filter: Some("shelf=debug".into()),
            file: None,
        };
        assert_eq!(filter_directives(Some("trace".into()), &config), "trace");
        assert_eq!(filter_directives(None, &config), "shelf=debug");
        assert_eq!(filter_directives(Some(" ".into()), &config), "shelf=debug");
        assert_eq!(filter_directives(None, &LogConfig::default()), "warn");
    }

    #[test]
    fn test_file_only_without_file_is_noop() {
        assert!(init(&LogConfig::default(), LogTarget::FileOnly).is_ok());
    }
}
