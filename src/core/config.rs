//! Aggregate configuration
//!
//! Mirrors what a config loader would hand over: custom level scales,
//! formatters, handles and loggers, applied in that order by
//! [`Registry::configure`](super::registry::Registry::configure).

use super::error::Result;
use super::formatter::FormatterConfig;
use super::handle::HandleConfig;
use super::level::LevelMappingConfig;
use super::logger::LoggerConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub levels: Vec<LevelMappingConfig>,
    pub formatters: Vec<FormatterConfig>,
    pub handles: Vec<HandleConfig>,
    pub loggers: Vec<LoggerConfig>,
}

impl LoggingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handle::TargetSpec;

    #[test]
    fn test_parse_full_config() {
        let config = LoggingConfig::from_json_str(
            r#"{
                "levels": [{"name": "tiers", "levels": {"low": 1, "high": 2}, "orderOfSeverity": 1}],
                "formatters": [{"name": "f", "format": "%{level} %{message}"}],
                "handles": [{"name": "out", "target": "file", "path": "/tmp/out.log", "formatter": "f"}],
                "loggers": [{"name": "svc", "handle": ["out"], "level": "info"}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.levels[0].build().unwrap().name(), "tiers");
        assert_eq!(config.formatters[0].name, "f");
        assert!(matches!(config.handles[0].target, TargetSpec::File));
        assert_eq!(config.loggers[0].level.as_deref(), Some("info"));
    }

    #[test]
    fn test_empty_and_invalid() {
        let empty = LoggingConfig::from_json_str("{}").unwrap();
        assert!(empty.handles.is_empty());
        assert!(LoggingConfig::from_json_str("{\"handles\": 3}").is_err());
    }
}
