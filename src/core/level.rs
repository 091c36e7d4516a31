//! Named severity scales
//!
//! A [`LevelMapping`] maps level names to numeric severities together with the
//! direction in which severity grows. Several mappings coexist inside one
//! [`LevelRegistry`]; loggers and handles pick one by name.

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub const NPM: &str = "npm";
pub const HTTP: &str = "http";
pub const SYSLOG: &str = "syslog";
pub const PYTHON: &str = "python";
pub const DEFCON: &str = "defcon";

/// Direction in which a mapping's severity numbers get worse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityOrder {
    /// Larger numbers are worse (http status groups, python)
    Ascending,
    /// Smaller numbers are worse (npm, syslog, defcon)
    Descending,
}

impl SeverityOrder {
    #[must_use]
    pub fn sign(self) -> i8 {
        match self {
            SeverityOrder::Ascending => 1,
            SeverityOrder::Descending => -1,
        }
    }

    #[must_use]
    pub fn from_sign(sign: i64) -> Option<Self> {
        match sign {
            1 => Some(SeverityOrder::Ascending),
            -1 => Some(SeverityOrder::Descending),
            _ => None,
        }
    }

    /// True when `severity` is at least as severe as `threshold`
    #[inline]
    #[must_use]
    pub fn meets(self, severity: i64, threshold: i64) -> bool {
        match self {
            SeverityOrder::Ascending => severity >= threshold,
            SeverityOrder::Descending => severity <= threshold,
        }
    }
}

/// One named severity scale
#[derive(Debug, Clone)]
pub struct LevelMapping {
    name: String,
    order: SeverityOrder,
    /// Declaration order, used for colour maps and error-level inference
    levels: Vec<(String, i64)>,
    by_name: HashMap<String, i64>,
    by_severity: BTreeMap<i64, String>,
}

impl LevelMapping {
    /// Build a mapping, rejecting empty scales and duplicate names or severities.
    pub fn new<I, S>(name: impl Into<String>, levels: I, order: SeverityOrder) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut mapping = Self {
            name,
            order,
            levels: Vec::new(),
            by_name: HashMap::new(),
            by_severity: BTreeMap::new(),
        };

        for (level, severity) in levels {
            let level = level.into();
            if mapping.by_name.contains_key(&level) {
                return Err(LoggerError::config(
                    "level mapper",
                    format!("'{}' declares level '{}' twice", mapping.name, level),
                ));
            }
            if let Some(existing) = mapping.by_severity.get(&severity) {
                return Err(LoggerError::config(
                    "level mapper",
                    format!(
                        "'{}' assigns severity {} to both '{}' and '{}'",
                        mapping.name, severity, existing, level
                    ),
                ));
            }
            mapping.by_name.insert(level.clone(), severity);
            mapping.by_severity.insert(severity, level.clone());
            mapping.levels.push((level, severity));
        }

        if mapping.levels.is_empty() {
            return Err(LoggerError::config(
                "level mapper",
                format!("'{}' has no levels", mapping.name),
            ));
        }

        Ok(mapping)
    }

    /// Build a mapping from a JSON object of `{levelName: severity}`.
    ///
    /// Every value must be an integral number.
    pub fn from_json(
        name: impl Into<String>,
        levels: &serde_json::Value,
        order: SeverityOrder,
    ) -> Result<Self> {
        let name = name.into();
        let object = levels.as_object().ok_or_else(|| {
            LoggerError::config("level mapper", format!("'{}' levels must be an object", name))
        })?;

        let mut parsed = Vec::with_capacity(object.len());
        for (level, value) in object {
            let severity = value.as_i64().ok_or_else(|| {
                LoggerError::config(
                    "level mapper",
                    format!("'{}' severity for '{}' is not numeric: {}", name, level, value),
                )
            })?;
            parsed.push((level.clone(), severity));
        }

        Self::new(name, parsed, order)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn order(&self) -> SeverityOrder {
        self.order
    }

    /// Level names in declaration order
    pub fn level_names(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn contains(&self, level: &str) -> bool {
        self.by_name.contains_key(level)
    }

    #[must_use]
    pub fn resolve_severity(&self, level: &str) -> Option<i64> {
        self.by_name.get(level).copied()
    }

    /// Reverse lookup. Ascending scales floor to the nearest lower bucket, so
    /// status 404 resolves to the 400 level.
    #[must_use]
    pub fn resolve_name(&self, severity: i64) -> Option<&str> {
        match self.order {
            SeverityOrder::Ascending => self
                .by_severity
                .range(..=severity)
                .next_back()
                .map(|(_, name)| name.as_str()),
            SeverityOrder::Descending => self.by_severity.get(&severity).map(String::as_str),
        }
    }

    /// (least severe, most severe)
    #[must_use]
    pub fn min_max_severity(&self) -> (i64, i64) {
        // new() guarantees at least one entry
        let lowest = self.by_severity.keys().next().copied().unwrap_or_default();
        let highest = self.by_severity.keys().next_back().copied().unwrap_or_default();
        match self.order {
            SeverityOrder::Ascending => (lowest, highest),
            SeverityOrder::Descending => (highest, lowest),
        }
    }

    #[inline]
    #[must_use]
    pub fn meets(&self, severity: i64, threshold: i64) -> bool {
        self.order.meets(severity, threshold)
    }
}

/// Declarative form of a mapping, as it appears in configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelMappingConfig {
    pub name: String,
    pub levels: serde_json::Value,
    /// `1` when larger numbers are worse, `-1` when smaller numbers are worse
    pub order_of_severity: i64,
}

impl LevelMappingConfig {
    pub fn build(&self) -> Result<LevelMapping> {
        let order = SeverityOrder::from_sign(self.order_of_severity).ok_or_else(|| {
            LoggerError::config(
                "level mapper",
                format!(
                    "'{}' orderOfSeverity must be 1 or -1, got {}",
                    self.name, self.order_of_severity
                ),
            )
        })?;
        LevelMapping::from_json(self.name.clone(), &self.levels, order)
    }
}

/// Every mapping known to one logging environment
#[derive(Debug, Clone)]
pub struct LevelRegistry {
    mappings: HashMap<String, Arc<LevelMapping>>,
}

impl LevelRegistry {
    /// Registry preloaded with the npm, http, syslog, python and defcon scales
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            mappings: HashMap::new(),
        };
        for mapping in builtin_mappings() {
            registry
                .mappings
                .insert(mapping.name().to_string(), Arc::new(mapping));
        }
        registry
    }

    pub fn register(&mut self, mapping: LevelMapping) -> Result<()> {
        if self.mappings.contains_key(mapping.name()) {
            return Err(LoggerError::duplicate("level mapper", mapping.name()));
        }
        self.mappings
            .insert(mapping.name().to_string(), Arc::new(mapping));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Arc<LevelMapping>> {
        self.mappings
            .get(name)
            .ok_or_else(|| LoggerError::UnknownMapper(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin(name: &str, levels: &[(&str, i64)], order: SeverityOrder) -> LevelMapping {
    LevelMapping {
        name: name.to_string(),
        order,
        levels: levels.iter().map(|(l, s)| ((*l).to_string(), *s)).collect(),
        by_name: levels.iter().map(|(l, s)| ((*l).to_string(), *s)).collect(),
        by_severity: levels.iter().map(|(l, s)| (*s, (*l).to_string())).collect(),
    }
}

fn builtin_mappings() -> [LevelMapping; 5] {
    [
        builtin(
            NPM,
            &[
                ("error", 0),
                ("warn", 1),
                ("info", 2),
                ("http", 3),
                ("verbose", 4),
                ("debug", 5),
                ("silly", 6),
            ],
            SeverityOrder::Descending,
        ),
        builtin(
            HTTP,
            &[
                ("info", 100),
                ("success", 200),
                ("redirect", 300),
                ("clientError", 400),
                ("serverError", 500),
            ],
            SeverityOrder::Ascending,
        ),
        builtin(
            SYSLOG,
            &[
                ("emerg", 0),
                ("alert", 1),
                ("crit", 2),
                ("error", 3),
                ("warning", 4),
                ("notice", 5),
                ("info", 6),
                ("debug", 7),
            ],
            SeverityOrder::Descending,
        ),
        builtin(
            PYTHON,
            &[
                ("debug", 10),
                ("info", 20),
                ("warning", 30),
                ("error", 40),
                ("critical", 50),
            ],
            SeverityOrder::Ascending,
        ),
        builtin(
            DEFCON,
            &[
                ("defcon1", 1),
                ("defcon2", 2),
                ("defcon3", 3),
                ("defcon4", 4),
                ("defcon5", 5),
            ],
            SeverityOrder::Descending,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_round_trip() {
        let registry = LevelRegistry::new();
        for mapper in [NPM, HTTP, SYSLOG, PYTHON, DEFCON] {
            let mapping = registry.get(mapper).unwrap();
            for name in mapping.level_names() {
                let severity = mapping.resolve_severity(name).unwrap();
                assert_eq!(mapping.resolve_name(severity), Some(name));
            }
        }
    }

    #[test]
    fn test_http_floors_status_codes() {
        let registry = LevelRegistry::new();
        let http = registry.get(HTTP).unwrap();
        assert_eq!(http.resolve_name(404), Some("clientError"));
        assert_eq!(http.resolve_name(503), Some("serverError"));
        assert_eq!(http.resolve_name(99), None);
    }

    #[test]
    fn test_descending_requires_exact_match() {
        let registry = LevelRegistry::new();
        let npm = registry.get(NPM).unwrap();
        assert_eq!(npm.resolve_name(1), Some("warn"));
        assert_eq!(npm.resolve_name(42), None);
    }

    #[test]
    fn test_min_max_honours_order() {
        let registry = LevelRegistry::new();
        assert_eq!(registry.get(NPM).unwrap().min_max_severity(), (6, 0));
        assert_eq!(registry.get(HTTP).unwrap().min_max_severity(), (100, 500));
    }

    #[test]
    fn test_meets_threshold() {
        assert!(SeverityOrder::Descending.meets(0, 2));
        assert!(!SeverityOrder::Descending.meets(5, 2));
        assert!(SeverityOrder::Ascending.meets(500, 400));
        assert!(!SeverityOrder::Ascending.meets(200, 400));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = LevelRegistry::new();
        let mapping = LevelMapping::new("npm", [("a", 1)], SeverityOrder::Ascending).unwrap();
        assert!(matches!(
            registry.register(mapping),
            Err(LoggerError::DuplicateName { .. })
        ));

        let custom = LevelMapping::new("custom", [("low", 1), ("high", 9)], SeverityOrder::Ascending)
            .unwrap();
        registry.register(custom).unwrap();
        assert!(registry.contains("custom"));
    }

    #[test]
    fn test_mapping_validation() {
        let empty: [(&str, i64); 0] = [];
        assert!(LevelMapping::new("empty", empty, SeverityOrder::Ascending).is_err());
        assert!(LevelMapping::new("dup", [("a", 1), ("b", 1)], SeverityOrder::Ascending).is_err());

        let err = LevelMapping::from_json("bad", &json!({"a": "one"}), SeverityOrder::Ascending);
        assert!(matches!(err, Err(LoggerError::InvalidConfiguration { .. })));

        let ok = LevelMapping::from_json("ok", &json!({"low": 1, "high": 2}), SeverityOrder::Ascending)
            .unwrap();
        assert_eq!(ok.resolve_severity("high"), Some(2));
    }

    #[test]
    fn test_mapping_config_order_sign() {
        let config = LevelMappingConfig {
            name: "tiers".to_string(),
            levels: json!({"gold": 1, "silver": 2}),
            order_of_severity: 0,
        };
        assert!(config.build().is_err());

        let config = LevelMappingConfig {
            order_of_severity: -1,
            ..config
        };
        assert_eq!(config.build().unwrap().order(), SeverityOrder::Descending);
    }
}
