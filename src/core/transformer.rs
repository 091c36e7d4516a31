//! String transformers applied to single tokens or whole output

use super::error::{LoggerError, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type TransformFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Built-ins that cannot be replaced or removed
pub const RESERVED_TRANSFORMERS: [&str; 2] = ["uppercase", "lowercase"];

/// A transformer referenced by registered name or given inline
#[derive(Clone)]
pub enum TransformerRef {
    Named(String),
    Inline(TransformFn),
}

impl TransformerRef {
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        TransformerRef::Inline(Arc::new(f))
    }

    fn label(&self) -> &str {
        match self {
            TransformerRef::Named(name) => name,
            TransformerRef::Inline(_) => "<inline>",
        }
    }
}

impl fmt::Debug for TransformerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformerRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            TransformerRef::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

impl From<&str> for TransformerRef {
    fn from(name: &str) -> Self {
        TransformerRef::Named(name.to_string())
    }
}

impl From<String> for TransformerRef {
    fn from(name: String) -> Self {
        TransformerRef::Named(name)
    }
}

/// Accepts `"uppercase"` or `["uppercase", "trim"]`
pub(crate) fn deserialize_refs<'de, D>(deserializer: D) -> std::result::Result<Vec<TransformerRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![TransformerRef::Named(name)],
        OneOrMany::Many(names) => names.into_iter().map(TransformerRef::Named).collect(),
    })
}

/// Named transformers of one logging environment
#[derive(Clone)]
pub struct TransformerRegistry {
    transformers: HashMap<String, TransformFn>,
}

impl TransformerRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut transformers: HashMap<String, TransformFn> = HashMap::new();
        transformers.insert("uppercase".to_string(), Arc::new(|s: &str| s.to_uppercase()));
        transformers.insert("lowercase".to_string(), Arc::new(|s: &str| s.to_lowercase()));
        Self { transformers }
    }

    pub fn add<F>(&mut self, name: impl Into<String>, transform: F) -> Result<()>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        if RESERVED_TRANSFORMERS.contains(&name.as_str()) {
            return Err(LoggerError::reserved("transformer", name));
        }
        if self.transformers.contains_key(&name) {
            return Err(LoggerError::duplicate("transformer", name));
        }
        self.transformers.insert(name, Arc::new(transform));
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        if RESERVED_TRANSFORMERS.contains(&name) {
            return Err(LoggerError::reserved("transformer", name));
        }
        self.transformers
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| LoggerError::config("transformer", format!("'{}' is not registered", name)))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.transformers.contains_key(name)
    }

    /// Verify every named reference resolves
    pub fn check(&self, refs: &[TransformerRef]) -> Result<()> {
        for r in refs {
            if let TransformerRef::Named(name) = r {
                if !self.contains(name) {
                    return Err(LoggerError::config(
                        "transformer",
                        format!("'{}' is not registered", name),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Apply one transformer. Non-string values are a type error.
    pub fn apply(&self, transformer: &TransformerRef, value: &Value) -> Result<Value> {
        let Value::String(text) = value else {
            return Err(LoggerError::not_a_string(
                transformer.label(),
                value.to_string(),
            ));
        };
        let transformed = match transformer {
            TransformerRef::Inline(f) => f(text),
            TransformerRef::Named(name) => {
                let f = self.transformers.get(name).ok_or_else(|| {
                    LoggerError::config("transformer", format!("'{}' is not registered", name))
                })?;
                f(text)
            }
        };
        Ok(Value::String(transformed))
    }

    /// Apply a chain left to right
    pub fn apply_chain(&self, chain: &[TransformerRef], value: Value) -> Result<Value> {
        chain
            .iter()
            .try_fold(value, |current, transformer| self.apply(transformer, &current))
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins() {
        let registry = TransformerRegistry::new();
        assert_eq!(
            registry.apply(&"uppercase".into(), &json!("Hi")).unwrap(),
            json!("HI")
        );
        assert_eq!(
            registry.apply(&"lowercase".into(), &json!("Hi")).unwrap(),
            json!("hi")
        );
    }

    #[test]
    fn test_non_string_is_type_error() {
        let registry = TransformerRegistry::new();
        let err = registry.apply(&"uppercase".into(), &json!(42)).unwrap_err();
        assert!(matches!(err, LoggerError::NotAString { .. }));
    }

    #[test]
    fn test_chain_runs_left_to_right() {
        let mut registry = TransformerRegistry::new();
        registry
            .add("truncate", |s: &str| s.chars().take(3).collect())
            .unwrap();
        let chain = vec![
            TransformerRef::from("truncate"),
            TransformerRef::inline(|s: &str| format!("<{}>", s)),
            TransformerRef::from("uppercase"),
        ];
        assert_eq!(
            registry.apply_chain(&chain, json!("message")).unwrap(),
            json!("<MES>")
        );
    }

    #[test]
    fn test_reserved_names() {
        let mut registry = TransformerRegistry::new();
        assert!(matches!(
            registry.add("uppercase", |s: &str| s.to_string()),
            Err(LoggerError::ReservedName { .. })
        ));
        assert!(matches!(
            registry.remove("lowercase"),
            Err(LoggerError::ReservedName { .. })
        ));
    }

    #[test]
    fn test_add_and_remove() {
        let mut registry = TransformerRegistry::new();
        registry.add("trim", |s: &str| s.trim().to_string()).unwrap();
        assert!(matches!(
            registry.add("trim", |s: &str| s.to_string()),
            Err(LoggerError::DuplicateName { .. })
        ));
        registry.remove("trim").unwrap();
        assert!(!registry.contains("trim"));
        assert!(registry.check(&["trim".into()]).is_err());
    }

    #[test]
    fn test_deserialize_one_or_many() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "deserialize_refs")]
            transformer: Vec<TransformerRef>,
        }
        let one: Holder = serde_json::from_value(json!({"transformer": "uppercase"})).unwrap();
        assert_eq!(one.transformer.len(), 1);
        let many: Holder =
            serde_json::from_value(json!({"transformer": ["uppercase", "lowercase"]})).unwrap();
        assert_eq!(many.transformer.len(), 2);
    }
}
