//! Record rendering
//!
//! A formatter turns a [`LogRecord`] into its output line. User formatters go
//! through the full pipeline:
//!
//! 1. level colour from the colour map, when one is active for the mapper
//! 2. per-token transformers, then styles, for `level`, `message` and `stack`
//! 3. the `timestamp` token (locale, ISO 8601 or a strftime pattern)
//! 4. registered custom tokens, and `uuid` when enabled
//! 5. `fields` projection
//! 6. transformers for tokens listed under `tokens`
//! 7. JSON serialization or template substitution
//! 8. the whole-output transformer chain, then the whole-output style
//!
//! The predefined `default`, `simple`, `common` and `combined` formatters skip
//! straight to substitution and cannot be changed.

use super::error::{LoggerError, Result};
use super::level::LevelMapping;
use super::record::LogRecord;
use super::style::{self, default_color_map, StyleSpec};
use super::timestamp::{TimestampFormat, ACCESS_LOG_PATTERN};
use super::token::{self, substitute, value_text, Timezone};
use super::transformer::{deserialize_refs, TransformerRef, TransformerRegistry};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_TEMPLATE: &str = "%{timestamp} [%{loggerName}] %{level}: %{message}";
pub const SIMPLE_TEMPLATE: &str = "%{level}: %{message}";
pub const COMMON_TEMPLATE: &str =
    "%{remoteAddr} - %{remoteUser} [%{timestamp}] \"%{method} %{url} HTTP/%{httpVersion}\" %{status} %{contentLength}";
pub const COMBINED_TEMPLATE: &str =
    "%{remoteAddr} - %{remoteUser} [%{timestamp}] \"%{method} %{url} HTTP/%{httpVersion}\" %{status} %{contentLength} \"%{referrer}\" \"%{userAgent}\"";

/// Names of the immutable predefined formatters
pub const PREDEFINED_FORMATTERS: [&str; 4] = ["default", "simple", "common", "combined"];

/// Fixed-shape formatters rendered without the configurable pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Predefined {
    Default,
    Simple,
    Common,
    Combined,
}

impl Predefined {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Predefined::Default),
            "simple" => Some(Predefined::Simple),
            "common" => Some(Predefined::Common),
            "combined" => Some(Predefined::Combined),
            _ => None,
        }
    }

    fn render(self, record: &LogRecord) -> String {
        let (template, timestamp, default) = match self {
            Predefined::Default => (DEFAULT_TEMPLATE, TimestampFormat::Locale, ""),
            Predefined::Simple => (SIMPLE_TEMPLATE, TimestampFormat::Locale, ""),
            Predefined::Common => (COMMON_TEMPLATE, access_log_timestamp(), "-"),
            Predefined::Combined => (COMBINED_TEMPLATE, access_log_timestamp(), "-"),
        };
        substitute(
            template,
            |name| match name {
                "timestamp" => Some(timestamp.format(&record.date)),
                "level" => Some(record.level.clone()),
                "severity" => Some(record.severity.to_string()),
                "loggerName" => Some(record.logger_name.clone()),
                "message" => Some(record.message.clone()),
                other => record.fields.get(other).and_then(value_text),
            },
            default,
        )
    }
}

fn access_log_timestamp() -> TimestampFormat {
    TimestampFormat::Pattern {
        pattern: ACCESS_LOG_PATTERN.to_string(),
        timezone: Timezone::Local,
    }
}

/// `true` to use the mapper's default colours, or an explicit `level → colour` map
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColorMap {
    Enabled(bool),
    Levels(HashMap<String, String>),
}

impl ColorMap {
    fn colors_for(&self, mapper: &str) -> Option<HashMap<String, String>> {
        match self {
            ColorMap::Enabled(true) => Some(default_color_map(mapper)),
            ColorMap::Enabled(false) => None,
            ColorMap::Levels(levels) => Some(levels.clone()),
        }
    }
}

/// Styling and transformation for a single token
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenDirective {
    pub color: Option<String>,
    pub background: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub font: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_refs")]
    pub transformer: Vec<TransformerRef>,
    /// Timestamp only: `"ISO"` or a strftime pattern
    pub pattern: Option<String>,
    /// Timestamp only: `"UTC"`/`"GMT"` or local
    pub timezone: Option<String>,
}

impl TokenDirective {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    #[must_use]
    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font.push(font.into());
        self
    }

    #[must_use]
    pub fn transformer(mut self, transformer: impl Into<TransformerRef>) -> Self {
        self.transformer.push(transformer.into());
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    fn style(&self) -> StyleSpec {
        StyleSpec {
            color: self.color.clone(),
            background: self.background.clone(),
            fonts: self.font.clone(),
        }
    }
}

/// A user formatter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FormatterConfig {
    pub name: String,
    /// Chain applied to the whole rendered output
    #[serde(default, deserialize_with = "deserialize_refs")]
    pub transformer: Vec<TransformerRef>,
    pub color_map: Option<ColorMap>,
    /// Background for the level token
    pub background: Option<String>,
    /// Fonts for the level token
    #[serde(default, deserialize_with = "one_or_many")]
    pub font: Vec<String>,
    /// Style for the whole rendered output
    pub style: Option<TokenDirective>,
    pub default_substitution: Option<String>,
    pub format: Option<String>,
    #[serde(default)]
    pub json: bool,
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub uuid: bool,
    pub timestamp: Option<TokenDirective>,
    pub message: Option<TokenDirective>,
    pub level: Option<TokenDirective>,
    pub stack: Option<TokenDirective>,
    /// Directives for any other token
    #[serde(default)]
    pub tokens: HashMap<String, TokenDirective>,
}

impl FormatterConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn format(mut self, template: impl Into<String>) -> Self {
        self.format = Some(template.into());
        self
    }

    #[must_use]
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn uuid(mut self, uuid: bool) -> Self {
        self.uuid = uuid;
        self
    }

    #[must_use]
    pub fn default_substitution(mut self, default: impl Into<String>) -> Self {
        self.default_substitution = Some(default.into());
        self
    }

    #[must_use]
    pub fn transformer(mut self, transformer: impl Into<TransformerRef>) -> Self {
        self.transformer.push(transformer.into());
        self
    }

    #[must_use]
    pub fn color_map(mut self, color_map: ColorMap) -> Self {
        self.color_map = Some(color_map);
        self
    }

    #[must_use]
    pub fn timestamp(mut self, directive: TokenDirective) -> Self {
        self.timestamp = Some(directive);
        self
    }

    #[must_use]
    pub fn level(mut self, directive: TokenDirective) -> Self {
        self.level = Some(directive);
        self
    }

    #[must_use]
    pub fn message(mut self, directive: TokenDirective) -> Self {
        self.message = Some(directive);
        self
    }

    #[must_use]
    pub fn stack(mut self, directive: TokenDirective) -> Self {
        self.stack = Some(directive);
        self
    }

    #[must_use]
    pub fn token(mut self, name: impl Into<String>, directive: TokenDirective) -> Self {
        self.tokens.insert(name.into(), directive);
        self
    }

    #[must_use]
    pub fn style(mut self, directive: TokenDirective) -> Self {
        self.style = Some(directive);
        self
    }

    /// A name, and only transformers the registry knows
    pub fn validate(&self, transformers: &TransformerRegistry) -> Result<()> {
        if self.name.is_empty() {
            return Err(LoggerError::config("formatter", "name must not be empty"));
        }
        transformers.check(&self.transformer_refs())
    }

    /// Every transformer this formatter references
    fn transformer_refs(&self) -> Vec<TransformerRef> {
        let directives = [&self.timestamp, &self.message, &self.level, &self.stack, &self.style];
        self.transformer
            .iter()
            .chain(directives.into_iter().flatten().flat_map(|d| d.transformer.iter()))
            .chain(self.tokens.values().flat_map(|d| d.transformer.iter()))
            .cloned()
            .collect()
    }

    fn level_style(&self, level: &str, mapper: &str) -> StyleSpec {
        let mut spec = StyleSpec {
            color: self
                .color_map
                .as_ref()
                .and_then(|map| map.colors_for(mapper))
                .and_then(|colors| colors.get(level).cloned()),
            background: self.background.clone(),
            fonts: self.font.clone(),
        };
        if let Some(directive) = &self.level {
            if directive.color.is_some() {
                spec.color = directive.color.clone();
            }
            if directive.background.is_some() {
                spec.background = directive.background.clone();
            }
            spec.fonts.extend(directive.font.iter().cloned());
        }
        spec
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
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
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

pub type TokenFn = Arc<dyn Fn(&LogRecord) -> Value + Send + Sync>;

/// A globally registered token
#[derive(Clone)]
pub enum CustomToken {
    /// Template over the record's other tokens, e.g. `"%{method} %{url}"`
    Template(String),
    Computed(TokenFn),
}

impl CustomToken {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&LogRecord) -> Value + Send + Sync + 'static,
    {
        CustomToken::Computed(Arc::new(f))
    }
}

impl fmt::Debug for CustomToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomToken::Template(template) => f.debug_tuple("Template").field(template).finish(),
            CustomToken::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Formatters and custom tokens of one logging environment
#[derive(Debug, Clone, Default)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<FormatterConfig>>,
    tokens: BTreeMap<String, CustomToken>,
}

impl FormatterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formatter after checking its transformer references.
    pub fn add(&mut self, config: FormatterConfig, transformers: &TransformerRegistry) -> Result<()> {
        config.validate(transformers)?;
        if PREDEFINED_FORMATTERS.contains(&config.name.as_str()) {
            return Err(LoggerError::reserved("formatter", config.name));
        }
        if self.formatters.contains_key(&config.name) {
            return Err(LoggerError::duplicate("formatter", config.name));
        }
        self.formatters
            .insert(config.name.clone(), Arc::new(config));
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        if PREDEFINED_FORMATTERS.contains(&name) {
            return Err(LoggerError::reserved("formatter", name));
        }
        self.formatters
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| LoggerError::config("formatter", format!("'{}' is not registered", name)))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        PREDEFINED_FORMATTERS.contains(&name) || self.formatters.contains_key(name)
    }

    pub fn add_token(&mut self, name: impl Into<String>, token: CustomToken) -> Result<()> {
        let name = name.into();
        if super::record::CORE_TOKENS.contains(&name.as_str()) || name == "uuid" {
            return Err(LoggerError::reserved("token", name));
        }
        if self.tokens.contains_key(&name) {
            return Err(LoggerError::duplicate("token", name));
        }
        self.tokens.insert(name, token);
        Ok(())
    }

    pub fn remove_token(&mut self, name: &str) -> Result<()> {
        self.tokens
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| LoggerError::config("token", format!("'{}' is not registered", name)))
    }

    /// Render `record` through the named formatter.
    ///
    /// Returns `Ok(None)` when no formatter has that name; the caller then emits
    /// the record unformatted.
    pub fn render(
        &self,
        record: &LogRecord,
        name: &str,
        mapping: &LevelMapping,
        transformers: &TransformerRegistry,
    ) -> Result<Option<String>> {
        if let Some(predefined) = Predefined::from_name(name) {
            return Ok(Some(predefined.render(record)));
        }
        let Some(config) = self.formatters.get(name) else {
            return Ok(None);
        };
        self.render_config(record, config, mapping, transformers)
            .map(Some)
    }

    /// Render through a formatter that is not registered, such as one defined
    /// inline on a handle. Custom tokens still come from this registry.
    pub fn render_inline(
        &self,
        record: &LogRecord,
        config: &FormatterConfig,
        mapping: &LevelMapping,
        transformers: &TransformerRegistry,
    ) -> Result<String> {
        self.render_config(record, config, mapping, transformers)
    }

    fn render_config(
        &self,
        record: &LogRecord,
        config: &FormatterConfig,
        mapping: &LevelMapping,
        transformers: &TransformerRegistry,
    ) -> Result<String> {
        let mut tokens = record.tokens();

        let level_style = config.level_style(&record.level, mapping.name());
        let directives = [
            ("level", config.level.as_ref(), level_style),
            ("message", config.message.as_ref(), style_of(config.message.as_ref())),
            ("stack", config.stack.as_ref(), style_of(config.stack.as_ref())),
        ];
        for (key, directive, spec) in directives {
            let chain = directive.map(|d| d.transformer.as_slice()).unwrap_or(&[]);
            transform_token(&mut tokens, key, chain, &spec, transformers)?;
        }

        let timestamp = config.timestamp.as_ref();
        let format = TimestampFormat::from_directive(
            timestamp.and_then(|d| d.pattern.as_deref()),
            timestamp.and_then(|d| d.timezone.as_deref()),
        );
        tokens.insert(
            "timestamp".to_string(),
            Value::String(format.format(&record.date)),
        );
        transform_token(
            &mut tokens,
            "timestamp",
            timestamp.map(|d| d.transformer.as_slice()).unwrap_or(&[]),
            &style_of(timestamp),
            transformers,
        )?;

        let default = config.default_substitution.as_deref().unwrap_or("");
        for (name, token) in &self.tokens {
            if tokens.contains_key(name) {
                continue;
            }
            let value = match token {
                CustomToken::Template(template) => Value::String(substitute(
                    template,
                    |key| tokens.get(key).and_then(value_text),
                    default,
                )),
                CustomToken::Computed(f) => f(record),
            };
            tokens.insert(name.clone(), value);
        }
        if config.uuid {
            tokens.insert(
                "uuid".to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }

        if let Some(fields) = &config.fields {
            let mut projected = Map::with_capacity(fields.len());
            for field in fields {
                if let Some(value) = tokens.remove(field) {
                    projected.insert(field.clone(), value);
                }
            }
            tokens = projected;
        }

        for (name, directive) in &config.tokens {
            transform_token(
                &mut tokens,
                name,
                &directive.transformer,
                &directive.style(),
                transformers,
            )?;
        }

        let output = if config.json {
            serde_json::to_string(&tokens)?
        } else {
            let template = config.format.as_deref().unwrap_or(DEFAULT_TEMPLATE);
            substitute(template, |key| tokens.get(key).and_then(value_text), default)
        };

        let output = match transformers.apply_chain(&config.transformer, Value::String(output))? {
            Value::String(text) => text,
            other => other.to_string(),
        };
        Ok(match &config.style {
            Some(directive) => style::apply(&output, &directive.style()),
            None => output,
        })
    }
}

fn style_of(directive: Option<&TokenDirective>) -> StyleSpec {
    directive.map(TokenDirective::style).unwrap_or_default()
}

/// Transform then style one token in place. Absent and null tokens are left alone.
fn transform_token(
    tokens: &mut Map<String, Value>,
    key: &str,
    chain: &[TransformerRef],
    spec: &StyleSpec,
    transformers: &TransformerRegistry,
) -> Result<()> {
    let Some(value) = tokens.get(key) else {
        return Ok(());
    };
    if value.is_null() || (chain.is_empty() && spec.is_empty()) {
        return Ok(());
    }
    let mut value = transformers.apply_chain(chain, value.clone())?;
    if !spec.is_empty() {
        let text = token::value_text(&value).unwrap_or_default();
        value = Value::String(style::apply(&text, spec));
    }
    tokens.insert(key.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::{LevelRegistry, NPM};
    use serde_json::json;

    fn record(level: &str, severity: i64, message: &str) -> LogRecord {
        let mut record = LogRecord::new(level, severity, message);
        record.logger_name = "app".to_string();
        record
    }

    fn render(registry: &FormatterRegistry, record: &LogRecord, name: &str) -> Option<String> {
        let levels = LevelRegistry::new();
        registry
            .render(record, name, levels.get(NPM).unwrap(), &TransformerRegistry::new())
            .unwrap()
    }

    #[test]
    fn test_simple_template() {
        let mut registry = FormatterRegistry::new();
        registry
            .add(
                FormatterConfig::new("f").format("%{level} %{message}"),
                &TransformerRegistry::new(),
            )
            .unwrap();
        assert_eq!(
            render(&registry, &record("info", 2, "Hi"), "f").as_deref(),
            Some("info Hi")
        );
    }

    #[test]
    fn test_json_projection() {
        let mut registry = FormatterRegistry::new();
        registry
            .add(
                FormatterConfig::new("j").json(true).fields(["level", "message"]),
                &TransformerRegistry::new(),
            )
            .unwrap();
        assert_eq!(
            render(&registry, &record("debug", 5, "x"), "j").as_deref(),
            Some(r#"{"level":"debug","message":"x"}"#)
        );
    }

    #[test]
    fn test_unknown_formatter_fails_open() {
        let registry = FormatterRegistry::new();
        assert_eq!(render(&registry, &record("info", 2, "x"), "missing"), None);
    }

    #[test]
    fn test_predefined_formatters() {
        let registry = FormatterRegistry::new();
        let r = record("warn", 1, "careful");
        assert_eq!(render(&registry, &r, "simple").as_deref(), Some("warn: careful"));
        let default = render(&registry, &r, "default").unwrap();
        assert!(default.ends_with("[app] warn: careful"));

        let mut access = record("info", 2, "");
        access.fields.insert("remoteAddr".to_string(), json!("10.0.0.1"));
        access.fields.insert("method".to_string(), json!("GET"));
        access.fields.insert("url".to_string(), json!("/index"));
        access.fields.insert("httpVersion".to_string(), json!("1.1"));
        access.fields.insert("status".to_string(), json!(200));
        let common = render(&registry, &access, "common").unwrap();
        assert!(common.starts_with("10.0.0.1 - - ["));
        assert!(common.ends_with("\"GET /index HTTP/1.1\" 200 -"));
    }

    #[test]
    fn test_predefined_are_immutable() {
        let mut registry = FormatterRegistry::new();
        let transformers = TransformerRegistry::new();
        assert!(matches!(
            registry.add(FormatterConfig::new("default"), &transformers),
            Err(LoggerError::ReservedName { .. })
        ));
        assert!(matches!(
            registry.remove("combined"),
            Err(LoggerError::ReservedName { .. })
        ));
    }

    #[test]
    fn test_token_and_output_transformers() {
        let mut transformers = TransformerRegistry::new();
        transformers
            .add("truncate", |s: &str| s.chars().take(4).collect())
            .unwrap();
        let mut registry = FormatterRegistry::new();
        registry
            .add(
                FormatterConfig::new("t")
                    .format("%{level}|%{message}")
                    .message(TokenDirective::new().transformer("truncate"))
                    .transformer("uppercase"),
                &transformers,
            )
            .unwrap();
        let levels = LevelRegistry::new();
        let output = registry
            .render(&record("info", 2, "message"), "t", levels.get(NPM).unwrap(), &transformers)
            .unwrap();
        assert_eq!(output.as_deref(), Some("INFO|MESS"));
    }

    #[test]
    fn test_unknown_transformer_rejected_at_registration() {
        let mut registry = FormatterRegistry::new();
        let err = registry.add(
            FormatterConfig::new("t").transformer("nope"),
            &TransformerRegistry::new(),
        );
        assert!(matches!(err, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_custom_tokens_and_default_substitution() {
        let mut registry = FormatterRegistry::new();
        registry
            .add_token("request", CustomToken::Template("%{method} %{url}".to_string()))
            .unwrap();
        registry
            .add_token("pid", CustomToken::computed(|_| json!(42)))
            .unwrap();
        registry
            .add(
                FormatterConfig::new("c")
                    .format("%{pid} %{request} %{missing}")
                    .default_substitution("?"),
                &TransformerRegistry::new(),
            )
            .unwrap();
        let mut r = record("info", 2, "x");
        r.fields.insert("method".to_string(), json!("GET"));
        assert_eq!(render(&registry, &r, "c").as_deref(), Some("42 GET ? ?"));
        assert!(matches!(
            registry.add_token("message", CustomToken::Template(String::new())),
            Err(LoggerError::ReservedName { .. })
        ));
    }

    #[test]
    fn test_timestamp_pattern_and_uuid() {
        let mut registry = FormatterRegistry::new();
        registry
            .add(
                FormatterConfig::new("ts")
                    .json(true)
                    .uuid(true)
                    .fields(["timestamp", "uuid"])
                    .timestamp(TokenDirective::new().pattern("%Y").timezone("UTC")),
                &TransformerRegistry::new(),
            )
            .unwrap();
        let r = record("info", 2, "x");
        let output: Value = serde_json::from_str(&render(&registry, &r, "ts").unwrap()).unwrap();
        assert_eq!(
            output["timestamp"],
            json!(r.date.with_timezone(&chrono::Utc).format("%Y").to_string())
        );
        assert_eq!(output["uuid"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_substituted_values_are_not_reparsed() {
        let mut registry = FormatterRegistry::new();
        registry
            .add(
                FormatterConfig::new("f").format("%{message} 100%%"),
                &TransformerRegistry::new(),
            )
            .unwrap();
        assert_eq!(
            render(&registry, &record("info", 2, "%{level}"), "f").as_deref(),
            Some("%{level} 100%")
        );
    }

    #[test]
    fn test_config_deserialization() {
        let config: FormatterConfig = serde_json::from_value(json!({
            "name": "styled",
            "format": "%{level} %{message}",
            "colorMap": true,
            "font": "bold",
            "transformer": ["uppercase"],
            "timestamp": {"pattern": "ISO"},
            "tokens": {"status": {"color": "red"}}
        }))
        .unwrap();
        assert_eq!(config.color_map, Some(ColorMap::Enabled(true)));
        assert_eq!(config.font, vec!["bold".to_string()]);
        assert_eq!(config.transformer.len(), 1);
        assert!(config.tokens.contains_key("status"));

        let unknown = serde_json::from_value::<FormatterConfig>(json!({"name": "x", "colour": 1}));
        assert!(unknown.is_err());
    }
}
