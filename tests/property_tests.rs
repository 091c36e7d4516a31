//! Property-based tests for rust_handle_logger using proptest

use proptest::prelude::*;
use rust_handle_logger::core::level::{LevelRegistry, HTTP, NPM};
use rust_handle_logger::core::logger::ancestry;
use rust_handle_logger::core::token::{interpolate, substitute};
use rust_handle_logger::prelude::*;
use serde_json::{json, Value};

fn npm_level() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("error"),
        Just("warn"),
        Just("info"),
        Just("http"),
        Just("verbose"),
        Just("debug"),
        Just("silly"),
    ]
}

// ============================================================================
// Level Mapping Tests
// ============================================================================

proptest! {
    /// Name to severity and back yields the same name
    #[test]
    fn test_level_name_roundtrip(level in npm_level()) {
        let levels = LevelRegistry::new();
        let npm = levels.get(NPM).unwrap();
        let severity = npm.resolve_severity(level).unwrap();
        prop_assert_eq!(npm.resolve_name(severity), Some(level));
    }

    /// Ascending scales floor any in-range severity to its bucket
    #[test]
    fn test_http_severity_floors_to_bucket(status in 100i64..600) {
        let levels = LevelRegistry::new();
        let http = levels.get(HTTP).unwrap();
        let name = http.resolve_name(status).unwrap();
        let bucket = http.resolve_severity(name).unwrap();
        prop_assert_eq!(bucket, status / 100 * 100);
    }

    /// On npm a lower number is more severe
    #[test]
    fn test_npm_meets_is_descending(a in npm_level(), b in npm_level()) {
        let levels = LevelRegistry::new();
        let npm = levels.get(NPM).unwrap();
        let sa = npm.resolve_severity(a).unwrap();
        let sb = npm.resolve_severity(b).unwrap();
        prop_assert_eq!(npm.meets(sa, sb), sa <= sb);
    }
}

// ============================================================================
// Record Message Tests
// ============================================================================

proptest! {
    /// Records keep the message exactly as logged
    #[test]
    fn test_message_kept_verbatim(message in ".*") {
        let record = LogRecord::new("info", 2, &message);
        prop_assert_eq!(record.message, message);
    }

    /// A forged line inside a message never starts a new line in the file
    #[test]
    fn test_log_injection_prevention(
        prefix in "[a-zA-Z ]{1,20}",
        fake in "[A-Z]{4,5}",
        newline in prop_oneof![Just("\n"), Just("\r\n"), Just("\r")],
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forged.log");
        let registry = Registry::builder().default_handle(false).build();
        registry
            .add_formatter(FormatterConfig::new("bare").format("%{message}"))
            .unwrap();
        registry
            .add_handle(HandleConfig::new("file").target(TargetSpec::File).path(&path).formatter("bare"))
            .unwrap();
        let logger = registry
            .create_logger(LoggerConfig::new("auth").handle("file"))
            .unwrap();

        logger.log("info", format!("{}{}{} injected", prefix, newline, fake)).unwrap();
        registry.shutdown(std::time::Duration::from_secs(1)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        prop_assert_eq!(content.lines().count(), 1);
        let escaped = newline.replace('\r', "\\r").replace('\n', "\\n");
        let expected = format!("{}{}", escaped, fake);
        prop_assert!(content.contains(&expected));
    }
}

// ============================================================================
// Template Tests
// ============================================================================

proptest! {
    /// Templates without `%` come back unchanged
    #[test]
    fn test_substitute_plain_text_unchanged(text in "[^%]*") {
        prop_assert_eq!(substitute(&text, |_| None, "-"), text);
    }

    /// `%%` always renders a single percent sign
    #[test]
    fn test_percent_escape(left in "[a-z ]{0,10}", right in "[a-z ]{0,10}") {
        let template = format!("{}%%{{message}}{}", left, right);
        let out = substitute(&template, |_| Some("x".to_string()), "");
        prop_assert_eq!(out, format!("{}%{{message}}{}", left, right));
    }

    /// Substituted values are never re-expanded
    #[test]
    fn test_substitute_is_not_recursive(name in "[a-z]{1,8}") {
        let value = format!("%{{{}}}", name);
        let template = format!("[%{{{}}}]", name);
        let out = substitute(&template, |_| Some(value.clone()), "");
        prop_assert_eq!(out, format!("[{}]", value));
    }

    /// Missing tokens fall back to the default substitution
    #[test]
    fn test_substitute_default(name in "[a-z]{1,8}", default in "[a-z]{0,4}") {
        let template = format!("<%{{{}}}>", name);
        prop_assert_eq!(substitute(&template, |_| None, &default), format!("<{}>", default));
    }

    /// `%d` truncates numbers toward zero
    #[test]
    fn test_interpolate_integers(n in -1.0e6f64..1.0e6) {
        let out = interpolate("%d", &[json!(n)]);
        prop_assert_eq!(out, format!("{}", n.trunc() as i64));
    }

    /// Directives without arguments are left as written
    #[test]
    fn test_interpolate_missing_args(text in "[a-z ]{0,10}") {
        let format = format!("{} %s", text);
        prop_assert_eq!(interpolate(&format, &[]), format);
    }
}

// ============================================================================
// Hierarchy Tests
// ============================================================================

proptest! {
    /// Ancestry starts at the name, ends at root, and each step drops one segment
    #[test]
    fn test_ancestry_shape(segments in prop::collection::vec("[a-z]{1,6}", 1..6)) {
        let name = segments.join(".");
        let chain = ancestry(&name);

        prop_assert_eq!(chain.len(), segments.len() + 1);
        prop_assert_eq!(chain.first().map(String::as_str), Some(name.as_str()));
        prop_assert_eq!(chain.last().map(String::as_str), Some("root"));
        for (i, ancestor) in chain[..segments.len()].iter().enumerate() {
            prop_assert_eq!(ancestor, &segments[..segments.len() - i].join("."));
        }
    }
}

// ============================================================================
// Safety Tests (No Panics)
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Arbitrary templates and messages render without panicking
    #[test]
    fn test_arbitrary_template_no_panic(template in ".*", message in ".*") {
        let registry = Registry::builder().default_handle(false).build();
        if registry.add_formatter(FormatterConfig::new("f").format(template)).is_ok() {
            registry
                .add_handle(HandleConfig::new("h").target(TargetSpec::Null).formatter("f"))
                .unwrap();
            let logger = registry
                .create_logger(LoggerConfig::new("fuzz").handle("h"))
                .unwrap();
            prop_assert!(logger.log("info", message).is_ok());
        }
    }

    /// Log objects with any string level either log or fail with an error
    #[test]
    fn test_log_object_no_panic(level in "[a-zA-Z]{0,10}", message in ".*") {
        let registry = Registry::builder().default_handle(false).build();
        let logger = registry.get_logger("objects");
        let known = ["error", "warn", "info", "http", "verbose", "debug", "silly"]
            .contains(&level.as_str());
        let result = logger.log_object(json!({"level": level, "message": message}));
        prop_assert_eq!(result.is_ok(), known);
    }

    #[test]
    fn test_logf_no_panic(format in ".*", args in prop::collection::vec(any::<i32>(), 0..4)) {
        let registry = Registry::builder().default_handle(false).build();
        let logger = registry.get_logger("printf");
        let args: Vec<Value> = args.into_iter().map(Value::from).collect();
        prop_assert!(logger.logf("warn", format, args).is_ok());
    }
}
