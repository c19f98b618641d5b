//! Property-based tests for ops_toolkit using proptest

use chrono::DateTime;
use ops_toolkit::prelude::*;
use ops_toolkit::{DiscardHandler, JsonHandler, PrettyHandler, TextHandler};
use proptest::prelude::*;
use std::sync::Arc;

fn fixed_record(severity: Severity, message: &str, attrs: Vec<Attr>) -> Record {
    let time = DateTime::parse_from_rfc3339("2023-01-01T12:30:45.123Z").unwrap();
    Record::at(time, severity, message).with_attrs(attrs)
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-zA-Z0-9 =\"]{0,12}".prop_map(Value::String),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
    ]
}

fn attr_strategy() -> impl Strategy<Value = Attr> {
    ("[a-z]{1,4}", value_strategy()).prop_map(|(key, value)| Attr::new(key, value))
}

fn attrs_strategy() -> impl Strategy<Value = Vec<Attr>> {
    prop::collection::vec(attr_strategy(), 0..6)
}

/// Every handler variant that writes bytes, built on a fresh buffer
fn writing_handlers(threshold: Severity) -> Vec<(Arc<dyn Handler>, CaptureBuffer)> {
    let mut handlers: Vec<(Arc<dyn Handler>, CaptureBuffer)> = Vec::new();

    let buffer = CaptureBuffer::new();
    handlers.push((
        Arc::new(JsonHandler::new(Sink::new("memory", buffer.clone()), threshold)),
        buffer,
    ));
    let buffer = CaptureBuffer::new();
    handlers.push((
        Arc::new(PrettyHandler::new(Sink::new("memory", buffer.clone()), threshold)),
        buffer,
    ));
    let buffer = CaptureBuffer::new();
    handlers.push((
        Arc::new(TextHandler::new(Sink::new("memory", buffer.clone()), threshold)),
        buffer,
    ));

    handlers
}

// ============================================================================
// Severity Tests
// ============================================================================

proptest! {
    /// Threshold gating follows integer order for every writing handler
    #[test]
    fn test_threshold_gating(a in -100i32..100, b in -100i32..100) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        for (handler, _) in writing_handlers(Severity(high)) {
            prop_assert!(handler.enabled(Severity(high)));
            prop_assert_eq!(handler.enabled(Severity(low)), low >= high);
        }
    }

    /// Display output parses back to the same severity
    #[test]
    fn test_severity_display_parses(value in any::<i32>()) {
        let severity = Severity(value);
        let parsed: Severity = severity.to_string().parse().unwrap();
        prop_assert_eq!(parsed, severity);
    }
}

// ============================================================================
// Handler Tests
// ============================================================================

proptest! {
    /// Discard is never enabled, never fails and never derives a writing handler
    #[test]
    fn test_discard_is_silent(
        value in any::<i32>(),
        attrs in attrs_strategy(),
        group in "[a-z]{0,5}",
    ) {
        let handler = DiscardHandler::new()
            .with_attrs(attrs.clone())
            .with_group(&group);

        prop_assert!(!handler.enabled(Severity(value)));
        prop_assert!(handler.handle(&fixed_record(Severity(value), "ignored", attrs)).is_ok());
    }

    /// Two derivations render the same bytes as one derivation with both sets
    #[test]
    fn test_with_attrs_concatenates(
        a in attrs_strategy(),
        b in attrs_strategy(),
        call in attrs_strategy(),
    ) {
        let record = fixed_record(Severity::INFO, "request", call);
        let joined: Vec<Attr> = a.iter().chain(b.iter()).cloned().collect();

        for ((stepwise, left), (combined, right)) in writing_handlers(Severity::DEBUG)
            .into_iter()
            .zip(writing_handlers(Severity::DEBUG))
        {
            stepwise.with_attrs(a.clone()).with_attrs(b.clone()).handle(&record).unwrap();
            combined.with_attrs(joined.clone()).handle(&record).unwrap();
            prop_assert_eq!(left.contents(), right.contents());
        }
    }

    /// Handler attributes win over record attributes with the same key
    #[test]
    fn test_pretty_handler_attrs_win(
        key in "[a-z]{1,6}",
        old in "[a-z]{1,6}",
        new in "[A-Z]{1,6}",
    ) {
        let buffer = CaptureBuffer::new();
        let handler = PrettyHandler::new(Sink::new("memory", buffer.clone()), Severity::DEBUG)
            .with_attrs(vec![Attr::new(key.clone(), new.clone())]);

        handler
            .handle(&fixed_record(Severity::INFO, "msg", vec![Attr::new(key.clone(), old.clone())]))
            .unwrap();

        let output = buffer.contents();
        let expected = format!("\"{}\": \"{}\"", key, new);
        let stale = format!("\"{}\": \"{}\"", key, old);
        prop_assert!(output.contains(&expected));
        prop_assert!(!output.contains(&stale));
    }

    /// JSON and text encoders always emit exactly one line per record
    #[test]
    fn test_single_line_encoders(message in "\\PC{0,40}", attrs in attrs_strategy()) {
        for (handler, buffer) in writing_handlers(Severity::DEBUG) {
            if handler.name() == "pretty" {
                continue;
            }
            handler.handle(&fixed_record(Severity::WARN, &message, attrs.clone())).unwrap();

            let output = buffer.contents();
            prop_assert!(output.ends_with('\n'));
            prop_assert_eq!(output.matches('\n').count(), 1);
        }
    }
}

#[test]
fn test_json_lines_parse() {
    let buffer = CaptureBuffer::new();
    let handler = JsonHandler::new(Sink::new("memory", buffer.clone()), Severity::DEBUG);

    handler
        .handle(&fixed_record(Severity::INFO, "Hello", Vec::new()))
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(buffer.contents().trim_end()).unwrap();
    assert_eq!(parsed["time"], "2023-01-01T12:30:45.123Z");
    assert_eq!(parsed["level"], "INFO");
    assert_eq!(parsed["msg"], "Hello");
}
