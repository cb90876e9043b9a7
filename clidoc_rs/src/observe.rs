//! Dispatch observability.
//!
//! The dispatcher reports each outcome through [`DispatchLog`] instead of
//! calling a global logger, so tests can capture records and hosts can
//! route them wherever they like. [`TracingLog`] is the default sink.

use std::fmt;

use tracing::{error, info};

/// Key/value pairs attached to a log record.
pub type Fields<'a> = [(&'static str, &'a str)];

/// Sink for dispatch outcomes. Fire-and-forget: implementations must not
/// block or fail.
pub trait DispatchLog: Send + Sync {
    fn info(&self, event: &str, fields: &Fields<'_>);
    fn error(&self, event: &str, fields: &Fields<'_>);
}

/// Keys the dispatcher emits; [`TracingLog`] records these as `tracing` fields.
const KNOWN_KEYS: [&str; 4] = ["command", "input", "doc", "error"];

fn value<'a>(fields: &Fields<'a>, key: &str) -> Option<&'a str> {
    fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Any keys outside [`KNOWN_KEYS`], rendered `key="value"` into the message.
struct Extra<'a, 'b>(&'a Fields<'b>);

impl fmt::Display for Extra<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.0.iter().filter(|(k, _)| !KNOWN_KEYS.contains(k)) {
            write!(f, " {}={:?}", key, value)?;
        }
        Ok(())
    }
}

/// Forwards records to `tracing` under the `clidoc` target, with `event`,
/// `command`, `input`, `doc` and `error` as structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl DispatchLog for TracingLog {
    fn info(&self, event: &str, fields: &Fields<'_>) {
        info!(
            target: "clidoc",
            event,
            command = value(fields, "command"),
            input = value(fields, "input"),
            doc = value(fields, "doc"),
            error = value(fields, "error"),
            "documentation resolved{}",
            Extra(fields)
        );
    }

    fn error(&self, event: &str, fields: &Fields<'_>) {
        error!(
            target: "clidoc",
            event,
            command = value(fields, "command"),
            input = value(fields, "input"),
            doc = value(fields, "doc"),
            error = value(fields, "error"),
            "documentation lookup failed{}",
            Extra(fields)
        );
    }
}

/// Drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl DispatchLog for NullLog {
    fn info(&self, _event: &str, _fields: &Fields<'_>) {}
    fn error(&self, _event: &str, _fields: &Fields<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Level, Metadata, Subscriber};

    type Captured = Arc<Mutex<Vec<(Level, BTreeMap<String, String>)>>>;

    /// Minimal subscriber that keeps every event's fields.
    struct Capture(Captured);

    struct FieldMap<'a>(&'a mut BTreeMap<String, String>);

    impl Visit for FieldMap<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{:?}", value));
        }
    }

    impl Subscriber for Capture {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &Attributes<'_>) -> Id {
            Id::from_u64(1)
        }
        fn record(&self, _: &Id, _: &Record<'_>) {}
        fn record_follows_from(&self, _: &Id, _: &Id) {}
        fn event(&self, event: &Event<'_>) {
            let mut fields = BTreeMap::new();
            event.record(&mut FieldMap(&mut fields));
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), fields));
        }
        fn enter(&self, _: &Id) {}
        fn exit(&self, _: &Id) {}
    }

    fn capture(f: impl FnOnce()) -> Vec<(Level, BTreeMap<String, String>)> {
        let captured = Captured::default();
        tracing::subscriber::with_default(Capture(captured.clone()), f);
        let events = captured.lock().unwrap().clone();
        events
    }

    #[test]
    fn success_fields_are_structured() {
        let events = capture(|| {
            TracingLog.info(
                "yomo-cli-mcp",
                &[("command", "build"), ("input", "build it"), ("doc", "build docs")],
            )
        });

        assert_eq!(events.len(), 1);
        let (level, fields) = &events[0];
        assert_eq!(*level, Level::INFO);
        assert_eq!(fields["event"], "yomo-cli-mcp");
        assert_eq!(fields["command"], "build");
        assert_eq!(fields["input"], "build it");
        assert_eq!(fields["doc"], "build docs");
        assert!(!fields.contains_key("error"));
        assert_eq!(fields["message"], "documentation resolved");
    }

    #[test]
    fn failure_fields_are_structured() {
        let events = capture(|| {
            TracingLog.error(
                "yomo-cli-mcp",
                &[("command", "yomo"), ("input", ""), ("error", "not found")],
            )
        });

        let (level, fields) = &events[0];
        assert_eq!(*level, Level::ERROR);
        assert_eq!(fields["command"], "yomo");
        assert_eq!(fields["input"], "");
        assert_eq!(fields["error"], "not found");
        assert!(!fields.contains_key("doc"));
    }

    #[test]
    fn unknown_keys_go_to_the_message() {
        let fields = [("command", "run"), ("host", "say \"hi\"")];
        assert_eq!(Extra(&fields).to_string(), r#" host="say \"hi\"""#);
        assert_eq!(Extra(&[]).to_string(), "");
        assert_eq!(value(&fields, "command"), Some("run"));
        assert_eq!(value(&fields, "doc"), None);
    }
}
