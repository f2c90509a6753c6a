//! Tracing layer that writes one JSON object per event.
//!
//! Output goes to stderr so stdout stays reserved for report payloads.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// Correlation fields picked up from enclosing spans.
#[derive(Debug, Clone, Default)]
struct SpanContext {
    run_id: Option<String>,
    host_id: Option<String>,
    stage: Option<String>,
    stream: Option<String>,
}

impl SpanContext {
    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "run_id" => Some(&mut self.run_id),
            "host_id" => Some(&mut self.host_id),
            "stage" => Some(&mut self.stage),
            "stream" => Some(&mut self.stream),
            _ => None,
        }
    }

    /// Fill unset fields from an outer span.
    fn inherit(&mut self, outer: &SpanContext) {
        for (mine, theirs) in [
            (&mut self.run_id, &outer.run_id),
            (&mut self.host_id, &outer.host_id),
            (&mut self.stage, &outer.stage),
            (&mut self.stream, &outer.stream),
        ] {
            if mine.is_none() {
                mine.clone_from(theirs);
            }
        }
    }
}

impl Visit for SpanContext {
    fn record_str(&mut self, field: &Field, value: &str) {
        if let Some(slot) = self.slot(field.name()) {
            *slot = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if let Some(slot) = self.slot(field.name()) {
            *slot = Some(format!("{:?}", value));
        }
    }
}

/// Collects event fields into a JSON map.
#[derive(Default)]
struct JsonFieldVisitor {
    fields: Map<String, Value>,
    message: Option<String>,
    context: SpanContext,
}

impl JsonFieldVisitor {
    fn insert_string(&mut self, name: &str, value: String) {
        if name == "message" {
            self.message = Some(value);
        } else if let Some(slot) = self.context.slot(name) {
            // An empty context field means "not set".
            if !value.is_empty() {
                *slot = Some(value);
            }
        } else {
            self.fields.insert(name.to_string(), Value::String(value));
        }
    }
}

impl Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert_string(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert_string(field.name(), format!("{:?}", value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON form; record them as strings.
        let v = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.fields.insert(field.name().to_string(), v);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::Bool(value));
    }
}

/// JSONL layer over any writer; stderr in production.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer {
            writer: Mutex::new(io::stderr()),
        }
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut context = SpanContext::default();
        attrs.record(&mut context);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(context);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let ts = Utc::now();

        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        // Event fields win over span fields; inner spans over outer ones.
        let mut context = std::mem::take(&mut visitor.context);
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(outer) = span.extensions().get::<SpanContext>() {
                    context.inherit(outer);
                }
            }
        }

        let level: Level = (*event.metadata().level()).into();
        let mut obj = Map::new();
        obj.insert("ts".into(), Value::String(ts.to_rfc3339()));
        obj.insert("level".into(), serde_json::json!(level));
        obj.insert("event".into(), Value::String(event.metadata().target().into()));
        for (key, value) in [
            ("run_id", context.run_id),
            ("host_id", context.host_id),
            ("stage", context.stage),
            ("stream", context.stream),
            ("message", visitor.message),
        ] {
            if let Some(v) = value {
                obj.insert(key.into(), Value::String(v));
            }
        }
        if !visitor.fields.is_empty() {
            obj.insert("fields".into(), Value::Object(visitor.fields));
        }

        let line = serde_json::to_string(&Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    struct BufWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for BufWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Value> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let layer = JsonlLayer::new(BufWriter(buffer.clone()));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        let output = buffer.lock().unwrap();
        String::from_utf8_lossy(&output)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_basic_event() {
        let lines = capture(|| {
            tracing::warn!(target: "window.sample_rejected", stream = "fs:/data", "skipping sample");
        });
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["level"], "warn");
        assert_eq!(line["event"], "window.sample_rejected");
        assert_eq!(line["stream"], "fs:/data");
        assert_eq!(line["message"], "skipping sample");
        assert!(line["ts"].is_string());
    }

    #[test]
    fn test_numeric_fields() {
        let lines = capture(|| {
            tracing::info!(target: "analysis.finished", n_points = 12u64, eta = 6.5, breached = false, "done");
        });
        let fields = &lines[0]["fields"];
        assert_eq!(fields["n_points"], 12);
        assert_eq!(fields["eta"], 6.5);
        assert_eq!(fields["breached"], false);
    }

    #[test]
    fn test_non_finite_float_kept_as_string() {
        let lines = capture(|| {
            tracing::info!(target: "t", value = f64::NAN, "nan");
        });
        assert_eq!(lines[0]["fields"]["value"], "NaN");
    }

    #[test]
    fn test_span_context_is_inherited() {
        let lines = capture(|| {
            let outer = tracing::info_span!("run", run_id = "run-1", host_id = "host-1", stage = "sweep");
            let _o = outer.enter();
            let inner = tracing::info_span!("stream", stream = "memory", stage = "analyze");
            let _i = inner.enter();
            tracing::info!(target: "alert.raised", "raised");
        });
        let line = &lines[0];
        assert_eq!(line["run_id"], "run-1");
        assert_eq!(line["host_id"], "host-1");
        assert_eq!(line["stage"], "analyze");
        assert_eq!(line["stream"], "memory");
    }
}
