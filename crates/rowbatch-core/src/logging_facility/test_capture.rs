//! In-memory capture of coordinator log events
//!
//! Installs a process-global subscriber that keeps every event in a buffer.
//! Tests share it when they run in parallel, so assertions narrow the buffer
//! to their own commit with [`TestCapture::for_txn`], or to an op name no
//! other test uses with [`TestCapture::boundaries`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use rowbatch_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_COMPONENT, FIELD_EVENT, FIELD_OP, FIELD_TXN_ID,
};

/// One captured event, fields rendered as strings
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    /// Transaction the event was logged for, if any
    pub txn_id: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// `start`, `end` or `end_error` of an op boundary
    pub fn is_boundary(&self) -> bool {
        matches!(
            self.event.as_deref(),
            Some(EVENT_START) | Some(EVENT_END) | Some(EVENT_END_ERROR)
        )
    }
}

#[derive(Default)]
struct Fields(HashMap<String, String>);

impl Fields {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

/// Layer appending each event to the buffer shared with [`TestCapture`]
pub struct TestCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = Self {
            events: events.clone(),
        };
        (layer, TestCapture { events })
    }
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        event.record(&mut fields);
        let fields = fields.0;

        let captured = CapturedEvent {
            level: *event.metadata().level(),
            component: fields.get(FIELD_COMPONENT).cloned(),
            op: fields.get(FIELD_OP).cloned(),
            event: fields.get(FIELD_EVENT).cloned(),
            txn_id: fields.get(FIELD_TXN_ID).cloned(),
            fields,
        };

        self.events
            .lock()
            .map(|mut events| events.push(captured))
            .ok();
    }
}

/// Read side of the capture buffer
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events tagged with `txn_id`, in logging order
    pub fn for_txn(&self, txn_id: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.txn_id.as_deref() == Some(txn_id))
            .collect()
    }

    /// Boundary events of `op`, in logging order
    pub fn boundaries(&self, op: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.op.as_deref() == Some(op) && e.is_boundary())
            .collect()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer as the global subscriber on first use
///
/// # Example
///
/// ```
/// use rowbatch_core::logging_facility::test_capture::init_test_capture;
/// use rowbatch_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_example_reload");
/// let seen = capture.boundaries("doc_example_reload");
/// assert_eq!(seen[0].event.as_deref(), Some("start"));
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            tracing_subscriber::registry().with(layer).init();
            capture
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(event: Option<&str>, txn_id: Option<&str>) -> CapturedEvent {
        CapturedEvent {
            level: Level::INFO,
            component: None,
            op: Some("commit_updates".to_string()),
            event: event.map(str::to_string),
            txn_id: txn_id.map(str::to_string),
            fields: HashMap::from([("op_count".to_string(), "3".to_string())]),
        }
    }

    #[test]
    fn test_boundary_events() {
        assert!(captured(Some("end_error"), None).is_boundary());
        assert!(!captured(Some("absorbed"), None).is_boundary());
        assert!(!captured(None, None).is_boundary());
    }

    #[test]
    fn test_txn_filter_on_shared_buffer() {
        let (_layer, capture) = TestCaptureLayer::new();
        if let Ok(mut events) = capture.events.lock() {
            events.push(captured(Some("start"), Some("a")));
            events.push(captured(Some("start"), Some("b")));
            events.push(captured(Some("end"), Some("a")));
        }

        let for_a = capture.for_txn("a");
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[1].event.as_deref(), Some("end"));
        assert_eq!(for_a[1].field("op_count"), Some("3"));
        assert_eq!(capture.boundaries("commit_updates").len(), 3);
    }
}
