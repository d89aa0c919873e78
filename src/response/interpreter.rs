use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::document::{
    CODE_KEY, ErrorDocument, MESSAGE_FRIENDLY_KEY, MESSAGE_KEY, friendly_message, parse_body,
    server_message, stamp_status,
};
use crate::client::RawResponse;
use crate::observability::Metrics;

/// Shown when an error document has no friendly message
pub const FALLBACK_ALERT_MESSAGE: &str = "Invalid operation.";

const EVENT_CAPACITY: usize = 64;

/// Presents a blocking, user-facing error message
pub trait AlertPresenter: Send + Sync {
    fn present(&self, message: &str);
}

/// Alerts are dropped (background work, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAlerts;

impl AlertPresenter for SilentAlerts {
    fn present(&self, _message: &str) {}
}

/// Alerts are written to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrAlerts;

impl AlertPresenter for StderrAlerts {
    fn present(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

/// Broadcast for every interpreted response
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEvent {
    pub status: u16,
    pub document: Value,
}

/// Normalizes raw responses into success or error documents
pub struct ResponseInterpreter {
    events: broadcast::Sender<ResponseEvent>,
    alerts: Arc<dyn AlertPresenter>,
    metrics: Arc<Metrics>,
}

impl ResponseInterpreter {
    pub fn new(alerts: Arc<dyn AlertPresenter>, metrics: Arc<Metrics>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            alerts,
            metrics,
        }
    }

    /// Receive a [`ResponseEvent`] for each subsequent response
    pub fn subscribe(&self) -> broadcast::Receiver<ResponseEvent> {
        self.events.subscribe()
    }

    /// Turn a raw response into a document.
    ///
    /// - 204/205: `{statusCode}` only, body ignored
    /// - 200: parsed body with `statusCode` stamped on
    /// - anything else: an [`ErrorDocument`], alerting first if `alert_on_error`
    pub fn interpret(&self, raw: &RawResponse, alert_on_error: bool) -> Value {
        if matches!(raw.status, 204 | 205) {
            let mut document = Value::Object(Map::new());
            stamp_status(&mut document, raw.status);
            self.broadcast(raw.status, &document);
            return document;
        }

        let mut document = parse_body(&raw.body);

        if raw.status == 200 {
            stamp_status(&mut document, raw.status);
            self.broadcast(raw.status, &document);
            return document;
        }

        let document = self.server_error(document, raw.status, alert_on_error);
        self.broadcast(raw.status, &document);
        document
    }

    fn server_error(&self, document: Value, status: u16, alert_on_error: bool) -> Value {
        self.metrics.error_response();

        let has_code = document.get(CODE_KEY).and_then(Value::as_i64).is_some();

        let mut document = if has_code {
            let mut document = document;
            if let Value::Object(map) = &mut document {
                // absent, null or non-string messages are replaced
                if !map.get(MESSAGE_KEY).is_some_and(Value::is_string) {
                    map.insert(MESSAGE_KEY.to_string(), Value::from(server_message(status)));
                }
                if !map.get(MESSAGE_FRIENDLY_KEY).is_some_and(Value::is_string) {
                    map.insert(
                        MESSAGE_FRIENDLY_KEY.to_string(),
                        Value::from(friendly_message(status)),
                    );
                }
            }
            document
        } else {
            ErrorDocument::synthesize(status, document).into_document()
        };
        stamp_status(&mut document, status);

        let code = document.get(CODE_KEY).and_then(Value::as_i64);
        warn!(status, code, "Server returned an error");

        if alert_on_error {
            let message = document
                .get(MESSAGE_FRIENDLY_KEY)
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or(FALLBACK_ALERT_MESSAGE);
            self.alerts.present(message);
        }

        document
    }

    fn broadcast(&self, status: u16, document: &Value) {
        let event = ResponseEvent {
            status,
            document: document.clone(),
        };
        // no subscribers is fine
        if self.events.send(event).is_err() {
            debug!(status, "No response subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAlerts {
        messages: Mutex<Vec<String>>,
    }

    impl AlertPresenter for RecordingAlerts {
        fn present(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn interpreter() -> (ResponseInterpreter, Arc<RecordingAlerts>, Arc<Metrics>) {
        let alerts = Arc::new(RecordingAlerts::default());
        let metrics = Arc::new(Metrics::new());
        let interpreter = ResponseInterpreter::new(alerts.clone(), metrics.clone());
        (interpreter, alerts, metrics)
    }

    #[test]
    fn test_success_stamps_status() {
        let (interpreter, alerts, _) = interpreter();
        let raw = RawResponse::new(200, r#"{"data":{"x":1}}"#);

        let document = interpreter.interpret(&raw, true);

        assert_eq!(document, json!({"data": {"x": 1}, "statusCode": 200}));
        assert!(alerts.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_error_synthesized_for_body_without_code() {
        let (interpreter, alerts, metrics) = interpreter();
        let raw = RawResponse::new(500, "{}");

        let document = interpreter.interpret(&raw, true);

        assert_eq!(document["code"], json!(-1));
        assert_eq!(document["data"], json!({}));
        assert_eq!(document["message"], json!("Server.Error.500"));
        assert_eq!(document["statusCode"], json!(500));
        let friendly = document["messageFriendly"].as_str().unwrap();
        assert!(!friendly.is_empty());

        assert_eq!(alerts.messages.lock().unwrap().as_slice(), [friendly.to_string()]);
        assert_eq!(metrics.snapshot().error_responses, 1);
    }

    #[test]
    fn test_no_content_ignores_body() {
        let (interpreter, _, _) = interpreter();

        for status in [204, 205] {
            let raw = RawResponse::new(status, "this is not json at all");
            assert_eq!(interpreter.interpret(&raw, true), json!({"statusCode": status}));
        }
    }

    #[test]
    fn test_malformed_success_body_is_empty_object() {
        let (interpreter, _, _) = interpreter();
        let raw = RawResponse::new(200, "<html>");

        assert_eq!(interpreter.interpret(&raw, true), json!({"statusCode": 200}));
    }

    #[test]
    fn test_server_code_is_kept() {
        let (interpreter, alerts, _) = interpreter();
        let raw = RawResponse::new(
            403,
            r#"{"code": 12, "data": {"reason": "quota"}, "messageFriendly": "Daily quota used up"}"#,
        );

        let document = interpreter.interpret(&raw, true);

        assert_eq!(document["code"], json!(12));
        assert_eq!(document["data"], json!({"reason": "quota"}));
        assert_eq!(document["message"], json!("Server.Error.403"));
        assert_eq!(document["statusCode"], json!(403));
        assert_eq!(
            alerts.messages.lock().unwrap().as_slice(),
            ["Daily quota used up".to_string()]
        );

        let error = ErrorDocument::from_document(&document).unwrap();
        assert_eq!(error.code, 12);
    }

    #[test]
    fn test_null_messages_are_replaced() {
        let (interpreter, alerts, _) = interpreter();
        let raw = RawResponse::new(500, r#"{"code": 3, "message": null, "messageFriendly": 9}"#);

        let document = interpreter.interpret(&raw, true);

        assert_eq!(document["code"], json!(3));
        assert_eq!(document["message"], json!("Server.Error.500"));
        assert_eq!(document["messageFriendly"], json!(friendly_message(500)));

        let error = ErrorDocument::from_document(&document).unwrap();
        assert_eq!(error.code, 3);
        assert_eq!(error.status_code, 500);
        assert_eq!(
            alerts.messages.lock().unwrap().as_slice(),
            [friendly_message(500)]
        );
    }

    #[test]
    fn test_no_content_reads_back_as_error() {
        let (interpreter, _, _) = interpreter();

        let document = interpreter.interpret(&RawResponse::new(204, ""), false);

        let error = ErrorDocument::from_document(&document).unwrap();
        assert_eq!(error.status_code, 204);
    }

    #[test]
    fn test_non_integer_code_is_synthesized() {
        let (interpreter, _, _) = interpreter();
        let raw = RawResponse::new(400, r#"{"code": "E_BAD"}"#);

        let document = interpreter.interpret(&raw, false);

        assert_eq!(document["code"], json!(-1));
        assert_eq!(document["data"], json!({"code": "E_BAD"}));
    }

    #[test]
    fn test_empty_friendly_message_uses_fallback() {
        let (interpreter, alerts, _) = interpreter();
        let raw = RawResponse::new(400, r#"{"code": 1, "messageFriendly": ""}"#);

        interpreter.interpret(&raw, true);

        assert_eq!(
            alerts.messages.lock().unwrap().as_slice(),
            [FALLBACK_ALERT_MESSAGE.to_string()]
        );
    }

    #[test]
    fn test_alert_suppressed() {
        let (interpreter, alerts, _) = interpreter();
        interpreter.interpret(&RawResponse::new(502, ""), false);

        assert!(alerts.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_events_broadcast_for_success_and_error() {
        let (interpreter, _, _) = interpreter();
        let mut events = interpreter.subscribe();

        interpreter.interpret(&RawResponse::new(200, r#"{"data":{}}"#), false);
        interpreter.interpret(&RawResponse::new(404, ""), false);

        let first = events.try_recv().unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(first.document["statusCode"], json!(200));

        let second = events.try_recv().unwrap();
        assert_eq!(second.status, 404);
        assert_eq!(second.document["message"], json!("Server.Error.404"));
    }
}
