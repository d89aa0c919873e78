use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CODE_KEY: &str = "code";
pub const DATA_KEY: &str = "data";
pub const MESSAGE_KEY: &str = "message";
pub const MESSAGE_FRIENDLY_KEY: &str = "messageFriendly";
pub const STATUS_CODE_KEY: &str = "statusCode";

/// `code` given to errors whose body carried no code of its own
pub const UNPARSEABLE_CODE: i64 = -1;

/// Parse a response body; empty, malformed and `null` bodies become `{}`.
pub fn parse_body(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) | Err(_) => Value::Object(Map::new()),
        Ok(value) => value,
    }
}

/// HTTP status stamped on a document by the interpreter
pub fn status_of(document: &Value) -> Option<u16> {
    document
        .get(STATUS_CODE_KEY)
        .and_then(Value::as_u64)
        .and_then(|status| u16::try_from(status).ok())
}

/// Stamp `statusCode` onto an object document; other shapes are left as-is.
pub fn stamp_status(document: &mut Value, status: u16) {
    if let Value::Object(map) = document {
        map.insert(STATUS_CODE_KEY.to_string(), Value::from(status));
    }
}

/// Normalized failure document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub code: i64,
    #[serde(default)]
    pub data: Value,
    pub message: String,
    #[serde(rename = "messageFriendly", default)]
    pub message_friendly: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl ErrorDocument {
    /// Error for a body that carried no `code`; the body becomes `data`.
    pub fn synthesize(status: u16, data: Value) -> Self {
        Self {
            code: UNPARSEABLE_CODE,
            data,
            message: server_message(status),
            message_friendly: friendly_message(status),
            status_code: status,
        }
    }

    /// Read an error back from an interpreted document.
    ///
    /// Any stamped status other than 200 is a failure. Fields the document
    /// lacks, or carries with the wrong type, are filled in as for a
    /// synthesized error. Returns `None` for 200 and for documents without a
    /// stamped status (non-object success bodies).
    pub fn from_document(document: &Value) -> Option<Self> {
        let status = status_of(document)?;
        if status == 200 {
            return None;
        }

        let text = |key: &str| document.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            code: document
                .get(CODE_KEY)
                .and_then(Value::as_i64)
                .unwrap_or(UNPARSEABLE_CODE),
            data: document.get(DATA_KEY).cloned().unwrap_or(Value::Null),
            message: text(MESSAGE_KEY).unwrap_or_else(|| server_message(status)),
            message_friendly: text(MESSAGE_FRIENDLY_KEY)
                .unwrap_or_else(|| friendly_message(status)),
            status_code: status,
        })
    }

    pub fn into_document(self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// Machine-readable message key for a status (`Server.Error.500`)
pub fn server_message(status: u16) -> String {
    format!("Server.Error.{}", status)
}

/// Message shown to the user for a status
pub fn friendly_message(status: u16) -> String {
    match reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) => format!("Server error code: {} ({})", status, reason),
        None => format!("Server error code: {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_fallbacks() {
        assert_eq!(parse_body(b""), json!({}));
        assert_eq!(parse_body(b"<html>oops</html>"), json!({}));
        assert_eq!(parse_body(b"null"), json!({}));
        assert_eq!(parse_body(br#"[1,2]"#), json!([1, 2]));
    }

    #[test]
    fn test_synthesize() {
        let error = ErrorDocument::synthesize(503, json!({"detail": "maintenance"}));
        assert_eq!(error.code, -1);
        assert_eq!(error.message, "Server.Error.503");
        assert_eq!(error.message_friendly, "Server error code: 503 (Service Unavailable)");
        assert_eq!(error.status_code, 503);

        let document = error.into_document();
        assert_eq!(document["messageFriendly"], json!("Server error code: 503 (Service Unavailable)"));
        assert_eq!(document["statusCode"], json!(503));
        assert_eq!(document["data"]["detail"], json!("maintenance"));
    }

    #[test]
    fn test_friendly_message_for_unknown_status() {
        assert_eq!(friendly_message(599), "Server error code: 599");
    }

    #[test]
    fn test_from_document() {
        let document = ErrorDocument::synthesize(404, json!({})).into_document();
        let error = ErrorDocument::from_document(&document).unwrap();
        assert_eq!(error.status_code, 404);

        assert!(ErrorDocument::from_document(&json!({"data": {}, "statusCode": 200})).is_none());
        assert!(ErrorDocument::from_document(&json!({"data": {}})).is_none());
    }

    #[test]
    fn test_from_document_decides_on_status_alone() {
        let no_content = ErrorDocument::from_document(&json!({"statusCode": 204})).unwrap();
        assert_eq!(no_content.code, -1);
        assert_eq!(no_content.status_code, 204);
        assert_eq!(no_content.message, "Server.Error.204");

        let mistyped = ErrorDocument::from_document(
            &json!({"code": 3, "message": null, "messageFriendly": 5, "statusCode": 500}),
        )
        .unwrap();
        assert_eq!(mistyped.code, 3);
        assert_eq!(mistyped.message, "Server.Error.500");
        assert_eq!(mistyped.message_friendly, friendly_message(500));
    }

    #[test]
    fn test_stamp_status_only_on_objects() {
        let mut object = json!({"data": 1});
        stamp_status(&mut object, 200);
        assert_eq!(status_of(&object), Some(200));

        let mut array = json!([1]);
        stamp_status(&mut array, 200);
        assert_eq!(array, json!([1]));
    }
}
