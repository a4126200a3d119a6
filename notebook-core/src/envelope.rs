//! The `{success, data | error}` wrapper around every backend response.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Error object carried by a failed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn into_api_error(self, http_status: Option<u16>) -> ApiError {
        ApiError {
            code: self.code,
            message: self.message,
            details: self.details,
            http_status,
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{success: true, data}`; a missing `data` decodes as `null`.
    Success(Value),
    /// `{success: false, error}`.
    Failure(ErrorBody),
    /// Anything without a boolean `success` field.
    Bare(Value),
}

impl Envelope {
    /// Classify a JSON body.
    ///
    /// A `success: false` body whose `error` object is unreadable stays
    /// [`Envelope::Bare`] so the caller falls back to generic HTTP handling.
    pub fn from_value(mut value: Value) -> Self {
        let success = value.get("success").and_then(Value::as_bool);
        match success {
            Some(true) => {
                let data = value
                    .as_object_mut()
                    .and_then(|obj| obj.remove("data"))
                    .unwrap_or(Value::Null);
                Envelope::Success(data)
            }
            Some(false) => {
                let body = value
                    .get("error")
                    .cloned()
                    .and_then(|err| serde_json::from_value::<ErrorBody>(err).ok());
                match body {
                    Some(body) => Envelope::Failure(body),
                    None => Envelope::Bare(value),
                }
            }
            None => Envelope::Bare(value),
        }
    }
}

/// Build a success envelope.
pub fn success_body<T: Serialize>(data: &T) -> Value {
    json!({ "success": true, "data": data })
}

/// Build a failure envelope.
pub fn failure_body(code: &str, message: &str) -> Value {
    json!({ "success": false, "error": { "code": code, "message": message } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_unwraps_data() {
        let env = Envelope::from_value(json!({"success": true, "data": [1, 2]}));
        assert_eq!(env, Envelope::Success(json!([1, 2])));
    }

    #[test]
    fn test_success_without_data_is_null() {
        let env = Envelope::from_value(json!({"success": true}));
        assert_eq!(env, Envelope::Success(Value::Null));
    }

    #[test]
    fn test_failure_carries_error_body() {
        let env = Envelope::from_value(json!({
            "success": false,
            "error": {"code": "NOT_FOUND", "message": "gone", "details": {"id": "n1"}}
        }));
        match env {
            Envelope::Failure(body) => {
                assert_eq!(body.code, "NOT_FOUND");
                let err = body.into_api_error(Some(404));
                assert_eq!(err.http_status, Some(404));
                assert_eq!(err.details, Some(json!({"id": "n1"})));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_body_is_bare() {
        let env = Envelope::from_value(json!({"message": "oops"}));
        assert!(matches!(env, Envelope::Bare(_)));
    }

    #[test]
    fn test_malformed_failure_is_bare() {
        let env = Envelope::from_value(json!({"success": false, "error": "text"}));
        assert!(matches!(env, Envelope::Bare(_)));
    }
}
