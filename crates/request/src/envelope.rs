use serde_json::Value;

/// A response envelope, parsed once at the boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    /// `status` was `"success"`, or absent/falsy on endpoints that predate the
    /// envelope.
    Success {
        /// The envelope's `data` field.
        data: Option<Value>,
        /// The envelope's `message` field.
        message: Option<String>,
    },

    /// `status` was anything else, regardless of the HTTP status code.
    Failure {
        /// The status label, e.g. `"error"`.
        status: String,
        /// The envelope's `message` field.
        message: Option<String>,
        /// The envelope's `errors` field, unprocessed.
        errors: Option<Value>,
    },
}

impl Envelope {
    /// Parses a response body.
    ///
    /// Bodies that are not JSON objects (bare arrays, strings, empty bodies)
    /// carry no envelope and are treated as a success without `data`.
    #[must_use]
    pub fn parse(body: Option<Value>) -> Self {
        let Parts {
            status,
            message,
            errors,
            data,
        } = Parts::from_body(body);

        match status {
            Some(status) if !is_falsy(&status) && status != "success" => Self::Failure {
                status: label(status),
                message,
                errors,
            },
            _ => Self::Success { data, message },
        }
    }

    /// Whether this is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The four envelope fields of a body, `null`s removed.
#[derive(Debug, Default)]
pub(crate) struct Parts {
    pub status: Option<Value>,
    pub message: Option<String>,
    pub errors: Option<Value>,
    pub data: Option<Value>,
}

impl Parts {
    pub(crate) fn from_body(body: Option<Value>) -> Self {
        let Some(Value::Object(mut body)) = body else {
            return Self::default();
        };

        Self {
            status: non_null(body.remove("status")),
            message: non_null(body.remove("message")).and_then(|message| match message {
                Value::String(message) if message.is_empty() => None,
                Value::String(message) => Some(message),
                other => Some(other.to_string()),
            }),
            errors: non_null(body.remove("errors")),
            data: non_null(body.remove("data")),
        }
    }
}

fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|value| !value.is_null())
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn label(status: Value) -> String {
    match status {
        Value::String(status) => status,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_success() {
        let envelope = Envelope::parse(Some(json!({
            "status": "success",
            "message": "Saved",
            "data": { "id": 1 }
        })));

        assert_eq!(
            envelope,
            Envelope::Success {
                data: Some(json!({ "id": 1 })),
                message: Some("Saved".to_string()),
            }
        );
    }

    #[test]
    fn test_logical_failure() {
        let envelope = Envelope::parse(Some(json!({
            "status": "error",
            "message": "Out of stock",
            "errors": ["sku"]
        })));

        assert_eq!(
            envelope,
            Envelope::Failure {
                status: "error".to_string(),
                message: Some("Out of stock".to_string()),
                errors: Some(json!(["sku"])),
            }
        );
    }

    #[test]
    fn test_missing_or_falsy_status_is_success() {
        for status in [json!(null), json!(""), json!(false), json!(0)] {
            let envelope = Envelope::parse(Some(json!({ "status": status, "data": [1] })));
            assert_eq!(
                envelope,
                Envelope::Success {
                    data: Some(json!([1])),
                    message: None,
                }
            );
        }

        assert!(Envelope::parse(Some(json!({ "data": 5 }))).is_success());
    }

    #[test]
    fn test_non_string_status_is_failure() {
        let envelope = Envelope::parse(Some(json!({ "status": 500 })));

        assert_eq!(
            envelope,
            Envelope::Failure {
                status: "500".to_string(),
                message: None,
                errors: None,
            }
        );
    }

    #[test]
    fn test_non_object_bodies_have_no_data() {
        assert_eq!(
            Envelope::parse(Some(json!([{ "id": 1 }]))),
            Envelope::Success {
                data: None,
                message: None,
            }
        );
        assert!(Envelope::parse(None).is_success());
    }

    #[test]
    fn test_empty_message_is_absent() {
        let envelope = Envelope::parse(Some(json!({ "status": "success", "message": "" })));

        assert_eq!(
            envelope,
            Envelope::Success {
                data: None,
                message: None,
            }
        );
    }
}
