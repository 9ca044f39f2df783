//! Result shaping: engine-reported errors become a client-safe envelope.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::engine::{EngineError, SourceLocation};

/// The one message internal errors collapse into.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error(s) while executing query";

/// One client-visible error entry as serialized into the envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,
}

impl ClientError {
    fn internal_marker() -> Self {
        Self {
            message: INTERNAL_ERROR_MESSAGE.to_string(),
            locations: Vec::new(),
        }
    }
}

impl From<&EngineError> for ClientError {
    fn from(error: &EngineError) -> Self {
        Self {
            message: error.message.clone(),
            locations: error.locations.clone(),
        }
    }
}

/// The serialized response body. `data` is always present, JSON null when
/// the engine produced none; `errors` appears exactly when at least one
/// error occurred, filtered or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ClientError>,
}

/// Build the envelope for a data payload plus engine-reported errors.
///
/// Syntax and validation entries pass through verbatim. Everything else is
/// logged server-side with its category and message, then collapsed into a
/// single generic entry so internal detail never reaches the client.
pub fn shape(data: Value, errors: &[EngineError]) -> ResultEnvelope {
    if errors.is_empty() {
        return ResultEnvelope {
            data,
            errors: Vec::new(),
        };
    }

    let mut visible: Vec<ClientError> = errors
        .iter()
        .filter(|e| e.category.client_visible())
        .map(ClientError::from)
        .collect();

    if visible.len() < errors.len() {
        for internal in errors.iter().filter(|e| !e.category.client_visible()) {
            error!(
                category = internal.category.as_str(),
                message = %internal.message,
                "error executing query"
            );
        }
        visible.push(ClientError::internal_marker());
    }

    ResultEnvelope {
        data,
        errors: visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorCategory;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn serialized(envelope: &ResultEnvelope) -> String {
        serde_json::to_string(envelope).unwrap()
    }

    #[test]
    fn no_errors_means_no_errors_key() {
        let envelope = shape(json!({"hero": "R2-D2"}), &[]);
        let body = serialized(&envelope);
        assert!(body.contains("\"data\""));
        assert!(!body.contains("\"errors\""));
    }

    #[test]
    fn null_data_is_still_serialized() {
        let envelope = shape(Value::Null, &[]);
        assert_eq!(serialized(&envelope), r#"{"data":null}"#);
    }

    #[test]
    fn client_errors_pass_through_verbatim() {
        let errors = vec![
            EngineError::new(ErrorCategory::Syntax, "Unexpected token").at(1, 9),
            EngineError::new(ErrorCategory::Validation, "Unknown field \"heroo\""),
        ];
        let envelope = shape(Value::Null, &errors);
        assert_eq!(envelope.errors.len(), 2);
        assert_eq!(envelope.errors[0].message, "Unexpected token");
        assert_eq!(
            envelope.errors[0].locations,
            vec![SourceLocation { line: 1, column: 9 }]
        );
        assert_eq!(envelope.errors[1].message, "Unknown field \"heroo\"");
    }

    #[test]
    fn internal_errors_collapse_to_one_generic_entry_and_are_logged() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();

        let envelope = tracing::subscriber::with_default(subscriber, || {
            shape(
                json!({"partial": true}),
                &[
                    EngineError::new(ErrorCategory::Execution, "db timeout on replica-3"),
                    EngineError::new(ErrorCategory::Internal, "resolver NPE"),
                ],
            )
        });

        assert_eq!(envelope.errors.len(), 1);
        assert_eq!(envelope.errors[0].message, INTERNAL_ERROR_MESSAGE);

        let body = serialized(&envelope);
        assert!(!body.contains("db timeout"));
        assert!(!body.contains("resolver NPE"));

        let logs = capture.contents();
        assert!(logs.contains("db timeout on replica-3"));
        assert!(logs.contains("resolver NPE"));
    }

    #[test]
    fn mixed_errors_keep_client_entries_and_append_one_marker() {
        let envelope = shape(
            Value::Null,
            &[
                EngineError::new(ErrorCategory::Validation, "Unknown argument"),
                EngineError::new(ErrorCategory::Execution, "boom"),
                EngineError::new(ErrorCategory::Execution, "boom again"),
            ],
        );
        let messages: Vec<&str> = envelope.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Unknown argument", INTERNAL_ERROR_MESSAGE]);
    }

    #[test]
    fn locations_are_omitted_from_serialization_when_empty() {
        let envelope = shape(
            Value::Null,
            &[EngineError::new(ErrorCategory::Syntax, "Unexpected token")],
        );
        assert_eq!(
            serialized(&envelope),
            r#"{"data":null,"errors":[{"message":"Unexpected token"}]}"#
        );
    }
}
