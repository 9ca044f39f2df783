use std::fmt;

/// Why an HTTP request could not be normalized into an operation invocation.
///
/// Every variant is answered with HTTP 400 and an empty body; GraphQL-level
/// error envelopes are reserved for requests that actually reached the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRequest {
    /// GET on a non-introspection path without a `query` parameter.
    MissingQueryParam,
    /// POST body absent or not a JSON document with a `query` field.
    InvalidJsonBody {
        /// Parser detail, logged but never echoed to the client
        detail: String,
    },
    /// `variables` was present but was not JSON object text.
    InvalidVariables { detail: String },
    /// Multipart body without a `graphql` or `query` part.
    MissingOperationPart,
    /// Multipart body whose framing could not be decoded.
    InvalidMultipart { detail: String },
}

impl fmt::Display for MalformedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRequest::MissingQueryParam => {
                write!(f, "no query parameter named \"query\" given")
            }
            MalformedRequest::InvalidJsonBody { detail } => {
                write!(f, "parsing request body failed: {}", detail)
            }
            MalformedRequest::InvalidVariables { detail } => {
                write!(f, "variables must be JSON object text: {}", detail)
            }
            MalformedRequest::MissingOperationPart => {
                write!(f, "no part named \"graphql\" or \"query\"")
            }
            MalformedRequest::InvalidMultipart { detail } => {
                write!(f, "multipart body could not be decoded: {}", detail)
            }
        }
    }
}

impl std::error::Error for MalformedRequest {}

/// A failure thrown by the execution engine itself, as opposed to field
/// errors the engine reports inside an otherwise usable result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    pub message: String,
}

impl EngineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "execution engine failure: {}", self.message)
    }
}

impl std::error::Error for EngineFailure {}

/// An uncaught failure inside request handling. Answered with HTTP 500 and
/// an empty body: transport-level failures never produce a GraphQL envelope.
#[derive(Debug, Clone)]
pub enum TransportFailure {
    /// The engine invocation itself failed.
    Engine(EngineFailure),
    /// The result envelope could not be serialized.
    Serialization { detail: String },
    /// Handler code panicked; payload text recovered where possible.
    Panic { detail: String },
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Engine(failure) => write!(f, "{}", failure),
            TransportFailure::Serialization { detail } => {
                write!(f, "serializing result envelope failed: {}", detail)
            }
            TransportFailure::Panic { detail } => {
                write!(f, "handler panicked: {}", detail)
            }
        }
    }
}

impl std::error::Error for TransportFailure {}

impl From<EngineFailure> for TransportFailure {
    fn from(failure: EngineFailure) -> Self {
        TransportFailure::Engine(failure)
    }
}

/// Best-effort text out of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
