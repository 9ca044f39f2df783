//! Per-request state: the request snapshot, the execution context handed to
//! the engine, and the factory seam hosts use to populate it.

use std::collections::HashMap;

use http::Method;
use smallvec::SmallVec;

use crate::ids::RequestId;
use crate::invocation::JsonObject;

/// Headers as parsed off the wire; stack-allocated for typical requests.
pub type HeaderVec = SmallVec<[(String, String); 16]>;

/// Owned snapshot of the inbound request head. This is what listeners and
/// the execution context see; the body stays with the transport layer.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub headers: HeaderVec,
}

impl RequestHead {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An identity the host environment has already authenticated. The endpoint
/// never validates credentials; it only threads this value through dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub name: String,
    pub claims: JsonObject,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            claims: JsonObject::new(),
        }
    }

    pub fn with_claim(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.claims.insert(key.into(), value);
        self
    }
}

/// One file-bearing multipart part, kept for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub part_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Context for one engine invocation. Owned by the request being served and
/// dropped with it; never shared across requests.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    request: Option<RequestHead>,
    principal: Option<Principal>,
    uploads: Vec<UploadedFile>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) -> Option<&RequestHead> {
        self.request.as_ref()
    }

    pub fn set_request(&mut self, head: RequestHead) {
        self.request = Some(head);
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub fn uploads(&self) -> &[UploadedFile] {
        &self.uploads
    }

    pub fn attach_uploads(&mut self, uploads: Vec<UploadedFile>) {
        self.uploads.extend(uploads);
    }
}

/// Builds the context for each request. Hosts override this to delegate an
/// authenticated principal or attach request-derived state.
pub trait ContextFactory: Send + Sync {
    fn create(&self, request: Option<&RequestHead>) -> ExecutionContext;
}

/// Context carrying the request snapshot and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContextFactory;

impl ContextFactory for DefaultContextFactory {
    fn create(&self, request: Option<&RequestHead>) -> ExecutionContext {
        ExecutionContext {
            request: request.cloned(),
            principal: None,
            uploads: Vec::new(),
        }
    }
}
