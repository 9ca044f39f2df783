//! Execution engine seam.
//!
//! Parsing, validation, and execution of GraphQL documents belong to an
//! external engine behind [`ExecutionEngine`]. The engine reports two kinds
//! of trouble: errors inside an otherwise usable result
//! ([`ExecutionOutcome::errors`]) and outright invocation failures (the
//! `Err` side of [`ExecutionEngine::execute`]), which surface as HTTP 500.
//! Execution strategies and instrumentation are the host's business when it
//! constructs its engine; the endpoint only threads per-operation inputs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::context::{ExecutionContext, Principal};
use crate::error::EngineFailure;
use crate::invocation::{JsonObject, OperationInvocation};
use crate::schema::GraphQLSchema;

/// Where an engine-reported error points into the query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// Engine-side classification of a reported error. The shaper shows
/// `Syntax` and `Validation` entries to clients verbatim; everything else
/// stays server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Validation,
    /// A resolver failed while the rest of the result was produced.
    Execution,
    Internal,
}

impl ErrorCategory {
    pub fn client_visible(self) -> bool {
        matches!(self, ErrorCategory::Syntax | ErrorCategory::Validation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Syntax => "syntax",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Execution => "execution",
            ErrorCategory::Internal => "internal",
        }
    }
}

/// One error the engine reported inside a result.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineError {
    pub category: ErrorCategory,
    pub message: String,
    pub locations: Vec<SourceLocation>,
}

impl EngineError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.locations.push(SourceLocation { line, column });
        self
    }
}

/// What one engine invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub data: Value,
    pub errors: Vec<EngineError>,
}

impl ExecutionOutcome {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(data: Value, errors: Vec<EngineError>) -> Self {
        Self { data, errors }
    }
}

/// The external execution engine.
///
/// `execute` is a blocking call from the dispatcher's point of view.
/// `principal` is the identity acting on this invocation after principal
/// propagation has run; implementations that enforce per-field access read
/// it from here rather than from ambient state.
pub trait ExecutionEngine: Send + Sync {
    fn execute(
        &self,
        schema: &Arc<dyn GraphQLSchema>,
        invocation: &OperationInvocation,
        ctx: &ExecutionContext,
        principal: Option<&Principal>,
    ) -> Result<ExecutionOutcome, EngineFailure>;
}

/// Rewrites variables before execution, given the schema and query text.
/// Hook point for coercion or validation layers living outside the endpoint.
pub trait VariablesTransformer: Send + Sync {
    fn transform(
        &self,
        schema: &Arc<dyn GraphQLSchema>,
        query: &str,
        variables: JsonObject,
    ) -> JsonObject;
}

/// Variables pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityVariables;

impl VariablesTransformer for IdentityVariables {
    fn transform(
        &self,
        _schema: &Arc<dyn GraphQLSchema>,
        _query: &str,
        variables: JsonObject,
    ) -> JsonObject {
        variables
    }
}

/// Demo engine: reflects the invocation back as the data payload. Backs the
/// `serve` command and the integration tests; no GraphQL is interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEngine;

impl ExecutionEngine for EchoEngine {
    fn execute(
        &self,
        _schema: &Arc<dyn GraphQLSchema>,
        invocation: &OperationInvocation,
        _ctx: &ExecutionContext,
        principal: Option<&Principal>,
    ) -> Result<ExecutionOutcome, EngineFailure> {
        let mut echo = json!({
            "query": invocation.query,
            "variables": invocation.variables,
        });
        if let Some(name) = &invocation.operation_name {
            echo["operationName"] = json!(name);
        }
        if let Some(principal) = principal {
            echo["principal"] = json!(principal.name);
        }
        Ok(ExecutionOutcome::new(json!({ "echo": echo })))
    }
}
