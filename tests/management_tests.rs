//! Tests for the management surface exposed to host tooling
//!
//! # Test Coverage
//!
//! - Query and mutation root field listings from the full schema
//! - Synchronous `execute_query`: serialized envelope on success, the
//!   failure's display text when the engine invocation fails
//! - Internal-error filtering applies to management executions too

mod common;
mod tracing_util;

use common::fixture::demo_schema;
use graphql_endpoint::context::{ExecutionContext, Principal};
use graphql_endpoint::engine::{
    EchoEngine, EngineError, ErrorCategory, ExecutionEngine, ExecutionOutcome,
};
use graphql_endpoint::error::EngineFailure;
use graphql_endpoint::invocation::OperationInvocation;
use graphql_endpoint::schema::{GraphQLSchema, StaticSchemaProvider};
use graphql_endpoint::server::GraphQLService;
use serde_json::Value;
use std::sync::Arc;
use tracing_util::init_tracing;

fn echo_service() -> GraphQLService {
    GraphQLService::new(
        Arc::new(StaticSchemaProvider::new(demo_schema())),
        Arc::new(EchoEngine),
    )
}

#[test]
fn field_listings_come_from_the_full_schema() {
    init_tracing();
    let service = echo_service();
    assert_eq!(
        service.query_field_names(),
        vec!["hero".to_string(), "droid".to_string()]
    );
    assert_eq!(
        service.mutation_field_names(),
        vec!["createReview".to_string()]
    );
}

#[test]
fn execute_query_serializes_the_envelope() {
    init_tracing();
    let body = echo_service().execute_query("{ hero }");
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["data"]["echo"]["query"], "{ hero }");
    assert!(parsed.get("errors").is_none());
}

struct FailingEngine;

impl ExecutionEngine for FailingEngine {
    fn execute(
        &self,
        _schema: &Arc<dyn GraphQLSchema>,
        _invocation: &OperationInvocation,
        _ctx: &ExecutionContext,
        _principal: Option<&Principal>,
    ) -> Result<ExecutionOutcome, EngineFailure> {
        Err(EngineFailure::new("backend unreachable"))
    }
}

#[test]
fn execute_query_returns_failure_text_when_the_engine_throws() {
    init_tracing();
    let service = GraphQLService::new(
        Arc::new(StaticSchemaProvider::new(demo_schema())),
        Arc::new(FailingEngine),
    );
    let out = service.execute_query("{ hero }");
    assert!(out.contains("execution engine failure"));
    assert!(out.contains("backend unreachable"));
}

struct InternalErrorEngine;

impl ExecutionEngine for InternalErrorEngine {
    fn execute(
        &self,
        _schema: &Arc<dyn GraphQLSchema>,
        _invocation: &OperationInvocation,
        _ctx: &ExecutionContext,
        _principal: Option<&Principal>,
    ) -> Result<ExecutionOutcome, EngineFailure> {
        Ok(ExecutionOutcome::with_errors(
            Value::Null,
            vec![EngineError::new(ErrorCategory::Internal, "resolver NPE")],
        ))
    }
}

#[test]
fn execute_query_filters_internal_errors_too() {
    init_tracing();
    let service = GraphQLService::new(
        Arc::new(StaticSchemaProvider::new(demo_schema())),
        Arc::new(InternalErrorEngine),
    );
    let body = service.execute_query("{ hero }");
    assert!(!body.contains("resolver NPE"));
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        parsed["errors"][0]["message"],
        "Internal Server Error(s) while executing query"
    );
}
