//! # graphql-endpoint
//!
//! A coroutine-powered GraphQL HTTP endpoint: request normalization,
//! lifecycle listeners, and error shaping around a pluggable execution
//! engine.
//!
//! ## Overview
//!
//! This crate is the glue between HTTP and a GraphQL engine. It accepts
//! requests as GET query strings, POST JSON bodies, or multipart forms,
//! normalizes each into one [`invocation::OperationInvocation`], dispatches
//! it to an [`engine::ExecutionEngine`] you supply, and writes the result
//! back as a JSON envelope with internal errors filtered out. Parsing,
//! validating, and executing GraphQL documents is the engine's business; the
//! lifecycle around one invocation is this crate's.
//!
//! ## Architecture
//!
//! The library is organized into focused modules:
//!
//! - **[`invocation`]** - The canonical operation record and the
//!   normalization rules for every accepted transport shape
//! - **[`dispatcher`]** - Operation dispatch: listeners, the variables
//!   transform hook, the engine invocation, response writing
//! - **[`envelope`]** - Result shaping and the client/internal error filter
//! - **[`listener`]** - Lifecycle observers at request and operation
//!   granularity, isolated from the main path
//! - **[`context`]** - Per-request execution context, delegated principals,
//!   uploaded files
//! - **[`engine`]** - The execution engine seam and its error taxonomy
//! - **[`schema`]** - The schema provider seam (full and read-only views)
//! - **[`server`]** - HTTP host glue built on `may_minihttp`
//! - **[`error`]** - Malformed-request and transport failure types
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Service as GraphQLService<br/>(may_minihttp)
//!     participant Listeners as ListenerRegistry
//!     participant Normalizer as invocation
//!     participant Dispatcher as OperationDispatcher
//!     participant Engine as ExecutionEngine
//!     participant Shaper as envelope::shape
//!
//!     Client->>Service: GET / POST /graphql
//!     Service->>Listeners: on_request_start
//!     Service->>Normalizer: extract query / operationName / variables
//!
//!     alt Malformed input
//!         Service-->>Client: 400, empty body
//!     end
//!
//!     Service->>Dispatcher: dispatch(invocation, schema, ctx)
//!     Dispatcher->>Listeners: on_operation_start
//!     Dispatcher->>Engine: execute(query, operationName, variables)
//!
//!     alt Engine invocation fails
//!         Dispatcher-->>Service: TransportFailure
//!         Service-->>Client: 500, empty body
//!     end
//!
//!     Engine-->>Dispatcher: data + errors
//!     Dispatcher->>Shaper: filter internal errors
//!     Dispatcher-->>Client: 200 application/json envelope
//!     Dispatcher->>Listeners: on_operation_success/error, finally
//!     Service->>Listeners: on_request_success/error, finally
//! ```
//!
//! GraphQL-level errors never change the HTTP status: a syntactically
//! deliverable result is HTTP 200 even when `errors` is populated. Only
//! malformed input (400) and uncaught failures (500) answer without an
//! envelope.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use graphql_endpoint::engine::EchoEngine;
//! use graphql_endpoint::schema::{FieldListSchema, StaticSchemaProvider};
//! use graphql_endpoint::server::{GraphQLService, HttpServer};
//!
//! let schema = FieldListSchema::new(vec!["hero".to_string()], Vec::new());
//! let service = GraphQLService::new(
//!     Arc::new(StaticSchemaProvider::new(schema)),
//!     Arc::new(EchoEngine),
//! );
//! let handle = HttpServer(service).start("0.0.0.0:8080").expect("bind failed");
//! handle.join().expect("server failed");
//! ```
//!
//! ## Runtime Considerations
//!
//! The endpoint rides the `may` coroutine runtime, not tokio. Each
//! connection is served by a coroutine running blocking-style code; the
//! engine invocation is a blocking call from the dispatcher's perspective.
//! Coroutine stack size is configurable via the
//! `GRAPHQL_ENDPOINT_STACK_SIZE` environment variable (see
//! [`runtime_config`]).

pub mod cli;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod introspection;
pub mod invocation;
pub mod listener;
pub mod runtime_config;
pub mod schema;
pub mod server;

pub use context::{ContextFactory, ExecutionContext, Principal, UploadedFile};
pub use dispatcher::OperationDispatcher;
pub use engine::{
    EngineError, ErrorCategory, ExecutionEngine, ExecutionOutcome, VariablesTransformer,
};
pub use envelope::{shape, ClientError, ResultEnvelope};
pub use error::{EngineFailure, MalformedRequest, TransportFailure};
pub use invocation::OperationInvocation;
pub use listener::{LifecycleListener, ListenerRegistry};
pub use schema::{GraphQLSchema, SchemaProvider};
pub use server::GraphQLService;
