//! The HTTP face of the endpoint.
//!
//! [`GraphQLService`] aggregates the collaborators (schema provider,
//! execution engine, variables transformer, context factory, listener
//! registry) and implements `may_minihttp::HttpService`: one `call` per
//! inbound request, cloned per connection by the host. It also exposes the
//! management surface host tooling pokes at: root field listings and a
//! synchronous execute-and-serialize operation.

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use http::Method;
use may_minihttp::{HttpService, Request, Response};
use tracing::{error, info_span, warn};

use crate::context::{ContextFactory, DefaultContextFactory, UploadedFile};
use crate::dispatcher::OperationDispatcher;
use crate::engine::{ExecutionEngine, IdentityVariables, VariablesTransformer};
use crate::envelope;
use crate::error::{panic_message, MalformedRequest, TransportFailure};
use crate::introspection::{INTROSPECTION_QUERY, SCHEMA_PATH};
use crate::invocation::{self, OperationInvocation};
use crate::listener::{LifecycleListener, ListenerRegistry};
use crate::schema::SchemaProvider;
use crate::server::multipart::{boundary_from_content_type, parse_parts, Part};
use crate::server::request::{parse_request, IncomingRequest};
use crate::server::response::write_status;

/// What ended a request before a 200 could be written.
enum HandlerError {
    Malformed(MalformedRequest),
    Transport(TransportFailure),
}

impl From<MalformedRequest> for HandlerError {
    fn from(cause: MalformedRequest) -> Self {
        HandlerError::Malformed(cause)
    }
}

impl From<TransportFailure> for HandlerError {
    fn from(failure: TransportFailure) -> Self {
        HandlerError::Transport(failure)
    }
}

/// The GraphQL endpoint as an HTTP service.
pub struct GraphQLService {
    schema_provider: Arc<dyn SchemaProvider>,
    engine: Arc<dyn ExecutionEngine>,
    variables: Arc<dyn VariablesTransformer>,
    context_factory: Arc<dyn ContextFactory>,
    listeners: Arc<ListenerRegistry>,
    dispatcher: OperationDispatcher,
}

impl Clone for GraphQLService {
    fn clone(&self) -> Self {
        Self {
            schema_provider: Arc::clone(&self.schema_provider),
            engine: Arc::clone(&self.engine),
            variables: Arc::clone(&self.variables),
            context_factory: Arc::clone(&self.context_factory),
            listeners: Arc::clone(&self.listeners),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl GraphQLService {
    /// Build a service around a schema provider and an engine, with
    /// pass-through variables and a context factory that carries no
    /// principal. Override either with the `with_` builders.
    pub fn new(schema_provider: Arc<dyn SchemaProvider>, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self::with_collaborators(
            schema_provider,
            engine,
            Arc::new(IdentityVariables),
            Arc::new(DefaultContextFactory),
        )
    }

    pub fn with_collaborators(
        schema_provider: Arc<dyn SchemaProvider>,
        engine: Arc<dyn ExecutionEngine>,
        variables: Arc<dyn VariablesTransformer>,
        context_factory: Arc<dyn ContextFactory>,
    ) -> Self {
        let listeners = Arc::new(ListenerRegistry::new());
        let dispatcher = OperationDispatcher::new(
            Arc::clone(&engine),
            Arc::clone(&variables),
            Arc::clone(&listeners),
        );
        Self {
            schema_provider,
            engine,
            variables,
            context_factory,
            listeners,
            dispatcher,
        }
    }

    pub fn with_variables_transformer(mut self, variables: Arc<dyn VariablesTransformer>) -> Self {
        self.variables = Arc::clone(&variables);
        self.dispatcher = OperationDispatcher::new(
            Arc::clone(&self.engine),
            variables,
            Arc::clone(&self.listeners),
        );
        self
    }

    pub fn with_context_factory(mut self, context_factory: Arc<dyn ContextFactory>) -> Self {
        self.context_factory = context_factory;
        self
    }

    pub fn add_listener(&self, listener: Arc<dyn LifecycleListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn LifecycleListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Field names under the query root of the full schema.
    pub fn query_field_names(&self) -> Vec<String> {
        self.schema_provider.schema(None).query_field_names()
    }

    /// Field names under the mutation root of the full schema.
    pub fn mutation_field_names(&self) -> Vec<String> {
        self.schema_provider.schema(None).mutation_field_names()
    }

    /// Run a query synchronously for management tooling, outside any HTTP
    /// exchange. Returns the serialized envelope, or the failure's display
    /// text when the engine invocation or serialization failed.
    pub fn execute_query(&self, query: &str) -> String {
        let invocation = OperationInvocation::new(query);
        let schema = self.schema_provider.schema(None);
        let ctx = self.context_factory.create(None);
        let variables =
            self.variables
                .transform(&schema, &invocation.query, invocation.variables.clone());
        let effective = OperationInvocation {
            variables,
            ..invocation
        };
        let result = self
            .engine
            .execute(&schema, &effective, &ctx, ctx.principal())
            .map_err(TransportFailure::Engine)
            .and_then(|outcome| {
                serde_json::to_string(&envelope::shape(outcome.data, &outcome.errors)).map_err(
                    |e| TransportFailure::Serialization {
                        detail: e.to_string(),
                    },
                )
            });
        match result {
            Ok(body) => body,
            Err(failure) => failure.to_string(),
        }
    }

    /// Route one parsed request into dispatch. Returns Ok when a response
    /// was written, 405 included; 400 and 500 writes happen in `call`.
    fn handle(&self, incoming: &IncomingRequest, res: &mut Response) -> Result<(), HandlerError> {
        let head = &incoming.head;
        if head.method == Method::GET {
            // The schema path always introspects, whatever the query string
            // says.
            let invocation = if head.path == SCHEMA_PATH {
                OperationInvocation::new(INTROSPECTION_QUERY)
            } else {
                invocation::from_query_params(&head.query_params)?
            };
            let schema = self.schema_provider.read_only_schema(Some(head));
            let ctx = self.context_factory.create(Some(head));
            self.dispatcher
                .dispatch(invocation, &schema, &ctx, None, res)?;
        } else if head.method == Method::POST {
            let (invocation, uploads) = if incoming.is_multipart() {
                normalize_multipart(incoming)?
            } else {
                (invocation::from_json_body(&incoming.body)?, Vec::new())
            };
            let schema = self.schema_provider.schema(Some(head));
            let mut ctx = self.context_factory.create(Some(head));
            ctx.attach_uploads(uploads);
            self.dispatcher
                .dispatch(invocation, &schema, &ctx, None, res)?;
        } else {
            warn!(method = %head.method, "method not allowed");
            write_status(res, 405);
        }
        Ok(())
    }
}

/// Split a multipart body and normalize its operation parts; file-bearing
/// parts come back separately for the execution context.
fn normalize_multipart(
    incoming: &IncomingRequest,
) -> Result<(OperationInvocation, Vec<UploadedFile>), MalformedRequest> {
    let boundary = incoming
        .content_type()
        .and_then(boundary_from_content_type)
        .ok_or_else(|| MalformedRequest::InvalidMultipart {
            detail: "content type without a boundary parameter".to_string(),
        })?;
    let parts = parse_parts(&incoming.body, &boundary)?;

    let (files, values): (Vec<&Part>, Vec<&Part>) = parts.iter().partition(|p| p.is_file());
    let field = |name: &str| values.iter().find(|p| p.name == name);

    let invocation = invocation::from_multipart_fields(
        field("graphql").map(|p| p.data.as_slice()),
        field("query").map(|p| p.text()).as_deref(),
        field("operationName").map(|p| p.text()).as_deref(),
        field("variables").map(|p| p.text()).as_deref(),
    )?;

    let uploads = files
        .into_iter()
        .map(|part| UploadedFile {
            part_name: part.name.clone(),
            file_name: part.file_name.clone().unwrap_or_default(),
            content_type: part.content_type.clone(),
            data: part.data.clone(),
        })
        .collect();

    Ok((invocation, uploads))
}

impl HttpService for GraphQLService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let incoming = parse_request(req);
        let head = incoming.head.clone();
        let span = info_span!(
            "graphql_request",
            request_id = %head.request_id,
            method = %head.method,
            path = %head.path,
        );
        let _guard = span.enter();

        let callbacks = self.listeners.request_started(&head);

        match catch_unwind(AssertUnwindSafe(|| self.handle(&incoming, res))) {
            Ok(Ok(())) => {
                callbacks.request_success(&head);
            }
            Ok(Err(HandlerError::Malformed(cause))) => {
                // Bad input, not a server failure: listeners still see a
                // completed request.
                warn!(error = %cause, "bad request");
                write_status(res, 400);
                callbacks.request_success(&head);
            }
            Ok(Err(HandlerError::Transport(failure))) => {
                error!(error = %failure, "request handling failed");
                write_status(res, 500);
                callbacks.request_error(&head, &failure);
            }
            Err(payload) => {
                let failure = TransportFailure::Panic {
                    detail: panic_message(payload.as_ref()),
                };
                error!(error = %failure, "request handler panicked");
                write_status(res, 500);
                callbacks.request_error(&head, &failure);
            }
        }
        callbacks.request_finally(&head);

        Ok(())
    }
}
