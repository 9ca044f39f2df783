//! Operation dispatch: everything between a normalized invocation and the
//! bytes on the wire.

use std::sync::Arc;

use may_minihttp::Response;
use tracing::debug;

use crate::context::{ExecutionContext, Principal};
use crate::engine::{ExecutionEngine, VariablesTransformer};
use crate::envelope;
use crate::error::TransportFailure;
use crate::invocation::OperationInvocation;
use crate::listener::ListenerRegistry;
use crate::schema::GraphQLSchema;
use crate::server::response::write_envelope;

/// Runs one operation end to end: operation listeners, the variables
/// transform hook, the engine invocation, result shaping, and the 200
/// response write.
#[derive(Clone)]
pub struct OperationDispatcher {
    engine: Arc<dyn ExecutionEngine>,
    variables: Arc<dyn VariablesTransformer>,
    listeners: Arc<ListenerRegistry>,
}

impl OperationDispatcher {
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        variables: Arc<dyn VariablesTransformer>,
        listeners: Arc<ListenerRegistry>,
    ) -> Self {
        Self {
            engine,
            variables,
            listeners,
        }
    }

    /// Dispatch one invocation and write the envelope to `res`.
    ///
    /// `principal` is the identity already acting on this execution. When
    /// none is acting and the context carries one, dispatch re-enters itself
    /// with that principal bound, so downstream logic never special-cases
    /// whether propagation happened. A thrown engine failure or an envelope
    /// serialization failure propagates as a [`TransportFailure`]; the
    /// per-operation callbacks are skipped in that case. GraphQL-level
    /// errors still produce HTTP 200 — they are not HTTP-level failures.
    pub fn dispatch(
        &self,
        mut invocation: OperationInvocation,
        schema: &Arc<dyn GraphQLSchema>,
        ctx: &ExecutionContext,
        principal: Option<&Principal>,
        res: &mut Response,
    ) -> Result<(), TransportFailure> {
        // An empty operationName re-enters as absent, so both spellings
        // share one downstream path.
        if invocation.operation_name.as_deref() == Some("") {
            invocation.operation_name = None;
            return self.dispatch(invocation, schema, ctx, principal, res);
        }

        if principal.is_none() {
            if let Some(delegated) = ctx.principal() {
                debug!(principal = %delegated.name, "re-entering dispatch under context principal");
                return self.dispatch(invocation, schema, ctx, Some(delegated), res);
            }
        }

        debug!(
            operation = invocation.operation_name.as_deref().unwrap_or(""),
            variable_count = invocation.variables.len(),
            "dispatching operation"
        );

        let callbacks = self.listeners.operation_started(ctx, &invocation);

        // The engine sees transformed variables; listeners keep seeing the
        // invocation as the client sent it.
        let effective = OperationInvocation {
            query: invocation.query.clone(),
            operation_name: invocation.operation_name.clone(),
            variables: self
                .variables
                .transform(schema, &invocation.query, invocation.variables.clone()),
        };

        let outcome = self.engine.execute(schema, &effective, ctx, principal)?;
        let had_errors = !outcome.errors.is_empty();

        let shaped = envelope::shape(outcome.data, &outcome.errors);
        let body = serde_json::to_vec(&shaped).map_err(|e| TransportFailure::Serialization {
            detail: e.to_string(),
        })?;
        write_envelope(res, body);

        if had_errors {
            callbacks.operation_error(ctx, &invocation, &shaped.data, &outcome.errors);
        } else {
            callbacks.operation_success(ctx, &invocation, &shaped.data);
        }
        callbacks.operation_finally(ctx, &invocation, &shaped.data);

        Ok(())
    }
}
