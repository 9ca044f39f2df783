//! Lifecycle observation.
//!
//! Observers see two granularities: the whole HTTP exchange
//! (`on_request_*`) and one engine invocation (`on_operation_*`). Every
//! observer call is isolated: a panicking observer is logged and, when the
//! panic happened in a start event, dropped from that request's remaining
//! notifications. No observer failure ever aborts the request or changes
//! what the client receives.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::error;

use crate::context::{ExecutionContext, RequestHead};
use crate::engine::EngineError;
use crate::error::{panic_message, TransportFailure};
use crate::invocation::OperationInvocation;

/// Observer of the request/operation lifecycle. All methods default to
/// no-ops; implement the events you care about.
pub trait LifecycleListener: Send + Sync {
    fn on_request_start(&self, _request: &RequestHead) {}
    fn on_request_success(&self, _request: &RequestHead) {}
    fn on_request_error(&self, _request: &RequestHead, _failure: &TransportFailure) {}
    fn on_request_finally(&self, _request: &RequestHead) {}

    fn on_operation_start(&self, _ctx: &ExecutionContext, _invocation: &OperationInvocation) {}
    fn on_operation_success(
        &self,
        _ctx: &ExecutionContext,
        _invocation: &OperationInvocation,
        _data: &Value,
    ) {
    }
    fn on_operation_error(
        &self,
        _ctx: &ExecutionContext,
        _invocation: &OperationInvocation,
        _data: &Value,
        _errors: &[EngineError],
    ) {
    }
    fn on_operation_finally(
        &self,
        _ctx: &ExecutionContext,
        _invocation: &OperationInvocation,
        _data: &Value,
    ) {
    }
}

/// Registered listeners, shared across requests. Add and remove are the
/// only mutations; notifications run against a snapshot, so mid-flight
/// requests keep the listener set they started with.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn LifecycleListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn LifecycleListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Remove by identity. Returns whether anything was removed.
    pub fn remove(&self, listener: &Arc<dyn LifecycleListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|existing| !Arc::ptr_eq(existing, listener));
        listeners.len() < before
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<dyn LifecycleListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notify request start. Listeners that panic are excluded from the
    /// returned set and therefore from this request's remaining events.
    pub(crate) fn request_started(&self, request: &RequestHead) -> NotificationSet {
        let mut active = Vec::new();
        for listener in self.snapshot() {
            if run_listener("on_request_start", || listener.on_request_start(request)) {
                active.push(listener);
            }
        }
        NotificationSet { active }
    }

    /// Notify operation start, same exclusion rule as [`request_started`].
    ///
    /// [`request_started`]: ListenerRegistry::request_started
    pub(crate) fn operation_started(
        &self,
        ctx: &ExecutionContext,
        invocation: &OperationInvocation,
    ) -> NotificationSet {
        let mut active = Vec::new();
        for listener in self.snapshot() {
            if run_listener("on_operation_start", || {
                listener.on_operation_start(ctx, invocation)
            }) {
                active.push(listener);
            }
        }
        NotificationSet { active }
    }
}

/// The listeners that survived a start event. Subsequent notifications for
/// the same request or operation go only to these; a panic in a
/// success/error callback is logged but does not cancel that listener's
/// finally callback.
pub(crate) struct NotificationSet {
    active: Vec<Arc<dyn LifecycleListener>>,
}

impl NotificationSet {
    pub(crate) fn request_success(&self, request: &RequestHead) {
        for listener in &self.active {
            run_callback("on_request_success", || {
                listener.on_request_success(request)
            });
        }
    }

    pub(crate) fn request_error(&self, request: &RequestHead, failure: &TransportFailure) {
        for listener in &self.active {
            run_callback("on_request_error", || {
                listener.on_request_error(request, failure)
            });
        }
    }

    pub(crate) fn request_finally(&self, request: &RequestHead) {
        for listener in &self.active {
            run_callback("on_request_finally", || {
                listener.on_request_finally(request)
            });
        }
    }

    pub(crate) fn operation_success(
        &self,
        ctx: &ExecutionContext,
        invocation: &OperationInvocation,
        data: &Value,
    ) {
        for listener in &self.active {
            run_callback("on_operation_success", || {
                listener.on_operation_success(ctx, invocation, data)
            });
        }
    }

    pub(crate) fn operation_error(
        &self,
        ctx: &ExecutionContext,
        invocation: &OperationInvocation,
        data: &Value,
        errors: &[EngineError],
    ) {
        for listener in &self.active {
            run_callback("on_operation_error", || {
                listener.on_operation_error(ctx, invocation, data, errors)
            });
        }
    }

    pub(crate) fn operation_finally(
        &self,
        ctx: &ExecutionContext,
        invocation: &OperationInvocation,
        data: &Value,
    ) {
        for listener in &self.active {
            run_callback("on_operation_finally", || {
                listener.on_operation_finally(ctx, invocation, data)
            });
        }
    }
}

fn run_listener(event: &'static str, call: impl FnOnce()) -> bool {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(()) => true,
        Err(payload) => {
            error!(
                event,
                panic = %panic_message(payload.as_ref()),
                "error running listener"
            );
            false
        }
    }
}

fn run_callback(event: &'static str, call: impl FnOnce()) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(call)) {
        error!(
            event,
            panic = %panic_message(payload.as_ref()),
            "error running callback"
        );
    }
}
