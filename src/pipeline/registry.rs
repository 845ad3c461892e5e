//! Ordered handler registry.
//!
//! # Responsibilities
//! - Keep handlers in registration order
//! - Index each handler under the stages it declares
//! - Emit a stage: run its listeners one at a time, stop at the first error
//!
//! # Design Decisions
//! - Registration order is execution order within every stage
//! - Listeners are sequential, never concurrent: later handlers read state
//!   written by earlier ones
//! - Frozen once the application is built

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::http::{HttpContext, HttpError};
use crate::observability::metrics;
use crate::pipeline::handler::{invoke, Handler};
use crate::pipeline::Stage;
use crate::resilience::timeouts::with_stage_deadline;

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn Handler>>,
    listeners: HashMap<Stage, Vec<Arc<dyn Handler>>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler and subscribe it to the stages it declares.
    pub fn register(&mut self, handler: Arc<dyn Handler>) {
        for stage in handler.stages() {
            if !stage.is_listenable() {
                tracing::warn!(
                    handler = handler.name(),
                    stage = %stage,
                    "Handlers cannot listen to this stage; ignored"
                );
                continue;
            }
            let listeners = self.listeners.entry(*stage).or_default();
            if !listeners.iter().any(|h| Arc::ptr_eq(h, &handler)) {
                listeners.push(handler.clone());
            }
        }
        tracing::debug!(handler = handler.name(), stages = ?handler.stages(), "Handler registered");
        self.handlers.push(handler);
    }

    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn listeners(&self, stage: Stage) -> &[Arc<dyn Handler>] {
        self.listeners.get(&stage).map(Vec::as_slice).unwrap_or_default()
    }

    /// Run every listener of `stage` in registration order.
    pub async fn emit(
        &self,
        stage: Stage,
        ctx: &mut HttpContext,
        deadline: Option<Duration>,
    ) -> Result<(), HttpError> {
        let listeners = self.listeners(stage);
        if listeners.is_empty() {
            return Ok(());
        }

        with_stage_deadline(stage, deadline, async {
            for handler in listeners {
                tracing::trace!(
                    request_id = %ctx.request_id,
                    stage = %stage,
                    handler = handler.name(),
                    "Invoking handler"
                );
                if let Err(err) = invoke(handler.as_ref(), stage, ctx).await {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        stage = %stage,
                        handler = handler.name(),
                        status = err.status().as_u16(),
                        "Handler failed"
                    );
                    metrics::record_stage_failure(stage.as_str());
                    return Err(err);
                }
            }
            Ok(())
        })
        .await
    }
}
