//! Per-action consumers.
//!
//! A consumer is middleware attached to a single action method. The chain
//! runs sequentially before the action body; the first failure aborts the
//! action and surfaces through the pipeline error path.

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{HttpContext, HttpError};

#[async_trait]
pub trait Consumer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn consume(&self, ctx: &mut HttpContext) -> Result<(), HttpError>;
}

/// Run `consumers` in order, stopping at the first error.
pub async fn run_chain(consumers: &[Arc<dyn Consumer>], ctx: &mut HttpContext) -> Result<(), HttpError> {
    for consumer in consumers {
        if let Err(err) = consumer.consume(ctx).await {
            tracing::debug!(
                request_id = %ctx.request_id,
                consumer = consumer.name(),
                status = err.status().as_u16(),
                "Consumer rejected action"
            );
            return Err(err);
        }
    }
    Ok(())
}

/// Rejects anonymous requests with 401.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequireAuthenticated;

#[async_trait]
impl Consumer for RequireAuthenticated {
    fn name(&self) -> &'static str {
        "require-authenticated"
    }

    async fn consume(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        match &ctx.user {
            Some(user) if !user.is_anonymous() => Ok(()),
            _ => Err(HttpError::unauthorized()),
        }
    }
}

/// Rejects requests missing any of the named parameters with 400.
#[derive(Debug, Clone)]
pub struct RequireParams {
    names: Vec<String>,
}

impl RequireParams {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Consumer for RequireParams {
    fn name(&self) -> &'static str {
        "require-params"
    }

    async fn consume(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        for name in &self.names {
            let present = ctx
                .params
                .get_ignore_case(name)
                .is_some_and(|v| !v.is_null());
            if !present {
                return Err(HttpError::BadRequest(format!("Missing parameter {}", name)));
            }
        }
        Ok(())
    }
}
