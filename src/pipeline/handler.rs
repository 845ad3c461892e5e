//! Handler and processor contracts.

use async_trait::async_trait;

use crate::http::{HttpContext, HttpError};
use crate::pipeline::Stage;

/// A pluggable contributor to one or more lifecycle stages.
///
/// Handlers are registered once at startup and shared by every request, so
/// they must not keep per-request state; that belongs on the context.
/// Only the stages returned by [`Handler::stages`] are ever invoked.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Stages this handler listens to.
    fn stages(&self) -> &'static [Stage];

    async fn begin_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }

    async fn validate_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }

    async fn authenticate_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }

    async fn authorize_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }

    async fn map_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }

    async fn post_map_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }

    async fn end_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }

    async fn pre_execute_result(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }

    /// Runs after a result has written the response; may rewrite the body.
    async fn post_execute_result(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        Ok(())
    }
}

/// The handler that claimed a request during mapping.
///
/// Exactly one processor runs per request, and it runs once: it is moved
/// out of the context before `process_request` is called.
#[async_trait]
pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process_request(self: Box<Self>, ctx: &mut HttpContext) -> Result<(), HttpError>;
}

/// Route one stage to the matching handler method.
pub(crate) async fn invoke(
    handler: &dyn Handler,
    stage: Stage,
    ctx: &mut HttpContext,
) -> Result<(), HttpError> {
    match stage {
        Stage::BeginRequest => handler.begin_request(ctx).await,
        Stage::ValidateRequest => handler.validate_request(ctx).await,
        Stage::AuthenticateRequest => handler.authenticate_request(ctx).await,
        Stage::AuthorizeRequest => handler.authorize_request(ctx).await,
        Stage::MapRequest => handler.map_request(ctx).await,
        Stage::PostMapRequest => handler.post_map_request(ctx).await,
        Stage::EndRequest => handler.end_request(ctx).await,
        Stage::PreExecuteResult => handler.pre_execute_result(ctx).await,
        Stage::PostExecuteResult => handler.post_execute_result(ctx).await,
        Stage::ProcessRequest => Ok(()),
    }
}
