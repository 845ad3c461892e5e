//! MVC dispatcher.
//!
//! # Data Flow
//! ```text
//! authorizeRequest: restricted location (decoded path)? → 403
//! mapRequest:       already claimed? → skip
//!                   RouteTable::find(path) → none? → leave unclaimed
//!                   controller name (route / :controller / path segment)
//!                   ControllerRegistry::resolve → Controller
//!                   route values → ctx.params, claim MvcProcessor
//! postMapRequest:   claimed by us? → CORS preflight headers
//! processRequest:   OPTIONS → empty 200
//!                   Controller::resolve(action, verb) → ActionMethod
//!                   consumers → bind args → invoke → ActionResult::execute
//! ```

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use regex::{Regex, RegexBuilder};

use crate::http::cors::apply_preflight_headers;
use crate::http::{HttpContext, HttpError};
use crate::mvc::consumer::run_chain;
use crate::mvc::controller::{Args, Controller};
use crate::pipeline::{Handler, Processor, Stage};
use crate::routing::DEFAULT_ACTION;

pub const MVC_HANDLER: &str = "mvc";

/// The mapping handler that turns routes into controller actions.
#[derive(Debug, Clone)]
pub struct ViewHandler {
    restricted: Vec<Regex>,
}

impl ViewHandler {
    /// Build with the given restricted-location patterns (case-insensitive).
    pub fn new<S: AsRef<str>>(restricted_locations: &[S]) -> Result<Self, regex::Error> {
        let restricted = restricted_locations
            .iter()
            .map(|p| RegexBuilder::new(p.as_ref()).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { restricted })
    }
}

#[async_trait]
impl Handler for ViewHandler {
    fn name(&self) -> &'static str {
        MVC_HANDLER
    }

    fn stages(&self) -> &'static [Stage] {
        &[Stage::AuthorizeRequest, Stage::MapRequest, Stage::PostMapRequest]
    }

    async fn authorize_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        let path = ctx.decoded_path();
        if self.restricted.iter().any(|re| re.is_match(path)) {
            tracing::debug!(request_id = %ctx.request_id, path = %path, "Restricted location");
            return Err(HttpError::forbidden());
        }
        Ok(())
    }

    async fn map_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        if ctx.is_claimed() {
            return Ok(());
        }

        let app = ctx.app().clone();
        let Some(route_match) = app.routes().find(ctx.path()) else {
            return Ok(());
        };

        let controller_name = route_match.controller_name();
        let (resolution, mut controller) = app.controllers().resolve(&controller_name, app.models());
        let name = controller_name.to_lowercase();
        controller.set_name(name.clone());

        let action = route_match.action_name();
        tracing::debug!(
            request_id = %ctx.request_id,
            route = %route_match.route.pattern().as_str(),
            controller = %name,
            action = %action,
            resolution = ?resolution,
            "Route mapped"
        );

        for param in &route_match.params {
            ctx.params.insert(param.name.clone(), param.value.clone());
        }
        ctx.controller = Some(name);
        ctx.action = Some(action);
        ctx.route = Some(route_match);
        ctx.claim(Box::new(MvcProcessor { controller }));
        Ok(())
    }

    async fn post_map_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        if ctx.claimed_by() == Some(MVC_HANDLER) {
            apply_preflight_headers(ctx);
        }
        Ok(())
    }
}

/// Runs one controller action for a claimed request.
#[derive(Debug)]
pub struct MvcProcessor {
    controller: Controller,
}

impl MvcProcessor {
    pub fn new(controller: Controller) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl Processor for MvcProcessor {
    fn name(&self) -> &'static str {
        MVC_HANDLER
    }

    async fn process_request(self: Box<Self>, ctx: &mut HttpContext) -> Result<(), HttpError> {
        if ctx.is(&Method::OPTIONS) {
            ctx.response.write_head(StatusCode::OK, None);
            return Ok(());
        }

        let action = ctx
            .action
            .clone()
            .unwrap_or_else(|| DEFAULT_ACTION.to_string());
        let method = self.controller.resolve(&action, ctx.method())?;

        run_chain(method.consumers(), ctx).await?;

        let args = Args::bind(method.declared_params(), &ctx.params);
        tracing::debug!(
            request_id = %ctx.request_id,
            controller = %self.controller.name(),
            action = %action,
            method = %method.name(),
            "Invoking action"
        );
        let result = method.invoke(ctx, args).await?;
        result.execute(ctx).await
    }
}
