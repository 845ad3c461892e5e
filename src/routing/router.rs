//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Find the first route matching a request path
//! - Bind a match to a fresh per-request parameter list
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in declaration order; order is the only tie-break
//! - A match never mutates the shared `Route`; extracted values live on the
//!   returned `RouteMatch`

use std::sync::Arc;

use crate::config::RouteConfig;
use crate::http::cors::CorsOverrides;
use crate::routing::matcher::{format_template, PatternError, RouteParam, RoutePattern};

/// Controller used when the path has no segment after the leading slash.
pub const ROOT_CONTROLLER: &str = "root";

/// Action used when neither the route nor the path names one.
pub const DEFAULT_ACTION: &str = "index";

/// A configured route: a request pattern plus its dispatch metadata.
#[derive(Debug)]
pub struct Route {
    pattern: RoutePattern,
    template: Option<String>,
    pub controller: Option<String>,
    pub action: Option<String>,
    pub mime: Option<String>,
    /// Views sub-directory used when rendering for this route.
    pub view_path: Option<String>,
    pub cors: CorsOverrides,
}

impl Route {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: RoutePattern::compile(pattern)?,
            template: None,
            controller: None,
            action: None,
            mime: None,
            view_path: None,
            cors: CorsOverrides::default(),
        })
    }

    pub fn from_config(config: &RouteConfig) -> Result<Self, PatternError> {
        let mut route = Self::new(&config.url)?;
        route.template = config.route.clone();
        route.controller = config.controller.clone();
        route.action = config.action.clone();
        route.mime = config.mime.clone();
        route.view_path = config.path.clone();
        route.cors = CorsOverrides {
            allow_origin: config.allow_origin.clone(),
            allow_credentials: config.allow_credentials,
            allow_headers: config.allow_headers.clone(),
            allow_methods: config.allow.clone().or_else(|| config.allow_methods.clone()),
        };
        Ok(route)
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// A route bound to one request path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub path: String,
    pub params: Vec<RouteParam>,
}

impl RouteMatch {
    /// Extracted value for `key` (with or without the leading `:`).
    pub fn data(&self, key: &str) -> Option<&str> {
        let key = key.strip_prefix(':').unwrap_or(key);
        self.params
            .iter()
            .find(|p| p.name == key)
            .map(|p| p.value.as_str())
    }

    /// Concrete output path from the route's response template.
    pub fn format(&self) -> Option<String> {
        self.route
            .template()
            .map(|template| format_template(template, &self.params))
    }

    /// Route-level controller, else `:controller`, else the path convention.
    pub fn controller_name(&self) -> String {
        self.route
            .controller
            .clone()
            .or_else(|| self.data("controller").map(str::to_string))
            .unwrap_or_else(|| controller_from_path(&self.path))
    }

    /// Route-level action, else `:action`, else [`DEFAULT_ACTION`].
    pub fn action_name(&self) -> String {
        self.route
            .action
            .clone()
            .or_else(|| self.data("action").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_ACTION.to_string())
    }
}

/// Derive a controller name from the second `/`-delimited path segment.
pub fn controller_from_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() <= 2 {
        ROOT_CONTROLLER.to_string()
    } else {
        segments[1].to_string()
    }
}

/// Ordered, immutable route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
        }
    }

    /// Compile all configured routes, keeping declaration order.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, PatternError> {
        let routes = configs
            .iter()
            .map(Route::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = routes.len(), "Route table compiled");
        Ok(Self::new(routes))
    }

    /// First route (declaration order) matching `path`.
    pub fn find(&self, path: &str) -> Option<RouteMatch> {
        let path = path.split('?').next().unwrap_or_default();
        let route = self.routes.iter().find(|r| r.is_match(path))?;
        let params = route.pattern().parse(path).ok()?;
        Some(RouteMatch {
            route: route.clone(),
            path: path.to_string(),
            params,
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(patterns: &[&str]) -> RouteTable {
        RouteTable::new(patterns.iter().map(|p| Route::new(p).unwrap()).collect())
    }

    #[test]
    fn test_first_match_wins() {
        let generic_first = table(&["/:controller/:action", "/users/:id"]);
        let m = generic_first.find("/users/42").unwrap();
        assert_eq!(m.route.pattern().as_str(), "/:controller/:action");
        assert_eq!(m.data("action"), Some("42"));

        let specific_first = table(&["/users/:id", "/:controller/:action"]);
        let m = specific_first.find("/users/42").unwrap();
        assert_eq!(m.route.pattern().as_str(), "/users/:id");
        assert_eq!(m.data(":id"), Some("42"));
    }

    #[test]
    fn test_no_match() {
        let table = table(&["/pages/:name"]);
        assert!(table.find("/unknown/path").is_none());
    }

    #[test]
    fn test_query_string_is_ignored() {
        let table = table(&["/pages/:name"]);
        let m = table.find("/pages/about?lang=en").unwrap();
        assert_eq!(m.path, "/pages/about");
        assert_eq!(m.data("name"), Some("about"));
    }

    #[test]
    fn test_controller_name_resolution() {
        let explicit = RouteTable::new(vec![Route::new("/w/:id").unwrap().with_controller("Widgets")]);
        assert_eq!(explicit.find("/w/1").unwrap().controller_name(), "Widgets");

        let captured = table(&["/:controller/:action"]);
        assert_eq!(captured.find("/orders/list").unwrap().controller_name(), "orders");

        let convention = table(&["/widgets/list"]);
        assert_eq!(convention.find("/widgets/list").unwrap().controller_name(), "widgets");

        let root = table(&["/about"]);
        assert_eq!(root.find("/about").unwrap().controller_name(), ROOT_CONTROLLER);
    }

    #[test]
    fn test_action_name_resolution() {
        let explicit = RouteTable::new(vec![Route::new("/a").unwrap().with_action("show")]);
        assert_eq!(explicit.find("/a").unwrap().action_name(), "show");

        let captured = table(&["/:controller/:action"]);
        assert_eq!(captured.find("/a/edit").unwrap().action_name(), "edit");

        let fallback = table(&["/a"]);
        assert_eq!(fallback.find("/a").unwrap().action_name(), DEFAULT_ACTION);
    }

    #[test]
    fn test_format_uses_template() {
        let table = RouteTable::new(vec![Route::new("/pages/:name")
            .unwrap()
            .with_template("/pages/:name.html")]);
        let m = table.find("/pages/about").unwrap();
        assert_eq!(m.format().as_deref(), Some("/pages/about.html"));
    }

    #[test]
    fn test_matches_do_not_share_parameters() {
        let table = table(&["/items/:id"]);
        let first = table.find("/items/1").unwrap();
        let second = table.find("/items/2").unwrap();
        assert_eq!(first.data("id"), Some("1"));
        assert_eq!(second.data("id"), Some("2"));
    }
}
