//! Route pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a path template (`/pages/:name`) into an anchored matcher
//! - Extract named parameters from a concrete path, in declaration order
//! - Rebuild a concrete path from a response template and extracted values
//!
//! # Design Decisions
//! - Named segments are a `:` sigil followed by a word token
//! - Each named segment captures `[\w-]+`; literal text is escaped
//! - Matching ignores the query string
//! - Template formatting is a single pass over placeholders, so a value that
//!   happens to contain another parameter's name is never substituted twice

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Named parameter token: the sigil followed by a word.
static PARAM_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\b(\w+)\b").expect("static parameter regex"));

const SEGMENT_CAPTURE: &str = r"([\w-]+)";

/// Error raised when a pattern cannot be compiled.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("route pattern cannot be empty")]
    Empty,

    #[error("route pattern `{pattern}` has a `:` with no parameter name at byte {offset}")]
    DanglingSigil { pattern: String, offset: usize },

    #[error("route pattern `{pattern}` declares parameter `{name}` more than once")]
    DuplicateParameter { pattern: String, name: String },

    #[error("route pattern `{pattern}` is invalid: {reason}")]
    Invalid { pattern: String, reason: String },
}

/// Error raised when `parse` is called with a path the pattern does not match.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("path `{path}` does not match route pattern `{pattern}`")]
pub struct RouteMismatchError {
    pub pattern: String,
    pub path: String,
}

/// A single extracted `{name, value}` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParam {
    pub name: String,
    pub value: String,
}

impl RouteParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A compiled route pattern. Immutable: a different pattern is a different
/// `RoutePattern`.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    matcher: Regex,
    names: Vec<String>,
}

impl RoutePattern {
    /// Compile a pattern into an anchored matcher.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        let mut expr = String::with_capacity(pattern.len() * 2);
        let mut names: Vec<String> = Vec::new();
        expr.push('^');

        let mut last = 0;
        for caps in PARAM_TOKEN.captures_iter(pattern) {
            let Some(token) = caps.get(0) else {
                continue;
            };
            let name = &caps[1];
            expr.push_str(&escape_literal(pattern, &pattern[last..token.start()], last)?);
            if names.iter().any(|n| n == name) {
                return Err(PatternError::DuplicateParameter {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            names.push(name.to_string());
            expr.push_str(SEGMENT_CAPTURE);
            last = token.end();
        }
        expr.push_str(&escape_literal(pattern, &pattern[last..], last)?);
        expr.push('$');

        let matcher = Regex::new(&expr).map_err(|e| PatternError::Invalid {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            matcher,
            names,
        })
    }

    /// The pattern text this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Declared parameter names, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True iff the whole path (query string excluded) matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(strip_query(path))
    }

    /// Zip declared parameter names with the captured values.
    pub fn parse(&self, path: &str) -> Result<Vec<RouteParam>, RouteMismatchError> {
        let mismatch = || RouteMismatchError {
            pattern: self.source.clone(),
            path: path.to_string(),
        };
        let caps = self.matcher.captures(strip_query(path)).ok_or_else(mismatch)?;

        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                caps.get(i + 1)
                    .map(|m| RouteParam::new(name.clone(), m.as_str()))
                    .ok_or_else(mismatch)
            })
            .collect()
    }
}

/// Substitute extracted values into a response template.
///
/// Placeholders with no matching parameter are left as written.
pub fn format_template(template: &str, params: &[RouteParam]) -> String {
    PARAM_TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            params
                .iter()
                .find(|p| p.name == caps[1])
                .map(|p| p.value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn strip_query(path: &str) -> &str {
    match path.find('?') {
        Some(k) => &path[..k],
        None => path,
    }
}

fn escape_literal(pattern: &str, literal: &str, offset: usize) -> Result<String, PatternError> {
    if let Some(pos) = literal.find(':') {
        return Err(PatternError::DanglingSigil {
            pattern: pattern.to_string(),
            offset: offset + pos,
        });
    }
    Ok(regex::escape(literal))
}
