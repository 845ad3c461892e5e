//! Query string parameters.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::http::{HttpContext, HttpError};
use crate::pipeline::{Handler, Stage};

/// Merges the query string into `ctx.params` at `beginRequest`.
///
/// A name repeated in the query becomes an array of its values.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryStringHandler;

/// Decode a query string into parameters.
pub fn parse_query(query: &str) -> Map<String, Value> {
    let mut params = Map::new();
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        match params.get_mut(name.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                params.insert(name.into_owned(), value);
            }
        }
    }
    params
}

#[async_trait]
impl Handler for QueryStringHandler {
    fn name(&self) -> &'static str {
        "query"
    }

    fn stages(&self) -> &'static [Stage] {
        &[Stage::BeginRequest]
    }

    async fn begin_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        if let Some(query) = ctx.query().filter(|q| !q.is_empty()) {
            let parsed = parse_query(query);
            ctx.params.extend(parsed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query() {
        let params = parse_query("a=1&b=two%20words&a=3&c=");
        assert_eq!(params.get("a"), Some(&json!(["1", "3"])));
        assert_eq!(params.get("b"), Some(&json!("two words")));
        assert_eq!(params.get("c"), Some(&json!("")));
    }
}
