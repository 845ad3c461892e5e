//! Form field names with bracket notation.
//!
//! `user[name]=a` nests into objects, `tags[]=x` appends to an array and
//! `items[0][id]=1` addresses an array slot. Plain names are assigned as-is,
//! a later value replacing an earlier one.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::http::HttpError;

/// Highest array index accepted in a field name.
pub const MAX_INDEX: usize = 1024;

static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w-]*)((?:\[[^\[\]]*\])*)$").expect("static field name regex"));

static BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("static bracket regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Push,
}

fn segments(field: &str) -> Result<(String, Vec<Segment>), HttpError> {
    let invalid = || HttpError::BadRequest(format!("Invalid form field name {}", field));
    let caps = FIELD_NAME.captures(field).ok_or_else(invalid)?;
    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    if name.is_empty() {
        return Err(invalid());
    }
    let brackets = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    let mut path = Vec::new();
    for inner in BRACKET.captures_iter(brackets) {
        let key = inner.get(1).map(|m| m.as_str()).unwrap_or_default();
        let segment = if key.is_empty() {
            Segment::Push
        } else if key.bytes().all(|b| b.is_ascii_digit()) {
            let index: usize = key.parse().map_err(|_| invalid())?;
            if index > MAX_INDEX {
                return Err(invalid());
            }
            Segment::Index(index)
        } else {
            Segment::Key(key.to_string())
        };
        path.push(segment);
    }
    Ok((name.to_string(), path))
}

fn assign(slot: &mut Value, path: &[Segment], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *slot = value;
        return;
    };
    match head {
        Segment::Key(key) => {
            let mut map = match std::mem::take(slot) {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            assign(map.entry(key.clone()).or_insert(Value::Null), rest, value);
            *slot = Value::Object(map);
        }
        Segment::Index(index) => {
            let mut items = match std::mem::take(slot) {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            assign(&mut items[*index], rest, value);
            *slot = Value::Array(items);
        }
        Segment::Push => {
            let mut items = match std::mem::take(slot) {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            let mut item = Value::Null;
            assign(&mut item, rest, value);
            items.push(item);
            *slot = Value::Array(items);
        }
    }
}

/// Fold decoded `(name, value)` pairs into a parameter map.
pub fn parse_form<I>(pairs: I) -> Result<Map<String, Value>, HttpError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut form = Map::new();
    for (field, value) in pairs {
        let (name, path) = segments(&field)?;
        let slot = form.entry(name).or_insert(Value::Null);
        assign(slot, &path, Value::String(value));
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_bracket_notation() {
        let form = parse_form(pairs(&[
            ("user[name]", "ann"),
            ("user[address][city]", "Athens"),
            ("tags[]", "a"),
            ("tags[]", "b"),
            ("items[1][id]", "7"),
            ("plain", "x"),
        ]))
        .unwrap();

        assert_eq!(
            Value::Object(form),
            json!({
                "user": { "name": "ann", "address": { "city": "Athens" } },
                "tags": ["a", "b"],
                "items": [null, { "id": "7" }],
                "plain": "x"
            })
        );
    }

    #[test]
    fn test_last_plain_value_wins() {
        let form = parse_form(pairs(&[("a", "1"), ("a", "2")])).unwrap();
        assert_eq!(form.get("a"), Some(&json!("2")));
    }

    #[test]
    fn test_invalid_names() {
        assert!(parse_form(pairs(&[("a.b", "1")])).is_err());
        assert!(parse_form(pairs(&[("[x]", "1")])).is_err());
        assert!(parse_form(pairs(&[("a[99999]", "1")])).is_err());
    }
}
