//! JSON value to XML text.
//!
//! Objects become elements named after their keys, array elements become
//! `<Item>` elements, scalars become escaped text. Null members are skipped.

use serde_json::Value;

pub const ITEM_ELEMENT: &str = "Item";

/// Serialize `value` as an XML document body with the given root element.
pub fn to_xml(value: &Value, root: &str) -> String {
    let mut out = String::new();
    write_element(&mut out, root, value);
    out
}

/// Root element name for a value: `Array` for arrays, `Object` otherwise.
pub fn default_root(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "Array",
        _ => "Object",
    }
}

fn write_element(out: &mut String, name: &str, value: &Value) {
    let name = element_name(name);
    match value {
        Value::Null => {
            out.push('<');
            out.push_str(&name);
            out.push_str("/>");
        }
        Value::Object(map) => {
            open(out, &name);
            for (key, member) in map {
                if member.is_null() {
                    continue;
                }
                write_element(out, key, member);
            }
            close(out, &name);
        }
        Value::Array(items) => {
            open(out, &name);
            for item in items {
                write_element(out, ITEM_ELEMENT, item);
            }
            close(out, &name);
        }
        Value::String(s) => {
            open(out, &name);
            out.push_str(&escape(s));
            close(out, &name);
        }
        Value::Bool(_) | Value::Number(_) => {
            open(out, &name);
            out.push_str(&value.to_string());
            close(out, &name);
        }
    }
}

fn open(out: &mut String, name: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
}

fn close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// XML names cannot start with a digit or contain most punctuation.
fn element_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '_' })
        .collect();
    if cleaned.is_empty() || cleaned.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
        cleaned.insert(0, '_');
    }
    cleaned
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
