//! JSON path helpers
//!
//! Dot paths (`$.data.items`, `items[0]`, `items[-1]`) are walked directly;
//! wildcard paths go through jsonpath-rust.

use crate::error::{Error, Result};
use serde_json::Value;

/// Extract a value using a dot path
pub fn extract_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        let Some(bracket) = part.find('[') else {
            current = current.get(part)?;
            continue;
        };

        let name = &part[..bracket];
        if !name.is_empty() {
            current = current.get(name)?;
        }

        let index = part[bracket + 1..].strip_suffix(']')?;
        if index == "*" {
            return Some(current.clone());
        }

        let index: i64 = index.parse().ok()?;
        let Value::Array(items) = current else {
            return None;
        };
        let resolved = if index < 0 {
            items.len().checked_sub(index.unsigned_abs() as usize)?
        } else {
            usize::try_from(index).ok()?
        };
        current = items.get(resolved)?;
    }

    Some(current.clone())
}

/// Extract a scalar as a string
///
/// Strings are returned as-is, numbers and booleans are formatted; anything
/// else (including `null`) is treated as missing.
pub fn extract_string(value: &Value, path: &str) -> Option<String> {
    match extract_path(value, path)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extract the records of a response body
pub fn extract_records(body: &Value, path: Option<&str>) -> Result<Vec<Value>> {
    let found = match path {
        Some(path) if path.contains('*') && !path.contains("[-") => {
            return extract_with_jsonpath(body, path);
        }
        Some(path) => extract_path(body, path),
        None => Some(body.clone()),
    };

    Ok(match found {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    })
}

fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    Ok(match jp.find(value) {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

/// Parse a `Link` header and return the URL for `target_rel`
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut url = None;
        let mut matches_rel = false;

        for segment in link.split(';').map(str::trim) {
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(rel) = segment.strip_prefix("rel=") {
                let rel = rel.trim_matches(|c| c == '"' || c == '\'');
                matches_rel = rel.split_whitespace().any(|r| r == target_rel);
            }
        }

        url.filter(|_| matches_rel).map(str::to_string)
    })
}
