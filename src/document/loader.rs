//! Parsing raw bytes into a generic document tree.
//!
//! JSON is tried first; YAML, being a superset, is the fallback. Both land in
//! an order-preserving `serde_json::Value` so traversal follows document order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AnalysisError;

/// Textual format of a specification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Determine the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Determine the format from an HTTP `Content-Type` value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("json") {
            Some(Format::Json)
        } else if ct.contains("yaml") || ct.contains("yml") {
            Some(Format::Yaml)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Yaml => write!(f, "yaml"),
        }
    }
}

/// Parse raw bytes as JSON, falling back to YAML.
///
/// The hint is informational only: JSON is always attempted first.
pub fn parse(bytes: &[u8], hint: Option<Format>) -> Result<Value, AnalysisError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}').trim();

    match serde_json::from_str::<Value>(text) {
        Ok(value) => {
            debug!(hint = ?hint, "parsed document as json");
            Ok(value)
        }
        Err(json_err) => match serde_yaml::from_str::<serde_yaml::Value>(text) {
            Ok(value) => {
                debug!(hint = ?hint, json_error = %json_err, "parsed document as yaml");
                Ok(yaml_to_json(value))
            }
            Err(yaml_err) => Err(AnalysisError::Parse(yaml_err.to_string())),
        },
    }
}

/// Parse and require a top-level mapping.
pub fn parse_mapping(
    bytes: &[u8],
    hint: Option<Format>,
) -> Result<Map<String, Value>, AnalysisError> {
    match parse(bytes, hint)? {
        Value::Object(map) => Ok(map),
        _ => Err(AnalysisError::Structural(
            "OpenAPI content is not a valid JSON/YAML object.".to_string(),
        )),
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(mapping) => {
            let mut out = Map::new();
            for (key, value) in mapping {
                out.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Mapping keys become strings; unquoted `200:` response codes are common.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let value = parse(br#"{"openapi": "3.0.0", "paths": {}}"#, None).unwrap();
        assert_eq!(value["openapi"], "3.0.0");
    }

    #[test]
    fn test_parse_yaml_fallback() {
        let yaml = b"openapi: 3.0.1\ninfo:\n  title: T\npaths: {}\n";
        let value = parse(yaml, Some(Format::Yaml)).unwrap();
        assert_eq!(value["info"]["title"], "T");
    }

    #[test]
    fn test_yaml_integer_keys_become_strings() {
        let yaml = b"responses:\n  200:\n    description: ok\n  404:\n    description: missing\n";
        let value = parse(yaml, None).unwrap();
        let keys: Vec<&String> = value["responses"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["200", "404"]);
    }

    #[test]
    fn test_yaml_preserves_key_order() {
        let yaml = b"paths:\n  /zeta: {}\n  /alpha: {}\n  /mid: {}\n";
        let value = parse(yaml, None).unwrap();
        let keys: Vec<&String> = value["paths"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["/zeta", "/alpha", "/mid"]);
    }

    #[test]
    fn test_parse_error() {
        let err = parse(b"not json or yaml: [", None).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_scalar_is_structural_error() {
        let err = parse_mapping(b"just a string", None).unwrap_err();
        assert!(matches!(err, AnalysisError::Structural(_)));
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(br#"{"a": 1}"#);
        let value = parse(&bytes, Some(Format::Json)).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_extension("YML"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("json"), Some(Format::Json));
        assert_eq!(Format::from_extension("txt"), None);
        assert_eq!(
            Format::from_content_type("application/vnd.oai.openapi+json;version=3.0"),
            Some(Format::Json)
        );
        assert_eq!(Format::from_content_type("application/x-yaml"), Some(Format::Yaml));
        assert_eq!(Format::from_content_type("text/html"), None);
    }
}
