//! Upgrade of Swagger 2.0 shaped documents into the OpenAPI 3 layout.
//!
//! Every step is idempotent on its own: a step only fires while a legacy key
//! or legacy shape is still present, and removes it when it does.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::Method;

/// Root-level keys that move under `components` (legacy key, v3 section).
const MOVED_SECTIONS: &[(&str, &str)] = &[
    ("definitions", "schemas"),
    ("securityDefinitions", "securitySchemes"),
    ("parameters", "parameters"),
    ("responses", "responses"),
];

/// Header keys that belong under a v3 header `schema`.
const HEADER_SCHEMA_KEYS: &[&str] = &[
    "type", "format", "items", "enum", "default", "minimum", "maximum", "pattern",
];

const DEFAULT_MEDIA_TYPE: &str = "application/json";
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Normalize a document mapping in place. Returns true if anything changed.
pub fn normalize(root: &mut Map<String, Value>) -> bool {
    let mut changed = false;

    for (legacy, section) in MOVED_SECTIONS {
        changed |= move_to_components(root, legacy, section);
    }
    changed |= synthesize_servers(root);

    // Operation shapes are only rewritten for documents declaring themselves
    // Swagger; a v3 document never carries `in: body` parameters legitimately.
    if root.contains_key("swagger") {
        changed |= upgrade_operations(root);
    }

    if changed {
        debug!("normalized legacy document shape");
    }
    changed
}

fn move_to_components(root: &mut Map<String, Value>, legacy: &str, section: &str) -> bool {
    if !root.contains_key(legacy) {
        return false;
    }
    // v3 documents never carry these at the root, except that a malformed
    // v3 document may; only move object-shaped values.
    if (legacy == "parameters" || legacy == "responses")
        && !root.get(legacy).map(Value::is_object).unwrap_or(false)
    {
        return false;
    }

    if !matches!(root.get("components"), None | Some(Value::Object(_))) {
        warn!(key = legacy, "components is not a mapping; leaving legacy section in place");
        return false;
    }

    let Some(moved) = root.remove(legacy) else {
        return false;
    };
    let Some(components) = root
        .entry("components")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
    else {
        return false;
    };

    match components.get_mut(section) {
        None => {
            components.insert(section.to_string(), moved);
        }
        Some(Value::Object(existing)) => {
            if let Value::Object(entries) = moved {
                for (name, value) in entries {
                    existing.entry(name).or_insert(value);
                }
            } else {
                warn!(key = legacy, "legacy section is not a mapping; dropped");
            }
        }
        Some(_) => {
            warn!(section, "components section is not a mapping; legacy section dropped");
        }
    }
    true
}

fn synthesize_servers(root: &mut Map<String, Value>) -> bool {
    let host = root.remove("host");
    let base_path = root.remove("basePath");
    let schemes = root.remove("schemes");

    if host.is_none() && base_path.is_none() && schemes.is_none() {
        return false;
    }
    if root.contains_key("servers") {
        return true;
    }

    let scheme = schemes
        .as_ref()
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(Value::as_str)
        .unwrap_or("https");
    let host = host.as_ref().and_then(Value::as_str).unwrap_or("");
    let base_path = match base_path.as_ref().and_then(Value::as_str) {
        Some(p) if !p.is_empty() && !p.starts_with('/') => format!("/{}", p),
        Some(p) => p.to_string(),
        None => String::new(),
    };

    let url = if host.is_empty() {
        if base_path.is_empty() {
            "/".to_string()
        } else {
            base_path
        }
    } else {
        format!("{}://{}{}", scheme, host, base_path)
    };

    let mut server = Map::new();
    server.insert("url".to_string(), Value::String(url));
    root.insert(
        "servers".to_string(),
        Value::Array(vec![Value::Object(server)]),
    );
    true
}

fn first_media_type(node: &Map<String, Value>, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn upgrade_operations(root: &mut Map<String, Value>) -> bool {
    let root_consumes = first_media_type(root, "consumes");
    let root_produces = first_media_type(root, "produces");
    // Shared parameters have already moved under `components`.
    let shared = root
        .get("components")
        .and_then(|c| c.get("parameters"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let Some(Value::Object(paths)) = root.get_mut("paths") else {
        return false;
    };

    let mut changed = false;
    for item in paths.values_mut() {
        let Value::Object(item) = item else { continue };
        let inherited = take_legacy_parameters(item, &shared);
        changed |= !inherited.is_empty();

        for (key, op) in item.iter_mut() {
            if Method::parse(key).is_none() {
                continue;
            }
            let Value::Object(op) = op else { continue };

            let consumes = first_media_type(op, "consumes").or_else(|| root_consumes.clone());
            let produces = first_media_type(op, "produces").or_else(|| root_produces.clone());

            changed |= upgrade_body_parameters(op, consumes.as_deref(), &shared, &inherited);
            changed |= upgrade_responses(op, produces.as_deref());
        }
    }
    changed
}

/// A parameter with a local `#/parameters/` reference followed.
fn resolve_parameter(param: &Value, shared: &Map<String, Value>) -> Value {
    let target = param
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| {
            r.strip_prefix("#/parameters/")
                .or_else(|| r.strip_prefix("#/components/parameters/"))
        })
        .and_then(|name| shared.get(name));
    target.unwrap_or(param).clone()
}

fn location(param: &Value) -> Option<&str> {
    param.get("in").and_then(Value::as_str)
}

fn is_legacy_location(param: &Value) -> bool {
    matches!(location(param), Some("body") | Some("formData"))
}

/// Split `parameters` of a node into kept entries and resolved body/form
/// entries, removing the latter from the node.
fn take_legacy_parameters(node: &mut Map<String, Value>, shared: &Map<String, Value>) -> Vec<Value> {
    let Some(Value::Array(params)) = node.get_mut("parameters") else {
        return Vec::new();
    };
    if !params
        .iter()
        .any(|p| is_legacy_location(&resolve_parameter(p, shared)))
    {
        return Vec::new();
    }

    let mut legacy = Vec::new();
    let mut kept = Vec::new();
    for param in params.drain(..) {
        let resolved = resolve_parameter(&param, shared);
        if is_legacy_location(&resolved) {
            legacy.push(resolved);
        } else {
            kept.push(param);
        }
    }
    *params = kept;
    if params.is_empty() {
        node.remove("parameters");
    }
    legacy
}

fn upgrade_body_parameters(
    op: &mut Map<String, Value>,
    consumes: Option<&str>,
    shared: &Map<String, Value>,
    inherited: &[Value],
) -> bool {
    let mut legacy = take_legacy_parameters(op, shared);
    // Operation-level entries override path-level ones with the same name.
    let overridden = |p: &Value, own: &[Value]| {
        own.iter()
            .any(|o| o.get("name") == p.get("name") && location(o) == location(p))
    };
    let extra: Vec<Value> = inherited
        .iter()
        .filter(|p| !overridden(*p, legacy.as_slice()))
        .cloned()
        .collect();
    legacy.extend(extra);

    if legacy.is_empty() {
        return false;
    }
    let is_body = |p: &Value| location(p) == Some("body");

    if op.contains_key("requestBody") {
        return true;
    }

    let mut request_body = Map::new();
    let mut media = Map::new();

    if let Some(body) = legacy.iter().find(|&p| is_body(p)) {
        if let Some(desc) = body.get("description") {
            request_body.insert("description".to_string(), desc.clone());
        }
        if let Some(required) = body.get("required") {
            request_body.insert("required".to_string(), required.clone());
        }
        let schema = body
            .get("schema")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        media.insert("schema".to_string(), schema);
        let media_type = consumes.unwrap_or(DEFAULT_MEDIA_TYPE).to_string();
        request_body.insert("content".to_string(), single_entry(media_type, media));
    } else {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &legacy {
            let Some(name) = field.get("name").and_then(Value::as_str) else {
                continue;
            };
            let mut prop = Map::new();
            for key in HEADER_SCHEMA_KEYS.iter().chain(["description"].iter()) {
                if let Some(v) = field.get(*key) {
                    prop.insert(key.to_string(), v.clone());
                }
            }
            if field.get("required").and_then(Value::as_bool) == Some(true) {
                required.push(Value::String(name.to_string()));
            }
            properties.insert(name.to_string(), Value::Object(prop));
        }
        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        media.insert("schema".to_string(), Value::Object(schema));
        let media_type = consumes.unwrap_or(FORM_MEDIA_TYPE).to_string();
        request_body.insert("content".to_string(), single_entry(media_type, media));
    }

    op.insert("requestBody".to_string(), Value::Object(request_body));
    true
}

fn upgrade_responses(op: &mut Map<String, Value>, produces: Option<&str>) -> bool {
    let Some(Value::Object(responses)) = op.get_mut("responses") else {
        return false;
    };

    let mut changed = false;
    for response in responses.values_mut() {
        let Value::Object(response) = response else { continue };

        if response.contains_key("schema") && !response.contains_key("content") {
            let media_type = produces.unwrap_or(DEFAULT_MEDIA_TYPE).to_string();
            let mut media = Map::new();
            if let Some(schema) = response.remove("schema") {
                media.insert("schema".to_string(), schema);
            }
            if let Some(Value::Object(examples)) = response.remove("examples") {
                let example = examples
                    .get(&media_type)
                    .or_else(|| examples.values().next())
                    .cloned();
                if let Some(example) = example {
                    media.insert("example".to_string(), example);
                }
            }
            response.insert("content".to_string(), single_entry(media_type, media));
            changed = true;
        }

        if let Some(Value::Object(headers)) = response.get_mut("headers") {
            for header in headers.values_mut() {
                let Value::Object(header) = header else { continue };
                if header.contains_key("schema") || !header.contains_key("type") {
                    continue;
                }
                let mut schema = Map::new();
                for key in HEADER_SCHEMA_KEYS {
                    if let Some(v) = header.remove(*key) {
                        schema.insert(key.to_string(), v);
                    }
                }
                header.insert("schema".to_string(), Value::Object(schema));
                changed = true;
            }
        }
    }
    changed
}

fn single_entry(key: String, value: Map<String, Value>) -> Value {
    let mut map = Map::new();
    map.insert(key, Value::Object(value));
    Value::Object(map)
}
