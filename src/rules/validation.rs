//! Structural sanity checks beyond what loading already enforces.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use super::support;
use super::RuleContext;
use crate::document::{get_array, get_str, value_kind, Document, Operation};
use crate::error::RuleError;

pub fn info_metadata(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let info = doc.info();
    let mut findings = Vec::new();
    if get_str(info, "title").is_none() {
        findings.push("Spec is missing an API title.".to_string());
    }
    if info.get("version").map_or(true, is_blank) {
        findings.push("Spec should define an API version.".to_string());
    }
    Ok(findings)
}

// Versions are often written unquoted in YAML (`version: 1`).
fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().is_empty(),
        Value::Number(_) => false,
        _ => true,
    }
}

pub fn servers(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let servers = doc.servers()?;
    if servers.is_empty() {
        return Ok(vec![
            "No servers defined. Consider specifying servers for clarity.".to_string(),
        ]);
    }

    let mut findings = Vec::new();
    for server in servers {
        let Some(url) = get_str(server, "url") else { continue };
        if url.contains('{') && !server.contains_key("variables") {
            findings.push(format!(
                "Server URL '{}' uses variables. Document them properly.",
                url
            ));
        }
    }
    Ok(findings)
}

/// Checks each operation on its own; a malformed operation yields one
/// advisory finding and the remaining operations are still checked.
pub fn operation_structure(
    doc: &Document,
    _ctx: &RuleContext<'_>,
) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();
    for op in doc.operations() {
        if let Err(e) = check_operation(doc, &op, &mut findings) {
            debug!(operation = %op.label(), "operation skipped: {}", e);
            findings.push(format!("Could not analyze {}: {}.", e.subject, e.reason));
        }
    }
    Ok(findings)
}

fn check_operation(
    doc: &Document,
    op: &Operation<'_>,
    findings: &mut Vec<String>,
) -> Result<(), RuleError> {
    let label = op.label();

    if op.operation_id().is_none() {
        findings.push(format!("Operation {} missing operationId.", label));
    }

    let mut seen = HashSet::new();
    for param in support::parameters(doc, op.parameters()?, &label)? {
        match (get_str(param, "name"), get_str(param, "in")) {
            (Some(name), Some(location)) => {
                if !seen.insert((name, location)) {
                    findings.push(format!(
                        "Duplicate parameter {} in {} for {}.",
                        name, location, label
                    ));
                }
            }
            _ => findings.push(format!("Parameter in {} missing name or in.", label)),
        }
    }

    if let Some(body) = support::request_body(doc, op)? {
        let has_content = matches!(body.get("content"), Some(Value::Object(c)) if !c.is_empty());
        if !has_content {
            findings.push(format!("{} requestBody has no content defined.", label));
        }
    }

    let responses = support::responses(doc, op)?;
    if responses.is_empty() {
        findings.push(format!("Operation {} has no responses defined.", label));
        return Ok(());
    }
    for (class, kind) in [('2', "2xx success"), ('4', "4xx client error"), ('5', "5xx server error")] {
        if !responses.iter().any(|r| r.is_class(class)) {
            findings.push(format!("Operation {} missing {} response.", label, kind));
        }
    }

    for response in &responses {
        let subject = format!("response {} of {}", response.code, label);
        for (media_type, media) in support::media_types(response.node, &subject)? {
            if !media.contains_key("schema") {
                findings.push(format!(
                    "Response {} of {} with content {} missing schema.",
                    response.code, label, media_type
                ));
            }
        }
    }
    Ok(())
}

pub fn schema_structure(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    const SHAPE_KEYS: &[&str] = &["type", "allOf", "oneOf", "anyOf", "$ref"];

    let mut findings = Vec::new();
    for (name, schema) in doc.component_schemas()? {
        let node = match schema {
            Value::Object(node) => node,
            Value::Bool(_) => continue,
            other => {
                return Err(RuleError::new(
                    format!("schema '{}'", name),
                    format!("expected a mapping, found {}", value_kind(other)),
                ))
            }
        };
        if !SHAPE_KEYS.iter().any(|k| node.contains_key(*k)) {
            findings.push(format!("Schema {} missing type or composition keyword.", name));
        }
        // A malformed composition list is a structural problem of its own.
        for key in ["allOf", "oneOf", "anyOf"] {
            get_array(node, key, &format!("schema '{}'", name))?;
        }
    }
    Ok(findings)
}
