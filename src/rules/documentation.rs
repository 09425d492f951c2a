//! Human-facing descriptions.

use serde_json::Value;

use super::support;
use super::RuleContext;
use crate::document::{get_str, ref_of, value_kind, Document};
use crate::error::RuleError;

pub fn api_description(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    if get_str(doc.info(), "description").is_some() {
        return Ok(Vec::new());
    }
    Ok(vec!["Spec should include a description.".to_string()])
}

pub fn operation_docs(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();

    for op in doc.operations() {
        let label = op.label();
        if op.summary().is_none() {
            findings.push(format!("Operation {} missing summary.", label));
        }
        if op.description().is_none() {
            findings.push(format!("Operation {} missing description.", label));
        }

        for param in support::parameters(doc, op.all_parameters()?, &label)? {
            if get_str(param, "description").is_some() {
                continue;
            }
            findings.push(format!(
                "Parameter {} in {} of {} missing description.",
                get_str(param, "name").unwrap_or("?"),
                get_str(param, "in").unwrap_or("?"),
                label
            ));
        }

        for response in support::responses(doc, &op)? {
            if get_str(response.node, "description").is_none() {
                findings.push(format!(
                    "Response {} of {} missing description.",
                    response.code, label
                ));
            }
        }
    }
    Ok(findings)
}

pub fn schema_docs(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();
    for (name, schema) in doc.component_schemas()? {
        if ref_of(schema).is_some() {
            continue;
        }
        match schema {
            Value::Object(node) => {
                if get_str(node, "description").is_none() {
                    findings.push(format!("Schema {} missing description.", name));
                }
            }
            Value::Bool(_) => {}
            other => {
                return Err(RuleError::new(
                    format!("schema '{}'", name),
                    format!("expected a mapping, found {}", value_kind(other)),
                ))
            }
        }
    }
    Ok(findings)
}
