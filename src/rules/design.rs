//! HTTP method semantics and resource naming.

use super::RuleContext;
use crate::config::match_leading_word;
use crate::document::{Document, Method};
use crate::error::RuleError;

pub fn http_semantics(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();
    for op in doc.operations() {
        let has_body = op.request_body().is_some();
        let message = match (op.method, has_body) {
            (Method::Get, true) => {
                "defines a requestBody; GET requests should not carry a body."
            }
            (Method::Post | Method::Put | Method::Patch, false) => "is missing a requestBody.",
            (Method::Delete, true) => {
                "defines a requestBody; bodies on DELETE are atypical and often ignored by intermediaries."
            }
            _ => continue,
        };
        findings.push(format!("Operation {} {}", op.label(), message));
    }
    Ok(findings)
}

pub fn path_naming(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();

    for path in doc.paths().keys() {
        let literal = strip_templates(path);
        if literal.chars().any(char::is_uppercase) {
            findings.push(format!(
                "Path '{}' contains upper-case letters; prefer lower-case, hyphenated segments.",
                path
            ));
        }
        if literal.contains('_') {
            findings.push(format!("Path '{}' contains underscores; prefer hyphens.", path));
        }
        if path.len() > 1 && path.ends_with('/') {
            findings.push(format!("Path '{}' has a trailing slash.", path));
        }
        for segment in path.split('/').filter(|s| !s.is_empty() && !s.starts_with('{')) {
            if match_leading_word(&ctx.vocabulary.path_verbs, segment).is_some() {
                findings.push(format!(
                    "Path '{}' segment '{}' is verb-like; model resources as nouns and let the HTTP method carry the action.",
                    path, segment
                ));
            }
        }
    }
    Ok(findings)
}

/// Drop `{param}` templates so parameter naming is not judged as path naming.
fn strip_templates(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
