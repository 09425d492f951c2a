//! Rate limiting, caching, and pagination hints.

use super::support::{self, Response};
use super::RuleContext;
use crate::config::match_words;
use crate::document::{get_str, Document, Method, Operation};
use crate::error::RuleError;

/// Header names declared across an operation's 2xx responses.
fn success_header_names<'a>(
    doc: &'a Document,
    op: &Operation<'a>,
) -> Result<Vec<&'a str>, RuleError> {
    let mut names = Vec::new();
    for response in support::responses(doc, op)?
        .into_iter()
        .filter(|r| r.is_class('2'))
    {
        let subject = format!("response {} of {}", response.code, op.label());
        names.extend(
            support::headers(doc, response.node, &subject)?
                .into_iter()
                .map(|(name, _)| name),
        );
    }
    Ok(names)
}

pub fn rate_limiting(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let vocabulary = &ctx.vocabulary.rate_limit_headers;
    let mut findings = Vec::new();
    for op in doc.operations() {
        let names = success_header_names(doc, &op)?;
        if !names.iter().any(|n| match_words(vocabulary, n).is_some()) {
            findings.push(format!(
                "Operation {} documents no rate-limit headers in its success responses.",
                op.label()
            ));
        }
    }
    Ok(findings)
}

pub fn caching(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let vocabulary = &ctx.vocabulary.cache_headers;
    let mut findings = Vec::new();
    for op in doc.operations().into_iter().filter(|op| op.method == Method::Get) {
        let names = success_header_names(doc, &op)?;
        if !names.iter().any(|n| match_words(vocabulary, n).is_some()) {
            findings.push(format!(
                "Operation {} documents no caching headers (Cache-Control, ETag) in its success responses.",
                op.label()
            ));
        }
    }
    Ok(findings)
}

pub fn pagination(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let vocabulary = &ctx.vocabulary.pagination_parameters;
    let mut findings = Vec::new();

    for op in doc.operations().into_iter().filter(|op| op.method == Method::Get) {
        let label = op.label();
        let responses = support::responses(doc, &op)?;
        if !returns_collection(doc, &label, &responses)? {
            continue;
        }
        let pages = support::parameters(doc, op.all_parameters()?, &label)?
            .into_iter()
            .filter(|p| get_str(p, "in") == Some("query"))
            .filter_map(|p| get_str(p, "name"))
            .any(|name| match_words(vocabulary, name).is_some());
        if !pages {
            findings.push(format!(
                "Operation {} returns a collection without pagination parameters.",
                label
            ));
        }
    }
    Ok(findings)
}

fn returns_collection(
    doc: &Document,
    label: &str,
    responses: &[Response<'_>],
) -> Result<bool, RuleError> {
    for response in responses.iter().filter(|r| r.is_class('2')) {
        let subject = format!("response {} of {}", response.code, label);
        for (_, media) in support::media_types(response.node, &subject)? {
            let is_array = media
                .get("schema")
                .map(|s| doc.deref(s))
                .and_then(|s| s.get("type"))
                .and_then(|t| t.as_str())
                == Some("array");
            if is_array {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
