//! Operability: health checks and request correlation.

use super::support;
use super::RuleContext;
use crate::config::match_words;
use crate::document::{get_str, Document};
use crate::error::RuleError;

pub fn health_check(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let vocabulary = &ctx.vocabulary.health_paths;
    let found = doc.paths().keys().any(|path| {
        path.split('/')
            .filter(|s| !s.starts_with('{'))
            .any(|segment| match_words(vocabulary, segment).is_some())
    });
    if found {
        return Ok(Vec::new());
    }
    Ok(vec!["No health-check endpoint (e.g. /health) is documented.".to_string()])
}

pub fn request_tracing(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let vocabulary = &ctx.vocabulary.correlation_headers;
    let operations = doc.operations();
    if operations.is_empty() {
        return Ok(Vec::new());
    }

    for op in &operations {
        let label = op.label();
        let in_params = support::parameters(doc, op.all_parameters()?, &label)?
            .into_iter()
            .filter_map(|p| get_str(p, "name"))
            .any(|name| match_words(vocabulary, name).is_some());
        if in_params {
            return Ok(Vec::new());
        }
        for response in support::responses(doc, op)? {
            let subject = format!("response {} of {}", response.code, label);
            let in_headers = support::headers(doc, response.node, &subject)?
                .into_iter()
                .any(|(name, _)| match_words(vocabulary, name).is_some());
            if in_headers {
                return Ok(Vec::new());
            }
        }
    }

    Ok(vec![
        "No request correlation header (e.g. X-Request-ID) is documented on any operation."
            .to_string(),
    ])
}
