//! Contract-testing readiness: examples and error schemas.

use super::support;
use super::RuleContext;
use crate::document::Document;
use crate::error::RuleError;

pub fn response_examples(
    doc: &Document,
    _ctx: &RuleContext<'_>,
) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();

    for op in doc.operations() {
        let label = op.label();
        let mut has_content = false;
        let mut has_example = false;
        for response in support::responses(doc, &op)?.into_iter().filter(|r| r.is_class('2')) {
            let subject = format!("response {} of {}", response.code, label);
            for (_, media) in support::media_types(response.node, &subject)? {
                has_content = true;
                has_example |= support::has_example(doc, media);
            }
        }
        // Bodiless success responses (204) have nothing to exemplify.
        if has_content && !has_example {
            findings.push(format!(
                "Operation {} has no success response examples to drive contract tests.",
                label
            ));
        }
    }
    Ok(findings)
}

pub fn request_examples(
    doc: &Document,
    _ctx: &RuleContext<'_>,
) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();
    for op in doc.operations() {
        let label = op.label();
        let Some(body) = support::request_body(doc, &op)? else { continue };
        let subject = format!("request body of {}", label);
        for (media_type, media) in support::media_types(body, &subject)? {
            if !support::has_example(doc, media) {
                findings.push(format!(
                    "Request body of {} ({}) has no example.",
                    label, media_type
                ));
            }
        }
    }
    Ok(findings)
}

pub fn error_schemas(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();
    for op in doc.operations() {
        let label = op.label();
        for response in support::responses(doc, &op)?
            .into_iter()
            .filter(|r| r.is_class('4') || r.is_class('5'))
        {
            let subject = format!("response {} of {}", response.code, label);
            let has_schema = support::media_types(response.node, &subject)?
                .into_iter()
                .any(|(_, media)| media.contains_key("schema"));
            if !has_schema {
                findings.push(format!(
                    "Error response {} of {} has no schema to assert against.",
                    response.code, label
                ));
            }
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::run_check;
    use serde_json::json;

    #[test]
    fn test_response_examples() {
        let findings = run_check(
            response_examples,
            json!({"info": {}, "paths": {
                "/a": {"get": {"responses": {"200": {"content": {"application/json": {"schema": {}}}}}}},
                "/b": {"get": {"responses": {"200": {"content": {"application/json": {"example": {"id": 1}}}}}}},
                "/c": {"delete": {"responses": {"204": {"description": "gone"}}}},
                "/d": {"get": {"responses": {"200": {"content": {"application/json": {
                    "schema": {"$ref": "#/components/schemas/Pet"}
                }}}}}}
            }, "components": {"schemas": {"Pet": {"type": "object", "example": {"id": 1}}}}}),
        );
        assert_eq!(
            findings,
            vec!["Operation GET /a has no success response examples to drive contract tests."]
        );
    }

    #[test]
    fn test_request_examples() {
        let findings = run_check(
            request_examples,
            json!({"info": {}, "paths": {"/a": {"post": {"requestBody": {"content": {
                "application/json": {"examples": {"one": {"value": {}}}},
                "application/xml": {"schema": {"type": "object"}}
            }}}}}}),
        );
        assert_eq!(findings, vec!["Request body of POST /a (application/xml) has no example."]);
    }

    #[test]
    fn test_error_schemas() {
        let findings = run_check(
            error_schemas,
            json!({"info": {}, "paths": {"/a": {"get": {"responses": {
                "200": {"description": "ok"},
                "400": {"content": {"application/json": {"schema": {"type": "object"}}}},
                "404": {"description": "missing"},
                "5XX": {"content": {"text/plain": {}}}
            }}}}}),
        );
        assert_eq!(
            findings,
            vec![
                "Error response 404 of GET /a has no schema to assert against.",
                "Error response 5XX of GET /a has no schema to assert against.",
            ]
        );
    }
}
