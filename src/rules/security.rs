//! Authentication, authorization, and data-exposure checks.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use super::support;
use super::walk::walk_properties;
use super::RuleContext;
use crate::config::{match_substring, match_words};
use crate::document::{as_object, get_str, Document};
use crate::error::RuleError;

lazy_static! {
    static ref IDENTIFIER_SEGMENT: Regex = Regex::new(
        r"(?i)^(\{[^}]+\}|\d+|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$"
    )
    .unwrap();
}

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "[::1]"];

pub fn global_security(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    if doc.has_global_security() {
        return Ok(Vec::new());
    }
    Ok(vec![
        "No global security requirements defined. Consider adding authentication info.".to_string(),
    ])
}

pub fn security_schemes(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let schemes = doc.security_schemes()?;
    if schemes.is_empty() {
        return Ok(vec![
            "No security schemes defined in components.securitySchemes.".to_string(),
        ]);
    }

    let mut findings = Vec::new();
    for (name, scheme) in schemes {
        let scheme = as_object(doc.deref(scheme), &format!("security scheme '{}'", name))?;
        let kind = get_str(scheme, "type").unwrap_or_default();
        let http_scheme = get_str(scheme, "scheme").unwrap_or_default();

        let is_basic = kind.eq_ignore_ascii_case("basic")
            || (kind.eq_ignore_ascii_case("http") && http_scheme.eq_ignore_ascii_case("basic"));
        if is_basic {
            findings.push(format!(
                "Security scheme '{}' uses HTTP Basic authentication; prefer bearer tokens or OAuth2.",
                name
            ));
        }
        if kind.eq_ignore_ascii_case("apiKey") && get_str(scheme, "in") == Some("query") {
            findings.push(format!(
                "Security scheme '{}' passes an API key in the query string, where it can leak into logs.",
                name
            ));
        }
    }
    Ok(findings)
}

pub fn operation_security(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    if doc.has_global_security() {
        return Ok(Vec::new());
    }
    Ok(doc
        .operations()
        .into_iter()
        .filter(|op| !op.declares_security())
        .map(|op| format!("Operation {} missing security definition.", op.label()))
        .collect())
}

pub fn privileged_operations(
    doc: &Document,
    ctx: &RuleContext<'_>,
) -> Result<Vec<String>, RuleError> {
    let tokens = &ctx.vocabulary.privileged_tokens;
    let mut findings = Vec::new();

    for op in doc.operations() {
        if doc.has_effective_security(&op) {
            continue;
        }
        let matched = op
            .path
            .split('/')
            .find_map(|segment| match_substring(tokens, segment))
            .or_else(|| op.operation_id().and_then(|id| match_substring(tokens, id)))
            .or_else(|| op.summary().and_then(|s| match_substring(tokens, s)));
        if let Some(token) = matched {
            findings.push(format!(
                "Operation {} looks privileged ('{}') but lacks explicit authorization.",
                op.label(),
                token
            ));
        }
    }
    Ok(findings)
}

pub fn object_level_authorization(
    doc: &Document,
    _ctx: &RuleContext<'_>,
) -> Result<Vec<String>, RuleError> {
    Ok(doc
        .operations()
        .into_iter()
        .filter(|op| addresses_single_resource(op.path) && !doc.has_effective_security(op))
        .map(|op| {
            format!(
                "Operation {} addresses an individual resource but has no security requirement (object-level authorization).",
                op.label()
            )
        })
        .collect())
}

fn addresses_single_resource(path: &str) -> bool {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|last| IDENTIFIER_SEGMENT.is_match(last))
}

pub fn sensitive_data_exposure(
    doc: &Document,
    ctx: &RuleContext<'_>,
) -> Result<Vec<String>, RuleError> {
    let vocabulary = &ctx.vocabulary.sensitive_properties;
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut findings = Vec::new();

    for op in doc.operations() {
        let label = op.label();
        for response in support::responses(doc, &op)? {
            let subject = format!("response {} of {}", response.code, label);
            for (_, media) in support::media_types(response.node, &subject)? {
                let Some(schema) = media.get("schema") else { continue };
                walk_properties(doc, schema, &subject, |owner, property, _| {
                    if match_words(vocabulary, property).is_none() {
                        return;
                    }
                    if seen.insert((owner.to_string(), property.to_string())) {
                        findings.push(format!(
                            "Response schema '{}' exposes sensitive property '{}' ({} {}).",
                            owner, property, label, response.code
                        ));
                    }
                })?;
            }
        }
    }
    Ok(findings)
}

pub fn mass_assignment(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();

    for op in doc.operations() {
        let label = op.label();
        let Some(body) = support::request_body(doc, &op)? else { continue };
        let subject = format!("request body of {}", label);

        let open = support::media_types(body, &subject)?
            .into_iter()
            .filter_map(|(_, media)| media.get("schema"))
            .filter_map(|schema| doc.deref(schema).as_object())
            .any(|schema| accepts_extra_properties(schema, ctx));
        if open {
            findings.push(format!(
                "Request body of {} accepts additional properties (mass assignment risk).",
                label
            ));
        }
    }
    Ok(findings)
}

fn accepts_extra_properties(schema: &Map<String, Value>, ctx: &RuleContext<'_>) -> bool {
    match schema.get("additionalProperties") {
        Some(Value::Bool(allowed)) => *allowed,
        Some(_) => false,
        None => {
            let is_object = get_str(schema, "type") == Some("object") || schema.contains_key("properties");
            ctx.policy.flag_implicit_additional_properties && is_object
        }
    }
}

pub fn transport_security(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    Ok(doc
        .server_urls()?
        .into_iter()
        .filter(|url| plaintext_remote(url))
        .map(|url| format!("Server URL '{}' uses plaintext HTTP.", url))
        .collect())
}

fn plaintext_remote(url: &str) -> bool {
    let Some(scheme_end) = url.find("://") else {
        return false;
    };
    if !url[..scheme_end].eq_ignore_ascii_case("http") {
        return false;
    }
    let rest = &url[scheme_end + 3..];
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = if host_port.starts_with('[') {
        match host_port.find(']') {
            Some(end) => &host_port[..=end],
            None => host_port,
        }
    } else {
        host_port.split(':').next().unwrap_or_default()
    };
    !LOCAL_HOSTS.iter().any(|local| host.eq_ignore_ascii_case(local))
}

pub fn cors_policy(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let mut findings = Vec::new();

    for op in doc.operations() {
        let label = op.label();
        for response in support::responses(doc, &op)? {
            let subject = format!("response {} of {}", response.code, label);
            let wildcard = support::headers(doc, response.node, &subject)?
                .into_iter()
                .filter(|(name, _)| name.eq_ignore_ascii_case("access-control-allow-origin"))
                .any(|(_, header)| allows_any_origin(doc, header));
            if wildcard {
                findings.push(format!(
                    "Response {} of {} allows any origin (Access-Control-Allow-Origin: *).",
                    response.code, label
                ));
            }
        }
    }
    Ok(findings)
}

fn allows_any_origin(doc: &Document, header: &Value) -> bool {
    let is_star = |v: Option<&Value>| v.and_then(Value::as_str) == Some("*");
    if is_star(header.get("example")) {
        return true;
    }
    let Some(schema) = header.get("schema").map(|s| doc.deref(s)) else {
        return false;
    };
    is_star(schema.get("default"))
        || is_star(schema.get("example"))
        || schema
            .get("enum")
            .and_then(Value::as_array)
            .is_some_and(|values| values.iter().any(|v| v.as_str() == Some("*")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Policy;
    use crate::rules::{run_check, run_check_with};
    use serde_json::json;

    #[test]
    fn test_global_security() {
        let findings = run_check(global_security, json!({"info": {}, "paths": {}}));
        assert_eq!(findings.len(), 1);
        let findings = run_check(
            global_security,
            json!({"info": {}, "paths": {}, "security": [{"key": []}]}),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_security_schemes() {
        let findings = run_check(security_schemes, json!({"info": {}, "paths": {}}));
        assert_eq!(findings, vec!["No security schemes defined in components.securitySchemes."]);

        let findings = run_check(
            security_schemes,
            json!({"info": {}, "paths": {}, "components": {"securitySchemes": {
                "basic": {"type": "http", "scheme": "Basic"},
                "legacy": {"type": "basic"},
                "key": {"type": "apiKey", "in": "query", "name": "api_key"},
                "header_key": {"type": "apiKey", "in": "header", "name": "X-Key"},
                "bearer": {"type": "http", "scheme": "bearer"}
            }}}),
        );
        assert_eq!(findings.len(), 3);
        assert!(findings[0].contains("'basic'"));
        assert!(findings[1].contains("'legacy'"));
        assert!(findings[2].contains("'key' passes an API key"));
    }

    #[test]
    fn test_operation_security() {
        let findings = run_check(
            operation_security,
            json!({"info": {}, "paths": {"/x": {
                "get": {},
                "post": {"security": [{"key": []}]}
            }}}),
        );
        assert_eq!(findings, vec!["Operation GET /x missing security definition."]);

        let findings = run_check(
            operation_security,
            json!({"info": {}, "security": [{"key": []}], "paths": {"/x": {"get": {}}}}),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_privileged_operations() {
        let findings = run_check(
            privileged_operations,
            json!({
                "info": {},
                "security": [{"key": []}],
                "paths": {
                    "/admin/users": {"get": {"security": []}},
                    "/pets": {
                        "post": {"operationId": "createPet", "security": []},
                        "get": {"summary": "List pets", "security": []}
                    },
                    "/config": {"get": {}}
                }
            }),
        );
        assert_eq!(
            findings,
            vec![
                "Operation GET /admin/users looks privileged ('admin') but lacks explicit authorization.",
                "Operation POST /pets looks privileged ('create') but lacks explicit authorization.",
            ]
        );
    }

    #[test]
    fn test_object_level_authorization() {
        let findings = run_check(
            object_level_authorization,
            json!({"info": {}, "paths": {
                "/pets/{petId}": {"get": {}},
                "/orders/42/": {"get": {}},
                "/items/3fa85f64-5717-4562-b3fc-2c963f66afa6": {"delete": {}},
                "/pets": {"get": {}},
                "/users/{id}": {"get": {"security": [{"key": []}]}}
            }}),
        );
        assert_eq!(findings.len(), 3);
        assert!(findings[0].starts_with("Operation GET /pets/{petId} addresses"));
        assert!(findings[1].starts_with("Operation GET /orders/42/ addresses"));
        assert!(findings[2].starts_with("Operation DELETE /items/"));
    }

    #[test]
    fn test_sensitive_data_exposure_once_per_schema_property() {
        let findings = run_check(
            sensitive_data_exposure,
            json!({
                "info": {},
                "paths": {
                    "/users": {"get": {"responses": {"200": {"content": {"application/json": {
                        "schema": {"type": "array", "items": {"$ref": "#/components/schemas/User"}}
                    }}}}}},
                    "/users/{id}": {"get": {"responses": {"200": {"content": {"application/json": {
                        "schema": {"$ref": "#/components/schemas/User"}
                    }}}}}}
                },
                "components": {"schemas": {"User": {
                    "type": "object",
                    "properties": {"name": {"type": "string"}, "password": {"type": "string"}}
                }}}
            }),
        );
        assert_eq!(
            findings,
            vec!["Response schema 'User' exposes sensitive property 'password' (GET /users 200)."]
        );
    }

    #[test]
    fn test_sensitive_data_exposure_cycle() {
        let findings = run_check(
            sensitive_data_exposure,
            json!({
                "info": {},
                "paths": {"/nodes": {"get": {"responses": {"200": {"content": {"application/json": {
                    "schema": {"$ref": "#/components/schemas/Node"}
                }}}}}}},
                "components": {"schemas": {"Node": {
                    "type": "object",
                    "properties": {
                        "apiToken": {"type": "string"},
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                    }
                }}}
            }),
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("'Node' exposes sensitive property 'apiToken'"));
    }

    #[test]
    fn test_mass_assignment() {
        let doc = json!({"info": {}, "paths": {
            "/open": {"post": {"requestBody": {"content": {"application/json": {
                "schema": {"type": "object", "additionalProperties": true}
            }}}}},
            "/implicit": {"post": {"requestBody": {"content": {"application/json": {
                "schema": {"type": "object", "properties": {"a": {}}}
            }}}}},
            "/closed": {"post": {"requestBody": {"content": {"application/json": {
                "schema": {"type": "object", "additionalProperties": false}
            }}}}}
        }});
        let findings = run_check(mass_assignment, doc.clone());
        assert_eq!(
            findings,
            vec!["Request body of POST /open accepts additional properties (mass assignment risk)."]
        );

        let strict = Policy {
            flag_implicit_additional_properties: true,
        };
        let findings = run_check_with(mass_assignment, doc, &strict);
        assert_eq!(findings.len(), 2);
        assert!(findings[1].contains("POST /implicit"));
    }

    #[test]
    fn test_transport_security() {
        let findings = run_check(
            transport_security,
            json!({"info": {}, "paths": {}, "servers": [
                {"url": "http://api.example.com/v1"},
                {"url": "https://api.example.com"},
                {"url": "http://localhost:8080"},
                {"url": "http://[::1]:3000/api"},
                {"url": "HTTP://user@internal.example.com"}
            ]}),
        );
        assert_eq!(
            findings,
            vec![
                "Server URL 'http://api.example.com/v1' uses plaintext HTTP.",
                "Server URL 'HTTP://user@internal.example.com' uses plaintext HTTP.",
            ]
        );
    }

    #[test]
    fn test_cors_policy() {
        let findings = run_check(
            cors_policy,
            json!({"info": {}, "paths": {"/x": {"get": {"responses": {
                "200": {"headers": {"Access-Control-Allow-Origin": {"schema": {"type": "string", "enum": ["*"]}}}},
                "201": {"headers": {"access-control-allow-origin": {"example": "*"}}},
                "202": {"headers": {"Access-Control-Allow-Origin": {"schema": {"default": "https://a.example"}}}}
            }}}}}),
        );
        assert_eq!(
            findings,
            vec![
                "Response 200 of GET /x allows any origin (Access-Control-Allow-Origin: *).",
                "Response 201 of GET /x allows any origin (Access-Control-Allow-Origin: *).",
            ]
        );
    }
}
