//! Versioning, identity, lifecycle, and ownership metadata.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::RuleContext;
use crate::config::match_substring;
use crate::document::{get_array, Document};
use crate::error::RuleError;

lazy_static! {
    static ref VERSION_VALUE: Regex = Regex::new(r"^(?i:v)?\d").unwrap();
    static ref VERSION_SEGMENT: Regex = Regex::new(r"^(?i:v)\d+(\.\d+)*$").unwrap();
}

pub fn versioning(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let in_info = match doc.info().get("version") {
        Some(Value::String(v)) => VERSION_VALUE.is_match(v.trim()),
        Some(Value::Number(_)) => true,
        _ => false,
    };
    if in_info {
        return Ok(Vec::new());
    }

    let in_servers = doc
        .server_urls()?
        .into_iter()
        .any(|url| url_path(url).split('/').any(|s| VERSION_SEGMENT.is_match(s)));
    let in_paths = doc
        .paths()
        .keys()
        .filter_map(|path| path.split('/').find(|s| !s.is_empty()))
        .any(|first| VERSION_SEGMENT.is_match(first));
    if in_servers || in_paths {
        return Ok(Vec::new());
    }

    Ok(vec![
        "API version is not expressed in info.version or a server URL path segment (e.g. /v1)."
            .to_string(),
    ])
}

/// Path component of a server URL; relative URLs are all path.
fn url_path(url: &str) -> &str {
    match url.find("://") {
        Some(i) => {
            let rest = &url[i + 3..];
            rest.find('/').map(|j| &rest[j..]).unwrap_or("")
        }
        None => url,
    }
}

pub fn duplicate_operation_ids(
    doc: &Document,
    _ctx: &RuleContext<'_>,
) -> Result<Vec<String>, RuleError> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut findings = Vec::new();
    for op in doc.operations() {
        let Some(id) = op.operation_id() else { continue };
        let count = seen.entry(id).or_insert(0);
        *count += 1;
        if *count > 1 {
            findings.push(format!("Duplicate operationId '{}' found.", id));
        }
    }
    Ok(findings)
}

pub fn deprecation(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let markers = &ctx.vocabulary.migration_markers;
    Ok(doc
        .operations()
        .into_iter()
        .filter(|op| op.is_deprecated())
        .filter(|op| {
            op.description()
                .and_then(|d| match_substring(markers, d))
                .is_none()
        })
        .map(|op| {
            format!(
                "Deprecated operation {} has no migration note in its description.",
                op.label()
            )
        })
        .collect())
}

pub fn tagging(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let declared: Option<HashSet<&str>> = get_array(doc.root(), "tags", "tags")?.map(|tags| {
        tags.iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str))
            .collect()
    });

    let mut findings = Vec::new();
    let mut reported = HashSet::new();
    let mut any_tagged = false;

    for op in doc.operations() {
        let tags = op.tags()?;
        if tags.is_empty() {
            findings.push(format!("Operation {} has no tags.", op.label()));
            continue;
        }
        any_tagged = true;
        let Some(declared) = &declared else { continue };
        for tag in tags {
            if !declared.contains(tag) && reported.insert(tag) {
                findings.push(format!(
                    "Operation {} uses tag '{}' that is not declared in the top-level tags list.",
                    op.label(),
                    tag
                ));
            }
        }
    }

    if declared.is_none() && any_tagged {
        findings.push(
            "Tags are used by operations but not declared in the top-level tags list.".to_string(),
        );
    }
    Ok(findings)
}

pub fn ownership(doc: &Document, _ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let info = doc.info();
    let present = |key: &str| matches!(info.get(key), Some(v) if !v.is_null());

    let mut findings = Vec::new();
    if !present("contact") {
        findings.push("Spec should declare an API contact (info.contact).".to_string());
    }
    if !present("license") {
        findings.push("Spec should declare a license (info.license).".to_string());
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::run_check;
    use serde_json::json;

    #[test]
    fn test_versioning_sources() {
        let unversioned = json!({"info": {"version": "latest"}, "paths": {"/pets": {}}});
        assert_eq!(run_check(versioning, unversioned).len(), 1);

        for doc in [
            json!({"info": {"version": "1.0.0"}, "paths": {}}),
            json!({"info": {"version": "v2"}, "paths": {}}),
            json!({"info": {}, "paths": {}, "servers": [{"url": "https://api.example.com/v3"}]}),
            json!({"info": {}, "paths": {"/v1/pets": {}}}),
        ] {
            assert!(run_check(versioning, doc).is_empty());
        }
    }

    #[test]
    fn test_duplicate_operation_ids() {
        let findings = run_check(
            duplicate_operation_ids,
            json!({"info": {}, "paths": {
                "/a": {"get": {"operationId": "list"}, "post": {"operationId": "list"}},
                "/b": {"get": {"operationId": "list"}, "put": {"operationId": "other"}}
            }}),
        );
        assert_eq!(
            findings,
            vec!["Duplicate operationId 'list' found.", "Duplicate operationId 'list' found."]
        );
    }

    #[test]
    fn test_deprecation() {
        let findings = run_check(
            deprecation,
            json!({"info": {}, "paths": {"/a": {
                "get": {"deprecated": true, "description": "Use /b instead."},
                "post": {"deprecated": true},
                "put": {"deprecated": false}
            }}}),
        );
        assert_eq!(
            findings,
            vec!["Deprecated operation POST /a has no migration note in its description."]
        );
    }

    #[test]
    fn test_tagging_with_declared_tags() {
        let findings = run_check(
            tagging,
            json!({"info": {}, "tags": [{"name": "pets"}], "paths": {
                "/a": {"get": {"tags": ["pets"]}, "post": {"tags": ["store"]}},
                "/b": {"get": {"tags": ["store"]}, "put": {}}
            }}),
        );
        assert_eq!(
            findings,
            vec![
                "Operation POST /a uses tag 'store' that is not declared in the top-level tags list.",
                "Operation PUT /b has no tags.",
            ]
        );
    }

    #[test]
    fn test_tagging_without_declared_tags() {
        let findings = run_check(
            tagging,
            json!({"info": {}, "paths": {"/a": {"get": {"tags": ["pets"]}}}}),
        );
        assert_eq!(
            findings,
            vec!["Tags are used by operations but not declared in the top-level tags list."]
        );
    }

    #[test]
    fn test_ownership() {
        let findings = run_check(
            ownership,
            json!({"info": {"contact": {"email": "a@example.com"}}, "paths": {}}),
        );
        assert_eq!(findings, vec!["Spec should declare a license (info.license)."]);
    }
}
