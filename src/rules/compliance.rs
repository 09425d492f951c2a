//! Regulated-data heuristics.

use std::collections::HashSet;

use serde_json::Value;

use super::support;
use super::walk::walk_properties;
use super::RuleContext;
use crate::config::match_words;
use crate::document::Document;
use crate::error::RuleError;

/// Every schema root worth inspecting, labelled for messages.
fn schema_roots<'a>(doc: &'a Document) -> Result<Vec<(String, &'a Value)>, RuleError> {
    let mut roots: Vec<(String, &Value)> = doc
        .component_schemas()?
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();

    for op in doc.operations() {
        let label = op.label();
        if let Some(body) = support::request_body(doc, &op)? {
            let subject = format!("request body of {}", label);
            for (_, media) in support::media_types(body, &subject)? {
                if let Some(schema) = media.get("schema") {
                    roots.push((subject.clone(), schema));
                }
            }
        }
        for response in support::responses(doc, &op)? {
            let subject = format!("response {} of {}", response.code, label);
            for (_, media) in support::media_types(response.node, &subject)? {
                if let Some(schema) = media.get("schema") {
                    roots.push((subject.clone(), schema));
                }
            }
        }
    }
    Ok(roots)
}

pub fn personal_data(doc: &Document, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
    let vocabulary = ctx.vocabulary;
    let regimes = [
        ("GDPR", &vocabulary.gdpr_properties),
        ("HIPAA", &vocabulary.hipaa_properties),
        ("PCI DSS", &vocabulary.pci_properties),
    ];

    let mut seen: HashSet<(String, String, &str)> = HashSet::new();
    let mut findings = Vec::new();

    for (label, schema) in schema_roots(doc)? {
        walk_properties(doc, schema, &label, |owner, property, _| {
            for (regime, terms) in regimes {
                if match_words(terms, property).is_none() {
                    continue;
                }
                if seen.insert((owner.to_string(), property.to_string(), regime)) {
                    findings.push(format!(
                        "Schema '{}' property '{}' looks like personal data ({}).",
                        owner, property, regime
                    ));
                }
            }
        })?;
    }
    Ok(findings)
}
