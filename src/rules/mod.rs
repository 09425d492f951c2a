//! Rule registry for quality findings in API descriptions.
//!
//! Every rule is a pure function over a [`Document`] returning finding
//! messages. Rules are grouped by [`Category`]; the registry order is the
//! output order.

mod compliance;
mod design;
mod documentation;
mod engine;
mod governance;
mod monitoring;
mod performance;
mod security;
mod support;
mod testing;
mod types;
mod validation;
pub(crate) mod walk;

pub use engine::{group_by_category, RuleEngine};
pub use types::{Category, Finding};

use crate::config::{Policy, Vocabulary};
use crate::document::Document;
use crate::error::RuleError;

/// Inputs a rule may read besides the document.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub vocabulary: &'a Vocabulary,
    pub policy: &'a Policy,
}

/// Signature every rule implements.
pub type CheckFn = fn(&Document, &RuleContext<'_>) -> Result<Vec<String>, RuleError>;

/// A registered rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub check: CheckFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("category", &self.category)
            .finish()
    }
}

macro_rules! rule {
    ($id:literal, $category:ident, $description:literal, $check:path) => {
        Rule {
            id: $id,
            category: Category::$category,
            description: $description,
            check: $check,
        }
    };
}

/// All rules, grouped by category in declared category order.
pub static RULES: &[Rule] = &[
    // Validation
    rule!("info_metadata", Validation, "API title and version are declared", validation::info_metadata),
    rule!("servers", Validation, "Servers are declared and their variables documented", validation::servers),
    rule!("operation_structure", Validation, "Operations have ids, well-formed parameters, and complete responses", validation::operation_structure),
    rule!("schema_structure", Validation, "Component schemas declare a type or composition", validation::schema_structure),
    // Security
    rule!("global_security", Security, "A document-level security requirement exists", security::global_security),
    rule!("security_schemes", Security, "Security schemes exist and avoid weak mechanisms", security::security_schemes),
    rule!("operation_security", Security, "Every operation is covered by a security requirement", security::operation_security),
    rule!("privileged_operations", Security, "Privileged-looking operations require authorization", security::privileged_operations),
    rule!("object_level_authorization", Security, "Single-resource operations require authorization", security::object_level_authorization),
    rule!("sensitive_data_exposure", Security, "Response schemas do not expose sensitive properties", security::sensitive_data_exposure),
    rule!("mass_assignment", Security, "Request bodies reject unknown properties", security::mass_assignment),
    rule!("transport_security", Security, "Remote servers use TLS", security::transport_security),
    rule!("cors_policy", Security, "Responses do not allow every origin", security::cors_policy),
    // Performance
    rule!("rate_limiting", Performance, "Success responses document rate-limit headers", performance::rate_limiting),
    rule!("caching", Performance, "GET responses document caching headers", performance::caching),
    rule!("pagination", Performance, "Collection endpoints accept paging parameters", performance::pagination),
    // Design/Patterns
    rule!("http_semantics", DesignPatterns, "Request bodies match HTTP method semantics", design::http_semantics),
    rule!("path_naming", DesignPatterns, "Paths use lower-case noun segments", design::path_naming),
    // Governance
    rule!("versioning", Governance, "The API version is visible to clients", governance::versioning),
    rule!("duplicate_operation_ids", Governance, "operationId values are unique", governance::duplicate_operation_ids),
    rule!("deprecation", Governance, "Deprecated operations carry migration notes", governance::deprecation),
    rule!("tagging", Governance, "Operations are tagged with declared tags", governance::tagging),
    rule!("ownership", Governance, "Contact and license are declared", governance::ownership),
    // Compliance
    rule!("personal_data", Compliance, "Personal, health, and payment data is identified", compliance::personal_data),
    // Documentation
    rule!("api_description", Documentation, "The API has a description", documentation::api_description),
    rule!("operation_docs", Documentation, "Operations, parameters, and responses are described", documentation::operation_docs),
    rule!("schema_docs", Documentation, "Component schemas are described", documentation::schema_docs),
    // Monitoring
    rule!("health_check", Monitoring, "A health-check endpoint is documented", monitoring::health_check),
    rule!("request_tracing", Monitoring, "A correlation header is documented", monitoring::request_tracing),
    // Testing
    rule!("response_examples", Testing, "Success responses carry examples", testing::response_examples),
    rule!("request_examples", Testing, "Request bodies carry examples", testing::request_examples),
    rule!("error_schemas", Testing, "Error responses carry schemas", testing::error_schemas),
];

/// Look up a rule by id.
pub fn find_rule(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.id == id)
}

/// Run one check against an inline document with default vocabularies.
#[cfg(test)]
pub(crate) fn run_check(check: CheckFn, value: serde_json::Value) -> Vec<String> {
    run_check_with(check, value, &Policy::default())
}

#[cfg(test)]
pub(crate) fn run_check_with(
    check: CheckFn,
    value: serde_json::Value,
    policy: &Policy,
) -> Vec<String> {
    let doc = Document::from_value(value).unwrap();
    let vocabulary = Vocabulary::default();
    let ctx = RuleContext {
        vocabulary: &vocabulary,
        policy,
    };
    check(&doc, &ctx).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_is_grouped_in_category_order() {
        let categories: Vec<Category> = RULES.iter().map(|r| r.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
    }

    #[test]
    fn test_every_category_has_rules() {
        for category in Category::ALL {
            assert!(
                RULES.iter().any(|r| r.category == category),
                "no rules for {}",
                category
            );
        }
    }

    #[test]
    fn test_rule_ids_unique() {
        let ids: HashSet<&str> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), RULES.len());
        assert!(find_rule("cors_policy").is_some());
        assert!(find_rule("nope").is_none());
    }
}
