//! The analysis pipeline: bytes to document to findings to report.

use tracing::{info, warn};

use crate::config::Config;
use crate::document::{Document, Format};
use crate::error::AnalysisError;
use crate::result::{AnalysisReport, Summary};
use crate::rules::RuleEngine;
use crate::score::{self, ScoreWeights};

/// Runs the full analysis for one document.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    engine: RuleEngine,
    weights: ScoreWeights,
}

impl Analyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            engine: RuleEngine::new(config),
            weights: config.weights.clone(),
        }
    }

    /// Analyze raw bytes. Load failures become an error report.
    pub fn analyze_bytes(&self, bytes: &[u8], hint: Option<Format>) -> AnalysisReport {
        match Document::load(bytes, hint) {
            Ok(doc) => self.analyze_document(&doc),
            Err(e) => {
                warn!(kind = e.kind(), "analysis aborted: {}", e);
                AnalysisReport::error(&e)
            }
        }
    }

    /// Analyze an already parsed value.
    pub fn analyze_value(&self, value: serde_json::Value) -> AnalysisReport {
        match Document::from_value(value) {
            Ok(doc) => self.analyze_document(&doc),
            Err(e) => AnalysisReport::error(&e),
        }
    }

    /// Turn a failure from a collaborator into an error report.
    pub fn report_error(&self, err: &AnalysisError) -> AnalysisReport {
        warn!(kind = err.kind(), "analysis aborted: {}", err);
        AnalysisReport::error(err)
    }

    pub fn analyze_document(&self, doc: &Document) -> AnalysisReport {
        let findings = self.engine.run(doc);
        let scores = score::calculate(doc, &findings, &self.weights);
        info!(
            findings = findings.len(),
            complexity = scores.complexity,
            maintainability = scores.maintainability,
            "analysis complete"
        );
        AnalysisReport::from_findings(Summary::from_document(doc), &findings, scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Category;
    use serde_json::json;

    #[test]
    fn test_minimal_document_end_to_end() {
        let report = Analyzer::default().analyze_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "T", "version": "1"},
            "paths": {"/x": {"get": {"responses": {"200": {"description": "ok"}}}}}
        }));

        assert!(report.is_valid);
        let summary = report.summary.clone().unwrap();
        assert_eq!(summary.paths_count, 1);
        assert_eq!(summary.operations_count, 1);
        assert_eq!(summary.schemas_count, 0);

        let validation = report.messages(Category::Validation);
        assert!(validation.iter().any(|m| m.contains("missing operationId")));
        let security = report.messages(Category::Security);
        assert!(security.iter().any(|m| m.contains("GET /x") && m.contains("security")));
    }

    #[test]
    fn test_unparseable_input_is_error_report() {
        let report = Analyzer::default().analyze_bytes(b"not json or yaml: [", None);
        assert!(!report.is_success());
        assert!(!report.is_valid);
        assert!(!report.message.clone().unwrap_or_default().is_empty());
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_missing_metadata_keeps_document_valid() {
        let report = Analyzer::default().analyze_value(json!({
            "info": {"version": "1"},
            "paths": {}
        }));
        assert!(report.is_valid);
        assert!(!report.messages(Category::Validation).is_empty());
        assert!(!report.messages(Category::Documentation).is_empty());
    }

    #[test]
    fn test_deterministic_output() {
        let doc = json!({
            "swagger": "2.0",
            "info": {"title": "Pets"},
            "host": "api.example.com",
            "paths": {"/pets/{id}": {"get": {"responses": {"200": {"schema": {"$ref": "#/definitions/Pet"}}}}}},
            "definitions": {"Pet": {"properties": {"password": {"type": "string"}}}}
        });
        let analyzer = Analyzer::default();
        let first = serde_json::to_string(&analyzer.analyze_value(doc.clone())).unwrap();
        let second = serde_json::to_string(&analyzer.analyze_value(doc)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_adding_operation_never_lowers_complexity() {
        let analyzer = Analyzer::default();
        let small = analyzer.analyze_value(json!({"info": {}, "paths": {"/a": {"get": {}}}}));
        let large = analyzer.analyze_value(json!({"info": {}, "paths": {"/a": {"get": {}, "post": {}}}}));
        assert!(large.complexity_score >= small.complexity_score);
        assert!(
            large.summary.unwrap().operations_count >= small.summary.unwrap().operations_count
        );
    }

    #[test]
    fn test_adding_schema_never_lowers_complexity() {
        let analyzer = Analyzer::default();
        let dangling = analyzer.analyze_value(json!({
            "info": {},
            "paths": {},
            "components": {"schemas": {"A": {"$ref": "#/components/schemas/B"}}}
        }));
        let closed = analyzer.analyze_value(json!({
            "info": {},
            "paths": {},
            "components": {"schemas": {
                "A": {"$ref": "#/components/schemas/B"},
                "B": {"$ref": "#/components/schemas/A"}
            }}
        }));
        assert!(closed.complexity_score >= dangling.complexity_score);

        let nested = analyzer.analyze_value(json!({
            "info": {},
            "paths": {},
            "components": {"schemas": {
                "A": {"$ref": "#/components/schemas/B"},
                "B": {"$ref": "#/components/schemas/A"},
                "C": {"properties": {"d": {"properties": {"e": {}}}}}
            }}
        }));
        assert!(nested.complexity_score >= closed.complexity_score);
    }

    #[test]
    fn test_adding_parameter_never_lowers_complexity() {
        let analyzer = Analyzer::default();
        let without = analyzer.analyze_value(json!({
            "info": {},
            "paths": {"/a/{id}": {"get": {}}}
        }));
        let with_operation_param = analyzer.analyze_value(json!({
            "info": {},
            "paths": {"/a/{id}": {"get": {"parameters": [{"name": "q", "in": "query"}]}}}
        }));
        let with_path_param = analyzer.analyze_value(json!({
            "info": {},
            "paths": {"/a/{id}": {
                "parameters": [{"name": "id", "in": "path"}],
                "get": {"parameters": [{"name": "q", "in": "query"}]}
            }}
        }));
        assert!(with_operation_param.complexity_score > without.complexity_score);
        assert!(with_path_param.complexity_score > with_operation_param.complexity_score);
    }
}
