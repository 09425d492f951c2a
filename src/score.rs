//! Scoring and grading for analyzed documents.
//!
//! Complexity is a weighted sum of size and nesting factors and grows with
//! the document. Maintainability (0-100) falls with complexity and with the
//! density of findings per operation.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::rules::walk::schema_depth;
use crate::rules::Finding;

/// Default score weights.
pub mod defaults {
    pub const PATH: f64 = 2.0;
    pub const OPERATION: f64 = 3.0;
    pub const SCHEMA: f64 = 1.5;
    pub const DEPTH: f64 = 5.0; // per level of the deepest schema
    pub const PARAMETER: f64 = 0.5;
    pub const COMPLEXITY_LOG_WEIGHT: f64 = 8.0;
    pub const DENSITY_WEIGHT: f64 = 10.0; // per finding per operation
}

/// Grade thresholds over the maintainability score.
pub mod grades {
    pub const A_MIN: f64 = 80.0;
    pub const B_MIN: f64 = 65.0;
    pub const C_MIN: f64 = 50.0;
    pub const D_MIN: f64 = 35.0;
}

/// Weights used by both scores. All must be non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub path: f64,
    pub operation: f64,
    pub schema: f64,
    pub depth: f64,
    pub parameter: f64,
    pub complexity_log_weight: f64,
    pub density_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            path: defaults::PATH,
            operation: defaults::OPERATION,
            schema: defaults::SCHEMA,
            depth: defaults::DEPTH,
            parameter: defaults::PARAMETER,
            complexity_log_weight: defaults::COMPLEXITY_LOG_WEIGHT,
            density_weight: defaults::DENSITY_WEIGHT,
        }
    }
}

impl ScoreWeights {
    /// Every weight by its configuration name.
    pub fn named(&self) -> [(&'static str, f64); 7] {
        [
            ("path", self.path),
            ("operation", self.operation),
            ("schema", self.schema),
            ("depth", self.depth),
            ("parameter", self.parameter),
            ("complexity_log_weight", self.complexity_log_weight),
            ("density_weight", self.density_weight),
        ]
    }
}

/// Factors the complexity score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreInputs {
    pub paths: usize,
    pub operations: usize,
    pub schemas: usize,
    pub max_schema_depth: usize,
    pub parameters: usize,
}

impl ScoreInputs {
    /// Collect inputs from a document. Counts come from the document's
    /// precomputed values; malformed sub-structures contribute nothing.
    pub fn from_document(doc: &Document) -> Self {
        let counts = doc.counts();
        let operations = doc.operations();

        let parameters = operations
            .iter()
            .map(|op| op.all_parameters().map(|p| p.len()).unwrap_or(0))
            .sum();

        let mut depth = doc
            .schemas()
            .map(|schemas| {
                schemas
                    .values()
                    .map(|s| schema_depth(doc, s))
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        for op in &operations {
            for schema in inline_schemas(doc, op) {
                depth = depth.max(schema_depth(doc, schema));
            }
        }

        Self {
            paths: counts.paths,
            operations: counts.operations,
            schemas: counts.schemas,
            max_schema_depth: depth,
            parameters,
        }
    }
}

/// Request and response body schemas of an operation.
fn inline_schemas<'a>(
    doc: &'a Document,
    op: &crate::document::Operation<'a>,
) -> Vec<&'a serde_json::Value> {
    let bodies = op
        .request_body()
        .into_iter()
        .chain(op.responses().unwrap_or_default().into_iter().map(|(_, r)| r));
    bodies
        .filter_map(|body| doc.deref(body).get("content"))
        .filter_map(|content| content.as_object())
        .flat_map(|content| content.values())
        .filter_map(|media| media.get("schema"))
        .collect()
}

/// The computed scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub complexity: f64,
    /// 0-100, higher is better
    pub maintainability: f64,
}

impl Scores {
    pub fn grade(&self) -> &'static str {
        calculate_grade(self.maintainability)
    }
}

/// Weighted size and nesting. Non-decreasing in every input.
pub fn complexity(inputs: &ScoreInputs, weights: &ScoreWeights) -> f64 {
    weights.path * inputs.paths as f64
        + weights.operation * inputs.operations as f64
        + weights.schema * inputs.schemas as f64
        + weights.depth * inputs.max_schema_depth as f64
        + weights.parameter * inputs.parameters as f64
}

/// `100 - a*ln(1 + complexity) - b*(findings / operations)`, clamped to 0-100.
pub fn maintainability(
    complexity: f64,
    findings: usize,
    operations: usize,
    weights: &ScoreWeights,
) -> f64 {
    let density = if operations == 0 {
        0.0
    } else {
        findings as f64 / operations as f64
    };
    let score = 100.0
        - weights.complexity_log_weight * complexity.max(0.0).ln_1p()
        - weights.density_weight * density;
    score.clamp(0.0, 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Determine the letter grade from a maintainability score.
pub fn calculate_grade(maintainability: f64) -> &'static str {
    match maintainability {
        s if s >= grades::A_MIN => "A",
        s if s >= grades::B_MIN => "B",
        s if s >= grades::C_MIN => "C",
        s if s >= grades::D_MIN => "D",
        _ => "F",
    }
}

/// Score a document given its findings.
pub fn calculate(doc: &Document, findings: &[Finding], weights: &ScoreWeights) -> Scores {
    let inputs = ScoreInputs::from_document(doc);
    calculate_from_inputs(&inputs, findings.len(), weights)
}

pub fn calculate_from_inputs(
    inputs: &ScoreInputs,
    findings: usize,
    weights: &ScoreWeights,
) -> Scores {
    let raw = complexity(inputs, weights);
    Scores {
        complexity: round2(raw),
        maintainability: round2(maintainability(raw, findings, inputs.operations, weights)),
    }
}
