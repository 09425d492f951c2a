//! Analysis results as serialized at the boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::AnalysisError;
use crate::rules::{Category, Finding};
use crate::score::Scores;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Precomputed document counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub openapi_version: Option<String>,
    pub paths_count: usize,
    pub operations_count: usize,
    pub schemas_count: usize,
}

impl Summary {
    pub fn from_document(doc: &Document) -> Self {
        let counts = doc.counts();
        Self {
            openapi_version: doc.openapi_version().map(str::to_string),
            paths_count: counts.paths,
            operations_count: counts.operations,
            schemas_count: counts.schemas,
        }
    }
}

/// Result of analyzing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub status: Status,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<Summary>,
    /// Finding messages per category, in declared category order
    pub suggestions: BTreeMap<Category, Vec<String>>,
    pub category_counts: BTreeMap<Category, usize>,
    pub total_findings: usize,
    pub complexity_score: f64,
    pub maintainability_score: f64,
}

impl AnalysisReport {
    /// Assemble a success report. Every category is listed, empty or not.
    pub fn from_findings(summary: Summary, findings: &[Finding], scores: Scores) -> Self {
        let mut suggestions: BTreeMap<Category, Vec<String>> =
            Category::ALL.into_iter().map(|c| (c, Vec::new())).collect();
        for finding in findings {
            suggestions
                .entry(finding.category)
                .or_default()
                .push(finding.message.clone());
        }
        let category_counts = suggestions.iter().map(|(c, m)| (*c, m.len())).collect();

        Self {
            status: Status::Success,
            is_valid: true,
            message: None,
            summary: Some(summary),
            suggestions,
            category_counts,
            total_findings: findings.len(),
            complexity_score: scores.complexity,
            maintainability_score: scores.maintainability,
        }
    }

    /// A terminal error report.
    pub fn error(err: &AnalysisError) -> Self {
        Self {
            status: Status::Error,
            is_valid: false,
            message: Some(err.to_string()),
            summary: None,
            suggestions: BTreeMap::new(),
            category_counts: BTreeMap::new(),
            total_findings: 0,
            complexity_score: 0.0,
            maintainability_score: 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Messages of one category; empty when the category has none.
    pub fn messages(&self, category: Category) -> &[String] {
        self.suggestions
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Repository metadata for a multi-file analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub url: String,
    pub size: u64,
}

/// One analyzed file: its metadata followed by the report fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file_info: FileInfo,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryReport {
    pub repository: RepositoryInfo,
    pub openapi_files: Vec<FileReport>,
}

impl RepositoryReport {
    /// Whether every file analyzed successfully.
    pub fn all_succeeded(&self) -> bool {
        self.openapi_files.iter().all(|f| f.report.is_success())
    }

    pub fn total_findings(&self) -> usize {
        self.openapi_files.iter().map(|f| f.report.total_findings).sum()
    }

    /// Lowest maintainability among successful files.
    pub fn min_maintainability(&self) -> Option<f64> {
        self.openapi_files
            .iter()
            .filter(|f| f.report.is_success())
            .map(|f| f.report.maintainability_score)
            .reduce(f64::min)
    }
}
