//! oascheck - quality gate for API description documents.
//!
//! oascheck loads OpenAPI 3.x and Swagger 2.0 documents into one canonical
//! model, evaluates a registry of independent rules against it, and derives
//! a complexity and a maintainability score from the document and the
//! findings.
//!
//! # Architecture
//!
//! - `document`: loading, v2 to v3 normalization, and `$ref` resolution
//! - `rules`: the rule registry, the rules per category, and the engine
//! - `score`: complexity and maintainability scoring
//! - `result`: the serialized result types
//! - `analyzer`: the bytes to report pipeline
//! - `config`: YAML configuration (vocabularies, weights, policy)
//! - `fetch` / `discover`: URL and local directory sources
//! - `report`: output formatting (pretty, JSON, markdown, key=value)
//!
//! # Adding a Rule
//!
//! Write a check function in the module for its category under
//! `src/rules/` and register it in `RULES` in `rules/mod.rs`.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod discover;
pub mod document;
pub mod error;
pub mod fetch;
pub mod report;
pub mod result;
pub mod rules;
pub mod score;

pub use analyzer::Analyzer;
pub use config::Config;
pub use document::{Document, Format};
pub use error::{AnalysisError, RuleError};
pub use result::{AnalysisReport, RepositoryReport};
pub use rules::{Category, Finding, RuleEngine};
pub use score::Scores;
