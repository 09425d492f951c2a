//! Rule engine that evaluates the registry against a document.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, error, warn};

use super::{Category, Finding, Rule, RuleContext, RULES};
use crate::config::{Config, Policy, Vocabulary};
use crate::document::Document;

/// Evaluates enabled rules and returns their findings in output order.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<&'static Rule>,
    vocabulary: Vocabulary,
    policy: Policy,
    parallel: bool,
}

impl RuleEngine {
    /// Create an engine from configuration, skipping disabled rules.
    pub fn new(config: &Config) -> Self {
        Self {
            rules: RULES
                .iter()
                .filter(|r| config.is_rule_enabled(r.id))
                .collect(),
            vocabulary: config.vocabulary.clone(),
            policy: config.policy.clone(),
            parallel: config.parallel,
        }
    }

    /// Set whether rules run on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Ids of the rules this engine runs, in registry order.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id).collect()
    }

    /// Run every enabled rule.
    ///
    /// Output is grouped by category in declared order; within a category,
    /// rules contribute in registry order. Parallel and sequential runs
    /// produce identical output.
    pub fn run(&self, doc: &Document) -> Vec<Finding> {
        let ctx = RuleContext {
            vocabulary: &self.vocabulary,
            policy: &self.policy,
        };

        let per_rule: Vec<Vec<Finding>> = if self.parallel {
            self.rules.par_iter().map(|rule| run_rule(rule, doc, &ctx)).collect()
        } else {
            self.rules.iter().map(|rule| run_rule(rule, doc, &ctx)).collect()
        };

        let mut findings: Vec<Finding> = per_rule.into_iter().flatten().collect();
        // Stable: keeps registry order inside each category.
        findings.sort_by_key(|f| f.category);
        findings
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Run one rule, downgrading errors and panics to a single finding.
fn run_rule(rule: &Rule, doc: &Document, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let start = Instant::now();
    let result = catch_unwind(AssertUnwindSafe(|| (rule.check)(doc, ctx)));

    match result {
        Ok(Ok(messages)) => {
            debug!(
                rule = rule.id,
                findings = messages.len(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "rule finished"
            );
            messages
                .into_iter()
                .map(|m| Finding::new(rule.category, rule.id, m))
                .collect()
        }
        Ok(Err(e)) => {
            warn!(rule = rule.id, "rule could not complete: {}", e);
            vec![Finding::new(
                rule.category,
                rule.id,
                format!("Could not analyze {}: {}.", e.subject, e.reason),
            )]
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!(rule = rule.id, "rule panicked: {}", panic_msg);
            vec![Finding::new(
                rule.category,
                rule.id,
                format!("Could not analyze {} rule: {}.", rule.id, panic_msg),
            )]
        }
    }
}

/// Group findings by category. Every category is present, in declared order.
pub fn group_by_category(findings: &[Finding]) -> Vec<(Category, Vec<&Finding>)> {
    Category::ALL
        .into_iter()
        .map(|c| (c, findings.iter().filter(|f| f.category == c).collect()))
        .collect()
}
