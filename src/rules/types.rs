//! Core types for rule findings.

use serde::{Deserialize, Serialize};

/// Finding categories, in output order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Validation,
    Security,
    Performance,
    DesignPatterns,
    Governance,
    Compliance,
    Documentation,
    Monitoring,
    Testing,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Validation,
        Category::Security,
        Category::Performance,
        Category::DesignPatterns,
        Category::Governance,
        Category::Compliance,
        Category::Documentation,
        Category::Monitoring,
        Category::Testing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Validation => "validation",
            Category::Security => "security",
            Category::Performance => "performance",
            Category::DesignPatterns => "design_patterns",
            Category::Governance => "governance",
            Category::Compliance => "compliance",
            Category::Documentation => "documentation",
            Category::Monitoring => "monitoring",
            Category::Testing => "testing",
        }
    }

    /// Heading used by human-readable reports.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Validation => "Validation",
            Category::Security => "Security",
            Category::Performance => "Performance",
            Category::DesignPatterns => "Design/Patterns",
            Category::Governance => "Governance",
            Category::Compliance => "Compliance",
            Category::Documentation => "Documentation",
            Category::Monitoring => "Monitoring",
            Category::Testing => "Testing recommendations",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single categorized suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    /// Id of the rule that produced it
    pub rule: String,
    pub message: String,
}

impl Finding {
    pub fn new(category: Category, rule: &str, message: impl Into<String>) -> Self {
        Self {
            category,
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}
