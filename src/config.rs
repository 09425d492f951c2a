//! Configuration for oascheck.
//!
//! A configuration file tunes the rule vocabularies, score weights, rule
//! policy, and file discovery. Every field is optional; a missing file means
//! all defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::rules;
use crate::score::ScoreWeights;

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["oascheck.yaml", ".oascheck.yaml", "oascheck.yml"];

/// Configuration format versions this build understands.
pub const SUPPORTED_VERSIONS: &[&str] = &["1"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub vocabulary: Vocabulary,
    pub weights: ScoreWeights,
    pub policy: Policy,
    /// Rule ids that should not run (e.g. "pagination").
    pub disabled_rules: Vec<String>,
    pub discovery: DiscoveryConfig,
    /// Evaluate rules on the rayon pool (default: true)
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            vocabulary: Vocabulary::default(),
            weights: ScoreWeights::default(),
            policy: Policy::default(),
            disabled_rules: Vec::new(),
            discovery: DiscoveryConfig::default(),
            parallel: true,
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Find a configuration file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn is_rule_enabled(&self, id: &str) -> bool {
        !self.disabled_rules.iter().any(|r| r == id)
    }
}

/// Name lists the rules match against.
///
/// Property and header vocabularies match whole words of a name, so
/// `userPassword` and `X-RateLimit-Limit` match but `className` does not match
/// `ssn`. Path and summary vocabularies match substrings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Vocabulary {
    pub privileged_tokens: Vec<String>,
    pub sensitive_properties: Vec<String>,
    pub rate_limit_headers: Vec<String>,
    pub cache_headers: Vec<String>,
    pub health_paths: Vec<String>,
    pub correlation_headers: Vec<String>,
    pub pagination_parameters: Vec<String>,
    pub path_verbs: Vec<String>,
    pub migration_markers: Vec<String>,
    pub gdpr_properties: Vec<String>,
    pub hipaa_properties: Vec<String>,
    pub pci_properties: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            privileged_tokens: strings(&["admin", "delete", "update", "create", "manage", "config"]),
            sensitive_properties: strings(&[
                "password",
                "secret",
                "ssn",
                "credit card",
                "cardnumber",
                "email",
                "token",
            ]),
            rate_limit_headers: strings(&["ratelimit", "rate-limit", "retry-after"]),
            cache_headers: strings(&["cache-control", "etag", "expires", "last-modified"]),
            health_paths: strings(&["health", "healthz", "status", "ping", "ready", "live"]),
            correlation_headers: strings(&[
                "x-request-id",
                "x-correlation-id",
                "request-id",
                "correlation-id",
                "traceparent",
            ]),
            pagination_parameters: strings(&[
                "limit", "offset", "page", "page-size", "per-page", "cursor", "page-token",
            ]),
            path_verbs: strings(&[
                "get", "create", "update", "delete", "remove", "fetch", "add", "modify",
            ]),
            migration_markers: strings(&[
                "instead",
                "replaced",
                "migrat",
                "successor",
                "sunset",
                "superseded",
                "use ",
            ]),
            gdpr_properties: strings(&[
                "email",
                "phone",
                "address",
                "first name",
                "last name",
                "full name",
                "birth date",
                "date of birth",
                "dob",
                "ip address",
                "national id",
                "passport",
            ]),
            hipaa_properties: strings(&[
                "diagnosis",
                "medical record",
                "patient",
                "health record",
                "insurance",
                "prescription",
                "medication",
                "treatment",
            ]),
            pci_properties: strings(&[
                "card number",
                "credit card",
                "cvv",
                "cvc",
                "pan",
                "expiry date",
                "expiration date",
                "cardholder",
            ]),
        }
    }
}

impl Vocabulary {
    /// All vocabularies by name, for validation.
    fn lists(&self) -> [(&'static str, &Vec<String>); 12] {
        [
            ("privileged_tokens", &self.privileged_tokens),
            ("sensitive_properties", &self.sensitive_properties),
            ("rate_limit_headers", &self.rate_limit_headers),
            ("cache_headers", &self.cache_headers),
            ("health_paths", &self.health_paths),
            ("correlation_headers", &self.correlation_headers),
            ("pagination_parameters", &self.pagination_parameters),
            ("path_verbs", &self.path_verbs),
            ("migration_markers", &self.migration_markers),
            ("gdpr_properties", &self.gdpr_properties),
            ("hipaa_properties", &self.hipaa_properties),
            ("pci_properties", &self.pci_properties),
        ]
    }
}

/// First term whose words appear as a consecutive run of words in `name`.
pub fn match_words<'v>(terms: &'v [String], name: &str) -> Option<&'v str> {
    let words = split_words(name);
    terms
        .iter()
        .find(|term| {
            let target = compact(term);
            !target.is_empty() && contains_word_run(&words, &target)
        })
        .map(String::as_str)
}

/// First term equal to the leading word of `name` ("getPets" -> "get").
pub fn match_leading_word<'v>(terms: &'v [String], name: &str) -> Option<&'v str> {
    let words = split_words(name);
    let first = words.first()?;
    terms
        .iter()
        .find(|term| compact(term) == *first)
        .map(String::as_str)
}

/// First term contained in `text`, case-insensitively.
pub fn match_substring<'v>(terms: &'v [String], text: &str) -> Option<&'v str> {
    let text = text.to_lowercase();
    terms
        .iter()
        .find(|term| !term.is_empty() && text.contains(&term.to_lowercase()))
        .map(String::as_str)
}

/// Lower-case a term and drop separators: "Credit Card" -> "creditcard".
fn compact(term: &str) -> String {
    term.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split an identifier on separators and lower-to-upper case changes.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn contains_word_run(words: &[String], target: &str) -> bool {
    for start in 0..words.len() {
        let mut joined = String::new();
        for word in &words[start..] {
            joined.push_str(word);
            if joined == target || joined.strip_suffix('s') == Some(target) {
                return true;
            }
            if joined.len() >= target.len() + 1 {
                break;
            }
        }
    }
    false
}

/// Rule behaviour switches.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Policy {
    /// Treat an object request body without `additionalProperties` as open.
    pub flag_implicit_additional_properties: bool,
}

/// Configuration for discovering specification files in a directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// File name globs that identify specification files.
    pub patterns: Vec<String>,
    /// Glob patterns for paths to skip (e.g. "**/fixtures/**").
    pub excluded_paths: Vec<String>,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            patterns: strings(&[
                "openapi*.json",
                "openapi*.yaml",
                "openapi*.yml",
                "swagger*.json",
                "swagger*.yaml",
                "swagger*.yml",
                "*.openapi.json",
                "*.openapi.yaml",
                "*.openapi.yml",
                "api-docs*.json",
                "api-docs*.yaml",
                "api-docs*.yml",
            ]),
            excluded_paths: Vec::new(),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if !SUPPORTED_VERSIONS.contains(&config.version.as_str()) {
        anyhow::bail!(
            "unsupported config version {:?} (supported: {})",
            config.version,
            SUPPORTED_VERSIONS.join(", ")
        );
    }

    for (name, value) in config.weights.named() {
        if !value.is_finite() || value < 0.0 {
            anyhow::bail!("invalid weight {}: {} (must be a non-negative number)", name, value);
        }
    }

    for (name, list) in config.vocabulary.lists() {
        if let Some(pos) = list.iter().position(|t| compact(t).is_empty()) {
            anyhow::bail!("vocabulary {} has an empty entry at position {}", name, pos);
        }
    }

    for id in &config.disabled_rules {
        if rules::find_rule(id).is_none() {
            anyhow::bail!("unknown rule {:?} in disabled_rules", id);
        }
    }

    for pattern in config
        .discovery
        .patterns
        .iter()
        .chain(config.discovery.excluded_paths.iter())
    {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid discovery pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
vocabulary:
  privileged_tokens: ["root", "sudo"]
weights:
  path: 4.0
policy:
  flag_implicit_additional_properties: true
disabled_rules:
  - pagination
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.vocabulary.privileged_tokens, vec!["root", "sudo"]);
        // Unset vocabularies keep their defaults
        assert!(config.vocabulary.sensitive_properties.contains(&"password".to_string()));
        assert_eq!(config.weights.path, 4.0);
        assert_eq!(config.weights.operation, ScoreWeights::default().operation);
        assert!(config.policy.flag_implicit_additional_properties);
        assert!(!config.is_rule_enabled("pagination"));
        assert!(config.is_rule_enabled("caching"));
        assert!(config.parallel);
        validate(&config).unwrap();
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse_str("").unwrap();
        assert!(config.disabled_rules.is_empty());
        validate(&config).unwrap();
    }

    #[test]
    fn test_validate_rejects_unknown_version() {
        let config = Config::parse_str("version: \"2\"\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("unsupported config version"));

        let config = Config::parse_str("version: \"1\"\n").unwrap();
        validate(&config).unwrap();
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut config = Config::default();
        config.weights.schema = -1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_rule() {
        let config = Config {
            disabled_rules: vec!["no_such_rule".to_string()],
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("no_such_rule"));
    }

    #[test]
    fn test_validate_rejects_empty_vocabulary_entry() {
        let mut config = Config::default();
        config.vocabulary.cache_headers.push(" - ".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_discover_config() {
        let temp = TempDir::new().unwrap();
        assert!(Config::discover(temp.path()).is_none());
        std::fs::write(temp.path().join(".oascheck.yaml"), "parallel: false\n").unwrap();
        let found = Config::discover(temp.path()).unwrap();
        let config = Config::parse_file(found).unwrap();
        assert!(!config.parallel);
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("userPassword"), vec!["user", "password"]);
        assert_eq!(split_words("X-RateLimit-Limit"), vec!["x", "rate", "limit", "limit"]);
        assert_eq!(split_words("credit_card_number"), vec!["credit", "card", "number"]);
        assert_eq!(split_words("userSSN"), vec!["user", "ssn"]);
        assert_eq!(split_words("ETag"), vec!["etag"]);
    }

    #[test]
    fn test_match_words() {
        let vocab = Vocabulary::default();
        assert_eq!(match_words(&vocab.sensitive_properties, "Password"), Some("password"));
        assert_eq!(match_words(&vocab.sensitive_properties, "access_token"), Some("token"));
        assert_eq!(match_words(&vocab.sensitive_properties, "creditCardNumber"), Some("credit card"));
        assert_eq!(match_words(&vocab.sensitive_properties, "refreshTokens"), Some("token"));
        assert_eq!(match_words(&vocab.sensitive_properties, "className"), None);
        assert_eq!(match_words(&vocab.sensitive_properties, "businessName"), None);
        assert_eq!(match_words(&vocab.rate_limit_headers, "X-RateLimit-Remaining"), Some("ratelimit"));
        assert_eq!(match_words(&vocab.rate_limit_headers, "Retry-After"), Some("retry-after"));
        assert_eq!(match_words(&vocab.cache_headers, "ETag"), Some("etag"));
        assert_eq!(match_words(&vocab.correlation_headers, "X-Request-ID"), Some("x-request-id"));
    }

    #[test]
    fn test_match_leading_word() {
        let vocab = Vocabulary::default();
        assert_eq!(match_leading_word(&vocab.path_verbs, "getPets"), Some("get"));
        assert_eq!(match_leading_word(&vocab.path_verbs, "delete-user"), Some("delete"));
        assert_eq!(match_leading_word(&vocab.path_verbs, "addresses"), None);
        assert_eq!(match_leading_word(&vocab.path_verbs, "user-updates"), None);
    }

    #[test]
    fn test_match_substring() {
        let vocab = Vocabulary::default();
        assert_eq!(match_substring(&vocab.privileged_tokens, "/Admin/users"), Some("admin"));
        assert_eq!(match_substring(&vocab.privileged_tokens, "createPet"), Some("create"));
        assert_eq!(match_substring(&vocab.privileged_tokens, "/pets"), None);
    }
}
