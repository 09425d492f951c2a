//! Canonical, read-only document model.
//!
//! A [`Document`] wraps a normalized OpenAPI mapping and exposes the fields
//! rules need through accessors with defined defaults. Accessors that can hit
//! a wrongly-shaped value return [`RuleError`] so the caller decides whether
//! to recover.

mod loader;
mod normalize;

pub use loader::{parse, parse_mapping, Format};
pub use normalize::normalize;

use lazy_static::lazy_static;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AnalysisError, RuleError};

lazy_static! {
    static ref EMPTY_MAP: Map<String, Value> = Map::new();
}

/// HTTP methods an operation can be declared under, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    Trace,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Options,
        Method::Head,
        Method::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
            Method::Trace => "trace",
        }
    }

    /// Parse a path-item key, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}

/// Counts computed once at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub paths: usize,
    pub operations: usize,
    pub schemas: usize,
}

/// A normalized, structurally valid API description.
#[derive(Debug, Clone)]
pub struct Document {
    root: Map<String, Value>,
    openapi_version: Option<String>,
    counts: Counts,
}

impl Document {
    /// Parse raw bytes, normalize, and validate.
    pub fn load(bytes: &[u8], hint: Option<Format>) -> Result<Self, AnalysisError> {
        let root = parse_mapping(bytes, hint)?;
        Self::from_mapping(root)
    }

    /// Build from an already parsed value.
    pub fn from_value(value: Value) -> Result<Self, AnalysisError> {
        match value {
            Value::Object(root) => Self::from_mapping(root),
            _ => Err(AnalysisError::Structural(
                "OpenAPI content is not a valid JSON/YAML object.".to_string(),
            )),
        }
    }

    fn from_mapping(mut root: Map<String, Value>) -> Result<Self, AnalysisError> {
        normalize(&mut root);

        match root.get("info") {
            Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(AnalysisError::Structural(format!(
                    "`info` must be a mapping, found {}",
                    value_kind(other)
                )))
            }
            None => {
                return Err(AnalysisError::Structural(
                    "document has no `info` section".to_string(),
                ))
            }
        }
        match root.get("paths") {
            Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(AnalysisError::Structural(format!(
                    "`paths` must be a mapping, found {}",
                    value_kind(other)
                )))
            }
            None => {
                return Err(AnalysisError::Structural(
                    "document has no `paths` section".to_string(),
                ))
            }
        }

        let openapi_version = ["openapi", "swagger"]
            .iter()
            .find_map(|key| root.get(*key))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        let mut doc = Self {
            root,
            openapi_version,
            counts: Counts::default(),
        };
        doc.counts = Counts {
            paths: doc.paths().len(),
            operations: doc.operations().len(),
            schemas: doc.schemas().map(Map::len).unwrap_or(0),
        };

        debug!(
            version = doc.openapi_version.as_deref().unwrap_or("unknown"),
            paths = doc.counts.paths,
            operations = doc.counts.operations,
            schemas = doc.counts.schemas,
            "document loaded"
        );
        Ok(doc)
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn openapi_version(&self) -> Option<&str> {
        self.openapi_version.as_deref()
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// The `info` mapping (validated at construction).
    pub fn info(&self) -> &Map<String, Value> {
        self.root
            .get("info")
            .and_then(Value::as_object)
            .unwrap_or(&*EMPTY_MAP)
    }

    /// The `paths` mapping (validated at construction).
    pub fn paths(&self) -> &Map<String, Value> {
        self.root
            .get("paths")
            .and_then(Value::as_object)
            .unwrap_or(&*EMPTY_MAP)
    }

    /// Server URLs in document order. Entries without a string `url` are skipped.
    pub fn servers(&self) -> Result<Vec<&Map<String, Value>>, RuleError> {
        let Some(servers) = get_array(&self.root, "servers", "servers")? else {
            return Ok(Vec::new());
        };
        Ok(servers
            .iter()
            .filter_map(Value::as_object)
            .filter(|s| get_str(s, "url").is_some())
            .collect())
    }

    pub fn server_urls(&self) -> Result<Vec<&str>, RuleError> {
        Ok(self
            .servers()?
            .into_iter()
            .filter_map(|s| get_str(s, "url"))
            .collect())
    }

    /// Whether a non-empty document-level `security` list exists.
    pub fn has_global_security(&self) -> bool {
        matches!(self.root.get("security"), Some(Value::Array(reqs)) if !reqs.is_empty())
    }

    /// Whether an operation is covered by a non-empty security requirement,
    /// either its own or inherited from the document.
    pub fn has_effective_security(&self, op: &Operation<'_>) -> bool {
        match op.node.get("security") {
            Some(Value::Array(reqs)) => !reqs.is_empty(),
            Some(_) => false,
            None => self.has_global_security(),
        }
    }

    /// A named section of `components`, if it is a mapping.
    pub fn components_section(&self, section: &str) -> Option<&Map<String, Value>> {
        self.root
            .get("components")
            .and_then(Value::as_object)
            .and_then(|c| c.get(section))
            .and_then(Value::as_object)
    }

    pub fn schemas(&self) -> Option<&Map<String, Value>> {
        self.components_section("schemas")
    }

    /// Component schemas, failing if the section exists with the wrong shape.
    pub fn component_schemas(&self) -> Result<Vec<(&str, &Value)>, RuleError> {
        let Some(components) = get_object(&self.root, "components", "components")? else {
            return Ok(Vec::new());
        };
        let Some(schemas) = get_object(components, "schemas", "components.schemas")? else {
            return Ok(Vec::new());
        };
        Ok(schemas.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }

    pub fn security_schemes(&self) -> Result<Vec<(&str, &Value)>, RuleError> {
        let Some(components) = get_object(&self.root, "components", "components")? else {
            return Ok(Vec::new());
        };
        let Some(schemes) = get_object(components, "securitySchemes", "components.securitySchemes")?
        else {
            return Ok(Vec::new());
        };
        Ok(schemes.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }

    /// Look up a local `$ref` target. Returns the component name and value.
    ///
    /// Both `#/components/<section>/<name>` and the legacy `#/definitions/<name>`,
    /// `#/parameters/<name>`, `#/responses/<name>` forms resolve.
    pub fn resolve_ref<'a>(&'a self, reference: &str) -> Option<(String, &'a Value)> {
        let (section, name) = split_ref(reference)?;
        let value = self.components_section(section)?.get(&name)?;
        Some((name, value))
    }

    /// Follow `$ref` chains to a concrete value. Cycles stop at the last
    /// value before revisiting a reference.
    pub fn deref<'a>(&'a self, value: &'a Value) -> &'a Value {
        let mut current = value;
        let mut seen: Vec<&str> = Vec::new();
        while let Some(reference) = ref_of(current) {
            if seen.contains(&reference) {
                break;
            }
            seen.push(reference);
            match self.resolve_ref(reference) {
                Some((_, target)) => current = target,
                None => break,
            }
        }
        current
    }

    /// All operations in traversal order: paths in document order, methods
    /// in precedence order. Non-mapping path items and operations are skipped.
    pub fn operations(&self) -> Vec<Operation<'_>> {
        let mut ops = Vec::new();
        for (path, item) in self.paths() {
            let Value::Object(item) = item else { continue };
            for method in Method::ALL {
                for (key, node) in item {
                    if Method::parse(key) != Some(method) {
                        continue;
                    }
                    if let Value::Object(node) = node {
                        ops.push(Operation {
                            path: path.as_str(),
                            method,
                            node,
                            path_item: item,
                        });
                    }
                }
            }
        }
        ops
    }
}

/// One HTTP-verb entry under a path.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    pub path: &'a str,
    pub method: Method,
    node: &'a Map<String, Value>,
    path_item: &'a Map<String, Value>,
}

impl<'a> Operation<'a> {
    /// `GET /pets/{id}` style label used in messages.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn node(&self) -> &'a Map<String, Value> {
        self.node
    }

    pub fn operation_id(&self) -> Option<&'a str> {
        get_str(self.node, "operationId")
    }

    pub fn summary(&self) -> Option<&'a str> {
        get_str(self.node, "summary")
    }

    pub fn description(&self) -> Option<&'a str> {
        get_str(self.node, "description")
    }

    pub fn is_deprecated(&self) -> bool {
        self.node.get("deprecated").and_then(Value::as_bool) == Some(true)
    }

    /// String tags; missing means none.
    pub fn tags(&self) -> Result<Vec<&'a str>, RuleError> {
        let subject = format!("tags of {}", self.label());
        Ok(get_array(self.node, "tags", &subject)?
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default())
    }

    /// Operation-level parameters, unresolved.
    pub fn parameters(&self) -> Result<&'a [Value], RuleError> {
        let subject = format!("parameters of {}", self.label());
        Ok(get_array(self.node, "parameters", &subject)?
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Operation-level followed by path-level parameters.
    pub fn all_parameters(&self) -> Result<Vec<&'a Value>, RuleError> {
        let subject = format!("path parameters of {}", self.path);
        let mut params: Vec<&'a Value> = self.parameters()?.iter().collect();
        if let Some(shared) = get_array(self.path_item, "parameters", &subject)? {
            params.extend(shared.iter());
        }
        Ok(params)
    }

    pub fn request_body(&self) -> Option<&'a Value> {
        self.node.get("requestBody")
    }

    /// Responses in document order; missing means none.
    pub fn responses(&self) -> Result<Vec<(&'a str, &'a Value)>, RuleError> {
        let subject = format!("responses of {}", self.label());
        Ok(get_object(self.node, "responses", &subject)?
            .map(|r| r.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default())
    }

    /// Whether the operation declares its own `security` key.
    pub fn declares_security(&self) -> bool {
        self.node.contains_key("security")
    }
}

/// Whether a response code belongs to a status class (`'2'` for 2xx).
pub fn is_status_class(code: &str, class: char) -> bool {
    code.len() == 3 && code.starts_with(class)
}

/// Human-readable kind of a JSON value, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Require a value to be a mapping.
pub fn as_object<'a>(value: &'a Value, subject: &str) -> Result<&'a Map<String, Value>, RuleError> {
    value.as_object().ok_or_else(|| {
        RuleError::new(subject, format!("expected a mapping, found {}", value_kind(value)))
    })
}

/// Optional mapping field; present with another shape is an error.
pub fn get_object<'a>(
    node: &'a Map<String, Value>,
    key: &str,
    subject: &str,
) -> Result<Option<&'a Map<String, Value>>, RuleError> {
    match node.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(RuleError::new(
            subject,
            format!("expected `{}` to be a mapping, found {}", key, value_kind(other)),
        )),
    }
}

/// Optional list field; present with another shape is an error.
pub fn get_array<'a>(
    node: &'a Map<String, Value>,
    key: &str,
    subject: &str,
) -> Result<Option<&'a Vec<Value>>, RuleError> {
    match node.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(RuleError::new(
            subject,
            format!("expected `{}` to be a list, found {}", key, value_kind(other)),
        )),
    }
}

/// Non-empty string field.
pub fn get_str<'a>(node: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    node.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// The `$ref` string of a reference object.
pub fn ref_of(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

fn split_ref(reference: &str) -> Option<(&'static str, String)> {
    let pointer = reference.strip_prefix("#/")?;
    let mut parts = pointer.splitn(3, '/');
    let first = parts.next()?;
    let (section, name) = match first {
        "components" => {
            let section = parts.next()?;
            let name = parts.next()?;
            (section_name(section)?, name)
        }
        "definitions" => ("schemas", parts.next()?),
        "parameters" => ("parameters", parts.next()?),
        "responses" => ("responses", parts.next()?),
        _ => return None,
    };
    if name.contains('/') {
        return None;
    }
    Some((section, name.replace("~1", "/").replace("~0", "~")))
}

fn section_name(section: &str) -> Option<&'static str> {
    const SECTIONS: &[&str] = &[
        "schemas",
        "responses",
        "parameters",
        "examples",
        "requestBodies",
        "headers",
        "securitySchemes",
        "links",
        "callbacks",
    ];
    SECTIONS.iter().find(|s| **s == section).copied()
}
