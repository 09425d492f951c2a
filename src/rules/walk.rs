//! Cycle-safe schema traversal.
//!
//! `$ref` targets are tracked by component name along the active walk path; a
//! name already on the path is not re-entered. A node budget bounds walks over
//! heavily shared reference graphs.

use std::collections::VecDeque;

use serde_json::{Map, Value};
use tracing::debug;

use crate::document::{get_array, get_object, ref_of, value_kind, Document};
use crate::error::RuleError;

const MAX_WALK_NODES: usize = 50_000;

struct Entry<'a> {
    owner: String,
    schema: &'a Value,
    active: Vec<String>,
}

/// Breadth-first walk over every property reachable from `root`.
///
/// `visit` receives the nearest named schema (or `label` for inline schemas),
/// the property name, and the property's schema.
pub(crate) fn walk_properties<'a, F>(
    doc: &'a Document,
    root: &'a Value,
    label: &str,
    mut visit: F,
) -> Result<(), RuleError>
where
    F: FnMut(&str, &'a str, &'a Value),
{
    let mut queue = VecDeque::new();
    queue.push_back(Entry {
        owner: label.to_string(),
        schema: root,
        active: Vec::new(),
    });

    let mut budget = MAX_WALK_NODES;
    while let Some(entry) = queue.pop_front() {
        if budget == 0 {
            debug!(label, "schema walk budget exhausted");
            break;
        }
        budget -= 1;

        let Some(Entry {
            owner,
            schema,
            active,
        }) = enter(doc, entry)
        else {
            continue;
        };
        let node = match schema {
            Value::Object(node) => node,
            Value::Bool(_) => continue,
            other => {
                return Err(RuleError::new(
                    format!("schema '{}'", owner),
                    format!("expected a mapping, found {}", value_kind(other)),
                ))
            }
        };

        let subject = format!("schema '{}'", owner);
        if let Some(properties) = get_object(node, "properties", &subject)? {
            for (name, property) in properties {
                visit(&owner, name.as_str(), property);
                queue.push_back(Entry {
                    owner: owner.clone(),
                    schema: property,
                    active: active.clone(),
                });
            }
        }
        for child in nested(node, &subject)? {
            queue.push_back(Entry {
                owner: owner.clone(),
                schema: child,
                active: active.clone(),
            });
        }
    }
    Ok(())
}

/// Follow `$ref`s from an entry. `None` when the reference is external,
/// dangling, or already on the active path.
fn enter<'a>(doc: &'a Document, entry: Entry<'a>) -> Option<Entry<'a>> {
    let Entry {
        mut owner,
        mut schema,
        mut active,
    } = entry;
    while let Some(reference) = ref_of(schema) {
        let (name, target) = doc.resolve_ref(reference)?;
        if active.contains(&name) {
            return None;
        }
        active.push(name.clone());
        owner = name;
        schema = target;
    }
    Some(Entry {
        owner,
        schema,
        active,
    })
}

/// Schemas nested under `items`, `additionalProperties`, and compositions.
fn nested<'a>(node: &'a Map<String, Value>, subject: &str) -> Result<Vec<&'a Value>, RuleError> {
    let mut children = Vec::new();
    if let Some(items) = node.get("items") {
        children.push(items);
    }
    if let Some(extra @ Value::Object(_)) = node.get("additionalProperties") {
        children.push(extra);
    }
    for key in ["allOf", "oneOf", "anyOf"] {
        if let Some(members) = get_array(node, key, subject)? {
            children.extend(members.iter());
        }
    }
    Ok(children)
}

/// Maximum nesting depth of a schema. A leaf schema is depth 1, and so is a
/// reference that cannot be followed (unresolved or back into the active path).
pub(crate) fn schema_depth(doc: &Document, schema: &Value) -> usize {
    let mut active = Vec::new();
    let mut budget = MAX_WALK_NODES;
    depth_of(doc, schema, &mut active, &mut budget)
}

fn depth_of(doc: &Document, schema: &Value, active: &mut Vec<String>, budget: &mut usize) -> usize {
    if *budget == 0 {
        return 1;
    }
    *budget -= 1;

    if let Some(reference) = ref_of(schema) {
        let Some((name, target)) = doc.resolve_ref(reference) else {
            return 1;
        };
        if active.contains(&name) {
            return 1;
        }
        active.push(name);
        let depth = depth_of(doc, target, active, budget);
        active.pop();
        return depth;
    }

    let Value::Object(node) = schema else {
        return 1;
    };

    let mut children: Vec<&Value> = node
        .get("properties")
        .and_then(Value::as_object)
        .map(|p| p.values().collect())
        .unwrap_or_default();
    // Malformed nesting counts as a leaf here; the rules report it.
    children.extend(nested(node, "").unwrap_or_default());

    let deepest = children
        .into_iter()
        .map(|child| depth_of(doc, child, active, budget))
        .max()
        .unwrap_or(0);
    1 + deepest
}
