//! Accessors shared by several rules.

use serde_json::{Map, Value};

use crate::document::{as_object, get_object, Document, Operation};
use crate::error::RuleError;

/// A resolved response of an operation.
pub(crate) struct Response<'a> {
    pub code: &'a str,
    pub node: &'a Map<String, Value>,
}

impl Response<'_> {
    pub fn is_class(&self, class: char) -> bool {
        crate::document::is_status_class(self.code, class)
    }
}

/// Responses with `$ref`s followed, in document order.
pub(crate) fn responses<'a>(
    doc: &'a Document,
    op: &Operation<'a>,
) -> Result<Vec<Response<'a>>, RuleError> {
    op.responses()?
        .into_iter()
        .map(|(code, value)| {
            let subject = format!("response {} of {}", code, op.label());
            as_object(doc.deref(value), &subject).map(|node| Response { code, node })
        })
        .collect()
}

/// The resolved request body, if any.
pub(crate) fn request_body<'a>(
    doc: &'a Document,
    op: &Operation<'a>,
) -> Result<Option<&'a Map<String, Value>>, RuleError> {
    match op.request_body() {
        None => Ok(None),
        Some(value) => {
            let subject = format!("request body of {}", op.label());
            as_object(doc.deref(value), &subject).map(Some)
        }
    }
}

/// `content` entries of a request body or response.
pub(crate) fn media_types<'a>(
    node: &'a Map<String, Value>,
    subject: &str,
) -> Result<Vec<(&'a str, &'a Map<String, Value>)>, RuleError> {
    let Some(content) = get_object(node, "content", subject)? else {
        return Ok(Vec::new());
    };
    content
        .iter()
        .map(|(media_type, value)| {
            let media_subject = format!("media type {} of {}", media_type, subject);
            as_object(value, &media_subject).map(|m| (media_type.as_str(), m))
        })
        .collect()
}

/// Resolved header objects of a response, in document order.
pub(crate) fn headers<'a>(
    doc: &'a Document,
    node: &'a Map<String, Value>,
    subject: &str,
) -> Result<Vec<(&'a str, &'a Value)>, RuleError> {
    Ok(get_object(node, "headers", subject)?
        .map(|h| h.iter().map(|(k, v)| (k.as_str(), doc.deref(v))).collect())
        .unwrap_or_default())
}

/// Resolved parameter objects. Non-mapping entries are an error.
pub(crate) fn parameters<'a>(
    doc: &'a Document,
    params: impl IntoIterator<Item = &'a Value>,
    label: &str,
) -> Result<Vec<&'a Map<String, Value>>, RuleError> {
    let subject = format!("parameters of {}", label);
    params
        .into_iter()
        .map(|p| as_object(doc.deref(p), &subject))
        .collect()
}

/// Whether a media type object carries an example.
pub(crate) fn has_example(doc: &Document, media: &Map<String, Value>) -> bool {
    if media.contains_key("example") {
        return true;
    }
    if matches!(media.get("examples"), Some(Value::Object(e)) if !e.is_empty()) {
        return true;
    }
    media
        .get("schema")
        .map(|s| doc.deref(s))
        .and_then(Value::as_object)
        .map(|s| s.contains_key("example") || s.contains_key("examples"))
        .unwrap_or(false)
}
