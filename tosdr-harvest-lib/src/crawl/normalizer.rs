//! Turns a raw service detail payload into a [`ServiceRecord`].
//!
//! Detail payloads come either wrapped in a `parameters` envelope or bare. Anything
//! that does not look like a named service is rejected rather than reported as an
//! error: a rejected payload means the service contributes nothing to the dataset.

use super::service_record::{UNKNOWN_RATING, UNTITLED_DOCUMENT};
use super::{DocumentLink, EntityId, ServiceRecord};
use serde_json::{Map, Value};
use strum::Display;

const LOG_TARGET: &str = "normalizer";

/// Why a payload did not produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Rejection {
    #[strum(to_string = "payload is not valid JSON")]
    MalformedJson,

    #[strum(to_string = "payload is not a JSON object")]
    NotAnObject,

    #[strum(to_string = "payload has no name")]
    MissingName,

    #[strum(to_string = "payload documents are not a list of objects")]
    MalformedDocuments,
}

/// Normalize a raw payload, logging and discarding the reason on rejection.
#[must_use]
pub fn normalize(raw: &[u8], id: &EntityId) -> Option<ServiceRecord> {
    match classify(raw, id) {
        Ok(record) => Some(record),
        Err(rejection) => {
            log::debug!(target: LOG_TARGET, "Dropping service {id}: {rejection}");
            None
        }
    }
}

/// Normalize a raw payload, reporting why it was rejected.
pub fn classify(raw: &[u8], id: &EntityId) -> Result<ServiceRecord, Rejection> {
    let Ok(payload) = serde_json::from_slice::<Value>(raw) else {
        return Err(Rejection::MalformedJson);
    };

    classify_value(&payload, id)
}

/// Normalize an already parsed payload.
pub fn classify_value(payload: &Value, id: &EntityId) -> Result<ServiceRecord, Rejection> {
    let payload = payload.as_object().ok_or(Rejection::NotAnObject)?;
    let data = match payload.get("parameters") {
        Some(parameters) => parameters.as_object().ok_or(Rejection::NotAnObject)?,
        None => payload,
    };

    let name = data
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(Rejection::MissingName)?;

    let documents = extract_documents(data)?;

    ServiceRecord::new(id.clone(), name, extract_rating(data), documents).ok_or(Rejection::MissingName)
}

fn extract_rating(data: &Map<String, Value>) -> String {
    match data.get("rating") {
        Some(Value::Object(rating)) => rating.get("human").and_then(scalar_text),
        Some(other) => scalar_text(other),
        None => None,
    }
    .unwrap_or_else(|| UNKNOWN_RATING.to_string())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_documents(data: &Map<String, Value>) -> Result<Vec<DocumentLink>, Rejection> {
    let entries = match data.get("documents") {
        None => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(Rejection::MalformedDocuments),
    };

    let mut documents = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(entry) = entry.as_object() else {
            return Err(Rejection::MalformedDocuments);
        };

        // Links without a url carry nothing worth keeping
        let Some(url) = entry.get("url").and_then(Value::as_str) else {
            continue;
        };
        let title = entry
            .get("name")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_DOCUMENT);
        documents.extend(DocumentLink::new(title, url));
    }

    Ok(documents)
}
