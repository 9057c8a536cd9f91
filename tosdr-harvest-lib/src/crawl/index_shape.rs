//! Shape matchers for the service listing payload.
//!
//! The listing endpoint has returned at least three envelope layouts over time.
//! Each [`IndexShape`] knows how to pull the entity list out of one of them; the
//! matchers are tried in [`IndexShape::PRECEDENCE`] order and the first one that
//! yields a non-empty list wins.

use super::EntityId;
use serde_json::Value;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IndexShape {
    /// `[ {...}, {...} ]`
    #[strum(to_string = "bare array")]
    BareArray,

    /// `{ "parameters": { "services": [ ... ] } }`
    #[strum(to_string = "parameters.services")]
    NestedParameters,

    /// `{ "services": [ ... ] }`
    #[strum(to_string = "services")]
    TopLevelServices,
}

impl IndexShape {
    pub const PRECEDENCE: [Self; 3] = [Self::BareArray, Self::NestedParameters, Self::TopLevelServices];

    /// Returns the entity list if the payload has this shape and the list is not empty.
    #[must_use]
    pub fn extract(self, payload: &Value) -> Option<&[Value]> {
        let list = match self {
            Self::BareArray => payload.as_array(),
            Self::NestedParameters => payload
                .get("parameters")
                .and_then(|parameters| parameters.get("services"))
                .and_then(Value::as_array),
            Self::TopLevelServices => payload.get("services").and_then(Value::as_array),
        }?;

        if list.is_empty() { None } else { Some(list.as_slice()) }
    }
}

/// Find the entity list of a listing page, along with the shape that matched.
#[must_use]
pub fn extract_entities(payload: &Value) -> Option<(IndexShape, &[Value])> {
    IndexShape::PRECEDENCE
        .into_iter()
        .find_map(|shape| shape.extract(payload).map(|entities| (shape, entities)))
}

/// Extract the usable ids of a listing page, in page order.
///
/// Entities that are not objects or lack a usable `id` are ignored.
#[must_use]
pub fn extract_ids(payload: &Value) -> Vec<EntityId> {
    extract_entities(payload)
        .map(|(_, entities)| {
            entities
                .iter()
                .filter_map(|entity| entity.as_object()?.get("id").and_then(EntityId::from_json))
                .collect()
        })
        .unwrap_or_default()
}
