use core::fmt::{Display, Formatter};
use serde::Serialize;
use serde_json::Value;

/// Identifier of one service in the remote catalog.
///
/// The API hands out integer ids, but nothing guarantees it, so string ids are
/// carried through unchanged. The derived ordering places every numeric id before
/// every textual id, numeric ids in value order and textual ids lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(u64),
    Text(String),
}

impl EntityId {
    /// Extract a usable id from a JSON value.
    ///
    /// Zero, empty strings, `null`, booleans, arrays and objects are not usable ids.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(id) = n.as_u64() {
                    return (id != 0).then_some(Self::Numeric(id));
                }

                // negative or fractional ids are opaque text
                n.as_f64().filter(|f| *f != 0.0).map(|_| Self::Text(n.to_string()))
            }
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}
