use super::EntityId;
use serde::Serialize;

/// Rating reported when the payload carries no usable rating.
pub const UNKNOWN_RATING: &str = "N/A";

/// Title given to a document whose payload entry has no name.
pub const UNTITLED_DOCUMENT: &str = "Unknown";

/// A link to one legal document (terms, privacy policy, ...) of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLink {
    title: String,
    url: String,
}

impl DocumentLink {
    /// Returns `None` when `url` is empty; a document link always points somewhere.
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        if url.is_empty() {
            return None;
        }

        Some(Self { title: title.into(), url })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// The canonical output unit of a crawl.
///
/// Records are immutable once built and always carry a non-empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    id: EntityId,
    name: String,
    rating: String,
    documents: Vec<DocumentLink>,
}

impl ServiceRecord {
    /// Returns `None` when `name` is empty.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, rating: impl Into<String>, documents: Vec<DocumentLink>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            id,
            name,
            rating: rating.into(),
            documents,
        })
    }

    #[must_use]
    pub const fn id(&self) -> &EntityId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn rating(&self) -> &str {
        &self.rating
    }

    #[must_use]
    pub fn documents(&self) -> &[DocumentLink] {
        &self.documents
    }
}
