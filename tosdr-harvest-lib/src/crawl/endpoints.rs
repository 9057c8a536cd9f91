use super::EntityId;
use crate::Result;
use ohno::IntoAppError;
use url::Url;

/// Base URL of the public ToS;DR API.
pub const TOSDR_API_BASE: &str = "https://api.tosdr.org";

const SERVICE_PATH: &str = "service/v3/";

/// Builds listing and detail URLs for the service API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    service_url: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let service_url = Url::parse(&base)
            .and_then(|base| base.join(SERVICE_PATH))
            .into_app_err_with(|| format!("invalid API base URL '{base_url}'"))?;

        Ok(Self { service_url })
    }

    /// URL of one page of the service listing.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        self.with_query("page", &page.to_string())
    }

    /// URL of the detail document of one service.
    #[must_use]
    pub fn detail_url(&self, id: &EntityId) -> String {
        self.with_query("id", &id.to_string())
    }

    fn with_query(&self, key: &str, value: &str) -> String {
        let mut url = self.service_url.clone();
        let _ = url.query_pairs_mut().append_pair(key, value);
        url.into()
    }
}
