use std::future::Future;

use reqwest::Client;
use serde::Deserialize;

pub const CLEARBIT_SUGGEST_URL: &str = "https://autocomplete.clearbit.com/v1/companies/suggest";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanySuggestion {
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Lookup service answered {0}")]
    Status(reqwest::StatusCode),
}

/// Resolves an email domain to candidate company names.
pub trait CompanyLookup: Send + Sync {
    fn suggest(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Vec<CompanySuggestion>, LookupError>> + Send;
}

/// Clearbit's public company autocomplete endpoint.
#[derive(Debug, Clone)]
pub struct ClearbitLookup {
    client: Client,
    endpoint: String,
}

impl ClearbitLookup {
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, CLEARBIT_SUGGEST_URL)
    }

    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Default for ClearbitLookup {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl CompanyLookup for ClearbitLookup {
    async fn suggest(&self, domain: &str) -> Result<Vec<CompanySuggestion>, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", domain)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }
        Ok(response.json().await?)
    }
}
