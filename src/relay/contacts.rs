use reqwest::Client;
use serde::Serialize;
use time::OffsetDateTime;

use super::{ContactUpserter, UpstreamError, value_of};
use crate::types::FormData;

pub const INTERCOM_USERS_URL: &str = "https://api.intercom.io/users";

/// Intercom user upsert body; the email is the merge key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactProfile {
    pub email: String,
    pub name: String,
    pub custom_attributes: ContactAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactAttributes {
    pub company: String,
    pub role: String,
    pub extend: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub extend_last_seen_at: OffsetDateTime,
}

impl ContactProfile {
    pub fn from_submission(body: &FormData, seen_at: OffsetDateTime) -> Self {
        Self {
            email: value_of(body, "email"),
            name: value_of(body, "name"),
            custom_attributes: ContactAttributes {
                company: value_of(body, "company"),
                role: value_of(body, "role"),
                extend: true,
                extend_last_seen_at: seen_at,
            },
        }
    }
}

/// Bearer-authenticated client for the Intercom users API.
#[derive(Debug, Clone)]
pub struct IntercomClient {
    client: Client,
    url: String,
    access_token: String,
}

impl IntercomClient {
    pub fn new(client: Client, url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            access_token: access_token.into(),
        }
    }
}

impl ContactUpserter for IntercomClient {
    async fn upsert_contact(&self, contact: &ContactProfile) -> Result<(), UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .json(contact)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                service: "Intercom",
                status,
                body,
            });
        }
        Ok(())
    }
}
