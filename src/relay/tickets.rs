use reqwest::Client;
use serde::Serialize;

use super::{TicketCreator, UpstreamError, non_empty, value_of};
use crate::types::{FormData, Subject};

pub const ZENDESK_TICKETS_URL: &str = "https://auth0.zendesk.com/api/v2/tickets.json";

// Account-specific identifiers of the ticketing instance.
pub const TICKET_FORM_ID: u64 = 622708;
pub const TICKET_GROUP_ID: u64 = 40953288;
pub const FIELD_SOURCE: u64 = 56588368;
pub const FIELD_SUBJECT: u64 = 80837608;
pub const FIELD_COMPANY: u64 = 56256027;
pub const FIELD_ROLE: u64 = 56588348;
pub const FIELD_HOST_URL: u64 = 360008343073;

pub const SOURCE_TAG: &str = "extend_contact_form";
pub const TICKET_TAGS: [&str; 2] = ["extend_contact", SOURCE_TAG];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketEnvelope {
    pub ticket: Ticket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub subject: String,
    pub ticket_form_id: u64,
    pub group_id: u64,
    pub description: String,
    pub requester: Requester,
    pub tags: Vec<String>,
    pub custom_fields: Vec<CustomField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requester {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomField {
    pub id: u64,
    pub value: String,
}

impl CustomField {
    fn new(id: u64, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

impl TicketEnvelope {
    pub fn from_submission(subject: Subject, body: &FormData) -> Self {
        let mut custom_fields = vec![
            CustomField::new(FIELD_SOURCE, SOURCE_TAG),
            CustomField::new(FIELD_SUBJECT, subject.as_str()),
        ];
        let optional = [
            (FIELD_COMPANY, "company"),
            (FIELD_ROLE, "role"),
            (FIELD_HOST_URL, "hostUrl"),
        ];
        for (id, name) in optional {
            if let Some(value) = non_empty(body, name) {
                custom_fields.push(CustomField::new(id, value));
            }
        }

        Self {
            ticket: Ticket {
                subject: format!("Source [Auth0 Extend]: 'contact_form' {subject}"),
                ticket_form_id: TICKET_FORM_ID,
                group_id: TICKET_GROUP_ID,
                description: value_of(body, "message"),
                requester: Requester {
                    name: format!("{}/token", value_of(body, "name")),
                    email: value_of(body, "email"),
                },
                tags: TICKET_TAGS.iter().map(|t| t.to_string()).collect(),
                custom_fields,
                priority: non_empty(body, "severity").map(str::to_lowercase),
            },
        }
    }
}

/// Basic-authenticated client for the Zendesk tickets API, using an agent's
/// API token (`<email>/token:<token>`).
#[derive(Debug, Clone)]
pub struct ZendeskClient {
    client: Client,
    url: String,
    agent_email: String,
    api_token: String,
}

impl ZendeskClient {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        agent_email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            agent_email: agent_email.into(),
            api_token: api_token.into(),
        }
    }
}

impl TicketCreator for ZendeskClient {
    async fn create_ticket(&self, ticket: &TicketEnvelope) -> Result<(), UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .basic_auth(format!("{}/token", self.agent_email), Some(&self.api_token))
            .header("Accept", "application/json")
            .json(ticket)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                service: "Zendesk",
                status,
                body,
            });
        }
        Ok(())
    }
}
