//! Submission relay: checks a posted form and forwards it to the contacts
//! and ticketing platforms.
//!
//! Structural problems (unknown `subject`, missing fields) are rejected
//! before anything leaves the process. Once a request is accepted, upstream
//! failures are only logged; the caller always gets the same receipt.

pub mod config;
pub mod contacts;
pub mod server;
pub mod tickets;

use std::future::Future;

use serde::Serialize;
use time::OffsetDateTime;

use crate::types::{FormData, SUBMISSION_RECEIVED, Subject};
use contacts::ContactProfile;
use tickets::TicketEnvelope;

pub const SALES_REQUIRED: &[&str] = &["name", "email", "company", "role", "message"];
pub const SUPPORT_REQUIRED: &[&str] = &["name", "email", "message"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Request body did not include the '{0}' property.")]
    MissingField(&'static str),
    #[error("Invalid 'subject' property value '{0}'.")]
    InvalidSubject(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{service} answered {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Contacts platform: create or update a person by email.
pub trait ContactUpserter: Send + Sync {
    fn upsert_contact(
        &self,
        contact: &ContactProfile,
    ) -> impl Future<Output = Result<(), UpstreamError>> + Send;
}

/// Ticketing platform: open a ticket.
pub trait TicketCreator: Send + Sync {
    fn create_ticket(
        &self,
        ticket: &TicketEnvelope,
    ) -> impl Future<Output = Result<(), UpstreamError>> + Send;
}

/// What the caller sees for every accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub message: &'static str,
}

impl Receipt {
    fn received() -> Self {
        Self {
            message: SUBMISSION_RECEIVED,
        }
    }
}

pub struct Relay<C, T> {
    contacts: C,
    tickets: T,
}

impl<C: ContactUpserter, T: TicketCreator> Relay<C, T> {
    pub fn new(contacts: C, tickets: T) -> Self {
        Self { contacts, tickets }
    }

    pub async fn handle(&self, body: &FormData) -> Result<Receipt, RelayError> {
        let subject = parse_subject(body)?;

        match subject {
            Subject::Sales => {
                require(body, SALES_REQUIRED)?;
                let contact = ContactProfile::from_submission(body, OffsetDateTime::now_utc());
                let ticket = TicketEnvelope::from_submission(subject, body);
                let (contact_result, ticket_result) = tokio::join!(
                    self.contacts.upsert_contact(&contact),
                    self.tickets.create_ticket(&ticket),
                );
                log_upstream("Upsert to contacts", contact_result);
                log_upstream("Upsert ticket", ticket_result);
            }
            Subject::Support => {
                require(body, SUPPORT_REQUIRED)?;
                let ticket = TicketEnvelope::from_submission(subject, body);
                log_upstream("Upsert ticket", self.tickets.create_ticket(&ticket).await);
            }
        }

        tracing::info!(%subject, "Submission relayed");
        Ok(Receipt::received())
    }
}

fn parse_subject(body: &FormData) -> Result<Subject, RelayError> {
    require(body, &["subject"])?;
    let raw = &body["subject"];
    raw.parse()
        .map_err(|_| RelayError::InvalidSubject(raw.clone()))
}

/// Present and non-empty, in the order given.
fn require(body: &FormData, names: &[&'static str]) -> Result<(), RelayError> {
    match names
        .iter()
        .find(|name| body.get(**name).is_none_or(|value| value.is_empty()))
    {
        Some(missing) => Err(RelayError::MissingField(*missing)),
        None => Ok(()),
    }
}

fn log_upstream(what: &str, result: Result<(), UpstreamError>) {
    match result {
        Ok(()) => tracing::debug!("{} succeeded", what),
        Err(e) => tracing::error!("{} - {}", what, e),
    }
}

/// Non-empty value of an optional field.
pub(crate) fn non_empty<'a>(body: &'a FormData, name: &str) -> Option<&'a str> {
    body.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

pub(crate) fn value_of(body: &FormData, name: &str) -> String {
    body.get(name).cloned().unwrap_or_default()
}
