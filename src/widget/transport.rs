use std::future::Future;

use reqwest::Client;

use crate::types::SubmissionPayload;

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Relay rejected submission ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Delivers a submission to the relay. Only success or failure matters; the
/// response body is opaque to the widget.
pub trait Submitter: Send + Sync {
    fn post(
        &self,
        url: &str,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<(), SubmitError>> + Send;
}

/// Form-encoded POST over `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpSubmitter {
    client: Client,
}

impl HttpSubmitter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Submitter for HttpSubmitter {
    async fn post(&self, url: &str, payload: &SubmissionPayload) -> Result<(), SubmitError> {
        let response = self.client.post(url).form(payload).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SubmitError::Rejected { status, body })
    }
}
