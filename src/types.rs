use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Flat field-name to value mapping, the only shape that crosses the wire.
pub type FormData = BTreeMap<String, String>;

/// Which form produced a submission. Sent to the relay as `subject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "extend_sales")]
    Sales,
    #[serde(rename = "extend_support")]
    Support,
}

impl Subject {
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Sales => "extend_sales",
            Subject::Support => "extend_support",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subject '{0}'")]
pub struct UnknownSubject(pub String);

impl FromStr for Subject {
    type Err = UnknownSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extend_sales" => Ok(Subject::Sales),
            "extend_support" => Ok(Subject::Support),
            other => Err(UnknownSubject(other.to_string())),
        }
    }
}

/// What the widget posts to the relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    #[serde(flatten)]
    pub fields: FormData,
    pub subject: Subject,
}

/// Host page details the widget reports alongside a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub url: Url,
    pub title: String,
    pub referrer: String,
}

impl PageContext {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            title: String::new(),
            referrer: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = referrer.into();
        self
    }
}

/// Payload fields enriched with page context. Handed to the success/fail
/// callbacks for analytics; never posted to the relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub path: String,
    pub url: String,
    pub title: String,
    pub referrer: String,
    #[serde(rename = "formId")]
    pub form_id: String,
    #[serde(rename = "lpId")]
    pub lp_id: String,
    #[serde(rename = "trackData")]
    pub track_data: Option<String>,
    #[serde(flatten)]
    pub fields: FormData,
}

impl MetricsRecord {
    pub fn new(page: &PageContext, fields: &FormData) -> Self {
        Self {
            path: page.url.path().to_string(),
            url: page.url.to_string(),
            title: page.title.clone(),
            referrer: page.referrer.clone(),
            form_id: METRICS_FORM_ID.to_string(),
            lp_id: METRICS_LANDING_PAGE_ID.to_string(),
            track_data: fields.get("email").cloned(),
            fields: fields.clone(),
        }
    }
}

pub const METRICS_FORM_ID: &str = "1049";
pub const METRICS_LANDING_PAGE_ID: &str = "1135";
pub const DEFAULT_POST_URL: &str =
    "https://wtg-extend-prod.sandbox.auth0-extend.com/goextend-contact-support";
pub const SUBMISSION_RECEIVED: &str = "Form submission received";
