use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use super::fields::FormMode;
use crate::types::{DEFAULT_POST_URL, MetricsRecord};

pub type OpenCallback = Arc<dyn Fn() + Send + Sync>;
pub type MetricsCallback = Arc<dyn Fn(&MetricsRecord) + Send + Sync>;

pub const DEFAULT_SALES_TITLE: &str = "Talk to Sales";
pub const DEFAULT_SUPPORT_TITLE: &str = "Submit a Support Ticket";

/// Partial options a host page may pass, e.g. as a JSON object. Anything
/// left out falls back to [`FormConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
    pub modal_title: Option<String>,
    pub post_url: Option<String>,
    pub support: Option<bool>,
}

/// Settings of one widget instance. Fixed once the widget is built.
#[derive(Clone)]
pub struct FormConfig {
    pub modal_title: String,
    pub post_url: String,
    pub mode: FormMode,
    pub on_open: OpenCallback,
    pub on_success: MetricsCallback,
    pub on_fail: MetricsCallback,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            modal_title: DEFAULT_SALES_TITLE.to_string(),
            post_url: DEFAULT_POST_URL.to_string(),
            mode: FormMode::Sales,
            on_open: Arc::new(|| {}),
            on_success: Arc::new(|_| {}),
            on_fail: Arc::new(|_| {}),
        }
    }
}

impl FormConfig {
    pub fn support() -> Self {
        Self {
            modal_title: DEFAULT_SUPPORT_TITLE.to_string(),
            mode: FormMode::Support,
            ..Self::default()
        }
    }

    /// Merge host-supplied options over the defaults.
    pub fn from_options(options: FormOptions) -> Self {
        let defaults = Self::default();
        Self {
            modal_title: options.modal_title.unwrap_or(defaults.modal_title),
            post_url: options.post_url.unwrap_or(defaults.post_url),
            mode: match options.support {
                Some(true) => FormMode::Support,
                _ => FormMode::Sales,
            },
            ..defaults
        }
    }

    pub fn with_post_url(mut self, url: impl Into<String>) -> Self {
        self.post_url = url.into();
        self
    }

    pub fn on_open(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Arc::new(callback);
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&MetricsRecord) + Send + Sync + 'static) -> Self {
        self.on_success = Arc::new(callback);
        self
    }

    pub fn on_fail(mut self, callback: impl Fn(&MetricsRecord) + Send + Sync + 'static) -> Self {
        self.on_fail = Arc::new(callback);
        self
    }
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("modal_title", &self.modal_title)
            .field("post_url", &self.post_url)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
