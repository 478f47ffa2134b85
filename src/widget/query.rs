//! `?contact=true` deep links: open the form on page load and drop the
//! marker from the address bar once the modal closes.

use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use url::Url;

use super::ContactForm;
use super::autocomplete::CompanyLookup;
use super::config::FormConfig;
use super::transport::Submitter;
use crate::types::PageContext;

pub const AUTO_OPEN_KEY: &str = "contact";
pub const AUTO_OPEN_VALUE: &str = "true";

/// Replaces the current history entry without a reload.
pub trait History: Send + Sync + 'static {
    fn replace_state(&self, url: &Url);
}

pub fn wants_auto_open(url: &Url) -> bool {
    url.query_pairs()
        .any(|(key, value)| key == AUTO_OPEN_KEY && value == AUTO_OPEN_VALUE)
}

/// `url` without its `contact=true` pair; other parameters keep their order.
pub fn strip_auto_open(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, value)| !(key == AUTO_OPEN_KEY && value == AUTO_OPEN_VALUE))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

/// Auto-opened form plus the task that cleans up the URL on close.
pub struct AutoOpened<L, S> {
    pub form: ContactForm<L, S>,
    pub cleanup: JoinHandle<()>,
}

/// Show a form when the page URL asks for it. Returns `None` otherwise.
///
/// The cleanup task finishes after the first close of the shown modal, or
/// silently if the modal is discarded by another `show()`.
pub fn handle_query_string<L, S, H>(
    config: FormConfig,
    page: PageContext,
    lookup: L,
    submitter: S,
    history: H,
) -> Option<AutoOpened<L, S>>
where
    L: CompanyLookup,
    S: Submitter,
    H: History,
{
    if !wants_auto_open(&page.url) {
        return None;
    }

    let target = strip_auto_open(&page.url);
    let mut form = ContactForm::with_services(config, page, lookup, submitter);
    let visibility = form.show().visibility();
    tracing::info!("Contact form auto-opened from query string");

    let cleanup = tokio::spawn(async move {
        let mut changes = WatchStream::new(visibility);
        while let Some(open) = changes.next().await {
            if !open {
                tracing::debug!(url = %target, "Removing auto-open marker");
                history.replace_state(&target);
                break;
            }
        }
    });

    Some(AutoOpened { form, cleanup })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::autocomplete::{CompanySuggestion, LookupError};
    use crate::widget::transport::SubmitError;
    use crate::types::SubmissionPayload;
    use std::sync::{Arc, Mutex};

    struct NoLookup;

    impl CompanyLookup for NoLookup {
        async fn suggest(&self, _: &str) -> Result<Vec<CompanySuggestion>, LookupError> {
            Ok(Vec::new())
        }
    }

    struct NoSubmit;

    impl Submitter for NoSubmit {
        async fn post(&self, _: &str, _: &SubmissionPayload) -> Result<(), SubmitError> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingHistory(Arc<Mutex<Vec<String>>>);

    impl History for RecordingHistory {
        fn replace_state(&self, url: &Url) {
            self.0.lock().unwrap().push(url.to_string());
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn detects_and_strips_marker() {
        assert!(wants_auto_open(&url("https://goextend.io/?contact=true")));
        assert!(!wants_auto_open(&url("https://goextend.io/?contact=false")));
        assert!(!wants_auto_open(&url("https://goextend.io/")));

        assert_eq!(
            strip_auto_open(&url("https://goextend.io/pricing?contact=true")).as_str(),
            "https://goextend.io/pricing"
        );
        assert_eq!(
            strip_auto_open(&url("https://goextend.io/?a=1&contact=true&b=2")).as_str(),
            "https://goextend.io/?a=1&b=2"
        );
    }

    #[tokio::test]
    async fn no_marker_no_form() {
        let page = PageContext::new(url("https://goextend.io/"));
        let opened = handle_query_string(
            FormConfig::default(),
            page,
            NoLookup,
            NoSubmit,
            RecordingHistory::default(),
        );
        assert!(opened.is_none());
    }

    #[tokio::test]
    async fn closing_auto_opened_modal_rewrites_history() {
        let history = RecordingHistory::default();
        let page = PageContext::new(url("https://goextend.io/docs?contact=true&tab=2"));
        let mut opened = handle_query_string(
            FormConfig::default(),
            page,
            NoLookup,
            NoSubmit,
            history.clone(),
        )
        .expect("marker present");

        assert!(opened.form.modal().unwrap().is_open());
        assert!(history.0.lock().unwrap().is_empty());

        opened.form.close();
        opened.cleanup.await.unwrap();

        assert_eq!(
            *history.0.lock().unwrap(),
            ["https://goextend.io/docs?tab=2"]
        );
    }
}
