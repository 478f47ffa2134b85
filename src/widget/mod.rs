//! Headless model of the contact/support modal.
//!
//! [`ContactForm`] owns the mounted modal: its fields, its submit button and
//! its visibility. A front end feeds it input events and renders whatever
//! state it exposes.

pub mod autocomplete;
pub mod button;
pub mod config;
pub mod fields;
pub mod query;
pub mod transport;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::types::{FormData, MetricsRecord, PageContext, SubmissionPayload};
use autocomplete::{ClearbitLookup, CompanyLookup};
use button::{ButtonState, SubmitButton};
use config::FormConfig;
use fields::{Field, FormMode};
use transport::{HttpSubmitter, SubmitError, Submitter};

/// Time the success animation gets before the modal closes itself.
pub const CLOSE_AFTER_SUCCESS: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("The modal is not shown")]
    NotShown,
    #[error("No field named '{0}' in this form")]
    UnknownField(String),
}

/// What came of a submit attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    Sent,
    Invalid { fields: Vec<&'static str> },
    Failed(SubmitError),
    /// A previous submission is still waiting for the relay.
    InFlight,
}

/// One mounted modal instance. Dropping it aborts its timers.
pub struct Modal {
    title: String,
    mode: FormMode,
    fields: Vec<Field>,
    email: Option<usize>,
    company: Option<usize>,
    button: SubmitButton,
    open: Arc<watch::Sender<bool>>,
    close_timer: Option<JoinHandle<()>>,
}

impl Modal {
    fn mount(config: &FormConfig) -> Self {
        let fields: Vec<Field> = config.mode.fields().iter().map(Field::mount).collect();
        let email = fields.iter().position(Field::is_email);
        let company = fields.iter().position(|f| f.name() == "company");
        let (open, _) = watch::channel(false);

        Self {
            title: config.modal_title.clone(),
            mode: config.mode,
            fields,
            email,
            company,
            button: SubmitButton::new(),
            open: Arc::new(open),
            close_timer: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn button(&self) -> &SubmitButton {
        &self.button
    }

    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Receiver that observes every open/close of this modal.
    pub fn visibility(&self) -> watch::Receiver<bool> {
        self.open.subscribe()
    }

    pub fn close(&mut self) {
        if let Some(timer) = self.close_timer.take() {
            timer.abort();
        }
        self.open.send_replace(false);
    }

    fn open(&mut self) {
        self.open.send_replace(true);
    }

    fn close_after(&mut self, delay: Duration) {
        if let Some(timer) = self.close_timer.take() {
            timer.abort();
        }
        let open = Arc::clone(&self.open);
        self.close_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            open.send_replace(false);
        }));
    }

    fn index_of(&self, name: &str) -> Result<usize, WidgetError> {
        self.fields
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| WidgetError::UnknownField(name.to_string()))
    }

    fn set_company(&mut self, value: &str) {
        if let Some(company) = self.company {
            self.fields[company].set_value(value);
        }
    }

    /// Recompute every error flag; returns the names of invalid fields.
    fn revalidate(&mut self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        for field in &mut self.fields {
            let valid = validation::is_field_valid(field.spec(), field.value());
            field.set_error(!valid);
            if !valid {
                invalid.push(field.name());
            }
        }
        invalid
    }

    fn collect(&self) -> FormData {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), f.value().to_string()))
            .collect()
    }

    fn clear_inputs(&mut self) {
        for field in self.fields.iter_mut().filter(|f| !f.is_select()) {
            field.set_value("");
        }
    }
}

impl Drop for Modal {
    fn drop(&mut self) {
        if let Some(timer) = self.close_timer.take() {
            timer.abort();
        }
    }
}

/// The contact form widget.
pub struct ContactForm<L = ClearbitLookup, S = HttpSubmitter> {
    config: FormConfig,
    page: PageContext,
    lookup: L,
    submitter: S,
    modal: Option<Modal>,
}

impl ContactForm {
    /// Widget wired to the public autocomplete API and an HTTP relay.
    pub fn new(config: FormConfig, page: PageContext) -> Self {
        Self::with_services(config, page, ClearbitLookup::default(), HttpSubmitter::default())
    }
}

impl<L: CompanyLookup, S: Submitter> ContactForm<L, S> {
    pub fn with_services(config: FormConfig, page: PageContext, lookup: L, submitter: S) -> Self {
        Self {
            config,
            page,
            lookup,
            submitter,
            modal: None,
        }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut Modal> {
        self.modal.as_mut()
    }

    pub fn button_state(&self) -> Option<ButtonState> {
        self.modal.as_ref().map(|m| m.button.state())
    }

    /// Throw away any mounted modal, mount a fresh one and open it.
    pub fn show(&mut self) -> &Modal {
        if self.modal.take().is_some() {
            tracing::debug!("Discarding previous modal instance");
        }

        let mut modal = Modal::mount(&self.config);
        modal.open();
        tracing::info!(title = %modal.title, mode = ?modal.mode, "Contact form opened");
        (self.config.on_open)();

        self.modal.insert(modal)
    }

    pub fn close(&mut self) {
        if let Some(modal) = self.modal.as_mut() {
            modal.close();
        }
    }

    /// Handle an input event: store the value, recompute the field's error
    /// flag and, for a valid email, refresh the company field.
    pub async fn input(&mut self, name: &str, value: &str) -> Result<bool, WidgetError> {
        let modal = self.modal.as_mut().ok_or(WidgetError::NotShown)?;
        let index = modal.index_of(name)?;

        let field = &mut modal.fields[index];
        field.set_value(value);
        let valid = validation::is_field_valid(field.spec(), value);
        field.set_error(!valid);
        tracing::debug!(field = name, valid, "Field input");

        if valid && modal.email == Some(index) {
            let domain = validation::email_domain(value.trim()).to_string();
            if validation::is_free_mail_domain(&domain) {
                modal.set_company("");
            } else if modal.company.is_some() {
                self.autocomplete_company(&domain).await;
            }
        }

        Ok(valid)
    }

    /// The host reported a field as invalid (e.g. native constraint checks).
    /// Ignored while a submission is in flight.
    pub fn invalid(&mut self) -> Result<(), WidgetError> {
        let modal = self.modal.as_ref().ok_or(WidgetError::NotShown)?;
        if let Err(e) = modal.button.transition(ButtonState::Error) {
            tracing::debug!("{}", e);
        }
        Ok(())
    }

    async fn autocomplete_company(&mut self, domain: &str) {
        match self.lookup.suggest(domain).await {
            Ok(suggestions) => {
                let Some(first) = suggestions.into_iter().next() else {
                    tracing::debug!(domain, "No company suggestion");
                    return;
                };
                tracing::debug!(domain, company = %first.name, "Company autocompleted");
                if let Some(modal) = self.modal.as_mut() {
                    modal.set_company(&first.name);
                }
            }
            Err(e) => tracing::warn!(domain, "Company lookup failed: {}", e),
        }
    }

    /// Validate, post and settle the button. Never returns the relay's body.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, WidgetError> {
        let modal = self.modal.as_mut().ok_or(WidgetError::NotShown)?;
        if modal.button.transition(ButtonState::Processing).is_err() {
            return Ok(SubmitOutcome::InFlight);
        }

        let invalid = modal.revalidate();
        if !invalid.is_empty() {
            tracing::debug!(?invalid, "Submission blocked by validation");
            settle(&modal.button, ButtonState::Error);
            return Ok(SubmitOutcome::Invalid { fields: invalid });
        }

        let fields = modal.collect();
        let metrics = MetricsRecord::new(&self.page, &fields);
        let payload = SubmissionPayload {
            fields,
            subject: modal.mode.subject(),
        };

        let guard = modal.button.processing_guard();
        let result = self.submitter.post(&self.config.post_url, &payload).await;
        guard.disarm();
        let modal = self.modal.as_mut().ok_or(WidgetError::NotShown)?;
        match result {
            Ok(()) => {
                tracing::info!(subject = %payload.subject, "Submission sent");
                settle(&modal.button, ButtonState::Success);
                modal.clear_inputs();
                (self.config.on_success)(&metrics);
                modal.close_after(CLOSE_AFTER_SUCCESS);
                Ok(SubmitOutcome::Sent)
            }
            Err(e) => {
                tracing::warn!(subject = %payload.subject, "Submission failed: {}", e);
                settle(&modal.button, ButtonState::Error);
                (self.config.on_fail)(&metrics);
                Ok(SubmitOutcome::Failed(e))
            }
        }
    }
}

fn settle(button: &SubmitButton, to: ButtonState) {
    if let Err(e) = button.transition(to) {
        tracing::warn!("{}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subject;
    use autocomplete::{CompanySuggestion, LookupError};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    #[derive(Default, Clone)]
    struct FakeLookup {
        queries: Arc<Mutex<Vec<String>>>,
        names: Vec<&'static str>,
    }

    impl CompanyLookup for FakeLookup {
        async fn suggest(&self, domain: &str) -> Result<Vec<CompanySuggestion>, LookupError> {
            self.queries.lock().unwrap().push(domain.to_string());
            Ok(self
                .names
                .iter()
                .map(|name| CompanySuggestion {
                    name: name.to_string(),
                    domain: Some(domain.to_string()),
                    logo: None,
                })
                .collect())
        }
    }

    #[derive(Default, Clone)]
    struct FakeSubmitter {
        posted: Arc<Mutex<Vec<(String, SubmissionPayload)>>>,
        reject: bool,
    }

    impl Submitter for FakeSubmitter {
        async fn post(&self, url: &str, payload: &SubmissionPayload) -> Result<(), SubmitError> {
            self.posted
                .lock()
                .unwrap()
                .push((url.to_string(), payload.clone()));
            if self.reject {
                Err(SubmitError::Rejected {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn page() -> PageContext {
        PageContext::new(Url::parse("https://goextend.io/pricing").unwrap()).with_title("Pricing")
    }

    fn sales_form(
        lookup: FakeLookup,
        submitter: FakeSubmitter,
    ) -> ContactForm<FakeLookup, FakeSubmitter> {
        let config = FormConfig::default().with_post_url("http://relay.test/");
        ContactForm::with_services(config, page(), lookup, submitter)
    }

    async fn fill_sales(form: &mut ContactForm<FakeLookup, FakeSubmitter>) {
        form.input("name", "Jane Doe").await.unwrap();
        form.input("email", "jane@acme.io").await.unwrap();
        form.input("message", "We want to talk").await.unwrap();
        form.input("company", "Acme").await.unwrap();
        form.input("role", "CTO").await.unwrap();
    }

    #[tokio::test]
    async fn show_resets_and_fires_open_callback() {
        let opened = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&opened);
        let config = FormConfig::default().on_open(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut form = ContactForm::with_services(
            config,
            page(),
            FakeLookup::default(),
            FakeSubmitter::default(),
        );

        form.show();
        form.input("name", "Jane").await.unwrap();
        let modal = form.show();

        assert!(modal.is_open());
        assert_eq!(modal.title(), "Talk to Sales");
        assert_eq!(modal.field("name").unwrap().value(), "");
        assert_eq!(opened.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn input_flags_errors_per_field() {
        let mut form = sales_form(FakeLookup::default(), FakeSubmitter::default());
        form.show();

        assert!(!form.input("name", "").await.unwrap());
        assert!(form.modal().unwrap().field("name").unwrap().has_error());
        assert!(form.input("name", "Jane").await.unwrap());
        assert!(!form.modal().unwrap().field("name").unwrap().has_error());
        assert_eq!(
            form.input("hostUrl", "x").await,
            Err(WidgetError::UnknownField("hostUrl".into()))
        );
    }

    #[tokio::test]
    async fn free_mail_clears_company_without_lookup() {
        let lookup = FakeLookup {
            names: vec!["Google"],
            ..Default::default()
        };
        let mut form = sales_form(lookup.clone(), FakeSubmitter::default());
        form.show();
        form.input("company", "Stale Inc").await.unwrap();

        form.input("email", "jane@gmail.com").await.unwrap();

        assert_eq!(form.modal().unwrap().field("company").unwrap().value(), "");
        assert!(lookup.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn business_mail_populates_company_from_first_suggestion() {
        let lookup = FakeLookup {
            names: vec!["Acme", "Acme Labs"],
            ..Default::default()
        };
        let mut form = sales_form(lookup.clone(), FakeSubmitter::default());
        form.show();

        form.input("email", "jane@acme.io").await.unwrap();

        assert_eq!(*lookup.queries.lock().unwrap(), ["acme.io"]);
        assert_eq!(
            form.modal().unwrap().field("company").unwrap().value(),
            "Acme"
        );
    }

    #[tokio::test]
    async fn invalid_email_skips_autocomplete() {
        let lookup = FakeLookup::default();
        let mut form = sales_form(lookup.clone(), FakeSubmitter::default());
        form.show();

        assert!(!form.input("email", "jane@acme").await.unwrap());
        assert!(lookup.queries.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_submission_never_posts() {
        let submitter = FakeSubmitter::default();
        let mut form = sales_form(FakeLookup::default(), submitter.clone());
        form.show();
        form.input("name", "Jane").await.unwrap();

        let outcome = form.submit().await.unwrap();

        assert!(matches!(
            outcome,
            SubmitOutcome::Invalid { ref fields } if fields == &["email", "message", "company", "role"]
        ));
        assert_eq!(form.button_state(), Some(ButtonState::Error));
        assert!(submitter.posted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_submission_clears_inputs_and_closes() {
        let submitter = FakeSubmitter::default();
        let successes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&successes);
        let config = FormConfig::default()
            .with_post_url("http://relay.test/")
            .on_success(move |m| sink.lock().unwrap().push(m.clone()));
        let mut form =
            ContactForm::with_services(config, page(), FakeLookup::default(), submitter.clone());
        form.show();
        fill_sales(&mut form).await;

        let outcome = form.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Sent));
        assert_eq!(form.button_state(), Some(ButtonState::Success));

        let posted = submitter.posted.lock().unwrap().clone();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, "http://relay.test/");
        assert_eq!(posted[0].1.subject, Subject::Sales);
        assert_eq!(posted[0].1.fields["company"], "Acme");

        let modal = form.modal().unwrap();
        assert!(modal.fields().iter().all(|f| f.value().is_empty()));

        let metrics = successes.lock().unwrap().clone();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].track_data.as_deref(), Some("jane@acme.io"));
        assert_eq!(metrics[0].path, "/pricing");

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert_eq!(form.button_state(), Some(ButtonState::Initial));
        assert!(form.modal().unwrap().is_open());
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(!form.modal().unwrap().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submission_reports_and_keeps_values() {
        let submitter = FakeSubmitter {
            reject: true,
            ..Default::default()
        };
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let config = FormConfig::default().on_fail(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut form =
            ContactForm::with_services(config, page(), FakeLookup::default(), submitter);
        form.show();
        fill_sales(&mut form).await;

        let outcome = form.submit().await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(form.button_state(), Some(ButtonState::Error));
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert_eq!(
            form.modal().unwrap().field("name").unwrap().value(),
            "Jane Doe"
        );
        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(form.button_state(), Some(ButtonState::Initial));
        assert!(form.modal().unwrap().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn support_submission_keeps_severity_selection() {
        let submitter = FakeSubmitter::default();
        let mut form = ContactForm::with_services(
            FormConfig::support(),
            page(),
            FakeLookup::default(),
            submitter.clone(),
        );
        form.show();
        form.input("name", "Jane").await.unwrap();
        form.input("email", "jane@gmail.com").await.unwrap();
        form.input("message", "It broke").await.unwrap();
        form.input("severity", "High").await.unwrap();

        assert!(matches!(form.submit().await.unwrap(), SubmitOutcome::Sent));

        let posted = submitter.posted.lock().unwrap().clone();
        assert_eq!(posted[0].1.subject, Subject::Support);
        assert_eq!(posted[0].1.fields["hostUrl"], "");
        let modal = form.modal().unwrap();
        assert_eq!(modal.field("severity").unwrap().value(), "High");
        assert_eq!(modal.field("message").unwrap().value(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_severity_blocks_submission() {
        let submitter = FakeSubmitter::default();
        let mut form = ContactForm::with_services(
            FormConfig::support(),
            page(),
            FakeLookup::default(),
            submitter.clone(),
        );
        form.show();
        form.input("name", "Jane").await.unwrap();
        form.input("email", "jane@gmail.com").await.unwrap();
        form.input("message", "It broke").await.unwrap();

        assert!(!form.input("severity", "Bogus").await.unwrap());
        assert!(form.modal().unwrap().field("severity").unwrap().has_error());

        let outcome = form.submit().await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Invalid { ref fields } if fields == &["severity"]
        ));
        assert!(submitter.posted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_event_shows_error_then_reverts() {
        let mut form = sales_form(FakeLookup::default(), FakeSubmitter::default());
        form.show();

        form.invalid().unwrap();
        assert_eq!(form.button_state(), Some(ButtonState::Error));
        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(form.button_state(), Some(ButtonState::Initial));

        fill_sales(&mut form).await;
        assert!(matches!(form.submit().await.unwrap(), SubmitOutcome::Sent));
        assert_eq!(form.button_state(), Some(ButtonState::Success));

        form.invalid().unwrap();
        assert_eq!(form.button_state(), Some(ButtonState::Error));
        tokio::time::sleep(Duration::from_millis(1_900)).await;
        assert_eq!(form.button_state(), Some(ButtonState::Error));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(form.button_state(), Some(ButtonState::Initial));
    }

    /// Hangs on the first post, succeeds afterwards.
    #[derive(Default, Clone)]
    struct StallingSubmitter {
        calls: Arc<AtomicUsize>,
    }

    impl Submitter for StallingSubmitter {
        async fn post(&self, _url: &str, _payload: &SubmissionPayload) -> Result<(), SubmitError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_submit_does_not_wedge_the_button() {
        let submitter = StallingSubmitter::default();
        let config = FormConfig::default().with_post_url("http://relay.test/");
        let mut form =
            ContactForm::with_services(config, page(), FakeLookup::default(), submitter.clone());
        form.show();
        form.input("name", "Jane Doe").await.unwrap();
        form.input("email", "jane@acme.io").await.unwrap();
        form.input("message", "We want to talk").await.unwrap();
        form.input("company", "Acme").await.unwrap();
        form.input("role", "CTO").await.unwrap();

        let attempt = tokio::time::timeout(Duration::from_secs(1), form.submit()).await;
        assert!(attempt.is_err());
        assert_eq!(form.button_state(), Some(ButtonState::Error));

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(form.button_state(), Some(ButtonState::Initial));

        assert!(matches!(form.submit().await.unwrap(), SubmitOutcome::Sent));
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 2);
        assert_eq!(form.button_state(), Some(ButtonState::Success));
    }

    #[tokio::test]
    async fn operations_before_show_are_rejected() {
        let mut form = sales_form(FakeLookup::default(), FakeSubmitter::default());
        assert_eq!(form.input("name", "x").await, Err(WidgetError::NotShown));
        assert!(matches!(form.submit().await, Err(WidgetError::NotShown)));
    }
}
