use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use contact_form::widget::autocomplete::ClearbitLookup;
use contact_form::widget::query::{self, History};
use contact_form::widget::transport::HttpSubmitter;
use contact_form::{ContactForm, FormConfig, PageContext, SubmitOutcome, logging};
use dotenvy::dotenv;
use url::Url;

/// Drive a contact form from the command line against a running relay.
#[derive(Debug, Parser)]
#[command(name = "playground")]
struct Args {
    /// Open the support ticket form instead of the sales form.
    #[arg(long)]
    support: bool,

    #[arg(long, env = "PLAYGROUND_POST_URL", default_value = "http://127.0.0.1:3000/")]
    post_url: String,

    /// Page the form is "embedded" in; add `?contact=true` to auto-open.
    #[arg(long, default_value = "http://localhost:8080/playground")]
    page_url: Url,

    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    message: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    host_url: Option<String>,
    #[arg(long)]
    severity: Option<String>,
}

impl Args {
    fn value_for(&self, field: &str) -> Option<&str> {
        match field {
            "name" => self.name.as_deref(),
            "email" => self.email.as_deref(),
            "message" => self.message.as_deref(),
            "company" => self.company.as_deref(),
            "role" => self.role.as_deref(),
            "hostUrl" => self.host_url.as_deref(),
            "severity" => self.severity.as_deref(),
            _ => None,
        }
    }
}

struct PrintHistory;

impl History for PrintHistory {
    fn replace_state(&self, url: &Url) {
        println!("[History] replaceState -> {}", url);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    if let Err(e) = logging::init() {
        eprintln!("[Playground] Logging unavailable: {}", e);
    }

    let args = Args::parse();
    let base = if args.support {
        FormConfig::support()
    } else {
        FormConfig::default()
    };
    let config = base
        .with_post_url(&args.post_url)
        .on_open(|| println!("[Playground] Modal opened"))
        .on_success(|metrics| {
            println!(
                "[Playground] Success: {}",
                serde_json::to_string(metrics).unwrap_or_default()
            )
        })
        .on_fail(|metrics| {
            println!(
                "[Playground] Failed: {}",
                serde_json::to_string(metrics).unwrap_or_default()
            )
        });

    let page = PageContext::new(args.page_url.clone()).with_title("Contact form playground");
    let client = reqwest::Client::new();
    let lookup = ClearbitLookup::new(client.clone());
    let submitter = HttpSubmitter::new(client);

    let (mut form, cleanup) = match query::handle_query_string(
        config.clone(),
        page.clone(),
        lookup.clone(),
        submitter.clone(),
        PrintHistory,
    ) {
        Some(opened) => (opened.form, Some(opened.cleanup)),
        None => {
            let mut form = ContactForm::with_services(config, page, lookup, submitter);
            form.show();
            (form, None)
        }
    };

    let modal = form.modal().context("modal should be mounted")?;
    println!("[Playground] {} ({:?})", modal.title(), modal.mode());
    let names: Vec<&'static str> = modal.fields().iter().map(|f| f.name()).collect();
    let mut button = modal.button().subscribe();
    let mut visibility = modal.visibility();

    tokio::spawn(async move {
        while button.changed().await.is_ok() {
            let state = *button.borrow_and_update();
            println!(
                "[Button] {:?} label={:?} classes={:?}",
                state,
                state.label(),
                state.classes()
            );
        }
    });

    for name in names {
        if let Some(value) = args.value_for(name) {
            let valid = form.input(name, value).await?;
            println!("[Field] {} valid={}", name, valid);
        }
    }
    if let Some(company) = form.modal().and_then(|m| m.field("company")) {
        println!("[Field] company now {:?}", company.value());
    }

    match form.submit().await? {
        SubmitOutcome::Sent => {
            println!("[Playground] Sent; waiting for the modal to close...");
            let closed = visibility.wait_for(|open| !*open);
            if tokio::time::timeout(Duration::from_secs(6), closed).await.is_err() {
                eprintln!("[Playground] Modal did not close in time");
            }
        }
        SubmitOutcome::Invalid { fields } => {
            println!("[Playground] Invalid fields: {}", fields.join(", "));
            form.close();
        }
        SubmitOutcome::Failed(e) => {
            println!("[Playground] Submission failed: {:#}", e);
            form.close();
        }
        SubmitOutcome::InFlight => {}
    }

    // Let the last button revert print.
    tokio::time::sleep(Duration::from_secs(3)).await;

    if let Some(cleanup) = cleanup {
        form.close();
        if let Err(e) = cleanup.await {
            eprintln!("[Playground] History cleanup task failed: {}", e);
        }
    }
    Ok(())
}
