//! Per-field validity rules and the free-mail domain list used to gate
//! company autocomplete.

use std::sync::OnceLock;

use regex::Regex;

use super::fields::{FieldKind, FieldSpec};

/// Consumer webmail providers. Their domains say nothing about the sender's
/// employer, so autocomplete skips them.
pub const FREE_MAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "live.com",
    "hotmail.com",
    "outlook.com",
    "yahoo.com",
    "aol.com",
    "icloud.com",
    "gmx.com",
    "gmx.us",
    "lycos.com",
    "mail.com",
    "inbox.com",
];

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern compiles")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

pub fn is_free_mail_domain(domain: &str) -> bool {
    FREE_MAIL_DOMAINS
        .iter()
        .any(|free| free.eq_ignore_ascii_case(domain))
}

/// Everything after the last `@`.
pub fn email_domain(email: &str) -> &str {
    email.rsplit_once('@').map_or(email, |(_, domain)| domain)
}

/// Validity of a raw input value against its field's attributes.
///
/// Emails must match the address shape whenever they are required or
/// non-empty. A filled select must hold one of its options. Text only has
/// to be non-empty when required.
pub fn is_field_valid(spec: &FieldSpec, raw: &str) -> bool {
    let value = raw.trim();
    let has_value = !value.is_empty();
    match spec.kind {
        FieldKind::Email if spec.required || has_value => is_valid_email(value),
        FieldKind::Email => true,
        FieldKind::Select { options, .. } if spec.required || has_value => {
            options.contains(&value)
        }
        FieldKind::Select { .. } => true,
        FieldKind::Text => !spec.required || has_value,
    }
}
