//! Contact/support form model and the relay that forwards its submissions to
//! the contacts and ticketing platforms.

pub mod logging;
pub mod relay;
pub mod types;
pub mod widget;

pub use relay::{Receipt, Relay, RelayError};
pub use types::{FormData, MetricsRecord, PageContext, Subject, SubmissionPayload};
pub use widget::button::ButtonState;
pub use widget::config::{FormConfig, FormOptions};
pub use widget::{ContactForm, SubmitOutcome, WidgetError};
