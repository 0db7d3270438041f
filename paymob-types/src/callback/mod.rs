//! Inbound gateway callbacks: server-pushed webhooks and browser redirects.

mod de;
pub mod redirect;
pub mod webhook;

pub use redirect::RedirectRecord;
pub use webhook::{OrderRef, SourceData, TokenObject, TransactionObject, WebhookEnvelope};
