//! Polar payment provider: REST client, order mapping, sync and webhooks.

pub mod client;
pub mod mapping;
pub mod sync;
pub mod webhook;

pub use client::PolarClient;
pub use sync::{SyncReport, sync_orders};
pub use webhook::{SIGNATURE_HEADER, WebhookOutcome, dispatch, verify_signature};
