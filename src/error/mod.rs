mod meetmind;
mod polar;
mod webhook;

pub use meetmind::{ApiErrorBody, MeetmindError};
pub use polar::PolarError;
pub use webhook::WebhookError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
