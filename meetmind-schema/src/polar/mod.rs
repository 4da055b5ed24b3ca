//! Wire types for the Polar REST API and its webhook deliveries.
//!
//! Polar has renamed fields across API versions, so most fields are optional
//! and carry aliases for the older camelCase spellings.

mod order;
mod webhook;

pub use order::{
    PolarCustomer, PolarOrder, PolarOrderList, PolarPagination, PolarProduct, PolarUser,
};
pub use webhook::PolarWebhookEvent;
