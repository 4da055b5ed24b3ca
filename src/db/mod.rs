//! Database module: every SQL statement the service runs.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `patch.rs`: create/patch payloads and query parameters
//! - `actor.rs`: the `DbActor` that owns the pool; everything else goes through its handle

pub mod actor;
pub mod models;
pub mod patch;
pub mod schema;

mod aggregates;
mod meetings;
mod orders;
mod patch_impl;
mod payments;
mod reconcile;
mod users;

pub use models::{
    CleanupStats, DailyRevenue, DbAgent, DbAgentWithMeetings, DbMeeting, DbMeetingDetail, DbOrder,
    DbPayment, DbUser, MeetingStatus, OrderStatus, PaymentStatus, SessionUser, StatusCurrencyTotal,
    StatusShare, UpsertOutcome, UserStats,
};
pub use patch::{
    AgentCreate, DateRange, EntityPatch, MeetingCreate, OrderCreate, OrderPatch, PaymentCreate,
    PaymentFilter, PaymentPatch, PaymentWindow, PolarKey, PolarPaymentUpsert, SessionCreate,
    SortOrder, UserCreate, UserPatch,
};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorHandle, spawn};

/// `%term%` for a `LIKE ... ESCAPE '\'` clause, with the term's own
/// wildcards matched literally.
pub(crate) fn like_contains(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_in_terms_are_escaped() {
        assert_eq!(like_contains("ann"), "%ann%");
        assert_eq!(like_contains("50%_off"), r"%50\%\_off%");
        assert_eq!(like_contains(r"a\b"), r"%a\\b%");
    }
}
