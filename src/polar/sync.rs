//! Pulls Polar orders page by page and upserts them as payments.

use chrono::{SecondsFormat, Utc};
use meetmind_schema::PolarOrder;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::client::PolarClient;
use super::mapping::order_to_upsert;
use crate::db::{DbActorHandle, UpsertOutcome};
use crate::error::{MeetmindError, PolarError};

/// Orders echoed back per page in the debug trail.
const SAMPLE_ITEMS: usize = 2;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub total_processed: u64,
    pub new_payments: u64,
    pub updated_payments: u64,
    pub skipped_duplicates: u64,
    pub orders_only: bool,
    pub timestamp: String,
}

/// What happened to one page request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTrace {
    pub method: &'static str,
    pub page: u32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDebug {
    pub organization_id: String,
    pub methods: Vec<PageTrace>,
    pub processed_orders: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub stats: SyncStats,
    pub debug: SyncDebug,
}

impl SyncReport {
    pub fn message(&self) -> String {
        format!(
            "Orders sync completed: {} new, {} updated, {} skipped",
            self.stats.new_payments, self.stats.updated_payments, self.stats.skipped_duplicates
        )
    }

    fn record(&mut self, outcome: Option<UpsertOutcome>) {
        match outcome {
            Some(UpsertOutcome::Created) => {
                self.stats.new_payments += 1;
                self.stats.total_processed += 1;
            }
            Some(UpsertOutcome::Updated) => {
                self.stats.updated_payments += 1;
                self.stats.total_processed += 1;
            }
            _ => self.stats.skipped_duplicates += 1,
        }
    }
}

/// Runs one sync pass.
///
/// Only a missing access token fails the whole run; a failing page ends
/// pagination and is reported in the debug trail, a failing order is skipped.
pub async fn sync_orders(
    client: &PolarClient,
    db: &DbActorHandle,
) -> Result<SyncReport, MeetmindError> {
    if !client.has_token() {
        return Err(PolarError::MissingAccessToken.into());
    }

    let mut report = SyncReport {
        stats: SyncStats {
            orders_only: true,
            ..SyncStats::default()
        },
        debug: SyncDebug {
            organization_id: client.organization_id.clone(),
            ..SyncDebug::default()
        },
    };
    let mut seen: HashSet<String> = HashSet::new();

    info!(organization_id = %client.organization_id, "Polar orders sync started");

    for page in 1..=client.max_pages {
        let list = match client.list_orders(page).await {
            Ok(list) => list,
            Err(e) => {
                warn!(page, error = %e, "Polar orders page failed; stopping pagination");
                let status = match &e {
                    PolarError::UpstreamStatus { status, .. } => Some(status.as_u16()),
                    _ => None,
                };
                report.debug.methods.push(PageTrace {
                    method: "orders",
                    page,
                    success: false,
                    count: None,
                    status,
                    error: Some(e.to_string()),
                    data: Vec::new(),
                });
                break;
            }
        };

        let item_count = list.items.len();
        report.debug.methods.push(PageTrace {
            method: "orders",
            page,
            success: true,
            count: Some(item_count),
            status: None,
            error: None,
            data: list.items.iter().take(SAMPLE_ITEMS).cloned().collect(),
        });

        for raw in &list.items {
            let order = match serde_json::from_value::<PolarOrder>(raw.clone()) {
                Ok(order) => order,
                Err(e) => {
                    warn!(page, error = %e, "Skipping malformed Polar order");
                    report.record(None);
                    continue;
                }
            };
            if !seen.insert(order.id.clone()) {
                continue;
            }

            let upsert = order_to_upsert(&order, raw, Utc::now());
            let outcome = match db.upsert_polar_payment(upsert).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "Polar order upsert failed");
                    None
                }
            };
            debug!(order_id = %order.id, ?outcome, "Polar order processed");
            report.record(outcome);
            report.debug.processed_orders.push(order.id);
        }

        let last_page = match list.pagination {
            Some(p) if p.max_page > 0 => page >= p.max_page,
            _ => item_count < client.page_limit as usize,
        };
        if item_count == 0 || last_page {
            break;
        }
    }

    report.stats.timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    info!(
        new = report.stats.new_payments,
        updated = report.stats.updated_payments,
        skipped = report.stats.skipped_duplicates,
        pages = report.debug.methods.len(),
        "Polar orders sync finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_count_only_written_rows() {
        let mut report = SyncReport::default();
        report.record(Some(UpsertOutcome::Created));
        report.record(Some(UpsertOutcome::Updated));
        report.record(Some(UpsertOutcome::Updated));
        report.record(None);

        assert_eq!(report.stats.total_processed, 3);
        assert_eq!(report.stats.new_payments, 1);
        assert_eq!(report.stats.updated_payments, 2);
        assert_eq!(report.stats.skipped_duplicates, 1);
        assert_eq!(
            report.message(),
            "Orders sync completed: 1 new, 2 updated, 1 skipped"
        );
    }
}
