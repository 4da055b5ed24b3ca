//! `/api/polar/reports`: the same data as the payment reports, grouped in SQL.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

use super::period::ReportPeriod;
use crate::db::{
    DailyRevenue, DbActorHandle, DbPayment, PaymentStatus, PaymentWindow, SortOrder,
    StatusCurrencyTotal, StatusShare,
};
use crate::error::MeetmindError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarReportType {
    Summary,
    Detailed,
    Analytics,
}

impl PolarReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            PolarReportType::Summary => "summary",
            PolarReportType::Detailed => "detailed",
            PolarReportType::Analytics => "analytics",
        }
    }
}

impl FromStr for PolarReportType {
    type Err = MeetmindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(PolarReportType::Summary),
            "detailed" => Ok(PolarReportType::Detailed),
            "analytics" => Ok(PolarReportType::Analytics),
            _ => Err(MeetmindError::bad_request(
                "Invalid report type. Use: summary, detailed, or analytics",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PolarSummary {
    pub payment_summary: Vec<StatusCurrencyTotal>,
    pub total_transactions: i64,
    pub total_revenue: i64,
}

impl PolarSummary {
    pub fn from_rows(rows: Vec<StatusCurrencyTotal>) -> Self {
        Self {
            total_transactions: rows.iter().map(|r| r.count).sum(),
            total_revenue: rows
                .iter()
                .filter(|r| r.status == PaymentStatus::Succeeded)
                .map(|r| r.total)
                .sum(),
            payment_summary: rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PolarTransaction {
    pub id: String,
    pub customer_email: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<DbPayment> for PolarTransaction {
    fn from(p: DbPayment) -> Self {
        Self {
            id: p.id,
            customer_email: p.customer_email,
            amount: p.amount,
            currency: p.currency,
            status: p.status,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRangeEcho {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolarDetailed {
    pub transactions: Vec<PolarTransaction>,
    pub transaction_count: usize,
    pub date_range: DateRangeEcho,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsPeriod {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_days: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolarAnalytics {
    pub daily_revenue: Vec<DailyRevenue>,
    pub status_distribution: Vec<StatusShare>,
    pub analytics_period: AnalyticsPeriod,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PolarReport {
    Summary(PolarSummary),
    Detailed(PolarDetailed),
    Analytics(PolarAnalytics),
}

pub async fn build(
    db: &DbActorHandle,
    report_type: PolarReportType,
    period: &ReportPeriod,
) -> Result<PolarReport, MeetmindError> {
    let range = period.range;
    Ok(match report_type {
        PolarReportType::Summary => {
            PolarReport::Summary(PolarSummary::from_rows(db.status_currency_totals(range).await?))
        }
        PolarReportType::Detailed => {
            let rows = db
                .load_payments(PaymentWindow {
                    range,
                    order: SortOrder::OldestFirst,
                    limit: None,
                })
                .await?;
            let transactions: Vec<PolarTransaction> = rows.into_iter().map(Into::into).collect();
            PolarReport::Detailed(PolarDetailed {
                transaction_count: transactions.len(),
                transactions,
                date_range: DateRangeEcho {
                    start: period.start_date.clone(),
                    end: period.end_date.clone(),
                },
            })
        }
        PolarReportType::Analytics => {
            let daily_revenue = db.daily_revenue(range).await?;
            let status_distribution = db.status_shares(range).await?;
            PolarReport::Analytics(PolarAnalytics {
                analytics_period: AnalyticsPeriod {
                    start_date: period.start_date.clone(),
                    end_date: period.end_date.clone(),
                    total_days: daily_revenue.len(),
                },
                daily_revenue,
                status_distribution,
            })
        }
    })
}
