//! `/api/payments/reports` and `/api/polar/reports`.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::attachment;
use crate::db::{PaymentWindow, SortOrder};
use crate::error::MeetmindError;
use crate::reports::export::payments_csv;
use crate::reports::payments::{self, DETAILED_ROW_LIMIT};
use crate::reports::period::ReportPeriod;
use crate::reports::polar::{self as polar_reports, PolarReportType};
use crate::reports::{ReportFormat, ReportType, payment_report_pdf, timestamp};
use crate::server::router::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments/reports", get(payment_report))
        .route("/api/polar/reports", get(polar_report))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub format: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// JSON envelope shared by both report endpoints.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<T> {
    pub report_type: &'static str,
    pub generated_at: String,
    pub period: ReportPeriod,
    pub data: T,
}

/// GET /api/payments/reports?type=&format=&start_date=&end_date=
pub async fn payment_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, MeetmindError> {
    let report_type = query
        .report_type
        .as_deref()
        .unwrap_or("summary")
        .parse::<ReportType>()?;
    let format = query
        .format
        .as_deref()
        .unwrap_or("json")
        .parse::<ReportFormat>()?;
    let period = ReportPeriod::parse(query.start_date, query.end_date)?;
    let now = Utc::now();

    // CSV exports every row in the window.
    let limit = (format != ReportFormat::Csv && report_type == ReportType::Detailed)
        .then_some(DETAILED_ROW_LIMIT);
    let rows = state
        .db
        .load_payments(PaymentWindow {
            range: period.range,
            order: SortOrder::NewestFirst,
            limit,
        })
        .await?;
    info!(
        report_type = report_type.as_str(),
        ?format,
        rows = rows.len(),
        "payment report requested"
    );

    let day = now.format("%Y-%m-%d");
    match format {
        ReportFormat::Csv => Ok(attachment(
            "text/csv; charset=utf-8",
            &format!("payments-{day}.csv"),
            payments_csv(&rows)?,
        )),
        ReportFormat::Pdf => {
            let report = payments::build(report_type, &rows, &period, now);
            let bytes = payment_report_pdf(&report, report_type, &period, now)?;
            Ok(attachment(
                "application/pdf",
                &format!("payment-report-{}-{day}.pdf", report_type.as_str()),
                bytes,
            ))
        }
        ReportFormat::Json => {
            let data = payments::build(report_type, &rows, &period, now);
            Ok(Json(ReportEnvelope {
                report_type: report_type.as_str(),
                generated_at: timestamp(now),
                period,
                data,
            })
            .into_response())
        }
    }
}

/// GET /api/polar/reports?type=&start_date=&end_date=
pub async fn polar_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportEnvelope<polar_reports::PolarReport>>, MeetmindError> {
    let report_type = query
        .report_type
        .as_deref()
        .unwrap_or("summary")
        .parse::<PolarReportType>()?;
    let period = ReportPeriod::parse(query.start_date, query.end_date)?;
    let data = polar_reports::build(&state.db, report_type, &period).await?;
    Ok(Json(ReportEnvelope {
        report_type: report_type.as_str(),
        generated_at: timestamp(Utc::now()),
        period,
        data,
    }))
}
