//! Report builders and renderers (JSON, CSV, PDF).

pub mod export;
pub mod meetings;
pub mod orders;
pub mod payments;
pub mod pdf;
pub mod period;
pub mod polar;

use chrono::{DateTime, SecondsFormat, Utc};
use std::str::FromStr;

use crate::error::MeetmindError;
use payments::PaymentReport;
use pdf::{A4_PORTRAIT, PRIMARY, PdfWriter, money};
use period::ReportPeriod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Summary,
    Detailed,
    Analytics,
    Financial,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Summary => "summary",
            ReportType::Detailed => "detailed",
            ReportType::Analytics => "analytics",
            ReportType::Financial => "financial",
        }
    }
}

impl FromStr for ReportType {
    type Err = MeetmindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(ReportType::Summary),
            "detailed" => Ok(ReportType::Detailed),
            "analytics" => Ok(ReportType::Analytics),
            "financial" => Ok(ReportType::Financial),
            _ => Err(MeetmindError::bad_request(
                "Invalid report type. Use: summary, detailed, analytics, or financial",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Pdf,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = MeetmindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ReportFormat::Json),
            "pdf" => Ok(ReportFormat::Pdf),
            "csv" => Ok(ReportFormat::Csv),
            _ => Err(MeetmindError::bad_request(
                "Invalid format. Use: json, pdf, or csv",
            )),
        }
    }
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Renders a payment report as a portrait A4 PDF.
pub fn payment_report_pdf(
    report: &PaymentReport,
    report_type: ReportType,
    period: &ReportPeriod,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, MeetmindError> {
    let mut pdf = PdfWriter::new("MeetMind AI - Payment Report", A4_PORTRAIT)?
        .with_footer("Generated by MeetMind AI Platform");

    pdf.text_at(20.0, "MeetMind AI - Payment Report", 20.0, true, PRIMARY);
    pdf.gap(9.0);
    pdf.line(
        &format!("Report Type: {}", report_type.as_str().to_uppercase()),
        14.0,
        false,
        7.0,
    );
    pdf.line(
        &format!("Generated: {}", now.format("%Y-%m-%d %H:%M:%S UTC")),
        12.0,
        false,
        6.0,
    );
    if let (Some(start), Some(end)) = (&period.start_date, &period.end_date) {
        pdf.line(&format!("Period: {start} to {end}"), 12.0, false, 6.0);
    }
    pdf.gap(6.0);

    match report {
        PaymentReport::Summary(s) => {
            pdf.heading("Overview");
            pdf.line(
                &format!("Total Payments: {}", s.overview.total_payments),
                12.0,
                false,
                6.0,
            );
            pdf.line(
                &format!("Total Revenue: {}", money(s.overview.total_revenue as f64)),
                12.0,
                false,
                6.0,
            );
            pdf.line(
                &format!(
                    "Average Transaction: {}",
                    money(s.overview.average_transaction_value)
                ),
                12.0,
                false,
                6.0,
            );
            pdf.line(
                &format!("Success Rate: {:.2}%", s.overview.success_rate),
                12.0,
                false,
                6.0,
            );
            pdf.heading("Status Distribution");
            for (status, count) in s.status_distribution.entries() {
                pdf.line(&format!("{status}: {count}"), 12.0, false, 6.0);
            }
        }
        PaymentReport::Detailed(d) => {
            pdf.heading("Transaction Details");
            pdf.line(
                &format!("Total Transactions Analyzed: {}", d.transaction_count),
                12.0,
                false,
                6.0,
            );
            if let Some(largest) = &d.largest_transaction {
                pdf.line(
                    &format!("Largest Transaction: {}", money(largest.amount as f64)),
                    12.0,
                    false,
                    6.0,
                );
            }
            pdf.gap(4.0);
            pdf.line("Recent Failed Transactions:", 12.0, true, 6.0);
            for (i, failure) in d.recent_failures.iter().take(5).enumerate() {
                pdf.line(
                    &format!(
                        "{}. {} - {} - {}",
                        i + 1,
                        failure.customer_email,
                        money(failure.amount as f64),
                        timestamp(failure.created_at)
                    ),
                    11.0,
                    false,
                    6.0,
                );
            }
        }
        PaymentReport::Analytics(a) => {
            pdf.heading("Analytics Overview");
            let c = &a.customer_analytics;
            pdf.line(
                &format!("Total Unique Customers: {}", c.total_unique_customers),
                12.0,
                false,
                6.0,
            );
            pdf.line(
                &format!("Repeat Customers: {}", c.repeat_customers),
                12.0,
                false,
                6.0,
            );
            pdf.gap(4.0);
            pdf.line("Top 5 Customers:", 12.0, true, 6.0);
            for (i, customer) in c.top_customers.iter().take(5).enumerate() {
                pdf.line(
                    &format!(
                        "{}. {} - {}",
                        i + 1,
                        customer.email,
                        money(customer.total_spent as f64)
                    ),
                    11.0,
                    false,
                    6.0,
                );
            }
        }
        PaymentReport::Financial(f) => {
            pdf.heading("Financial Summary");
            let r = &f.revenue_summary;
            for (label, cents) in [
                ("Gross Revenue", r.gross_revenue as f64),
                ("Refunded Amount", r.refunded_amount as f64),
                ("Net Revenue", r.net_revenue as f64),
                ("Average Transaction", f.average_values.average_transaction),
                ("Median Transaction", f.average_values.median_transaction),
            ] {
                pdf.line(&format!("{label}: {}", money(cents)), 12.0, false, 6.0);
            }
        }
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_types_and_formats() {
        assert_eq!(
            "financial".parse::<ReportType>().ok(),
            Some(ReportType::Financial)
        );
        assert_eq!("csv".parse::<ReportFormat>().ok(), Some(ReportFormat::Csv));
        let err = "weekly".parse::<ReportType>().unwrap_err();
        assert_eq!(
            err.public_message(),
            "Invalid report type. Use: summary, detailed, analytics, or financial"
        );
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn every_report_type_renders_to_pdf() {
        let now = Utc::now();
        let period = ReportPeriod::default();
        let rows = vec![payments::tests::payment(
            "a@x.io",
            1500,
            crate::db::PaymentStatus::Failed,
            "2024-03-02T10:00:00Z",
        )];
        for ty in [
            ReportType::Summary,
            ReportType::Detailed,
            ReportType::Analytics,
            ReportType::Financial,
        ] {
            let report = payments::build(ty, &rows, &period, now);
            let bytes = payment_report_pdf(&report, ty, &period, now).expect("pdf");
            assert!(bytes.starts_with(b"%PDF"), "{ty:?}");
        }
    }
}
