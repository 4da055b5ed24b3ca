//! Payment reports computed over rows loaded for a period.
//!
//! Amounts stay in cents; rendering divides by 100.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::ReportType;
use super::period::ReportPeriod;
use crate::db::{DbPayment, PaymentStatus};

/// Rows considered by the detailed report.
pub const DETAILED_ROW_LIMIT: i64 = 1000;
const DETAILED_TRANSACTIONS: usize = 100;
const RECENT_FAILURES: usize = 10;
const TOP_CUSTOMERS: usize = 10;
const TREND_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PaymentReport {
    Summary(SummaryReport),
    Detailed(DetailedReport),
    Analytics(AnalyticsReport),
    Financial(FinancialReport),
}

pub fn build(
    report_type: ReportType,
    rows: &[DbPayment],
    period: &ReportPeriod,
    now: DateTime<Utc>,
) -> PaymentReport {
    match report_type {
        ReportType::Summary => PaymentReport::Summary(summary(rows, period)),
        ReportType::Detailed => PaymentReport::Detailed(detailed(rows)),
        ReportType::Analytics => PaymentReport::Analytics(analytics(rows, now)),
        ReportType::Financial => PaymentReport::Financial(financial(rows, period)),
    }
}

fn day(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn succeeded(rows: &[DbPayment]) -> impl Iterator<Item = &DbPayment> {
    use PaymentStatus::Succeeded;
    rows.iter().filter(|p| p.status == Succeeded)
}

// ---------------------------------------------------------------------------
// summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Overview {
    pub total_payments: usize,
    pub total_revenue: i64,
    pub average_transaction_value: f64,
    /// Percentage of succeeded payments, 2 decimals.
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusDistribution {
    pub succeeded: usize,
    pub pending: usize,
    pub failed: usize,
    pub processing: usize,
    pub cancelled: usize,
    pub refunded: usize,
}

impl StatusDistribution {
    fn from_rows(rows: &[DbPayment]) -> Self {
        let mut dist = Self::default();
        for p in rows {
            *dist.slot(p.status) += 1;
        }
        dist
    }

    fn slot(&mut self, status: PaymentStatus) -> &mut usize {
        match status {
            PaymentStatus::Succeeded => &mut self.succeeded,
            PaymentStatus::Pending => &mut self.pending,
            PaymentStatus::Failed => &mut self.failed,
            PaymentStatus::Processing => &mut self.processing,
            PaymentStatus::Cancelled => &mut self.cancelled,
            PaymentStatus::Refunded => &mut self.refunded,
        }
    }

    pub fn entries(&self) -> [(&'static str, usize); 6] {
        [
            ("succeeded", self.succeeded),
            ("pending", self.pending),
            ("failed", self.failed),
            ("processing", self.processing),
            ("cancelled", self.cancelled),
            ("refunded", self.refunded),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub days_analyzed: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub overview: Overview,
    pub status_distribution: StatusDistribution,
    pub currency_breakdown: BTreeMap<String, usize>,
    pub payment_methods: BTreeMap<String, usize>,
    pub period_summary: PeriodSummary,
}

pub fn summary(rows: &[DbPayment], period: &ReportPeriod) -> SummaryReport {
    let ok: Vec<&DbPayment> = succeeded(rows).collect();
    let total_revenue: i64 = ok.iter().map(|p| p.amount).sum();

    let mut currency_breakdown = BTreeMap::new();
    let mut payment_methods = BTreeMap::new();
    for p in rows {
        *currency_breakdown.entry(p.currency.clone()).or_insert(0) += 1;
        let method = p
            .payment_method
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        *payment_methods.entry(method).or_insert(0) += 1;
    }

    SummaryReport {
        overview: Overview {
            total_payments: rows.len(),
            total_revenue,
            average_transaction_value: if ok.is_empty() {
                0.0
            } else {
                total_revenue as f64 / ok.len() as f64
            },
            success_rate: if rows.is_empty() {
                0.0
            } else {
                round2(ok.len() as f64 / rows.len() as f64 * 100.0)
            },
        },
        status_distribution: StatusDistribution::from_rows(rows),
        currency_breakdown,
        payment_methods,
        period_summary: PeriodSummary {
            start_date: period.start_date.clone(),
            end_date: period.end_date.clone(),
            days_analyzed: period.days(),
        },
    }
}

// ---------------------------------------------------------------------------
// detailed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DailyStatistics {
    pub total_transactions: usize,
    pub total_amount: i64,
    #[serde(flatten)]
    pub by_status: StatusDistribution,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedReport {
    pub transactions: Vec<DbPayment>,
    pub daily_statistics: BTreeMap<String, DailyStatistics>,
    pub transaction_count: usize,
    pub largest_transaction: Option<DbPayment>,
    pub recent_failures: Vec<DbPayment>,
}

/// `rows` are expected newest first.
pub fn detailed(rows: &[DbPayment]) -> DetailedReport {
    let mut daily_statistics: BTreeMap<String, DailyStatistics> = BTreeMap::new();
    for p in rows {
        let stats = daily_statistics.entry(day(p.created_at)).or_default();
        stats.total_transactions += 1;
        stats.total_amount += p.amount;
        *stats.by_status.slot(p.status) += 1;
    }

    // First maximum wins on ties.
    let largest_transaction = rows
        .iter()
        .fold(None::<&DbPayment>, |best, p| match best {
            Some(b) if b.amount >= p.amount => Some(b),
            _ => Some(p),
        })
        .cloned();

    DetailedReport {
        transactions: rows.iter().take(DETAILED_TRANSACTIONS).cloned().collect(),
        daily_statistics,
        transaction_count: rows.len(),
        largest_transaction,
        recent_failures: rows
            .iter()
            .filter(|p| p.status == PaymentStatus::Failed)
            .take(RECENT_FAILURES)
            .cloned()
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrendDay {
    pub date: String,
    pub count: usize,
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerStat {
    pub email: String,
    pub total_payments: usize,
    pub total_spent: i64,
    pub last_payment: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerAnalytics {
    pub total_unique_customers: usize,
    pub top_customers: Vec<CustomerStat>,
    pub repeat_customers: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ConversionFunnel {
    pub pending_to_success: usize,
    pub processing_to_success: usize,
    pub total_successful: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub hourly_distribution: Vec<HourCount>,
    pub daily_trend: Vec<TrendDay>,
    pub customer_analytics: CustomerAnalytics,
    pub conversion_funnel: ConversionFunnel,
}

pub fn analytics(rows: &[DbPayment], now: DateTime<Utc>) -> AnalyticsReport {
    let mut hours = [0usize; 24];
    for p in rows {
        hours[p.created_at.hour() as usize] += 1;
    }
    let hourly_distribution = hours
        .iter()
        .enumerate()
        .map(|(hour, &count)| HourCount {
            hour: hour as u32,
            count,
        })
        .collect();

    let mut by_day: BTreeMap<String, (usize, i64)> = BTreeMap::new();
    for p in rows {
        let slot = by_day.entry(day(p.created_at)).or_default();
        slot.0 += 1;
        if p.status == PaymentStatus::Succeeded {
            slot.1 += p.amount;
        }
    }
    let daily_trend = (0..TREND_DAYS)
        .rev()
        .map(|back| {
            let date = day(now - Duration::days(back));
            let (count, revenue) = by_day.get(&date).copied().unwrap_or_default();
            TrendDay {
                date,
                count,
                revenue,
            }
        })
        .collect();

    let mut customers: BTreeMap<&str, CustomerStat> = BTreeMap::new();
    for p in rows {
        let stat = customers
            .entry(p.customer_email.as_str())
            .or_insert_with(|| CustomerStat {
                email: p.customer_email.clone(),
                total_payments: 0,
                total_spent: 0,
                last_payment: p.created_at,
            });
        stat.total_payments += 1;
        if p.status == PaymentStatus::Succeeded {
            stat.total_spent += p.amount;
        }
        stat.last_payment = stat.last_payment.max(p.created_at);
    }
    let repeat_customers = customers.values().filter(|c| c.total_payments > 1).count();
    let total_unique_customers = customers.len();
    let mut top_customers: Vec<CustomerStat> = customers.into_values().collect();
    // Stable sort keeps email order among equal spenders.
    top_customers.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
    top_customers.truncate(TOP_CUSTOMERS);

    let dist = StatusDistribution::from_rows(rows);

    AnalyticsReport {
        hourly_distribution,
        daily_trend,
        customer_analytics: CustomerAnalytics {
            total_unique_customers,
            top_customers,
            repeat_customers,
        },
        conversion_funnel: ConversionFunnel {
            pending_to_success: dist.pending,
            processing_to_success: dist.processing,
            total_successful: dist.succeeded,
        },
    }
}

// ---------------------------------------------------------------------------
// financial
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RevenueSummary {
    pub gross_revenue: i64,
    pub refunded_amount: i64,
    pub net_revenue: i64,
    pub total_transactions: usize,
    pub successful_transactions: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct AverageValues {
    pub average_transaction: f64,
    pub median_transaction: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PeakDay {
    pub date: String,
    pub count: usize,
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentVolume {
    pub daily_average: f64,
    pub peak_day: PeakDay,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub revenue_summary: RevenueSummary,
    pub monthly_breakdown: BTreeMap<String, i64>,
    pub currency_revenue: BTreeMap<String, i64>,
    pub average_values: AverageValues,
    pub payment_volume: PaymentVolume,
}

pub fn median(amounts: &mut [i64]) -> f64 {
    if amounts.is_empty() {
        return 0.0;
    }
    amounts.sort_unstable();
    let mid = amounts.len() / 2;
    if amounts.len() % 2 == 0 {
        (amounts[mid - 1] + amounts[mid]) as f64 / 2.0
    } else {
        amounts[mid] as f64
    }
}

pub fn financial(rows: &[DbPayment], period: &ReportPeriod) -> FinancialReport {
    let ok: Vec<&DbPayment> = succeeded(rows).collect();
    let gross_revenue: i64 = ok.iter().map(|p| p.amount).sum();
    let refunded_amount: i64 = rows
        .iter()
        .filter(|p| p.status == PaymentStatus::Refunded)
        .map(|p| p.amount)
        .sum();

    let mut monthly_breakdown = BTreeMap::new();
    let mut currency_revenue = BTreeMap::new();
    let mut per_day: BTreeMap<String, PeakDay> = BTreeMap::new();
    for p in &ok {
        *monthly_breakdown
            .entry(p.created_at.format("%Y-%m").to_string())
            .or_insert(0) += p.amount;
        *currency_revenue.entry(p.currency.clone()).or_insert(0) += p.amount;
        let date = day(p.created_at);
        let slot = per_day.entry(date.clone()).or_insert_with(|| PeakDay {
            date,
            ..PeakDay::default()
        });
        slot.count += 1;
        slot.revenue += p.amount;
    }
    // Earliest day wins on equal revenue.
    let peak_day = per_day
        .into_values()
        .fold(None::<PeakDay>, |best, d| match best {
            Some(b) if b.revenue >= d.revenue => Some(b),
            _ => Some(d),
        })
        .unwrap_or_default();

    let daily_average = match period.days() {
        Some(days) if days > 0 => ok.len() as f64 / days as f64,
        _ => 0.0,
    };

    let mut amounts: Vec<i64> = ok.iter().map(|p| p.amount).collect();

    FinancialReport {
        revenue_summary: RevenueSummary {
            gross_revenue,
            refunded_amount,
            net_revenue: gross_revenue - refunded_amount,
            total_transactions: rows.len(),
            successful_transactions: ok.len(),
        },
        monthly_breakdown,
        currency_revenue,
        average_values: AverageValues {
            average_transaction: if ok.is_empty() {
                0.0
            } else {
                gross_revenue as f64 / ok.len() as f64
            },
            median_transaction: median(&mut amounts),
        },
        payment_volume: PaymentVolume {
            daily_average,
            peak_day,
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn payment(
        email: &str,
        amount: i64,
        status: PaymentStatus,
        created_at: &str,
    ) -> DbPayment {
        let created_at: DateTime<Utc> = created_at.parse().expect("timestamp");
        DbPayment {
            id: format!("pay-{email}-{amount}-{created_at}"),
            polar_payment_id: None,
            polar_order_id: None,
            polar_customer_id: None,
            customer_name: email.split('@').next().unwrap_or(email).to_string(),
            customer_email: email.to_string(),
            amount,
            currency: "USD".to_string(),
            status,
            payment_method: Some("manual".to_string()),
            payment_intent_id: None,
            subscription_id: None,
            product_name: Some("Pro Plan".to_string()),
            metadata: None,
            polar_webhook_data: None,
            created_at,
            updated_at: created_at,
            processed_at: None,
            synced_from_polar: false,
            last_sync_at: None,
        }
    }

    fn sample() -> Vec<DbPayment> {
        use PaymentStatus::{Failed, Refunded, Succeeded};
        vec![
            payment("a@x.io", 1000, Succeeded, "2024-03-02T10:00:00Z"),
            payment("a@x.io", 3000, Succeeded, "2024-03-02T11:00:00Z"),
            payment("b@x.io", 500, Refunded, "2024-03-01T10:00:00Z"),
            payment("c@x.io", 2000, Failed, "2024-02-28T23:00:00Z"),
        ]
    }

    #[test]
    fn summary_counts_revenue_from_succeeded_only() {
        let period = ReportPeriod::default();
        let s = summary(&sample(), &period);

        assert_eq!(s.overview.total_payments, 4);
        assert_eq!(s.overview.total_revenue, 4000);
        assert_eq!(s.overview.average_transaction_value, 2000.0);
        assert_eq!(s.overview.success_rate, 50.0);
        assert_eq!(s.status_distribution.refunded, 1);
        assert_eq!(s.currency_breakdown.get("USD"), Some(&4));
        assert_eq!(s.payment_methods.get("manual"), Some(&4));
        assert_eq!(s.period_summary.days_analyzed, None);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let s = summary(&[], &ReportPeriod::default());
        assert_eq!(s.overview, Overview::default());
    }

    #[test]
    fn detailed_groups_by_day_and_finds_largest() {
        let d = detailed(&sample());

        assert_eq!(d.transaction_count, 4);
        assert_eq!(d.daily_statistics["2024-03-02"].total_transactions, 2);
        assert_eq!(d.daily_statistics["2024-03-02"].total_amount, 4000);
        assert_eq!(d.largest_transaction.map(|p| p.amount), Some(3000));
        assert_eq!(d.recent_failures.len(), 1);
    }

    #[test]
    fn analytics_trend_ends_today_and_ranks_customers() {
        let now: DateTime<Utc> = "2024-03-02T12:00:00Z".parse().expect("now");
        let a = analytics(&sample(), now);

        assert_eq!(a.hourly_distribution.len(), 24);
        assert_eq!(a.hourly_distribution[10].count, 2);
        assert_eq!(a.daily_trend.len(), 30);
        let last = a.daily_trend.last().expect("today");
        assert_eq!(last.date, "2024-03-02");
        assert_eq!((last.count, last.revenue), (2, 4000));

        let c = &a.customer_analytics;
        assert_eq!(c.total_unique_customers, 3);
        assert_eq!(c.repeat_customers, 1);
        assert_eq!(c.top_customers[0].email, "a@x.io");
        assert_eq!(c.top_customers[0].total_spent, 4000);
        assert_eq!(a.conversion_funnel.total_successful, 2);
    }

    #[test]
    fn financial_nets_refunds_and_finds_peak_day() {
        let period = ReportPeriod::parse(Some("2024-03-01".into()), Some("2024-03-02".into()))
            .expect("period");
        let f = financial(&sample(), &period);

        assert_eq!(f.revenue_summary.gross_revenue, 4000);
        assert_eq!(f.revenue_summary.refunded_amount, 500);
        assert_eq!(f.revenue_summary.net_revenue, 3500);
        assert_eq!(f.monthly_breakdown.get("2024-03"), Some(&4000));
        assert_eq!(f.average_values.median_transaction, 2000.0);
        assert_eq!(f.payment_volume.peak_day.date, "2024-03-02");
        assert_eq!(f.payment_volume.daily_average, 1.0);
    }

    #[test]
    fn median_handles_even_and_odd() {
        assert_eq!(median(&mut [5, 1, 3]), 3.0);
        assert_eq!(median(&mut [4, 1, 3, 2]), 2.5);
        assert_eq!(median(&mut []), 0.0);
    }
}
