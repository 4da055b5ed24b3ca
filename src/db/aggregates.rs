//! Grouped payment queries behind `/api/polar/reports`.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::{DailyRevenue, StatusCurrencyTotal, StatusShare};
use super::patch::DateRange;
use crate::error::MeetmindError;

fn push_range(qb: &mut QueryBuilder<'_, Sqlite>, range: Option<DateRange>) {
    if let Some(range) = range {
        qb.push(" WHERE created_at >= ")
            .push_bind(range.start)
            .push(" AND created_at <= ")
            .push_bind(range.end);
    }
}

pub(super) async fn status_currency_totals(
    pool: &SqlitePool,
    range: Option<DateRange>,
) -> Result<Vec<StatusCurrencyTotal>, MeetmindError> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT status, currency, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total FROM payments",
    );
    push_range(&mut qb, range);
    qb.push(" GROUP BY status, currency ORDER BY status, currency");
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

/// Succeeded revenue per UTC calendar day, oldest first.
pub(super) async fn daily_revenue(
    pool: &SqlitePool,
    range: Option<DateRange>,
) -> Result<Vec<DailyRevenue>, MeetmindError> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT
            substr(created_at, 1, 10) AS date,
            COALESCE(SUM(CASE WHEN status = 'succeeded' THEN amount ELSE 0 END), 0) AS revenue,
            COUNT(*) AS transaction_count
        FROM payments
        "#,
    );
    push_range(&mut qb, range);
    qb.push(" GROUP BY date ORDER BY date ASC");
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

/// Row count per status with its share of the window, rounded to 2 decimals.
pub(super) async fn status_shares(
    pool: &SqlitePool,
    range: Option<DateRange>,
) -> Result<Vec<StatusShare>, MeetmindError> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT
            status,
            COUNT(*) AS count,
            ROUND(COUNT(*) * 100.0 / SUM(COUNT(*)) OVER (), 2) AS percentage
        FROM payments
        "#,
    );
    push_range(&mut qb, range);
    qb.push(" GROUP BY status ORDER BY count DESC, status ASC");
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}
