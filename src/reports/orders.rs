//! Order dashboard aggregates for `/api/admin/orders/report`.
//!
//! Money is reported in dollars, like the rest of the orders API.

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::db::{DbOrder, OrderStatus};
use crate::error::MeetmindError;

const TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderRange {
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl OrderRange {
    /// Oldest `created_at` kept, `None` for everything.
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            OrderRange::Week => Some(now - Duration::days(7)),
            OrderRange::Month => Some(now - Duration::days(30)),
            OrderRange::Quarter => Some(now - Duration::days(90)),
            OrderRange::Year => now.checked_sub_months(Months::new(12)),
            OrderRange::All => None,
        }
    }
}

impl FromStr for OrderRange {
    type Err = MeetmindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(OrderRange::Week),
            "30d" => Ok(OrderRange::Month),
            "90d" => Ok(OrderRange::Quarter),
            "1y" => Ok(OrderRange::Year),
            "all" => Ok(OrderRange::All),
            _ => Err(MeetmindError::bad_request(
                "Invalid range. Use: 7d, 30d, 90d, 1y, or all",
            )),
        }
    }
}

pub fn dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductStat {
    pub name: String,
    pub count: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSpend {
    pub name: String,
    pub email: String,
    pub total_spent: f64,
    pub order_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusSlice {
    pub status: &'static str,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MethodStat {
    pub method: String,
    pub count: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDashboard {
    pub range: OrderRange,
    pub total_orders: usize,
    pub total_revenue: f64,
    pub completed_orders: usize,
    pub pending_orders: usize,
    pub cancelled_orders: usize,
    pub avg_order_value: f64,
    pub top_products: Vec<ProductStat>,
    pub top_customers: Vec<CustomerSpend>,
    pub orders_by_status: Vec<StatusSlice>,
    pub payment_methods: Vec<MethodStat>,
}

/// Revenue counts completed orders only; counts include every order.
pub fn dashboard(range: OrderRange, orders: &[DbOrder]) -> OrderDashboard {
    let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
    let completed_orders = count(OrderStatus::Completed);
    let pending_orders = count(OrderStatus::Pending);
    let cancelled_orders = count(OrderStatus::Cancelled);
    let earned = |o: &DbOrder| {
        if o.status == OrderStatus::Completed {
            o.amount
        } else {
            0
        }
    };
    let revenue_cents: i64 = orders.iter().map(earned).sum();

    let mut products: BTreeMap<&str, (usize, i64)> = BTreeMap::new();
    let mut customers: BTreeMap<&str, (&str, usize, i64)> = BTreeMap::new();
    let mut methods: BTreeMap<&str, (usize, i64)> = BTreeMap::new();
    for o in orders {
        let p = products.entry(o.product_name.as_str()).or_default();
        p.0 += 1;
        p.1 += earned(o);

        let c = customers
            .entry(o.customer_email.as_str())
            .or_insert((o.customer_name.as_str(), 0, 0));
        c.1 += 1;
        c.2 += earned(o);

        let method = o
            .payment_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown");
        let m = methods.entry(method).or_default();
        m.0 += 1;
        m.1 += earned(o);
    }

    let mut top_products: Vec<(&str, (usize, i64))> = products.into_iter().collect();
    top_products.sort_by(|a, b| b.1.1.cmp(&a.1.1));
    let mut top_customers: Vec<(&str, (&str, usize, i64))> = customers.into_iter().collect();
    top_customers.sort_by(|a, b| b.1.2.cmp(&a.1.2));
    let mut payment_methods: Vec<(&str, (usize, i64))> = methods.into_iter().collect();
    payment_methods.sort_by(|a, b| b.1.1.cmp(&a.1.1));

    let total = orders.len();
    let share = |n: usize| {
        if total == 0 {
            0.0
        } else {
            n as f64 / total as f64 * 100.0
        }
    };

    OrderDashboard {
        range,
        total_orders: total,
        total_revenue: dollars(revenue_cents),
        completed_orders,
        pending_orders,
        cancelled_orders,
        avg_order_value: if completed_orders == 0 {
            0.0
        } else {
            dollars(revenue_cents) / completed_orders as f64
        },
        top_products: top_products
            .into_iter()
            .take(TOP_N)
            .map(|(name, (count, revenue))| ProductStat {
                name: name.to_string(),
                count,
                revenue: dollars(revenue),
            })
            .collect(),
        top_customers: top_customers
            .into_iter()
            .take(TOP_N)
            .map(|(email, (name, order_count, spent))| CustomerSpend {
                name: name.to_string(),
                email: email.to_string(),
                total_spent: dollars(spent),
                order_count,
            })
            .collect(),
        orders_by_status: vec![
            StatusSlice {
                status: "Completed",
                count: completed_orders,
                percentage: share(completed_orders),
            },
            StatusSlice {
                status: "Pending",
                count: pending_orders,
                percentage: share(pending_orders),
            },
            StatusSlice {
                status: "Cancelled",
                count: cancelled_orders,
                percentage: share(cancelled_orders),
            },
        ],
        payment_methods: payment_methods
            .into_iter()
            .map(|(method, (count, revenue))| MethodStat {
                method: method.to_string(),
                count,
                revenue: dollars(revenue),
            })
            .collect(),
    }
}
