//! CSV exports. Every cell is quoted.

use csv::{QuoteStyle, WriterBuilder};

use super::orders::dollars;
use crate::db::{DbOrder, DbPayment};
use crate::error::MeetmindError;

pub const PAYMENT_HEADER: [&str; 11] = [
    "Payment ID",
    "Customer Name",
    "Customer Email",
    "Product",
    "Amount",
    "Currency",
    "Status",
    "Payment Method",
    "Source",
    "Date",
    "Notes",
];

pub const ORDER_HEADER: [&str; 9] = [
    "Order ID",
    "Customer Name",
    "Customer Email",
    "Product",
    "Amount",
    "Status",
    "Payment Method",
    "Order Date",
    "Notes",
];

fn write_rows<const N: usize>(
    header: [&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> Result<Vec<u8>, MeetmindError> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    let render = |e: csv::Error| MeetmindError::RenderError(format!("csv: {e}"));

    wtr.write_record(header).map_err(render)?;
    for row in rows {
        wtr.write_record(&row).map_err(render)?;
    }
    wtr.into_inner()
        .map_err(|e| MeetmindError::RenderError(format!("csv flush: {e}")))
}

pub fn payments_csv(payments: &[DbPayment]) -> Result<Vec<u8>, MeetmindError> {
    write_rows(
        PAYMENT_HEADER,
        payments.iter().map(|p| {
            let polar = p.synced_from_polar;
            [
                p.id.clone(),
                p.customer_name.clone(),
                p.customer_email.clone(),
                p.product_name.clone().unwrap_or_default(),
                format!("{:.2}", dollars(p.amount)),
                p.currency.clone(),
                p.status.to_string(),
                p.payment_method.clone().unwrap_or_default(),
                if polar { "Polar" } else { "Manual" }.to_string(),
                p.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                p.metadata.clone().unwrap_or_default(),
            ]
        }),
    )
}

pub fn orders_csv(orders: &[DbOrder]) -> Result<Vec<u8>, MeetmindError> {
    write_rows(
        ORDER_HEADER,
        orders.iter().map(|o| {
            [
                o.id.clone(),
                o.customer_name.clone(),
                o.customer_email.clone(),
                o.product_name.clone(),
                format!("{:.2}", dollars(o.amount)),
                o.status.to_string(),
                o.payment_method.clone().unwrap_or_default(),
                o.created_at.format("%Y-%m-%d").to_string(),
                o.notes.clone().unwrap_or_default(),
            ]
        }),
    )
}
