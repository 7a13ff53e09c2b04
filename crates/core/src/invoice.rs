//! Invoice arithmetic and state guards.

use crate::error::CoreError;
use crate::roles::Role;
use crate::status::InvoiceStatus;
use crate::types::Timestamp;

/// Monetary values are rounded to cents after every derived computation.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn line_amount(quantity: f64, rate: f64) -> f64 {
    round_cents(quantity * rate)
}

/// Derived invoice totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

/// `subtotal = Σ amount`, `tax = subtotal × rate / 100`,
/// `total = subtotal + tax − discount`, floored at zero.
pub fn compute_totals(
    amounts: impl IntoIterator<Item = f64>,
    tax_rate: f64,
    discount: f64,
) -> InvoiceTotals {
    let subtotal = round_cents(amounts.into_iter().sum());
    let tax_amount = round_cents(subtotal * tax_rate / 100.0);
    let total = round_cents((subtotal + tax_amount - discount).max(0.0));
    InvoiceTotals {
        subtotal,
        tax_amount,
        total,
    }
}

/// Sent and paid invoices are never deleted.
pub fn ensure_deletable(status: InvoiceStatus) -> Result<(), CoreError> {
    match status {
        InvoiceStatus::Sent | InvoiceStatus::Paid => Err(CoreError::Conflict(format!(
            "Cannot delete an invoice with status '{status}'"
        ))),
        _ => Ok(()),
    }
}

/// Paid invoices are frozen for everyone but admins.
pub fn ensure_editable(status: InvoiceStatus, role: Role) -> Result<(), CoreError> {
    if status == InvoiceStatus::Paid && !role.is_admin() {
        return Err(CoreError::Forbidden(
            "Paid invoices can only be modified by an admin".into(),
        ));
    }
    Ok(())
}

/// Columns a status change writes. `None` leaves the stored value alone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InvoiceStamps {
    pub sent_at: Option<Timestamp>,
    pub paid_at: Option<Timestamp>,
    pub amount_paid: Option<f64>,
}

/// First entry into `sent` stamps `sent_at`; first entry into `paid` stamps
/// `paid_at` and records the full total as paid.
pub fn invoice_stamps(
    to: InvoiceStatus,
    sent_at: Option<Timestamp>,
    paid_at: Option<Timestamp>,
    total: f64,
    now: Timestamp,
) -> InvoiceStamps {
    match to {
        InvoiceStatus::Sent if sent_at.is_none() => InvoiceStamps {
            sent_at: Some(now),
            ..Default::default()
        },
        InvoiceStatus::Paid if paid_at.is_none() => InvoiceStamps {
            paid_at: Some(now),
            amount_paid: Some(total),
            ..Default::default()
        },
        _ => InvoiceStamps::default(),
    }
}
