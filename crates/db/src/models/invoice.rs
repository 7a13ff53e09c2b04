//! Invoice entity model and DTOs.

use opsdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// An invoice row from the `invoices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: DbId,
    pub invoice_number: String,
    #[serde(rename = "client")]
    pub client_id: DbId,
    #[serde(rename = "project")]
    pub project_id: Option<DbId>,
    pub line_items: Json<Vec<LineItem>>,
    pub status: String,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub discount: f64,
    pub total: f64,
    pub amount_paid: f64,
    pub issue_date: Timestamp,
    pub due_date: Option<Timestamp>,
    pub sent_at: Option<Timestamp>,
    pub paid_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Invoice {
    /// Ids of the tasks referenced by line items.
    pub fn task_ids(&self) -> Vec<DbId> {
        self.line_items.iter().filter_map(|item| item.task).collect()
    }
}

/// A stored line item. `amount` is always `quantity × rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<DbId>,
}

/// A line item as submitted; the amount is computed server-side.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[validate(length(min = 1, message = "Line item description is required"))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Quantity cannot be negative"))]
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "Rate cannot be negative"))]
    pub rate: f64,
    pub task: Option<DbId>,
}

/// DTO for creating a new invoice.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    /// Generated when absent.
    pub invoice_number: Option<String>,
    #[serde(rename = "client")]
    pub client_id: DbId,
    #[serde(rename = "project")]
    pub project_id: Option<DbId>,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
    #[validate(range(min = 0.0, max = 100.0, message = "Tax rate must be between 0 and 100"))]
    pub tax_rate: Option<f64>,
    #[validate(range(min = 0.0, message = "Discount cannot be negative"))]
    pub discount: Option<f64>,
    pub issue_date: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
    pub notes: Option<String>,
}

/// DTO for updating an existing invoice. Replacing `lineItems` recomputes
/// the totals; task linkage is fixed at creation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoice {
    pub line_items: Option<Vec<LineItemInput>>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub tax_rate: Option<f64>,
    #[validate(range(min = 0.0))]
    pub discount: Option<f64>,
    pub issue_date: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
    pub notes: Option<String>,
}

/// Fully computed values written by [`crate::repositories::InvoiceRepo::create`].
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub client_id: DbId,
    pub project_id: Option<DbId>,
    pub line_items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub discount: f64,
    pub total: f64,
    pub issue_date: Timestamp,
    pub due_date: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_by: DbId,
}

/// Computed values written by [`crate::repositories::InvoiceRepo::update`].
/// `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct InvoiceChanges {
    pub line_items: Option<Vec<LineItem>>,
    pub subtotal: Option<f64>,
    pub tax_rate: Option<f64>,
    pub tax_amount: Option<f64>,
    pub discount: Option<f64>,
    pub total: Option<f64>,
    pub issue_date: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
    pub notes: Option<String>,
}

/// Filters accepted by `GET /finance/invoices`.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<String>,
    pub client_id: Option<DbId>,
    pub project_id: Option<DbId>,
}

/// Outcome of [`crate::repositories::InvoiceRepo::delete_and_revert_tasks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceDeletion {
    Deleted { reverted_tasks: u64 },
    Missing,
    /// Sent and paid invoices are never deleted.
    Locked { status: String },
}

/// Aggregates over non-cancelled invoices.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub total_invoiced: f64,
    pub total_paid: f64,
    pub outstanding: f64,
    pub overdue_count: i64,
}
