//! Handlers for the `/finance` resource.
//!
//! Invoices are open to admins and finance; deletion is admin-only. Creating
//! an invoice marks its line-item tasks invoiced, deleting one reverts them.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsdesk_core::error::CoreError;
use opsdesk_core::invoice::{
    compute_totals, ensure_deletable, ensure_editable, invoice_stamps, line_amount,
};
use opsdesk_core::numbering::SequenceKind;
use opsdesk_core::pagination::parse_sort;
use opsdesk_core::status::{validate_invoice_transition, InvoiceStatus};
use opsdesk_core::types::DbId;
use opsdesk_db::models::invoice::{
    CreateInvoice, FinanceSummary, Invoice, InvoiceChanges, InvoiceDeletion, InvoiceFilter,
    LineItem, LineItemInput, NewInvoice, UpdateInvoice,
};
use opsdesk_db::repositories::{ClientRepo, InvoiceRepo, ProjectRepo, SequenceRepo, TaskRepo};
use opsdesk_events::payload::InvoicePayload;
use opsdesk_events::types::{
    ENTITY_INVOICE, INVOICE_CREATED, INVOICE_DELETED, INVOICE_STATUS_CHANGED,
};
use opsdesk_events::PlatformEvent;
use serde::Serialize;
use validator::Validate;

use crate::error::{not_found, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireFinance};
use crate::query::{InvoiceListParams, StatusBody};
use crate::response::{DataResponse, Empty, ListResponse};
use crate::state::AppState;

const SORT_FIELDS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("issueDate", "issue_date"),
    ("dueDate", "due_date"),
    ("total", "total"),
    ("status", "status"),
    ("invoiceNumber", "invoice_number"),
];

/// Creation response: the invoice plus the line-item tasks that could not
/// be marked invoiced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvoice {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub skipped_tasks: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_invoice(state: &AppState, id: DbId) -> AppResult<Invoice> {
    InvoiceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Invoice", id))
}

/// Validate submitted line items and compute their amounts.
fn priced_items(inputs: &[LineItemInput]) -> AppResult<Vec<LineItem>> {
    inputs
        .iter()
        .map(|input| {
            input.validate()?;
            Ok(LineItem {
                description: input.description.trim().to_string(),
                quantity: input.quantity,
                rate: input.rate,
                amount: line_amount(input.quantity, input.rate),
                task: input.task,
            })
        })
        .collect()
}

fn payload(invoice: &Invoice) -> InvoicePayload {
    InvoicePayload {
        invoice_number: invoice.invoice_number.clone(),
        client: invoice.client_id,
        total: invoice.total,
        ..Default::default()
    }
}

fn publish(state: &AppState, event_type: &str, invoice: &Invoice, actor: DbId, payload: InvoicePayload) {
    state.publish(
        PlatformEvent::new(event_type)
            .with_source(ENTITY_INVOICE, invoice.id)
            .with_actor(actor)
            .with_payload(payload),
    );
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/finance/invoices
pub async fn list(
    State(state): State<AppState>,
    RequireFinance(_user): RequireFinance,
    Query(params): Query<InvoiceListParams>,
) -> AppResult<Json<ListResponse<Invoice>>> {
    if let Some(status) = &params.status {
        status.parse::<InvoiceStatus>()?;
    }
    let page = params.page();
    let sort = parse_sort(params.sort.as_deref(), SORT_FIELDS);
    let filter = InvoiceFilter {
        status: params.status,
        client_id: params.client,
        project_id: params.project,
    };

    let invoices = InvoiceRepo::list(&state.pool, &filter, &page, &sort).await?;
    let total = InvoiceRepo::count(&state.pool, &filter).await?;
    Ok(Json(ListResponse::new(invoices, &page, total)))
}

/// POST /api/v1/finance/invoices
///
/// The invoice is created even when some line-item tasks cannot be
/// invoiced; those are reported in `skippedTasks`. Task updates already
/// applied are not rolled back if a later one fails.
pub async fn create(
    State(state): State<AppState>,
    RequireFinance(user): RequireFinance,
    Json(input): Json<CreateInvoice>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedInvoice>>)> {
    input.validate()?;
    let line_items = priced_items(&input.line_items)?;

    if !ClientRepo::exists(&state.pool, input.client_id).await? {
        return Err(not_found("Client", input.client_id));
    }
    if let Some(project_id) = input.project_id {
        let project = ProjectRepo::find_by_id(&state.pool, project_id)
            .await?
            .ok_or_else(|| not_found("Project", project_id))?;
        if project.client_id != input.client_id {
            return Err(CoreError::Validation(
                "Project does not belong to the invoice's client".into(),
            )
            .into());
        }
    }

    let now = chrono::Utc::now();
    let invoice_number = match input
        .invoice_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        Some(number) => number.to_string(),
        None => SequenceRepo::next_number(&state.pool, SequenceKind::Invoice, now).await?,
    };

    let tax_rate = input.tax_rate.unwrap_or(0.0);
    let discount = input.discount.unwrap_or(0.0);
    let totals = compute_totals(line_items.iter().map(|item| item.amount), tax_rate, discount);

    let new_invoice = NewInvoice {
        invoice_number,
        client_id: input.client_id,
        project_id: input.project_id,
        line_items,
        subtotal: totals.subtotal,
        tax_rate,
        tax_amount: totals.tax_amount,
        discount,
        total: totals.total,
        issue_date: input.issue_date.unwrap_or(now),
        due_date: input.due_date,
        notes: input.notes.clone(),
        created_by: user.user_id,
    };
    let invoice = InvoiceRepo::create(&state.pool, &new_invoice).await?;
    tracing::info!(
        invoice_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        total = invoice.total,
        "Invoice created"
    );

    let mut seen = HashSet::new();
    let mut invoiced = Vec::new();
    let mut skipped = Vec::new();
    for task_id in invoice.task_ids() {
        if !seen.insert(task_id) {
            continue;
        }
        match TaskRepo::mark_invoiced(&state.pool, task_id, &invoice.invoice_number, now).await {
            Ok(true) => invoiced.push(task_id),
            Ok(false) => {
                tracing::warn!(
                    task_id,
                    invoice_number = %invoice.invoice_number,
                    "Task missing or not ready for invoicing, skipped"
                );
                skipped.push(task_id);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    task_id,
                    invoice_number = %invoice.invoice_number,
                    "Failed to mark task invoiced"
                );
                skipped.push(task_id);
            }
        }
    }

    let event_payload = InvoicePayload {
        tasks: invoiced,
        skipped_tasks: skipped.clone(),
        ..payload(&invoice)
    };
    publish(&state, INVOICE_CREATED, &invoice, user.user_id, event_payload);

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(CreatedInvoice {
            invoice,
            skipped_tasks: skipped,
        })),
    ))
}

/// GET /api/v1/finance/invoices/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireFinance(_user): RequireFinance,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Invoice>>> {
    let invoice = find_invoice(&state, id).await?;
    Ok(Json(DataResponse::new(invoice)))
}

/// PUT /api/v1/finance/invoices/{id}
///
/// Totals are recomputed whenever line items, tax rate, or discount change.
/// Task links on replaced line items survive only for tasks already linked
/// to this invoice.
pub async fn update(
    State(state): State<AppState>,
    RequireFinance(user): RequireFinance,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateInvoice>,
) -> AppResult<Json<DataResponse<Invoice>>> {
    input.validate()?;
    let invoice = find_invoice(&state, id).await?;
    ensure_editable(invoice.status.parse()?, user.role)?;

    let line_items = match &input.line_items {
        Some(inputs) => {
            let linked: HashSet<DbId> = invoice.task_ids().into_iter().collect();
            let mut items = priced_items(inputs)?;
            for item in &mut items {
                item.task = item.task.filter(|task| linked.contains(task));
            }
            Some(items)
        }
        None => None,
    };

    let mut changes = InvoiceChanges {
        issue_date: input.issue_date,
        due_date: input.due_date,
        notes: input.notes.clone(),
        ..Default::default()
    };
    if line_items.is_some() || input.tax_rate.is_some() || input.discount.is_some() {
        let tax_rate = input.tax_rate.unwrap_or(invoice.tax_rate);
        let discount = input.discount.unwrap_or(invoice.discount);
        let amounts: Vec<f64> = line_items
            .as_deref()
            .unwrap_or(invoice.line_items.0.as_slice())
            .iter()
            .map(|item| item.amount)
            .collect();
        let totals = compute_totals(amounts, tax_rate, discount);
        changes.subtotal = Some(totals.subtotal);
        changes.tax_rate = Some(tax_rate);
        changes.tax_amount = Some(totals.tax_amount);
        changes.discount = Some(discount);
        changes.total = Some(totals.total);
    }
    changes.line_items = line_items;

    let updated = InvoiceRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| not_found("Invoice", id))?;
    tracing::info!(invoice_id = id, total = updated.total, user_id = user.user_id, "Invoice updated");
    Ok(Json(DataResponse::new(updated)))
}

/// PUT /api/v1/finance/invoices/{id}/status
///
/// First entry into `sent` stamps `sentAt`; first entry into `paid` stamps
/// `paidAt` and records the total as paid.
pub async fn update_status(
    State(state): State<AppState>,
    RequireFinance(user): RequireFinance,
    Path(id): Path<DbId>,
    Json(body): Json<StatusBody>,
) -> AppResult<Json<DataResponse<Invoice>>> {
    let to: InvoiceStatus = body.value()?.parse()?;
    let invoice = find_invoice(&state, id).await?;
    let from: InvoiceStatus = invoice.status.parse()?;
    ensure_editable(from, user.role)?;
    validate_invoice_transition(from, to)?;

    let stamps = invoice_stamps(
        to,
        invoice.sent_at,
        invoice.paid_at,
        invoice.total,
        chrono::Utc::now(),
    );
    let updated = InvoiceRepo::update_status(&state.pool, id, to.as_str(), &stamps)
        .await?
        .ok_or_else(|| not_found("Invoice", id))?;

    if from != to {
        tracing::info!(invoice_id = id, %from, %to, "Invoice status changed");
        let event_payload = InvoicePayload {
            from_status: Some(from.to_string()),
            to_status: Some(to.to_string()),
            ..payload(&updated)
        };
        publish(&state, INVOICE_STATUS_CHANGED, &updated, user.user_id, event_payload);
    }

    Ok(Json(DataResponse::new(updated)))
}

/// DELETE /api/v1/finance/invoices/{id}
///
/// Sent and paid invoices are never deleted. Linked tasks revert to
/// `completed` in the same transaction as the delete.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Empty>>> {
    let invoice = find_invoice(&state, id).await?;
    ensure_deletable(invoice.status.parse()?)?;

    // The status is re-checked under a row lock; a concurrent send wins.
    let reverted = match InvoiceRepo::delete_and_revert_tasks(&state.pool, &invoice).await? {
        InvoiceDeletion::Deleted { reverted_tasks } => reverted_tasks,
        InvoiceDeletion::Missing => return Err(not_found("Invoice", id)),
        InvoiceDeletion::Locked { status } => {
            return Err(CoreError::Conflict(format!(
                "Cannot delete an invoice with status '{status}'"
            ))
            .into())
        }
    };
    tracing::info!(invoice_id = id, reverted, user_id = user.user_id, "Invoice deleted");

    let event_payload = InvoicePayload {
        tasks: invoice.task_ids(),
        ..payload(&invoice)
    };
    publish(&state, INVOICE_DELETED, &invoice, user.user_id, event_payload);
    Ok(Json(DataResponse::new(Empty::default())))
}

/// GET /api/v1/finance/summary
pub async fn summary(
    State(state): State<AppState>,
    RequireFinance(_user): RequireFinance,
) -> AppResult<Json<DataResponse<FinanceSummary>>> {
    let summary = InvoiceRepo::summary(&state.pool).await?;
    Ok(Json(DataResponse::new(summary)))
}
