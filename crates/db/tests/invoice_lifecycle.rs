//! Integration tests for invoice persistence and task linkage.

mod common;

use chrono::Utc;
use common::{seed_client, seed_project, seed_task, seed_user};
use opsdesk_core::invoice::InvoiceStamps;
use opsdesk_core::lifecycle::TaskStamps;
use opsdesk_db::models::invoice::{InvoiceChanges, InvoiceDeletion, LineItem, NewInvoice};
use opsdesk_db::repositories::{InvoiceRepo, TaskRepo};
use sqlx::PgPool;

fn line(task: Option<i64>, amount: f64) -> LineItem {
    LineItem {
        description: "Consulting".to_string(),
        quantity: 1.0,
        rate: amount,
        amount,
        task,
    }
}

fn draft(client_id: i64, number: &str, items: Vec<LineItem>, created_by: i64) -> NewInvoice {
    let subtotal: f64 = items.iter().map(|i| i.amount).sum();
    NewInvoice {
        invoice_number: number.to_string(),
        client_id,
        project_id: None,
        line_items: items,
        subtotal,
        tax_rate: 0.0,
        tax_amount: 0.0,
        discount: 0.0,
        total: subtotal,
        issue_date: Utc::now(),
        due_date: None,
        notes: None,
        created_by,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_reverts_linked_tasks(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;
    let project = seed_project(&pool, client.id, "PRJ-2610-001", admin.id).await;

    let mut task_ids = Vec::new();
    for number in ["TSK-2610-001", "TSK-2610-002"] {
        let task = seed_task(&pool, project.id, None, number, admin.id).await;
        TaskRepo::update_status(&pool, task.id, "completed", &TaskStamps::default())
            .await
            .unwrap();
        task_ids.push(task.id);
    }

    let items = task_ids.iter().map(|id| line(Some(*id), 100.0)).collect();
    let invoice = InvoiceRepo::create(&pool, &draft(client.id, "INV-261016-0001", items, admin.id))
        .await
        .unwrap();
    for id in &task_ids {
        assert!(TaskRepo::mark_invoiced(&pool, *id, &invoice.invoice_number, Utc::now())
            .await
            .unwrap());
    }

    let reverted = InvoiceRepo::delete_and_revert_tasks(&pool, &invoice)
        .await
        .unwrap();
    assert_eq!(reverted, InvoiceDeletion::Deleted { reverted_tasks: 2 });

    for id in &task_ids {
        let task = TaskRepo::find_by_id(&pool, *id).await.unwrap().unwrap();
        assert_eq!(task.status, "completed");
        assert!(!task.invoiced);
        assert!(task.invoice_number.is_none());
    }
    assert!(InvoiceRepo::find_by_id(&pool, invoice.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_revert_leaves_tasks_relinked_elsewhere(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;
    let project = seed_project(&pool, client.id, "PRJ-2610-001", admin.id).await;
    let task = seed_task(&pool, project.id, None, "TSK-2610-001", admin.id).await;
    TaskRepo::update_status(&pool, task.id, "completed", &TaskStamps::default())
        .await
        .unwrap();

    let first = InvoiceRepo::create(
        &pool,
        &draft(client.id, "INV-261016-0001", vec![line(Some(task.id), 50.0)], admin.id),
    )
    .await
    .unwrap();
    TaskRepo::mark_invoiced(&pool, task.id, "INV-261016-0002", Utc::now())
        .await
        .unwrap();

    let reverted = InvoiceRepo::delete_and_revert_tasks(&pool, &first)
        .await
        .unwrap();
    assert_eq!(reverted, InvoiceDeletion::Deleted { reverted_tasks: 0 });
    let task = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(task.status, "invoiced");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_reverts_tasks_dropped_from_line_items(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;
    let project = seed_project(&pool, client.id, "PRJ-2610-001", admin.id).await;
    let task = seed_task(&pool, project.id, None, "TSK-2610-001", admin.id).await;
    TaskRepo::update_status(&pool, task.id, "completed", &TaskStamps::default())
        .await
        .unwrap();

    let invoice = InvoiceRepo::create(
        &pool,
        &draft(client.id, "INV-261016-0001", vec![line(Some(task.id), 80.0)], admin.id),
    )
    .await
    .unwrap();
    TaskRepo::mark_invoiced(&pool, task.id, &invoice.invoice_number, Utc::now())
        .await
        .unwrap();

    let changes = InvoiceChanges {
        line_items: Some(vec![line(None, 80.0)]),
        ..Default::default()
    };
    let invoice = InvoiceRepo::update(&pool, invoice.id, &changes)
        .await
        .unwrap()
        .unwrap();
    assert!(invoice.task_ids().is_empty());

    let outcome = InvoiceRepo::delete_and_revert_tasks(&pool, &invoice)
        .await
        .unwrap();
    assert_eq!(outcome, InvoiceDeletion::Deleted { reverted_tasks: 1 });

    let task = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(task.status, "completed");
    assert!(!task.invoiced);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_refuses_invoice_sent_after_load(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;
    let project = seed_project(&pool, client.id, "PRJ-2610-001", admin.id).await;
    let task = seed_task(&pool, project.id, None, "TSK-2610-001", admin.id).await;
    TaskRepo::update_status(&pool, task.id, "completed", &TaskStamps::default())
        .await
        .unwrap();

    let stale = InvoiceRepo::create(
        &pool,
        &draft(client.id, "INV-261016-0001", vec![line(Some(task.id), 80.0)], admin.id),
    )
    .await
    .unwrap();
    TaskRepo::mark_invoiced(&pool, task.id, &stale.invoice_number, Utc::now())
        .await
        .unwrap();
    InvoiceRepo::update_status(
        &pool,
        stale.id,
        "sent",
        &InvoiceStamps {
            sent_at: Some(Utc::now()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let outcome = InvoiceRepo::delete_and_revert_tasks(&pool, &stale)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        InvoiceDeletion::Locked {
            status: "sent".to_string()
        }
    );

    assert!(InvoiceRepo::find_by_id(&pool, stale.id).await.unwrap().is_some());
    let task = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(task.status, "invoiced");
    assert_eq!(task.invoice_number.as_deref(), Some("INV-261016-0001"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_of_missing_invoice(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;
    let invoice = InvoiceRepo::create(
        &pool,
        &draft(client.id, "INV-261016-0001", vec![line(None, 10.0)], admin.id),
    )
    .await
    .unwrap();

    let first = InvoiceRepo::delete_and_revert_tasks(&pool, &invoice).await.unwrap();
    assert_eq!(first, InvoiceDeletion::Deleted { reverted_tasks: 0 });
    let second = InvoiceRepo::delete_and_revert_tasks(&pool, &invoice).await.unwrap();
    assert_eq!(second, InvoiceDeletion::Missing);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_status_stamps_and_summary(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;

    let paid = InvoiceRepo::create(
        &pool,
        &draft(client.id, "INV-261016-0001", vec![line(None, 300.0)], admin.id),
    )
    .await
    .unwrap();
    let now = Utc::now();
    let paid = InvoiceRepo::update_status(
        &pool,
        paid.id,
        "paid",
        &InvoiceStamps {
            sent_at: None,
            paid_at: Some(now),
            amount_paid: Some(300.0),
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(paid.amount_paid, 300.0);
    assert!(paid.paid_at.is_some());

    let overdue = InvoiceRepo::create(
        &pool,
        &draft(client.id, "INV-261016-0002", vec![line(None, 120.0)], admin.id),
    )
    .await
    .unwrap();
    InvoiceRepo::update_status(&pool, overdue.id, "overdue", &InvoiceStamps::default())
        .await
        .unwrap();

    let cancelled = InvoiceRepo::create(
        &pool,
        &draft(client.id, "INV-261016-0003", vec![line(None, 999.0)], admin.id),
    )
    .await
    .unwrap();
    InvoiceRepo::update_status(&pool, cancelled.id, "cancelled", &InvoiceStamps::default())
        .await
        .unwrap();

    let summary = InvoiceRepo::summary(&pool).await.unwrap();
    assert_eq!(summary.total_invoiced, 420.0);
    assert_eq!(summary.total_paid, 300.0);
    assert_eq!(summary.outstanding, 120.0);
    assert_eq!(summary.overdue_count, 1);
}
