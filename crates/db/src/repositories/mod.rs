//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Multi-statement writes that must
//! not be observed half-done open their own transaction.

mod filter;

pub mod activity_repo;
pub mod client_repo;
pub mod invoice_repo;
pub mod notification_repo;
pub mod project_repo;
pub mod sequence_repo;
pub mod task_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepo;
pub use client_repo::ClientRepo;
pub use invoice_repo::InvoiceRepo;
pub use notification_repo::NotificationRepo;
pub use project_repo::ProjectRepo;
pub use sequence_repo::SequenceRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
