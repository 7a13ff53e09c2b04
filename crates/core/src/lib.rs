//! Domain logic for the opsdesk ERP backend.
//!
//! Everything here is pure: no database, no HTTP. The store and API crates
//! call into these modules to decide what to write and whether a caller may
//! write it.

pub mod access;
pub mod diff;
pub mod error;
pub mod invoice;
pub mod lifecycle;
pub mod numbering;
pub mod pagination;
pub mod roles;
pub mod status;
pub mod types;
pub mod validation;
