//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! JSON field names are camelCase; foreign keys serialize under the name of
//! the referenced entity (`client`, `project`, `assignedTo`).

pub mod activity;
pub mod client;
pub mod invoice;
pub mod notification;
pub mod project;
pub mod task;
pub mod user;
