//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the narrow data-access contracts consumed by the services.
//! - Isolate SQLite query details from chart/schedule orchestration.
//!
//! # Invariants
//! - Listings are deterministic: store order is `id ASC`.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors; invalid persisted rows surface as `InvalidData`
//!   instead of being masked.

pub mod link_repo;
pub mod project_repo;
pub mod task_repo;
