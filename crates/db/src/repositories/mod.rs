//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Reads take `&PgPool`; writes that must commit together with an audit
//! entry take the open transaction instead.

pub mod audit_repo;
pub mod issue_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use issue_repo::IssueRepo;
pub use user_repo::UserRepo;
