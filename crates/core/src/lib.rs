//! Issue workflow domain: status and assignment lifecycles, the authorization
//! policy, the audit trail, and the roadmap projection built from it.

pub mod assignment;
pub mod audit;
pub mod dashboard;
pub mod error;
pub mod issue;
pub mod memory;
pub mod policy;
pub mod roadmap;
pub mod roles;
pub mod status;
pub mod store;
pub mod types;
pub mod workflow;
