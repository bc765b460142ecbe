//! Row models and their conversions into domain types.

pub mod audit;
pub mod issue;
pub mod user;
