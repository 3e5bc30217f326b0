//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `decision` - Questions, answers, recommendations and saved records
//! - `wizard` - Step sum type and per-session limits

pub mod decision;
pub mod foundation;
pub mod wizard;
