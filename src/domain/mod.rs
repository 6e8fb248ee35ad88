//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, state machine, errors)
//! - `enrollment` - Enrollment payment lifecycle and webhook rules

pub mod enrollment;
pub mod foundation;
