//! Transfer workflow engine for a multi-campus school network.
//!
//! The heart of the crate lives in [`workflows::transfers`]: four role-gated
//! approval state machines (section, shift, grade-skip, and campus transfers),
//! the eligibility rules that bound where an entity may move, and the
//! identifier codec that rewrites display ids when a transfer is applied.
//! The surrounding modules carry service concerns: configuration, telemetry,
//! and the top-level error type used by the HTTP binary.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
