//! Domain layer
//!
//! Contains the timesheet entities, the storage port and the business services.

pub mod specification;
pub mod timesheet;
