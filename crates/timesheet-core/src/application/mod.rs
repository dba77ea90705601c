//! Application service layer
//!
//! Wires the domain services to a single storage port.

pub mod service_locator;

pub use service_locator::ServiceLocator;
