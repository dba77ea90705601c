//! Timesheet Core Library
//!
//! This crate provides the domain and service layer of the timesheet diary:
//! - Domain entities (projects, sub-projects, workstages, non-chargeable tasks)
//! - The storage port and its SQLite adapter
//! - Project and task services
//! - A service locator binding the services to one repository
//! - Configuration and storage bootstrap

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::ServiceLocator;
    pub use crate::config::Config;
    pub use crate::domain::timesheet::{
        NonChargeableTask, Project, ProjectService, SubProject, TaskService,
        TimesheetRepository, TimesheetRepositoryTrait, Workstage,
    };
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}
