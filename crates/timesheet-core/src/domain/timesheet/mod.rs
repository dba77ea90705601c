//! Timesheet domain module
//!
//! Classifies where a working day went: chargeable work against the
//! Project → SubProject → Workstage hierarchy, overhead against a flat list of
//! non-chargeable tasks.
//!
//! # Architecture
//!
//! - **Entities**: `Project`, `SubProject`, `Workstage`, `NonChargeableTask`
//! - **Repository**: `TimesheetRepositoryTrait` is the storage port;
//!   `TimesheetRepository` implements it over SQLite
//! - **Services**: `ProjectService` for the hierarchy, `TaskService` for overhead
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use timesheet_core::domain::timesheet::{Project, ProjectService, TimesheetRepository};
//!
//! let service = ProjectService::new(Arc::new(TimesheetRepository::new(pool.clone())));
//!
//! let mut project = Project::new("ABC", "Alpha");
//! service.save_project(&mut project).await?;
//!
//! let found = service.get_project_by_code("abc").await?;
//! ```

pub mod entity;
pub mod project_service;
pub mod repository;
pub mod repository_trait;
pub mod specification;
pub mod task_service;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use entity::{
    NonChargeableTask, Project, ProjectId, SubProject, SubProjectId, TaskId, Workstage,
    WorkstageId, code_key, codes_match,
};
pub use project_service::ProjectService;
pub use repository::TimesheetRepository;
pub use repository_trait::TimesheetRepositoryTrait;
pub use specification::{
    ChargeableSpec, ProjectCodeSpec, SubNumberSpec, SubProjectOfSpec, TaskNameSpec,
    WorkstageOfSpec,
};
pub use task_service::TaskService;
