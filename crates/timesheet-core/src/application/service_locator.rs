//! Service locator
//!
//! Hands out the timesheet services, all bound to one shared repository.

use std::sync::Arc;

use crate::domain::timesheet::{ProjectService, TaskService, TimesheetRepositoryTrait};

/// Resolves services over a shared storage port
#[derive(Clone)]
pub struct ServiceLocator {
    repository: Arc<dyn TimesheetRepositoryTrait>,
}

impl ServiceLocator {
    pub fn new(repository: Arc<dyn TimesheetRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// The repository every resolved service shares
    pub fn repository(&self) -> &Arc<dyn TimesheetRepositoryTrait> {
        &self.repository
    }

    /// A project service bound to the shared repository
    pub fn project_service(&self) -> ProjectService {
        ProjectService::new(Arc::clone(&self.repository))
    }

    /// A task service bound to the shared repository
    pub fn task_service(&self) -> TaskService {
        TaskService::new(Arc::clone(&self.repository))
    }
}
