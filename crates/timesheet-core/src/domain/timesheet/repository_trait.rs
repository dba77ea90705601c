//! Repository trait for timesheet persistence
//!
//! This is the storage boundary of the domain layer. Reads return snapshots of
//! committed state. Writes are staged and only become visible once
//! `save_changes` commits the whole batch.
//!
//! Whether a write is an insert or an update is decided by the caller; the
//! repository never infers it from the entity.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::{
    NonChargeableTask, Project, ProjectId, SubProject, SubProjectId, TaskId, Workstage,
    WorkstageId,
};

/// Repository trait for timesheet persistence
#[async_trait]
pub trait TimesheetRepositoryTrait: Send + Sync {
    // ========== Reads ==========

    /// All projects
    async fn projects(&self) -> Result<Vec<Project>>;

    /// All sub-projects
    async fn sub_projects(&self) -> Result<Vec<SubProject>>;

    /// All workstages
    async fn workstages(&self) -> Result<Vec<Workstage>>;

    /// All non-chargeable tasks
    async fn non_chargeable_tasks(&self) -> Result<Vec<NonChargeableTask>>;

    /// Sub-projects of one project
    async fn sub_projects_of(&self, project_id: ProjectId) -> Result<Vec<SubProject>> {
        let mut sub_projects = self.sub_projects().await?;
        sub_projects.retain(|s| s.project_id == project_id);
        Ok(sub_projects)
    }

    /// Workstages of one sub-project
    async fn workstages_of(&self, sub_project_id: SubProjectId) -> Result<Vec<Workstage>> {
        let mut workstages = self.workstages().await?;
        workstages.retain(|w| w.sub_project_id == sub_project_id);
        Ok(workstages)
    }

    // ========== Staged writes ==========

    /// Stage a new project, returning the identity it will be stored under
    fn insert_project(&self, project: &Project) -> Result<ProjectId>;

    /// Stage changes to a persisted project
    fn update_project(&self, project: &Project) -> Result<()>;

    /// Stage a new sub-project, returning the identity it will be stored under
    fn insert_sub_project(&self, sub_project: &SubProject) -> Result<SubProjectId>;

    /// Stage changes to a persisted sub-project
    fn update_sub_project(&self, sub_project: &SubProject) -> Result<()>;

    /// Stage a new workstage, returning the identity it will be stored under
    fn insert_workstage(&self, workstage: &Workstage) -> Result<WorkstageId>;

    /// Stage changes to a persisted workstage
    fn update_workstage(&self, workstage: &Workstage) -> Result<()>;

    /// Stage a new task, returning the identity it will be stored under
    fn insert_non_chargeable_task(&self, task: &NonChargeableTask) -> Result<TaskId>;

    /// Stage changes to a persisted task
    fn update_non_chargeable_task(&self, task: &NonChargeableTask) -> Result<()>;

    // ========== Commit ==========

    /// Commit every staged change atomically
    ///
    /// On failure nothing is applied and the staged batch is discarded.
    async fn save_changes(&self) -> Result<()>;
}
