//! Project service
//!
//! Business operations over the project hierarchy. Lookups are keyed by the
//! business codes people type into a timesheet (project code, sub-project
//! number) rather than by stored identities.
//!
//! Saving follows one rule: an entity without an identity is inserted, an
//! entity with one is updated, and the change is committed before the call
//! returns. Duplicate business keys are not checked here; the store rejects
//! them on commit.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::entity::{Project, ProjectId, SubProject, SubProjectId, Workstage, code_key};
use super::repository_trait::TimesheetRepositoryTrait;
use super::specification::{ProjectCodeSpec, SubNumberSpec, SubProjectOfSpec};
use crate::domain::specification::{Specification, select};
use crate::error::{Error, Result};

/// Reduce a lookup to at most one record
///
/// Business keys are assumed unique; more than one match is reported as
/// `Error::Ambiguous` rather than picking one.
pub(crate) fn single_match<T>(
    mut matches: Vec<T>,
    entity: &'static str,
    key: impl FnOnce() -> String,
) -> Result<Option<T>> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        count => {
            let key = key();
            warn!(entity, key = %key, count, "Business key matched more than one record");
            Err(Error::Ambiguous { entity, key, count })
        }
    }
}

/// Service for projects, sub-projects and workstages
#[derive(Clone)]
pub struct ProjectService {
    repository: Arc<dyn TimesheetRepositoryTrait>,
}

impl ProjectService {
    /// Create a new project service over the given repository
    pub fn new(repository: Arc<dyn TimesheetRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Get the underlying repository
    pub fn repository(&self) -> &Arc<dyn TimesheetRepositoryTrait> {
        &self.repository
    }

    // ========== Projects ==========

    /// All projects, as stored
    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.repository.projects().await
    }

    /// Projects satisfying a specification
    pub async fn find_projects(&self, spec: &dyn Specification<Project>) -> Result<Vec<Project>> {
        Ok(select(self.repository.projects().await?, spec))
    }

    /// Projects in listing order: chargeable first, then by code descending
    pub async fn project_listing(&self) -> Result<Vec<Project>> {
        let mut projects = self.repository.projects().await?;
        projects.sort_by(|a, b| {
            b.is_chargeable
                .cmp(&a.is_chargeable)
                .then_with(|| code_key(&b.code).cmp(&code_key(&a.code)))
        });
        Ok(projects)
    }

    /// Find the project with this code, ignoring case
    pub async fn get_project_by_code(&self, code: &str) -> Result<Option<Project>> {
        let matches = self.find_projects(&ProjectCodeSpec::new(code)).await?;
        single_match(matches, "project", || code.to_string())
    }

    /// Insert or update a project and commit
    ///
    /// A newly inserted project receives its identity once the commit succeeds.
    pub async fn save_project(&self, project: &mut Project) -> Result<()> {
        project.validate()?;

        match project.id {
            None => {
                let id = self.repository.insert_project(project)?;
                debug!(code = %project.code, "Staged project insert");
                self.repository.save_changes().await?;
                project.id = Some(id);
                info!(project_id = %id, code = %project.code, "Project created");
            }
            Some(id) => {
                self.repository.update_project(project)?;
                debug!(project_id = %id, "Staged project update");
                self.repository.save_changes().await?;
                info!(project_id = %id, code = %project.code, "Project updated");
            }
        }
        Ok(())
    }

    pub async fn delete_project(&self, _project: &Project) -> Result<()> {
        Err(Error::Unsupported("Deleting a project"))
    }

    // ========== Sub-projects ==========

    /// All sub-projects, as stored
    pub async fn sub_projects(&self) -> Result<Vec<SubProject>> {
        self.repository.sub_projects().await
    }

    /// Sub-projects satisfying a specification
    pub async fn find_sub_projects(
        &self,
        spec: &dyn Specification<SubProject>,
    ) -> Result<Vec<SubProject>> {
        Ok(select(self.repository.sub_projects().await?, spec))
    }

    /// Sub-projects belonging to one project
    pub async fn sub_projects_of(&self, project_id: ProjectId) -> Result<Vec<SubProject>> {
        self.repository.sub_projects_of(project_id).await
    }

    /// Find a sub-project by its parent's code (ignoring case) and its number
    pub async fn get_sub_project_by_code_and_sub_number(
        &self,
        code: &str,
        sub_number: i32,
    ) -> Result<Option<SubProject>> {
        let project_ids: Vec<ProjectId> = self
            .find_projects(&ProjectCodeSpec::new(code))
            .await?
            .into_iter()
            .filter_map(|p| p.id)
            .collect();
        if project_ids.is_empty() {
            return Ok(None);
        }

        let spec = SubProjectOfSpec::new(project_ids).and(SubNumberSpec(sub_number));
        let matches = self.find_sub_projects(&spec).await?;
        single_match(matches, "subproject", || format!("{}/{}", code, sub_number))
    }

    /// Insert or update a sub-project and commit
    pub async fn save_sub_project(&self, sub_project: &mut SubProject) -> Result<()> {
        sub_project.validate()?;

        match sub_project.id {
            None => {
                let id = self.repository.insert_sub_project(sub_project)?;
                debug!(
                    project_id = %sub_project.project_id,
                    sub_number = sub_project.sub_number,
                    "Staged sub-project insert"
                );
                self.repository.save_changes().await?;
                sub_project.id = Some(id);
                info!(sub_project_id = %id, sub_number = sub_project.sub_number, "Sub-project created");
            }
            Some(id) => {
                self.repository.update_sub_project(sub_project)?;
                debug!(sub_project_id = %id, "Staged sub-project update");
                self.repository.save_changes().await?;
                info!(sub_project_id = %id, sub_number = sub_project.sub_number, "Sub-project updated");
            }
        }
        Ok(())
    }

    pub async fn delete_sub_project(&self, _sub_project: &SubProject) -> Result<()> {
        Err(Error::Unsupported("Deleting a sub-project"))
    }

    // ========== Workstages ==========

    /// All workstages, as stored
    pub async fn workstages(&self) -> Result<Vec<Workstage>> {
        self.repository.workstages().await
    }

    /// Workstages satisfying a specification
    pub async fn find_workstages(
        &self,
        spec: &dyn Specification<Workstage>,
    ) -> Result<Vec<Workstage>> {
        Ok(select(self.repository.workstages().await?, spec))
    }

    /// Workstages belonging to one sub-project
    pub async fn workstages_of(&self, sub_project_id: SubProjectId) -> Result<Vec<Workstage>> {
        self.repository.workstages_of(sub_project_id).await
    }

    pub async fn save_workstage(&self, _workstage: &mut Workstage) -> Result<()> {
        Err(Error::Unsupported("Saving a workstage"))
    }

    pub async fn delete_workstage(&self, _workstage: &Workstage) -> Result<()> {
        Err(Error::Unsupported("Deleting a workstage"))
    }
}
