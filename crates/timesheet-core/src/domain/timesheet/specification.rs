//! Timesheet-specific specifications

use std::collections::HashSet;

use super::entity::{
    NonChargeableTask, Project, ProjectId, SubProject, SubProjectId, Workstage, codes_match,
};
use crate::domain::specification::Specification;

/// Project whose code matches, ignoring case
pub struct ProjectCodeSpec {
    code: String,
}

impl ProjectCodeSpec {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl Specification<Project> for ProjectCodeSpec {
    fn is_satisfied_by(&self, project: &Project) -> bool {
        codes_match(&project.code, &self.code)
    }
}

/// Project that can be charged to a client
pub struct ChargeableSpec;

impl Specification<Project> for ChargeableSpec {
    fn is_satisfied_by(&self, project: &Project) -> bool {
        project.is_chargeable
    }
}

/// Sub-project belonging to any of the given projects
pub struct SubProjectOfSpec {
    project_ids: HashSet<ProjectId>,
}

impl SubProjectOfSpec {
    pub fn new(project_ids: impl IntoIterator<Item = ProjectId>) -> Self {
        Self {
            project_ids: project_ids.into_iter().collect(),
        }
    }
}

impl Specification<SubProject> for SubProjectOfSpec {
    fn is_satisfied_by(&self, sub_project: &SubProject) -> bool {
        self.project_ids.contains(&sub_project.project_id)
    }
}

/// Sub-project with exactly this number
pub struct SubNumberSpec(pub i32);

impl Specification<SubProject> for SubNumberSpec {
    fn is_satisfied_by(&self, sub_project: &SubProject) -> bool {
        sub_project.sub_number == self.0
    }
}

/// Workstage belonging to the given sub-project
pub struct WorkstageOfSpec(pub SubProjectId);

impl Specification<Workstage> for WorkstageOfSpec {
    fn is_satisfied_by(&self, workstage: &Workstage) -> bool {
        workstage.sub_project_id == self.0
    }
}

/// Task whose name matches, ignoring case
pub struct TaskNameSpec {
    name: String,
}

impl TaskNameSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Specification<NonChargeableTask> for TaskNameSpec {
    fn is_satisfied_by(&self, task: &NonChargeableTask) -> bool {
        codes_match(&task.name, &self.name)
    }
}
