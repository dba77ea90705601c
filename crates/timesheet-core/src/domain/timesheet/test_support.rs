//! Recording repository used by the service tests

use std::sync::Mutex;

use async_trait::async_trait;

use super::entity::{
    NonChargeableTask, Project, ProjectId, SubProject, SubProjectId, TaskId, Workstage,
    WorkstageId,
};
use super::repository_trait::TimesheetRepositoryTrait;
use crate::error::{Error, Result};

/// Every interaction the services have with the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Projects,
    SubProjects,
    Workstages,
    Tasks,
    InsertProject(String),
    UpdateProject(String),
    InsertSubProject(i32),
    UpdateSubProject(i32),
    InsertWorkstage(String),
    UpdateWorkstage(String),
    InsertTask(String),
    UpdateTask(String),
    SaveChanges,
}

/// In-memory repository that serves fixed snapshots and records calls
#[derive(Default)]
pub struct RecordingRepository {
    pub projects: Vec<Project>,
    pub sub_projects: Vec<SubProject>,
    pub workstages: Vec<Workstage>,
    pub tasks: Vec<NonChargeableTask>,
    pub fail_commit: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A project that looks like it came back from storage
    pub fn stored_project(code: &str) -> Project {
        let mut project = Project::new(code, format!("{} project", code));
        project.id = Some(ProjectId::generate());
        project
    }

    /// A sub-project of `project` that looks like it came back from storage
    pub fn stored_sub_project(project: &Project, sub_number: i32) -> SubProject {
        let mut sub_project =
            SubProject::for_project(project, sub_number, format!("Sub {}", sub_number)).unwrap();
        sub_project.id = Some(SubProjectId::generate());
        sub_project
    }

    /// A workstage of `sub_project` that looks like it came back from storage
    pub fn stored_workstage(sub_project: &SubProject, number: &str) -> Workstage {
        let mut workstage =
            Workstage::for_sub_project(sub_project, number, format!("Stage {}", number)).unwrap();
        workstage.id = Some(WorkstageId::generate());
        workstage
    }

    pub fn with_projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_sub_projects(mut self, sub_projects: Vec<SubProject>) -> Self {
        self.sub_projects = sub_projects;
        self
    }

    pub fn with_workstages(mut self, workstages: Vec<Workstage>) -> Self {
        self.workstages = workstages;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<NonChargeableTask>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TimesheetRepositoryTrait for RecordingRepository {
    async fn projects(&self) -> Result<Vec<Project>> {
        self.record(Call::Projects);
        Ok(self.projects.clone())
    }

    async fn sub_projects(&self) -> Result<Vec<SubProject>> {
        self.record(Call::SubProjects);
        Ok(self.sub_projects.clone())
    }

    async fn workstages(&self) -> Result<Vec<Workstage>> {
        self.record(Call::Workstages);
        Ok(self.workstages.clone())
    }

    async fn non_chargeable_tasks(&self) -> Result<Vec<NonChargeableTask>> {
        self.record(Call::Tasks);
        Ok(self.tasks.clone())
    }

    fn insert_project(&self, project: &Project) -> Result<ProjectId> {
        self.record(Call::InsertProject(project.code.clone()));
        Ok(ProjectId::generate())
    }

    fn update_project(&self, project: &Project) -> Result<()> {
        self.record(Call::UpdateProject(project.code.clone()));
        Ok(())
    }

    fn insert_sub_project(&self, sub_project: &SubProject) -> Result<SubProjectId> {
        self.record(Call::InsertSubProject(sub_project.sub_number));
        Ok(SubProjectId::generate())
    }

    fn update_sub_project(&self, sub_project: &SubProject) -> Result<()> {
        self.record(Call::UpdateSubProject(sub_project.sub_number));
        Ok(())
    }

    fn insert_workstage(&self, workstage: &Workstage) -> Result<WorkstageId> {
        self.record(Call::InsertWorkstage(workstage.workstage_number.clone()));
        Ok(WorkstageId::generate())
    }

    fn update_workstage(&self, workstage: &Workstage) -> Result<()> {
        self.record(Call::UpdateWorkstage(workstage.workstage_number.clone()));
        Ok(())
    }

    fn insert_non_chargeable_task(&self, task: &NonChargeableTask) -> Result<TaskId> {
        self.record(Call::InsertTask(task.name.clone()));
        Ok(TaskId::generate())
    }

    fn update_non_chargeable_task(&self, task: &NonChargeableTask) -> Result<()> {
        self.record(Call::UpdateTask(task.name.clone()));
        Ok(())
    }

    async fn save_changes(&self) -> Result<()> {
        self.record(Call::SaveChanges);
        if self.fail_commit {
            return Err(Error::PersistenceError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}
