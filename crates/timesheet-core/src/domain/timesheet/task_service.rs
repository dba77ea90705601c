//! Non-chargeable task service

use std::sync::Arc;

use tracing::{debug, info};

use super::entity::NonChargeableTask;
use super::project_service::single_match;
use super::repository_trait::TimesheetRepositoryTrait;
use super::specification::TaskNameSpec;
use crate::domain::specification::{Specification, select};
use crate::error::Result;

/// Service for overhead tasks booked outside any project
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TimesheetRepositoryTrait>,
}

impl TaskService {
    pub fn new(repository: Arc<dyn TimesheetRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// All tasks, as stored
    pub async fn tasks(&self) -> Result<Vec<NonChargeableTask>> {
        self.repository.non_chargeable_tasks().await
    }

    pub async fn find_tasks(
        &self,
        spec: &dyn Specification<NonChargeableTask>,
    ) -> Result<Vec<NonChargeableTask>> {
        Ok(select(self.repository.non_chargeable_tasks().await?, spec))
    }

    /// Find the task with this name, ignoring case
    pub async fn get_task_by_name(&self, name: &str) -> Result<Option<NonChargeableTask>> {
        let matches = self.find_tasks(&TaskNameSpec::new(name)).await?;
        single_match(matches, "task", || name.to_string())
    }

    /// Insert or update a task and commit
    pub async fn save_task(&self, task: &mut NonChargeableTask) -> Result<()> {
        task.validate()?;

        match task.id {
            None => {
                let id = self.repository.insert_non_chargeable_task(task)?;
                debug!(name = %task.name, "Staged task insert");
                self.repository.save_changes().await?;
                task.id = Some(id);
                info!(task_id = %id, name = %task.name, "Task created");
            }
            Some(id) => {
                self.repository.update_non_chargeable_task(task)?;
                debug!(task_id = %id, "Staged task update");
                self.repository.save_changes().await?;
                info!(task_id = %id, name = %task.name, "Task updated");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timesheet::entity::TaskId;
    use crate::domain::timesheet::test_support::{Call, RecordingRepository};
    use crate::error::Error;

    fn stored_task(name: &str) -> NonChargeableTask {
        let mut task = NonChargeableTask::new(name);
        task.id = Some(TaskId::generate());
        task
    }

    #[tokio::test]
    async fn test_get_task_by_name_ignores_case() {
        let repository = Arc::new(RecordingRepository::new().with_tasks(vec![
            stored_task("Training"),
            stored_task("Annual Leave"),
        ]));
        let service = TaskService::new(repository.clone());

        let found = service.get_task_by_name("annual leave").await.unwrap();
        assert_eq!(found.map(|t| t.name), Some("Annual Leave".to_string()));
        assert!(service.get_task_by_name("Sick").await.unwrap().is_none());
        assert_eq!(repository.count(|c| *c == Call::Tasks), 2);
    }

    #[tokio::test]
    async fn test_duplicate_task_names_are_ambiguous() {
        let repository = Arc::new(
            RecordingRepository::new()
                .with_tasks(vec![stored_task("Training"), stored_task("TRAINING")]),
        );

        let err = TaskService::new(repository)
            .get_task_by_name("training")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ambiguous { entity: "task", count: 2, .. }));
    }

    #[tokio::test]
    async fn test_save_task_insert_then_update() {
        let repository = Arc::new(RecordingRepository::new());
        let service = TaskService::new(repository.clone());

        let mut task = NonChargeableTask::new("Training").with_description("Courses");
        service.save_task(&mut task).await.unwrap();
        assert!(!task.is_new());

        task.description = None;
        service.save_task(&mut task).await.unwrap();

        assert_eq!(
            repository.calls(),
            vec![
                Call::InsertTask("Training".to_string()),
                Call::SaveChanges,
                Call::UpdateTask("Training".to_string()),
                Call::SaveChanges,
            ]
        );
    }

    #[tokio::test]
    async fn test_save_blank_task_touches_nothing() {
        let repository = Arc::new(RecordingRepository::new());
        let mut task = NonChargeableTask::new(" ");

        let err = TaskService::new(repository.clone())
            .save_task(&mut task)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_task_new() {
        let repository = Arc::new(RecordingRepository::new().failing_commit());
        let mut task = NonChargeableTask::new("Training");

        let result = TaskService::new(repository).save_task(&mut task).await;
        assert!(result.unwrap_err().is_persistence());
        assert!(task.is_new());
    }
}
