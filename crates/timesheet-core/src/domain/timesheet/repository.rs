//! SQLite timesheet repository
//!
//! Writes are queued in memory and replayed inside a single transaction by
//! `save_changes`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::entity::{
    NonChargeableTask, Project, ProjectId, SubProject, SubProjectId, TaskId, Workstage,
    WorkstageId, code_key,
};
use super::repository_trait::TimesheetRepositoryTrait;
use crate::error::{Error, Result};

/// A write waiting for the next commit
#[derive(Debug, Clone)]
enum PendingChange {
    InsertProject(ProjectId, Project),
    UpdateProject(ProjectId, Project),
    InsertSubProject(SubProjectId, SubProject),
    UpdateSubProject(SubProjectId, SubProject),
    InsertWorkstage(WorkstageId, Workstage),
    UpdateWorkstage(WorkstageId, Workstage),
    InsertTask(TaskId, NonChargeableTask),
    UpdateTask(TaskId, NonChargeableTask),
}

/// Repository for timesheet database operations
///
/// One pending batch is shared by every caller holding this repository, and
/// `save_changes` commits or discards whatever is staged at that moment. A
/// caller whose writes were swept into another caller's failed commit gets no
/// error of its own, so callers sharing an instance must serialize their
/// stage-then-commit sequences.
#[derive(Debug)]
pub struct TimesheetRepository {
    pool: SqlitePool,
    pending: Mutex<Vec<PendingChange>>,
}

impl TimesheetRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of writes staged since the last commit
    pub fn pending_changes(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> MutexGuard<'_, Vec<PendingChange>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stage(&self, change: PendingChange) {
        self.pending().push(change);
    }

    async fn apply(conn: &mut SqliteConnection, change: &PendingChange) -> Result<()> {
        match change {
            PendingChange::InsertProject(id, project) => {
                sqlx::query(
                    r#"
                    INSERT INTO projects (id, code, code_key, name, description, is_chargeable)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(id.to_string())
                .bind(&project.code)
                .bind(code_key(&project.code))
                .bind(&project.name)
                .bind(&project.description)
                .bind(project.is_chargeable)
                .execute(&mut *conn)
                .await?;
            }
            PendingChange::UpdateProject(id, project) => {
                let result = sqlx::query(
                    r#"
                    UPDATE projects SET
                        code = ?,
                        code_key = ?,
                        name = ?,
                        description = ?,
                        is_chargeable = ?,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                )
                .bind(&project.code)
                .bind(code_key(&project.code))
                .bind(&project.name)
                .bind(&project.description)
                .bind(project.is_chargeable)
                .bind(id.to_string())
                .execute(&mut *conn)
                .await?;
                ensure_updated(result.rows_affected(), "project", id)?;
            }
            PendingChange::InsertSubProject(id, sub_project) => {
                sqlx::query(
                    r#"
                    INSERT INTO sub_projects (id, project_id, sub_number, name, description)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(id.to_string())
                .bind(sub_project.project_id.to_string())
                .bind(sub_project.sub_number)
                .bind(&sub_project.name)
                .bind(&sub_project.description)
                .execute(&mut *conn)
                .await?;
            }
            PendingChange::UpdateSubProject(id, sub_project) => {
                let result = sqlx::query(
                    r#"
                    UPDATE sub_projects SET
                        project_id = ?,
                        sub_number = ?,
                        name = ?,
                        description = ?,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                )
                .bind(sub_project.project_id.to_string())
                .bind(sub_project.sub_number)
                .bind(&sub_project.name)
                .bind(&sub_project.description)
                .bind(id.to_string())
                .execute(&mut *conn)
                .await?;
                ensure_updated(result.rows_affected(), "sub-project", id)?;
            }
            PendingChange::InsertWorkstage(id, workstage) => {
                sqlx::query(
                    r#"
                    INSERT INTO workstages (id, sub_project_id, workstage_number, name, description)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(id.to_string())
                .bind(workstage.sub_project_id.to_string())
                .bind(&workstage.workstage_number)
                .bind(&workstage.name)
                .bind(&workstage.description)
                .execute(&mut *conn)
                .await?;
            }
            PendingChange::UpdateWorkstage(id, workstage) => {
                let result = sqlx::query(
                    r#"
                    UPDATE workstages SET
                        sub_project_id = ?,
                        workstage_number = ?,
                        name = ?,
                        description = ?,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                )
                .bind(workstage.sub_project_id.to_string())
                .bind(&workstage.workstage_number)
                .bind(&workstage.name)
                .bind(&workstage.description)
                .bind(id.to_string())
                .execute(&mut *conn)
                .await?;
                ensure_updated(result.rows_affected(), "workstage", id)?;
            }
            PendingChange::InsertTask(id, task) => {
                sqlx::query(
                    r#"
                    INSERT INTO non_chargeable_tasks (id, name, description)
                    VALUES (?, ?, ?)
                    "#,
                )
                .bind(id.to_string())
                .bind(&task.name)
                .bind(&task.description)
                .execute(&mut *conn)
                .await?;
            }
            PendingChange::UpdateTask(id, task) => {
                let result = sqlx::query(
                    r#"
                    UPDATE non_chargeable_tasks SET
                        name = ?,
                        description = ?,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                )
                .bind(&task.name)
                .bind(&task.description)
                .bind(id.to_string())
                .execute(&mut *conn)
                .await?;
                ensure_updated(result.rows_affected(), "task", id)?;
            }
        }
        Ok(())
    }
}

fn ensure_updated(rows_affected: u64, entity: &str, id: &dyn std::fmt::Display) -> Result<()> {
    if rows_affected == 0 {
        return Err(Error::ConstraintViolation(format!(
            "{} {} does not exist",
            entity, id
        )));
    }
    Ok(())
}

fn missing_identity(entity: &str) -> Error {
    Error::ConstraintViolation(format!("cannot update a {} that has no identity", entity))
}

#[async_trait]
impl TimesheetRepositoryTrait for TimesheetRepository {
    async fn projects(&self) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            r#"
            SELECT id, code, name, description, is_chargeable
            FROM projects
            ORDER BY code_key
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProjectRow::into_project).collect()
    }

    async fn sub_projects(&self) -> Result<Vec<SubProject>> {
        let rows: Vec<SubProjectRow> = sqlx::query_as(
            r#"
            SELECT id, project_id, sub_number, name, description
            FROM sub_projects
            ORDER BY project_id, sub_number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubProjectRow::into_sub_project).collect()
    }

    async fn workstages(&self) -> Result<Vec<Workstage>> {
        let rows: Vec<WorkstageRow> = sqlx::query_as(
            r#"
            SELECT id, sub_project_id, workstage_number, name, description
            FROM workstages
            ORDER BY sub_project_id, workstage_number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorkstageRow::into_workstage).collect()
    }

    async fn non_chargeable_tasks(&self) -> Result<Vec<NonChargeableTask>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, name, description
            FROM non_chargeable_tasks
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn sub_projects_of(&self, project_id: ProjectId) -> Result<Vec<SubProject>> {
        let rows: Vec<SubProjectRow> = sqlx::query_as(
            r#"
            SELECT id, project_id, sub_number, name, description
            FROM sub_projects
            WHERE project_id = ?
            ORDER BY sub_number
            "#,
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubProjectRow::into_sub_project).collect()
    }

    async fn workstages_of(&self, sub_project_id: SubProjectId) -> Result<Vec<Workstage>> {
        let rows: Vec<WorkstageRow> = sqlx::query_as(
            r#"
            SELECT id, sub_project_id, workstage_number, name, description
            FROM workstages
            WHERE sub_project_id = ?
            ORDER BY workstage_number
            "#,
        )
        .bind(sub_project_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorkstageRow::into_workstage).collect()
    }

    fn insert_project(&self, project: &Project) -> Result<ProjectId> {
        let id = ProjectId::generate();
        self.stage(PendingChange::InsertProject(id, project.clone()));
        Ok(id)
    }

    fn update_project(&self, project: &Project) -> Result<()> {
        let id = project.id.ok_or_else(|| missing_identity("project"))?;
        self.stage(PendingChange::UpdateProject(id, project.clone()));
        Ok(())
    }

    fn insert_sub_project(&self, sub_project: &SubProject) -> Result<SubProjectId> {
        let id = SubProjectId::generate();
        self.stage(PendingChange::InsertSubProject(id, sub_project.clone()));
        Ok(id)
    }

    fn update_sub_project(&self, sub_project: &SubProject) -> Result<()> {
        let id = sub_project.id.ok_or_else(|| missing_identity("sub-project"))?;
        self.stage(PendingChange::UpdateSubProject(id, sub_project.clone()));
        Ok(())
    }

    fn insert_workstage(&self, workstage: &Workstage) -> Result<WorkstageId> {
        let id = WorkstageId::generate();
        self.stage(PendingChange::InsertWorkstage(id, workstage.clone()));
        Ok(id)
    }

    fn update_workstage(&self, workstage: &Workstage) -> Result<()> {
        let id = workstage.id.ok_or_else(|| missing_identity("workstage"))?;
        self.stage(PendingChange::UpdateWorkstage(id, workstage.clone()));
        Ok(())
    }

    fn insert_non_chargeable_task(&self, task: &NonChargeableTask) -> Result<TaskId> {
        let id = TaskId::generate();
        self.stage(PendingChange::InsertTask(id, task.clone()));
        Ok(id)
    }

    fn update_non_chargeable_task(&self, task: &NonChargeableTask) -> Result<()> {
        let id = task.id.ok_or_else(|| missing_identity("task"))?;
        self.stage(PendingChange::UpdateTask(id, task.clone()));
        Ok(())
    }

    async fn save_changes(&self) -> Result<()> {
        let batch = std::mem::take(&mut *self.pending());
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for change in &batch {
            Self::apply(&mut tx, change).await?;
        }
        tx.commit().await?;

        debug!(changes = batch.len(), "Committed staged timesheet changes");
        Ok(())
    }
}

// ========== Row Types ==========

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: String,
    code: String,
    name: String,
    description: Option<String>,
    is_chargeable: bool,
}

impl ProjectRow {
    fn into_project(self) -> Result<Project> {
        Ok(Project {
            id: Some(self.id.parse()?),
            code: self.code,
            name: self.name,
            description: self.description,
            is_chargeable: self.is_chargeable,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubProjectRow {
    id: String,
    project_id: String,
    sub_number: i32,
    name: String,
    description: Option<String>,
}

impl SubProjectRow {
    fn into_sub_project(self) -> Result<SubProject> {
        Ok(SubProject {
            id: Some(self.id.parse()?),
            project_id: self.project_id.parse()?,
            sub_number: self.sub_number,
            name: self.name,
            description: self.description,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WorkstageRow {
    id: String,
    sub_project_id: String,
    workstage_number: String,
    name: String,
    description: Option<String>,
}

impl WorkstageRow {
    fn into_workstage(self) -> Result<Workstage> {
        Ok(Workstage {
            id: Some(self.id.parse()?),
            sub_project_id: self.sub_project_id.parse()?,
            workstage_number: self.workstage_number,
            name: self.name,
            description: self.description,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    name: String,
    description: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Result<NonChargeableTask> {
        Ok(NonChargeableTask {
            id: Some(self.id.parse()?),
            name: self.name,
            description: self.description,
        })
    }
}
