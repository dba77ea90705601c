//! Timesheet classification entities
//!
//! Chargeable work is classified as Project → SubProject → Workstage; overhead
//! work is booked against a flat list of non-chargeable tasks.
//!
//! Every entity starts life with no identity. The store generates one when the
//! entity is first committed, and from then on the presence of an identity is
//! what marks the entity as already persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh identity
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| Error::Parse(format!("{} '{}': {}", $label, s, e)))
            }
        }
    };
}

entity_id!(
    /// Identity of a persisted project
    ProjectId,
    "project id"
);
entity_id!(
    /// Identity of a persisted sub-project
    SubProjectId,
    "sub-project id"
);
entity_id!(
    /// Identity of a persisted workstage
    WorkstageId,
    "workstage id"
);
entity_id!(
    /// Identity of a persisted non-chargeable task
    TaskId,
    "task id"
);

/// Case-folded form of a business code; two codes are the same iff their keys are equal
pub fn code_key(code: &str) -> String {
    code.to_lowercase()
}

/// Case-insensitive comparison used for every business-key lookup
pub fn codes_match(left: &str, right: &str) -> bool {
    left == right || code_key(left) == code_key(right)
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{} is required", what)));
    }
    Ok(())
}

/// A piece of work identified by a project code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<ProjectId>,
    /// Business key, unique ignoring case
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub is_chargeable: bool,
}

impl Project {
    /// Create a new, not yet persisted, chargeable project
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            code: code.into(),
            name: name.into(),
            description: None,
            is_chargeable: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn non_chargeable(mut self) -> Self {
        self.is_chargeable = false;
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Identity of a persisted project, or an error naming the project
    pub fn persisted_id(&self) -> Result<ProjectId> {
        self.id.ok_or_else(|| {
            Error::InvalidArgument(format!("project '{}' has not been saved", self.code))
        })
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.code, "project code")?;
        require(&self.name, "project name")
    }
}

/// A numbered subdivision of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProject {
    pub id: Option<SubProjectId>,
    pub project_id: ProjectId,
    /// Business key, unique within the parent project
    pub sub_number: i32,
    pub name: String,
    pub description: Option<String>,
}

impl SubProject {
    /// Create a new sub-project under a persisted project
    pub fn for_project(project: &Project, sub_number: i32, name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: None,
            project_id: project.persisted_id()?,
            sub_number,
            name: name.into(),
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn persisted_id(&self) -> Result<SubProjectId> {
        self.id.ok_or_else(|| {
            Error::InvalidArgument(format!("sub-project {} has not been saved", self.sub_number))
        })
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.name, "sub-project name")
    }
}

/// A stage of work within a sub-project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workstage {
    pub id: Option<WorkstageId>,
    pub sub_project_id: SubProjectId,
    pub workstage_number: String,
    pub name: String,
    pub description: Option<String>,
}

impl Workstage {
    /// Create a new workstage under a persisted sub-project
    pub fn for_sub_project(
        sub_project: &SubProject,
        workstage_number: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: None,
            sub_project_id: sub_project.persisted_id()?,
            workstage_number: workstage_number.into(),
            name: name.into(),
            description: None,
        })
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.workstage_number, "workstage number")?;
        require(&self.name, "workstage name")
    }
}

/// Overhead work that is booked outside any project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonChargeableTask {
    pub id: Option<TaskId>,
    pub name: String,
    pub description: Option<String>,
}

impl NonChargeableTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        require(&self.name, "task name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entities_have_no_identity() {
        let project = Project::new("ABC", "Alpha");
        assert!(project.is_new());
        assert!(project.is_chargeable);
        assert!(NonChargeableTask::new("Training").is_new());
    }

    #[test]
    fn test_sub_project_requires_persisted_parent() {
        let project = Project::new("ABC", "Alpha");
        let err = SubProject::for_project(&project, 1, "Design").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let mut project = project;
        project.id = Some(ProjectId::generate());
        let sub = SubProject::for_project(&project, 1, "Design").unwrap();
        assert_eq!(Some(sub.project_id), project.id);
        assert!(sub.is_new());
    }

    #[test]
    fn test_workstage_requires_persisted_parent() {
        let mut project = Project::new("ABC", "Alpha");
        project.id = Some(ProjectId::generate());
        let mut sub = SubProject::for_project(&project, 1, "Design").unwrap();

        assert!(Workstage::for_sub_project(&sub, "01", "Survey").is_err());

        sub.id = Some(SubProjectId::generate());
        let stage = Workstage::for_sub_project(&sub, "01", "Survey").unwrap();
        assert_eq!(Some(stage.sub_project_id), sub.id);
    }

    #[test]
    fn test_validate_rejects_blank_required_fields() {
        assert!(Project::new("", "Alpha").validate().is_err());
        assert!(Project::new("ABC", "   ").validate().is_err());
        assert!(Project::new("ABC", "Alpha").validate().is_ok());
        assert!(NonChargeableTask::new("").validate().is_err());
    }

    #[test]
    fn test_codes_match_ignores_case() {
        assert!(codes_match("xyz", "XYZ"));
        assert!(codes_match("Ab-1", "aB-1"));
        assert!(!codes_match("ABC", "ABD"));
        assert!(codes_match("ÉCOLE", "école"));
        assert_eq!(code_key("ÉCOLE"), code_key("École"));
    }

    #[test]
    fn test_id_parse_round_trip_and_error() {
        let id = ProjectId::generate();
        let parsed: ProjectId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let err = "not-a-uuid".parse::<TaskId>().unwrap_err();
        assert_eq!(err.code(), "E002");
        assert!(err.to_string().contains("task id"));
    }

    #[test]
    fn test_json_shape() {
        let mut project = Project::new("ABC", "Alpha").non_chargeable();
        let id = ProjectId::generate();
        project.id = Some(id);

        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["id"], serde_json::Value::String(id.to_string()));
        assert_eq!(value["code"], "ABC");
        assert_eq!(value["is_chargeable"], false);
        assert!(value["description"].is_null());

        let unsaved = serde_json::to_value(NonChargeableTask::new("Training")).unwrap();
        assert!(unsaved["id"].is_null());
    }
}
