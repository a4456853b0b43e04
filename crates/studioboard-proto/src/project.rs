//! Studio projects and their task roll-ups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::entity::{Entity, EntityId, EntityKind, MemberRef};
use crate::error::{require, ValidationError};
use crate::task::{Task, TaskStatus};

/// Colour used when a project is created without one
pub const DEFAULT_PROJECT_COLOR: &str = "#2563eb";

/// Project lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "At Risk")]
    AtRisk,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "Planned",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::AtRisk => "At Risk",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion percentage, always within `0..=100`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    pub const MAX: u8 = 100;

    /// Round and clamp an arbitrary number into a percentage
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0);
        }
        Self(value.round().clamp(0.0, f64::from(Self::MAX)) as u8)
    }

    /// Percentage of `done` out of `total`, 0 when `total` is 0
    pub fn from_ratio(done: u32, total: u32) -> Self {
        if total == 0 {
            return Self(0);
        }
        Self::new(f64::from(done) * 100.0 / f64::from(total))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for Progress {
    fn from(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }
}

impl<'de> Deserialize<'de> for Progress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Ok(Progress::new(raw))
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Cached `{total, completed}` task counts of a project
///
/// `completed` never exceeds `total`; every constructor and the
/// deserializer enforce it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTaskSummary")]
pub struct TaskSummary {
    total: u32,
    completed: u32,
}

#[derive(Deserialize)]
struct RawTaskSummary {
    #[serde(default)]
    total: u32,
    #[serde(default)]
    completed: u32,
}

impl From<RawTaskSummary> for TaskSummary {
    fn from(raw: RawTaskSummary) -> Self {
        TaskSummary::new(raw.total, raw.completed)
    }
}

impl TaskSummary {
    pub fn new(total: u32, completed: u32) -> Self {
        Self {
            total,
            completed: completed.min(total),
        }
    }

    /// Recount from the authoritative task list
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Complete)
            .count();
        Self::new(tasks.len() as u32, completed as u32)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Share of completed tasks as a percentage
    pub fn progress(&self) -> Progress {
        Progress::from_ratio(self.completed, self.total)
    }
}

/// Studio project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub progress: Progress,
    pub studio: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_lead: Option<MemberRef>,
    /// Server-computed; refreshed through hydrate, never recounted locally
    #[serde(default)]
    pub task_summary: TaskSummary,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_color() -> String {
    DEFAULT_PROJECT_COLOR.to_string()
}

/// Payload for `POST /projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    pub status: ProjectStatus,
    pub progress: Progress,
    pub studio: String,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_lead: Option<EntityId>,
}

impl ProjectDraft {
    /// Draft with the form defaults: planned, 0%, default colour
    pub fn new(name: impl Into<String>, studio: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ProjectStatus::default(),
            progress: Progress::default(),
            studio: studio.into(),
            due_date: None,
            notes: None,
            color: default_color(),
            project_lead: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("studio", &self.studio)
    }
}

/// Payload for `PUT /projects/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    /// `Some(None)` clears the due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_lead: Option<Option<EntityId>>,
}

impl ProjectPatch {
    pub fn progress(progress: Progress) -> Self {
        Self {
            progress: Some(progress),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(studio) = &self.studio {
            require("studio", studio)?;
        }
        Ok(())
    }
}

impl Entity for Project {
    type Draft = ProjectDraft;
    type Patch = ProjectPatch;

    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn from_draft(id: EntityId, draft: &ProjectDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            status: draft.status,
            progress: draft.progress,
            studio: draft.studio.clone(),
            due_date: draft.due_date,
            notes: draft.notes.clone(),
            color: draft.color.clone(),
            project_lead: draft.project_lead.clone().map(MemberRef::from),
            task_summary: TaskSummary::default(),
            created_at,
            updated_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &ProjectPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(studio) = &patch.studio {
            self.studio = studio.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(lead) = &patch.project_lead {
            self.project_lead = lead.clone().map(MemberRef::from);
        }
    }
}

/// Parent-project fragment returned alongside task mutations
///
/// Deserializes from a full project document as well; only the id and the
/// summary are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryUpdate {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub task_summary: Option<TaskSummary>,
}

/// Headline numbers on the dashboard landing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub team_members: usize,
    pub total_tasks: u32,
    pub completed_tasks: u32,
}

impl DashboardStats {
    pub fn compute(projects: &[Project], team_members: usize) -> Self {
        Self {
            total_projects: projects.len(),
            in_progress: projects
                .iter()
                .filter(|p| p.status == ProjectStatus::InProgress)
                .count(),
            completed: projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Completed)
                .count(),
            team_members,
            total_tasks: projects.iter().map(|p| p.task_summary.total()).sum(),
            completed_tasks: projects.iter().map(|p| p.task_summary.completed()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamps() {
        assert_eq!(Progress::new(-5.0).value(), 0);
        assert_eq!(Progress::new(49.6).value(), 50);
        assert_eq!(Progress::new(250.0).value(), 100);
        assert_eq!(Progress::new(f64::NAN).value(), 0);
        assert_eq!(Progress::from(180u8).value(), 100);
        assert_eq!(Progress::from_ratio(1, 3).value(), 33);
        assert_eq!(Progress::from_ratio(0, 0).value(), 0);
    }

    #[test]
    fn test_task_summary_never_exceeds_total() {
        let summary = TaskSummary::new(2, 5);
        assert_eq!(summary.completed(), 2);

        let parsed: TaskSummary = serde_json::from_str(r#"{"total":3,"completed":7}"#).unwrap();
        assert_eq!(parsed, TaskSummary::new(3, 3));

        let partial: TaskSummary = serde_json::from_str(r#"{"completed":1}"#).unwrap();
        assert_eq!(partial.total(), 0);
        assert_eq!(partial.completed(), 0);
    }

    #[test]
    fn test_project_deserializes_from_backend_json() {
        let json = r##"{
            "_id": "p1",
            "name": "Seaside Villa",
            "status": "At Risk",
            "progress": 130,
            "studio": "Core",
            "dueDate": null,
            "color": "#ff0000",
            "projectLead": {"_id": "m1", "name": "Ada"},
            "taskSummary": {"total": 4, "completed": 1},
            "createdAt": "2024-05-01T08:00:00Z"
        }"##;

        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.status, ProjectStatus::AtRisk);
        assert_eq!(project.progress.value(), 100);
        assert_eq!(project.task_summary, TaskSummary::new(4, 1));
        assert_eq!(project.project_lead.unwrap().name(), Some("Ada"));
    }

    #[test]
    fn test_draft_defaults_and_validation() {
        let draft = ProjectDraft::new("Seaside Villa", "Core");
        assert_eq!(draft.status, ProjectStatus::Planned);
        assert_eq!(draft.color, DEFAULT_PROJECT_COLOR);
        assert!(draft.validate().is_ok());

        let no_studio = ProjectDraft::new("Seaside Villa", "");
        assert_eq!(
            no_studio.validate(),
            Err(ValidationError::Required { field: "studio" })
        );
    }

    #[test]
    fn test_apply_patch_keeps_summary() {
        let mut project = Project::from_draft(
            EntityId::new("p1"),
            &ProjectDraft::new("Loft", "North"),
            Utc::now(),
        );
        project.task_summary = TaskSummary::new(3, 2);

        project.apply_patch(&ProjectPatch {
            progress: Some(Progress::from(60)),
            due_date: Some(None),
            ..Default::default()
        });

        assert_eq!(project.progress.value(), 60);
        assert_eq!(project.task_summary, TaskSummary::new(3, 2));
    }

    #[test]
    fn test_dashboard_stats() {
        let draft = ProjectDraft::new("A", "Core");
        let mut a = Project::from_draft(EntityId::new("a"), &draft, Utc::now());
        a.status = ProjectStatus::InProgress;
        a.task_summary = TaskSummary::new(4, 1);
        let mut b = Project::from_draft(EntityId::new("b"), &draft, Utc::now());
        b.status = ProjectStatus::Completed;
        b.task_summary = TaskSummary::new(2, 2);

        let stats = DashboardStats::compute(&[a, b], 3);
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.team_members, 3);
        assert_eq!(stats.total_tasks, 6);
        assert_eq!(stats.completed_tasks, 3);
    }
}
