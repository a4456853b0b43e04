//! Project tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, EntityId, EntityKind, MemberRef};
use crate::error::{require, ValidationError};
use crate::project::ProjectSummaryUpdate;

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Complete,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Complete => "Complete",
        }
    }

    /// Checkbox semantics: complete tasks reopen as pending, anything else completes
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Complete => TaskStatus::Pending,
            TaskStatus::Pending | TaskStatus::InProgress => TaskStatus::Complete,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task belonging to exactly one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    pub project: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<MemberRef>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub status: TaskStatus,
    pub project: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<EntityId>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, project: EntityId) -> Self {
        Self {
            title: title.into(),
            status: TaskStatus::Pending,
            project,
            assignee_id: None,
        }
    }

    pub fn assigned_to(mut self, member: EntityId) -> Self {
        self.assignee_id = Some(member);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)
    }
}

/// Payload for `PATCH /tasks/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// `Some(None)` unassigns the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<EntityId>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        Ok(())
    }
}

impl Entity for Task {
    type Draft = TaskDraft;
    type Patch = TaskPatch;

    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn from_draft(id: EntityId, draft: &TaskDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            status: draft.status,
            project: draft.project.clone(),
            assignee: draft.assignee_id.clone().map(MemberRef::from),
            created_at,
            updated_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assignee) = &patch.assignee_id {
            self.assignee = assignee.clone().map(MemberRef::from);
        }
    }
}

/// Response of a task-mutating endpoint
///
/// The backend answers with `{ "task": ..., "project": ... }` so the parent's
/// summary can be relayed, or with the bare task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "TaskMutationWire")]
pub struct TaskMutation {
    pub task: Task,
    pub project: Option<ProjectSummaryUpdate>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskMutationWire {
    Envelope {
        task: Task,
        #[serde(default)]
        project: Option<ProjectSummaryUpdate>,
    },
    Bare(Task),
}

impl From<TaskMutationWire> for TaskMutation {
    fn from(wire: TaskMutationWire) -> Self {
        match wire {
            TaskMutationWire::Envelope { task, project } => TaskMutation { task, project },
            TaskMutationWire::Bare(task) => TaskMutation {
                task,
                project: None,
            },
        }
    }
}

/// Response of `DELETE /tasks/{id}` when the backend sends a body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskDeletion {
    #[serde(default)]
    pub project: Option<ProjectSummaryUpdate>,
}

/// Newest `limit` tasks, most recent first
pub fn recent_tasks(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}
