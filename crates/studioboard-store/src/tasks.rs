use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use studioboard_client::StudioApi;
use studioboard_proto::{
    recent_tasks, EntityId, ProjectSummaryUpdate, Task, TaskDraft, TaskMutation, TaskPatch,
    TaskSummary,
};

use crate::activity::MutationKind;
use crate::collection::{Outcome, Placement, RemoteCollection};
use crate::error::StoreError;
use crate::notify::Notifier;

const LOAD_FAILED: &str = "Failed to load tasks";

/// Tasks of a single project, in creation order
///
/// Mutations hand back the server's parent-project summary; relay it to
/// [`ProjectStore::hydrate`](crate::ProjectStore::hydrate). This store never
/// touches project state itself.
#[derive(Clone)]
pub struct TaskStore {
    api: StudioApi,
    project_id: EntityId,
    collection: RemoteCollection<Task>,
}

impl TaskStore {
    pub fn new(api: StudioApi, notifier: Arc<dyn Notifier>, project_id: EntityId) -> Self {
        Self {
            api,
            project_id,
            collection: RemoteCollection::new(notifier, Placement::Back),
        }
    }

    pub fn project_id(&self) -> &EntityId {
        &self.project_id
    }

    pub fn collection(&self) -> &RemoteCollection<Task> {
        &self.collection
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.collection.items().await
    }

    pub async fn fetch_all(&self) -> Vec<Task> {
        self.collection
            .fetch_all_with(self.api.get_tasks(&self.project_id), LOAD_FAILED)
            .await
    }

    pub async fn fetch_all_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<Vec<Task>, StoreError> {
        self.collection
            .fetch_all_cancellable(self.api.get_tasks(&self.project_id), LOAD_FAILED, token)
            .await
    }

    /// Create a task in this store's project, whatever `draft.project` says
    pub async fn create(&self, mut draft: TaskDraft) -> Result<TaskMutation, StoreError> {
        let outcome = Outcome::new("Task created successfully", "Failed to create task");
        draft.project = self.project_id.clone();
        self.collection.validate(draft.validate(), &outcome)?;

        self.collection
            .create_with(&draft, self.api.create_task(&draft), &outcome)
            .await
    }

    /// Flip between complete and pending
    pub async fn toggle_status(&self, id: &EntityId) -> Result<TaskMutation, StoreError> {
        let failed = Outcome::quiet("Failed to update task");
        let Some(task) = self.collection.get(id).await else {
            return Err(self.collection.reject_missing(id, &failed));
        };

        let next = task.status.toggled();
        let outcome = Outcome::new(
            format!("Task marked as {}", next.as_str().to_lowercase()),
            failed.failure,
        );
        let response = self
            .collection
            .update_with(
                id,
                &TaskPatch::status(next),
                MutationKind::StatusToggle,
                self.api.set_task_status(id, next),
                &outcome,
            )
            .await?;

        Ok(response.unwrap_or_else(|| TaskMutation {
            task: Task {
                status: next,
                ..task
            },
            project: None,
        }))
    }

    pub async fn update(&self, id: &EntityId, patch: TaskPatch) -> Result<TaskMutation, StoreError> {
        let outcome = Outcome::new("Task updated successfully", "Failed to update task");
        self.collection.validate(patch.validate(), &outcome)?;

        let kind = match (&patch.title, &patch.status, &patch.assignee_id) {
            (None, Some(_), None) => MutationKind::StatusToggle,
            _ => MutationKind::Update,
        };
        self.collection
            .update_with(id, &patch, kind, self.api.update_task(id, &patch), &outcome)
            .await
    }

    /// Returns the parent project's new summary when the server sent one
    pub async fn delete(&self, id: &EntityId) -> Result<Option<ProjectSummaryUpdate>, StoreError> {
        let outcome = Outcome::new("Task deleted", "Failed to delete task");
        let deletion = self
            .collection
            .delete_with(id, self.api.delete_task(id), &outcome)
            .await?;
        Ok(deletion.project)
    }

    /// Summary recounted from the loaded tasks
    pub async fn summary(&self) -> TaskSummary {
        self.collection.read(TaskSummary::from_tasks).await
    }

    /// The `limit` newest tasks, newest first
    pub async fn recent(&self, limit: usize) -> Vec<Task> {
        self.collection
            .read(|tasks| recent_tasks(tasks, limit))
            .await
    }
}
