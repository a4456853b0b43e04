use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use studioboard_client::StudioApi;
use studioboard_proto::{
    DashboardStats, EntityId, EntityKind, Progress, Project, ProjectDraft, ProjectPatch,
    ProjectSummaryUpdate, Task, TaskSummary,
};

use crate::activity::MutationKind;
use crate::collection::{Outcome, Placement, RemoteCollection};
use crate::error::StoreError;
use crate::notify::Notifier;

const LOAD_FAILED: &str = "Failed to load projects";

/// Projects, newest first
#[derive(Clone)]
pub struct ProjectStore {
    api: StudioApi,
    collection: RemoteCollection<Project>,
}

impl ProjectStore {
    pub fn new(api: StudioApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            collection: RemoteCollection::new(notifier, Placement::Front),
        }
    }

    pub fn collection(&self) -> &RemoteCollection<Project> {
        &self.collection
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.collection.items().await
    }

    pub async fn get(&self, id: &EntityId) -> Option<Project> {
        self.collection.get(id).await
    }

    pub async fn fetch_all(&self) -> Vec<Project> {
        self.collection
            .fetch_all_with(self.api.get_projects(), LOAD_FAILED)
            .await
    }

    pub async fn fetch_all_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<Vec<Project>, StoreError> {
        self.collection
            .fetch_all_cancellable(self.api.get_projects(), LOAD_FAILED, token)
            .await
    }

    pub async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
        let outcome = Outcome::new("Project created successfully", "Failed to create project");
        self.collection.validate(draft.validate(), &outcome)?;

        self.collection
            .create_with(&draft, self.api.create_project(&draft), &outcome)
            .await
    }

    pub async fn update(&self, id: &EntityId, patch: ProjectPatch) -> Result<Project, StoreError> {
        let outcome = Outcome::new("Project updated successfully", "Failed to update project");
        self.collection.validate(patch.validate(), &outcome)?;

        self.collection
            .update_with(
                id,
                &patch,
                MutationKind::Update,
                self.api.update_project(id, &patch),
                &outcome,
            )
            .await
    }

    /// Set progress through the dedicated endpoint; values are clamped to 0..=100
    pub async fn update_progress(
        &self,
        id: &EntityId,
        progress: impl Into<Progress>,
    ) -> Result<Project, StoreError> {
        let progress = progress.into();
        let outcome = Outcome::new("Progress updated", "Failed to update progress");

        self.collection
            .update_with(
                id,
                &ProjectPatch::progress(progress),
                MutationKind::Progress,
                self.api.update_project_progress(id, progress),
                &outcome,
            )
            .await
    }

    pub async fn delete(&self, id: &EntityId) -> Result<(), StoreError> {
        let outcome = Outcome::new("Project deleted", "Failed to delete project");
        self.collection
            .delete_with(id, self.api.delete_project(id), &outcome)
            .await
    }

    /// Take the server's task summary for a project, as relayed by the task store
    ///
    /// Returns false when the project is not loaded or the update carries no
    /// summary.
    pub async fn hydrate(&self, update: &ProjectSummaryUpdate) -> bool {
        let Some(summary) = update.task_summary else {
            return false;
        };
        let hydrated = self
            .collection
            .modify_local(&update.id, |project| project.task_summary = summary)
            .await;
        if hydrated {
            debug!(
                "Hydrated project {} with {}/{} tasks complete",
                update.id,
                summary.completed(),
                summary.total()
            );
        }
        hydrated
    }

    /// Keep a project's progress in line with its task list
    ///
    /// Issues a progress update only when the task-derived value differs from
    /// the stored one; returns the updated project in that case. A project
    /// without tasks keeps its manually set progress.
    pub async fn sync_progress_from_tasks(
        &self,
        id: &EntityId,
        tasks: &[Task],
    ) -> Result<Option<Project>, StoreError> {
        if tasks.is_empty() {
            return Ok(None);
        }
        let derived = TaskSummary::from_tasks(tasks).progress();
        match self.get(id).await {
            Some(project) if project.progress == derived => Ok(None),
            Some(_) => self.update_progress(id, derived).await.map(Some),
            None => Err(StoreError::not_found(EntityKind::Project, id)),
        }
    }

    /// Headline numbers for the landing page
    pub async fn overview(&self, team_members: usize) -> DashboardStats {
        self.collection
            .read(|projects| DashboardStats::compute(projects, team_members))
            .await
    }
}
