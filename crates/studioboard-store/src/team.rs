use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use studioboard_client::StudioApi;
use studioboard_proto::{EntityId, TeamMember, TeamMemberDraft, TeamMemberPatch, Workload};

use crate::activity::MutationKind;
use crate::collection::{Outcome, Placement, RemoteCollection};
use crate::error::StoreError;
use crate::notify::Notifier;

const LOAD_FAILED: &str = "Failed to load team members";

/// Team roster, in joining order
#[derive(Clone)]
pub struct TeamStore {
    api: StudioApi,
    collection: RemoteCollection<TeamMember>,
}

impl TeamStore {
    pub fn new(api: StudioApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            collection: RemoteCollection::new(notifier, Placement::Back),
        }
    }

    pub fn collection(&self) -> &RemoteCollection<TeamMember> {
        &self.collection
    }

    pub async fn members(&self) -> Vec<TeamMember> {
        self.collection.items().await
    }

    pub async fn fetch_all(&self) -> Vec<TeamMember> {
        self.collection
            .fetch_all_with(self.api.get_team_members(), LOAD_FAILED)
            .await
    }

    pub async fn fetch_all_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<Vec<TeamMember>, StoreError> {
        self.collection
            .fetch_all_cancellable(self.api.get_team_members(), LOAD_FAILED, token)
            .await
    }

    pub async fn create(&self, draft: TeamMemberDraft) -> Result<TeamMember, StoreError> {
        let outcome = Outcome::new("Team member added successfully", "Failed to add team member");
        self.collection.validate(draft.validate(), &outcome)?;

        self.collection
            .create_with(&draft, self.api.create_team_member(&draft), &outcome)
            .await
    }

    pub async fn update(
        &self,
        id: &EntityId,
        patch: TeamMemberPatch,
    ) -> Result<TeamMember, StoreError> {
        let outcome = Outcome::new(
            "Team member updated successfully",
            "Failed to update team member",
        );
        self.collection.validate(patch.validate(), &outcome)?;

        self.collection
            .update_with(
                id,
                &patch,
                MutationKind::Update,
                self.api.update_team_member(id, &patch),
                &outcome,
            )
            .await
    }

    pub async fn delete(&self, id: &EntityId) -> Result<(), StoreError> {
        let outcome = Outcome::new("Team member removed", "Failed to remove team member");
        self.collection
            .delete_with(id, self.api.delete_team_member(id), &outcome)
            .await
    }

    /// Each member with their current load
    pub async fn workloads(&self) -> Vec<(TeamMember, Workload)> {
        self.collection
            .read(|members| {
                members
                    .iter()
                    .map(|member| (member.clone(), Workload::of(member)))
                    .collect()
            })
            .await
    }
}
