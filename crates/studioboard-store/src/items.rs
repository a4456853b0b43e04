use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use studioboard_client::StudioApi;
use studioboard_proto::{EntityId, Item, ItemDraft, ItemPatch, ItemStats};

use crate::activity::MutationKind;
use crate::collection::{Outcome, Placement, RemoteCollection};
use crate::error::StoreError;
use crate::notify::{Notification, Notifier};

const LOAD_FAILED: &str = "Failed to load items";

/// Inventory items, newest first
#[derive(Clone)]
pub struct ItemStore {
    api: StudioApi,
    collection: RemoteCollection<Item>,
}

impl ItemStore {
    pub fn new(api: StudioApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            collection: RemoteCollection::new(notifier, Placement::Front),
        }
    }

    pub fn collection(&self) -> &RemoteCollection<Item> {
        &self.collection
    }

    pub async fn items(&self) -> Vec<Item> {
        self.collection.items().await
    }

    pub async fn fetch_all(&self) -> Vec<Item> {
        self.collection
            .fetch_all_with(self.api.get_items(), LOAD_FAILED)
            .await
    }

    pub async fn fetch_all_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<Vec<Item>, StoreError> {
        self.collection
            .fetch_all_cancellable(self.api.get_items(), LOAD_FAILED, token)
            .await
    }

    /// Load a single item and merge it into the collection
    pub async fn fetch_one(&self, id: &EntityId) -> Result<Item, StoreError> {
        match self.api.get_item(id).await {
            Ok(item) => {
                self.collection.upsert_local(item.clone()).await;
                Ok(item)
            }
            Err(err) => {
                warn!("Failed to fetch item {}: {}", id, err);
                self.collection
                    .notify(Notification::error("Failed to load item"));
                Err(err.into())
            }
        }
    }

    pub async fn create(&self, draft: ItemDraft) -> Result<Item, StoreError> {
        let outcome = Outcome::new("Item created successfully", "Failed to create item");
        self.collection.validate(draft.validate(), &outcome)?;

        self.collection
            .create_with(&draft, self.api.create_item(&draft), &outcome)
            .await
    }

    pub async fn update(&self, id: &EntityId, patch: ItemPatch) -> Result<Item, StoreError> {
        let outcome = Outcome::new("Item updated successfully", "Failed to update item");
        self.collection.validate(patch.validate(), &outcome)?;

        self.collection
            .update_with(
                id,
                &patch,
                MutationKind::Update,
                self.api.update_item(id, &patch),
                &outcome,
            )
            .await
    }

    pub async fn delete(&self, id: &EntityId) -> Result<(), StoreError> {
        let outcome = Outcome::new("Item deleted", "Failed to delete item");
        self.collection
            .delete_with(id, self.api.delete_item(id), &outcome)
            .await
    }

    pub async fn stats(&self) -> ItemStats {
        self.collection.read(ItemStats::compute).await
    }
}
