//! Remote Collection Store
//!
//! Client-side mirror of one server-held collection. Every mutation is
//! applied locally first, then confirmed with the server's answer or rolled
//! back. Rollback is targeted: only the entity a call touched is restored,
//! and only while it still holds the value that call wrote.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use studioboard_client::ApiError;
use studioboard_proto::{
    Entity, EntityId, Item, Project, Task, TaskMutation, TeamMember, ValidationError,
};

use crate::activity::{Activity, MutationKind};
use crate::error::StoreError;
use crate::notify::{Notification, Notifier, UndoHandle, DELETE_CANCELLED};

/// Where optimistic creates land in the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

/// Notification text for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// `None` confirms silently
    pub success: Option<String>,
    pub failure: String,
}

impl Outcome {
    pub fn new(success: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            success: Some(success.into()),
            failure: failure.into(),
        }
    }

    pub fn quiet(failure: impl Into<String>) -> Self {
        Self {
            success: None,
            failure: failure.into(),
        }
    }
}

/// Server response that carries the confirmed version of an entity
pub trait Confirmed<E> {
    /// `None` when the server acknowledged without echoing the entity
    fn confirmed(&self) -> Option<&E>;
}

macro_rules! confirms_itself {
    ($($entity:ty),*) => {
        $(
            impl Confirmed<$entity> for $entity {
                fn confirmed(&self) -> Option<&$entity> {
                    Some(self)
                }
            }
        )*
    };
}

confirms_itself!(Item, Project, Task, TeamMember);

impl Confirmed<Task> for TaskMutation {
    fn confirmed(&self) -> Option<&Task> {
        Some(&self.task)
    }
}

impl Confirmed<Task> for Option<TaskMutation> {
    fn confirmed(&self) -> Option<&Task> {
        self.as_ref().map(|m| &m.task)
    }
}

#[derive(Debug)]
struct CollectionState<E> {
    entries: Vec<E>,
    last_error: Option<String>,
}

impl<E: Entity> CollectionState<E> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_error: None,
        }
    }

    fn position(&self, id: &EntityId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    fn insert(&mut self, entity: E, placement: Placement) {
        match placement {
            Placement::Front => self.entries.insert(0, entity),
            Placement::Back => self.entries.push(entity),
        }
    }

    fn remove(&mut self, id: &EntityId) -> Option<E> {
        self.position(id).map(|index| self.entries.remove(index))
    }

    /// Replace in place, or insert when absent
    fn upsert(&mut self, entity: E, placement: Placement) {
        match self.position(entity.id()) {
            Some(index) => self.entries[index] = entity,
            None => self.insert(entity, placement),
        }
    }

    /// Swap a placeholder for the server's entity, never leaving both
    fn resolve_placeholder(&mut self, temp_id: &EntityId, entity: E, placement: Placement) {
        let existing = self.position(entity.id());
        match (self.position(temp_id), existing) {
            (Some(index), None) => self.entries[index] = entity,
            (Some(index), Some(_)) => {
                self.entries.remove(index);
                self.upsert(entity, placement);
            }
            // A fetch replaced the list while the create was in flight
            (None, _) => self.upsert(entity, placement),
        }
    }

    /// Put `snapshot` back if the entity still holds `optimistic`
    fn restore_if_unchanged(&mut self, id: &EntityId, optimistic: &E, snapshot: E) -> bool {
        match self.position(id) {
            Some(index) if self.entries[index] == *optimistic => {
                self.entries[index] = snapshot;
                true
            }
            _ => false,
        }
    }

    /// Re-insert a deleted entity near its old position unless already back
    fn restore_at(&mut self, index: usize, snapshot: E) -> bool {
        if self.position(snapshot.id()).is_some() {
            return false;
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, snapshot);
        true
    }
}

/// Optimistic mirror of a remote collection of `E`
pub struct RemoteCollection<E: Entity> {
    state: Arc<RwLock<CollectionState<E>>>,
    activity: Arc<Activity>,
    notifier: Arc<dyn Notifier>,
    placement: Placement,
}

impl<E: Entity> Clone for RemoteCollection<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            activity: self.activity.clone(),
            notifier: self.notifier.clone(),
            placement: self.placement,
        }
    }
}

impl<E: Entity> RemoteCollection<E> {
    pub fn new(notifier: Arc<dyn Notifier>, placement: Placement) -> Self {
        Self {
            state: Arc::new(RwLock::new(CollectionState::new())),
            activity: Arc::new(Activity::default()),
            notifier,
            placement,
        }
    }

    // ========================
    // Fetch
    // ========================

    /// Replace the collection with the server's
    ///
    /// A failure is recorded in [`last_error`](Self::last_error) and
    /// notified; the previous entries stay. Returns the collection as it
    /// stands once the request settled.
    pub async fn fetch_all_with<Fut>(&self, request: Fut, failure: &str) -> Vec<E>
    where
        Fut: Future<Output = Result<Vec<E>, ApiError>>,
    {
        self.settle_fetch(request, failure, None)
            .await
            .unwrap_or_default()
    }

    /// Like [`fetch_all_with`](Self::fetch_all_with), abandoned once `token`
    /// is cancelled: nothing is written and nothing is notified
    pub async fn fetch_all_cancellable<Fut>(
        &self,
        request: Fut,
        failure: &str,
        token: &CancellationToken,
    ) -> Result<Vec<E>, StoreError>
    where
        Fut: Future<Output = Result<Vec<E>, ApiError>>,
    {
        self.settle_fetch(request, failure, Some(token))
            .await
            .ok_or(StoreError::Cancelled)
    }

    async fn settle_fetch<Fut>(
        &self,
        request: Fut,
        failure: &str,
        cancel: Option<&CancellationToken>,
    ) -> Option<Vec<E>>
    where
        Fut: Future<Output = Result<Vec<E>, ApiError>>,
    {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!("Fetch of {} cancelled before it started", E::KIND.plural());
            return None;
        }
        let _loading = self.activity.start_loading();
        self.state.write().await.last_error = None;

        let result = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = request => Some(result),
            },
            None => Some(request.await),
        };
        let Some(result) = result else {
            debug!("Fetch of {} cancelled", E::KIND.plural());
            return None;
        };

        let mut state = self.state.write().await;
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!("Discarding {} fetched after cancellation", E::KIND.plural());
            return None;
        }

        match result {
            Ok(entries) => {
                debug!("Fetched {} {}", entries.len(), E::KIND.plural());
                state.entries = entries;
                Some(state.entries.clone())
            }
            Err(err) => {
                warn!("Failed to fetch {}: {}", E::KIND.plural(), err);
                state.last_error = Some(err.to_string());
                let entries = state.entries.clone();
                drop(state);
                self.notifier.notify(Notification::error(failure));
                Some(entries)
            }
        }
    }

    // ========================
    // Mutations
    // ========================

    /// Insert a placeholder built from `draft`, then swap in the server's
    /// entity or drop the placeholder
    pub async fn create_with<R, Fut>(
        &self,
        draft: &E::Draft,
        request: Fut,
        outcome: &Outcome,
    ) -> Result<R, StoreError>
    where
        Fut: Future<Output = Result<R, ApiError>>,
        R: Confirmed<E>,
    {
        let temp_id = EntityId::temporary();
        let _busy = self.activity.start_mutation(&temp_id, MutationKind::Create);

        let placeholder = E::from_draft(temp_id.clone(), draft, Utc::now());
        self.state.write().await.insert(placeholder, self.placement);
        debug!("Inserted placeholder {} {}", E::KIND, temp_id);

        match request.await {
            Ok(response) => {
                let mut state = self.state.write().await;
                match response.confirmed() {
                    Some(entity) => {
                        debug!("Placeholder {} confirmed as {}", temp_id, entity.id());
                        state.resolve_placeholder(&temp_id, entity.clone(), self.placement);
                    }
                    None => {
                        state.remove(&temp_id);
                    }
                }
                drop(state);
                self.notify_success(outcome);
                Ok(response)
            }
            Err(err) => {
                self.state.write().await.remove(&temp_id);
                warn!("Create {} failed, placeholder {} removed: {}", E::KIND, temp_id, err);
                self.notifier.notify(Notification::error(&outcome.failure));
                Err(err.into())
            }
        }
    }

    /// Merge `patch` into the local entity, then confirm or roll back
    ///
    /// Fails with [`StoreError::NotFound`] and sends nothing when `id` is not
    /// in the collection.
    pub async fn update_with<R, Fut>(
        &self,
        id: &EntityId,
        patch: &E::Patch,
        kind: MutationKind,
        request: Fut,
        outcome: &Outcome,
    ) -> Result<R, StoreError>
    where
        Fut: Future<Output = Result<R, ApiError>>,
        R: Confirmed<E>,
    {
        let (snapshot, optimistic) = {
            let mut state = self.state.write().await;
            let Some(index) = state.position(id) else {
                drop(state);
                return Err(self.reject_missing(id, outcome));
            };
            let entity = &mut state.entries[index];
            let snapshot = entity.clone();
            entity.apply_patch(patch);
            (snapshot, entity.clone())
        };
        let _busy = self.activity.start_mutation(id, kind);
        debug!("Applied optimistic {} to {} {}", kind, E::KIND, id);

        match request.await {
            Ok(response) => {
                if let Some(entity) = response.confirmed() {
                    let mut state = self.state.write().await;
                    if let Some(index) = state.position(id) {
                        state.entries[index] = entity.clone();
                    }
                }
                self.notify_success(outcome);
                Ok(response)
            }
            Err(err) => {
                let restored = self
                    .state
                    .write()
                    .await
                    .restore_if_unchanged(id, &optimistic, snapshot);
                if restored {
                    warn!("{} of {} {} failed, rolled back: {}", kind, E::KIND, id, err);
                } else {
                    warn!(
                        "{} of {} {} failed; entity changed meanwhile, left as is: {}",
                        kind,
                        E::KIND,
                        id,
                        err
                    );
                }
                self.notifier.notify(Notification::error(&outcome.failure));
                Err(err.into())
            }
        }
    }

    /// Remove the entity at once and offer an undo
    ///
    /// The confirmation carries an [`UndoHandle`] restoring the entity at its
    /// old position. A failed request restores it as well.
    pub async fn delete_with<R, Fut>(
        &self,
        id: &EntityId,
        request: Fut,
        outcome: &Outcome,
    ) -> Result<R, StoreError>
    where
        Fut: Future<Output = Result<R, ApiError>>,
    {
        let (index, snapshot) = {
            let mut state = self.state.write().await;
            let Some(index) = state.position(id) else {
                drop(state);
                return Err(self.reject_missing(id, outcome));
            };
            (index, state.entries.remove(index))
        };
        let _busy = self.activity.start_mutation(id, MutationKind::Delete);
        debug!("Removed {} {} from position {}", E::KIND, id, index);

        if let Some(message) = &outcome.success {
            let undo = self.undo_delete(index, snapshot.clone());
            self.notifier
                .notify(Notification::success(message).with_undo(undo));
        }

        match request.await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.state.write().await.restore_at(index, snapshot);
                warn!("Delete of {} {} failed, restored: {}", E::KIND, id, err);
                self.notifier.notify(Notification::error(&outcome.failure));
                Err(err.into())
            }
        }
    }

    fn undo_delete(&self, index: usize, snapshot: E) -> UndoHandle {
        let collection = self.clone();
        UndoHandle::new(move || {
            let collection = collection.clone();
            let snapshot = snapshot.clone();
            async move {
                let id = snapshot.id().clone();
                let restored = collection.state.write().await.restore_at(index, snapshot);
                if restored {
                    debug!("Undo restored {} {}", E::KIND, id);
                    collection
                        .notifier
                        .notify(Notification::success(DELETE_CANCELLED));
                }
            }
        })
    }

    /// Reject an invalid draft or patch before anything changes
    pub fn validate(
        &self,
        result: Result<(), ValidationError>,
        outcome: &Outcome,
    ) -> Result<(), StoreError> {
        result.map_err(|err| {
            debug!("Rejected {} input: {}", E::KIND, err);
            self.notifier
                .notify(Notification::error(format!("{}: {}", outcome.failure, err)));
            StoreError::Invalid(err)
        })
    }

    pub(crate) fn reject_missing(&self, id: &EntityId, outcome: &Outcome) -> StoreError {
        warn!("{} {} is not in the collection", E::KIND, id);
        self.notifier.notify(Notification::error(&outcome.failure));
        StoreError::not_found(E::KIND, id)
    }

    fn notify_success(&self, outcome: &Outcome) {
        if let Some(message) = &outcome.success {
            self.notifier.notify(Notification::success(message));
        }
    }

    pub fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    // ========================
    // Local state
    // ========================

    /// Edit one entity in place without a request. Returns false if absent.
    pub async fn modify_local(&self, id: &EntityId, edit: impl FnOnce(&mut E)) -> bool {
        let mut state = self.state.write().await;
        match state.position(id) {
            Some(index) => {
                edit(&mut state.entries[index]);
                true
            }
            None => false,
        }
    }

    /// Store a server-provided entity, replacing any local copy
    pub async fn upsert_local(&self, entity: E) {
        self.state.write().await.upsert(entity, self.placement);
    }

    /// Compute something from the current entries without cloning them
    pub async fn read<T>(&self, view: impl FnOnce(&[E]) -> T) -> T {
        view(&self.state.read().await.entries)
    }

    pub async fn items(&self) -> Vec<E> {
        self.state.read().await.entries.clone()
    }

    pub async fn get(&self, id: &EntityId) -> Option<E> {
        self.read(|entries| entries.iter().find(|e| e.id() == id).cloned())
            .await
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Message of the most recent failed fetch, cleared when a fetch starts
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.activity.is_loading()
    }

    pub fn is_busy(&self, id: &EntityId) -> bool {
        self.activity.is_busy(id)
    }

    /// In-flight mutations on `id`, oldest first
    pub fn busy_kinds(&self, id: &EntityId) -> Vec<MutationKind> {
        self.activity.kinds(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studioboard_proto::{ItemDraft, ItemStatus};

    fn item(id: &str, name: &str) -> Item {
        let draft = ItemDraft {
            name: name.to_string(),
            description: None,
            category: "Materials".to_string(),
            status: ItemStatus::Active,
            price: 10.0,
            quantity: 1,
        };
        Item::from_draft(EntityId::new(id), &draft, Utc::now())
    }

    fn state(ids: &[&str]) -> CollectionState<Item> {
        let mut state = CollectionState::new();
        state.entries = ids.iter().map(|id| item(id, id)).collect();
        state
    }

    fn ids(state: &CollectionState<Item>) -> Vec<&str> {
        state.entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_placeholder_replaced_in_place() {
        let mut state = state(&["a", "temp-1", "b"]);
        state.resolve_placeholder(&EntityId::new("temp-1"), item("c", "c"), Placement::Front);
        assert_eq!(ids(&state), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_placeholder_never_duplicates_fetched_entity() {
        let mut state = state(&["temp-1", "c", "a"]);
        state.resolve_placeholder(&EntityId::new("temp-1"), item("c", "fresh"), Placement::Front);
        assert_eq!(ids(&state), vec!["c", "a"]);
        assert_eq!(state.entries[0].name, "fresh");
    }

    #[test]
    fn test_missing_placeholder_inserts_by_placement() {
        let mut state = state(&["a"]);
        state.resolve_placeholder(&EntityId::new("temp-1"), item("c", "c"), Placement::Back);
        assert_eq!(ids(&state), vec!["a", "c"]);
    }

    #[test]
    fn test_restore_only_when_unchanged() {
        let mut state = state(&["a"]);
        let snapshot = state.entries[0].clone();
        let mut optimistic = snapshot.clone();
        optimistic.name = "optimistic".to_string();

        state.entries[0].name = "someone else".to_string();
        assert!(!state.restore_if_unchanged(&EntityId::new("a"), &optimistic, snapshot.clone()));
        assert_eq!(state.entries[0].name, "someone else");

        state.entries[0] = optimistic.clone();
        assert!(state.restore_if_unchanged(&EntityId::new("a"), &optimistic, snapshot));
        assert_eq!(state.entries[0].name, "a");
    }

    #[test]
    fn test_restore_at_is_idempotent_and_clamped() {
        let mut state = state(&["a", "c"]);
        assert!(state.restore_at(1, item("b", "b")));
        assert!(!state.restore_at(1, item("b", "b")));
        assert_eq!(ids(&state), vec!["a", "b", "c"]);

        let mut short = self::state(&[]);
        assert!(short.restore_at(4, item("z", "z")));
        assert_eq!(ids(&short), vec!["z"]);
    }
}
