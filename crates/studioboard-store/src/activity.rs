//! Loading and per-row busy tracking
//!
//! Every in-flight operation holds a guard; dropping it releases the entry,
//! so state is cleared on success, failure and panic alike.

use scopeguard::ScopeGuard;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use studioboard_proto::EntityId;

/// What an in-flight mutation is doing to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Progress,
    StatusToggle,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::Progress => "progress",
            MutationKind::StatusToggle => "status toggle",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Activity {
    loading: AtomicUsize,
    busy: Mutex<HashMap<EntityId, Vec<MutationKind>>>,
}

pub(crate) type LoadingGuard = ScopeGuard<Arc<Activity>, fn(Arc<Activity>)>;

pub(crate) type BusyGuard =
    ScopeGuard<(Arc<Activity>, EntityId, MutationKind), fn((Arc<Activity>, EntityId, MutationKind))>;

impl Activity {
    /// Count a fetch as in flight until the guard drops
    pub(crate) fn start_loading(self: &Arc<Self>) -> LoadingGuard {
        self.loading.fetch_add(1, Ordering::SeqCst);
        scopeguard::guard(self.clone(), release_loading as fn(Arc<Activity>))
    }

    /// Mark `id` busy with `kind` until the guard drops
    pub(crate) fn start_mutation(self: &Arc<Self>, id: &EntityId, kind: MutationKind) -> BusyGuard {
        self.busy_map().entry(id.clone()).or_default().push(kind);
        scopeguard::guard(
            (self.clone(), id.clone(), kind),
            release_mutation as fn((Arc<Activity>, EntityId, MutationKind)),
        )
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub(crate) fn is_busy(&self, id: &EntityId) -> bool {
        self.busy_map().contains_key(id)
    }

    pub(crate) fn kinds(&self, id: &EntityId) -> Vec<MutationKind> {
        self.busy_map().get(id).cloned().unwrap_or_default()
    }

    fn busy_map(&self) -> MutexGuard<'_, HashMap<EntityId, Vec<MutationKind>>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn release_loading(activity: Arc<Activity>) {
    activity.loading.fetch_sub(1, Ordering::SeqCst);
}

fn release_mutation((activity, id, kind): (Arc<Activity>, EntityId, MutationKind)) {
    let mut busy = activity.busy_map();
    if let Some(kinds) = busy.get_mut(&id) {
        if let Some(pos) = kinds.iter().position(|k| *k == kind) {
            kinds.remove(pos);
        }
        if kinds.is_empty() {
            busy.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_counts_overlapping_fetches() {
        let activity = Arc::new(Activity::default());
        let first = activity.start_loading();
        let second = activity.start_loading();

        drop(first);
        assert!(activity.is_loading());
        drop(second);
        assert!(!activity.is_loading());
    }

    #[test]
    fn test_busy_is_a_multiset() {
        let activity = Arc::new(Activity::default());
        let id = EntityId::new("p1");

        let update = activity.start_mutation(&id, MutationKind::Update);
        let progress = activity.start_mutation(&id, MutationKind::Progress);
        assert_eq!(
            activity.kinds(&id),
            vec![MutationKind::Update, MutationKind::Progress]
        );

        drop(update);
        assert_eq!(activity.kinds(&id), vec![MutationKind::Progress]);
        assert!(activity.is_busy(&id));

        drop(progress);
        assert!(!activity.is_busy(&id));
        assert!(!activity.is_busy(&EntityId::new("p2")));
    }

    #[test]
    fn test_guard_released_on_panic() {
        let activity = Arc::new(Activity::default());
        let id = EntityId::new("t1");

        let inner = activity.clone();
        let task_id = id.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = inner.start_mutation(&task_id, MutationKind::StatusToggle);
            panic!("request handler blew up");
        }));

        assert!(result.is_err());
        assert!(!activity.is_busy(&id));
    }
}
