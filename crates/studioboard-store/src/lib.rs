//! Optimistic client-side stores for the studio dashboard
//!
//! Each store mirrors one server collection through a [`RemoteCollection`]:
//! mutations show up locally at once and are confirmed or rolled back when the
//! request settles. Outcomes are reported to a [`Notifier`].

pub mod activity;
pub mod collection;
pub mod error;
pub mod items;
pub mod notify;
pub mod projects;
pub mod tasks;
pub mod team;

pub use activity::MutationKind;
pub use collection::{Confirmed, Outcome, Placement, RemoteCollection};
pub use error::StoreError;
pub use items::ItemStore;
pub use notify::{
    BroadcastNotifier, LogNotifier, Notification, NotificationLevel, Notifier, UndoHandle,
    DELETE_CANCELLED, UNDO_WINDOW,
};
pub use projects::ProjectStore;
pub use tasks::TaskStore;
pub use team::TeamStore;

pub use tokio_util::sync::CancellationToken;
