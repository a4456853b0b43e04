//! Studioboard Entity Definitions
//!
//! This crate defines the records the dashboard syncs with the REST backend
//! (items, projects, tasks, team members), their create drafts and partial
//! patches, and the pure functions that derive summaries from them.

pub mod entity;
pub mod error;
pub mod item;
pub mod project;
pub mod task;
pub mod team;

pub use entity::{Entity, EntityId, EntityKind, MemberRef};
pub use error::ValidationError;
pub use item::{Item, ItemDraft, ItemPatch, ItemStats, ItemStatus};
pub use project::{
    DashboardStats, Progress, Project, ProjectDraft, ProjectPatch, ProjectStatus,
    ProjectSummaryUpdate, TaskSummary, DEFAULT_PROJECT_COLOR,
};
pub use task::{recent_tasks, Task, TaskDeletion, TaskDraft, TaskMutation, TaskPatch, TaskStatus};
pub use team::{
    CapacityBand, TeamMember, TeamMemberDraft, TeamMemberPatch, Workload, DEFAULT_CAPACITY,
};
