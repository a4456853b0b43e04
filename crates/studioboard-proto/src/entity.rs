//! Record identity and the contract shared by every synced entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix that marks an id as client-generated
const TEMPORARY_PREFIX: &str = "temp-";

/// Identifier of a record (`_id` on the wire)
///
/// Real ids are assigned by the server. Temporary ids are minted on the client
/// for optimistic placeholders and never leave the local session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a client-side id for an optimistic placeholder
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMPORARY_PREFIX, uuid::Uuid::new_v4()))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The four record types the dashboard manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Item,
    Project,
    Task,
    TeamMember,
}

impl EntityKind {
    /// Human-readable singular label
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::TeamMember => "team member",
        }
    }

    /// Human-readable plural label
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Item => "items",
            EntityKind::Project => "projects",
            EntityKind::Task => "tasks",
            EntityKind::TeamMember => "team members",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record that can be mirrored by a client-side collection
///
/// `from_draft` builds the optimistic placeholder shown while a create is in
/// flight; `apply_patch` merges a partial update into a local copy.
pub trait Entity: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Create payload (everything but the server-assigned fields)
    type Draft: Clone + fmt::Debug + Send + Sync;
    /// Partial update payload
    type Patch: Clone + fmt::Debug + Send + Sync;

    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    fn from_draft(id: EntityId, draft: &Self::Draft, created_at: DateTime<Utc>) -> Self;

    fn apply_patch(&mut self, patch: &Self::Patch);
}

/// Reference to a team member
///
/// The backend sends either the bare id or the populated member document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberRef {
    Id(EntityId),
    Populated {
        #[serde(rename = "_id")]
        id: EntityId,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
}

impl MemberRef {
    pub fn id(&self) -> &EntityId {
        match self {
            MemberRef::Id(id) => id,
            MemberRef::Populated { id, .. } => id,
        }
    }

    /// Display name, when the reference was populated
    pub fn name(&self) -> Option<&str> {
        match self {
            MemberRef::Id(_) => None,
            MemberRef::Populated { name, .. } => Some(name),
        }
    }
}

impl From<EntityId> for MemberRef {
    fn from(id: EntityId) -> Self {
        MemberRef::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_ids_are_unique() {
        let a = EntityId::temporary();
        let b = EntityId::temporary();

        assert_ne!(a, b);
        assert!(a.is_temporary());
        assert!(a.as_str().starts_with("temp-"));
        assert!(!EntityId::new("65f0c1").is_temporary());
    }

    #[test]
    fn test_member_ref_accepts_bare_id() {
        let parsed: MemberRef = serde_json::from_str(r#""m1""#).unwrap();
        assert_eq!(parsed.id().as_str(), "m1");
        assert_eq!(parsed.name(), None);
    }

    #[test]
    fn test_member_ref_accepts_populated_member() {
        let parsed: MemberRef =
            serde_json::from_str(r#"{"_id":"m2","name":"Ada","role":"Lead"}"#).unwrap();
        assert_eq!(parsed.id().as_str(), "m2");
        assert_eq!(parsed.name(), Some("Ada"));
    }
}
