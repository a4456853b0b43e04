//! Team members and workload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::{require, ValidationError};

/// Tasks a member can carry before reaching full load
pub const DEFAULT_CAPACITY: u32 = 5;

/// Raw load percentage from which a member counts as busy
const MEDIUM_LOAD_PERCENT: f64 = 60.0;
/// Raw load percentage from which a member counts as overloaded
const HIGH_LOAD_PERCENT: f64 = 80.0;

fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

/// Studio team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    pub role: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Assigned tasks
    #[serde(default)]
    pub tasks: Vec<EntityId>,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /team-members`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberDraft {
    pub name: String,
    pub role: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
}

impl TeamMemberDraft {
    pub fn new(name: impl Into<String>, role: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            email: email.into(),
            avatar: None,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("role", &self.role)?;
        validate_email(&self.email)?;
        if let Some(avatar) = &self.avatar {
            validate_avatar(avatar)?;
        }
        validate_capacity(self.capacity)
    }
}

/// Payload for `PATCH /team-members/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl TeamMemberPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(role) = &self.role {
            require("role", role)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(Some(avatar)) = &self.avatar {
            validate_avatar(avatar)?;
        }
        if let Some(capacity) = self.capacity {
            validate_capacity(capacity)?;
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    require("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::Invalid {
            field: "email",
            reason: "not an email address",
        }),
    }
}

fn validate_avatar(avatar: &str) -> Result<(), ValidationError> {
    // An empty avatar field means "no avatar"
    if avatar.is_empty() || avatar.starts_with("http://") || avatar.starts_with("https://") {
        return Ok(());
    }
    Err(ValidationError::Invalid {
        field: "avatar",
        reason: "not a URL",
    })
}

fn validate_capacity(capacity: u32) -> Result<(), ValidationError> {
    if capacity == 0 {
        return Err(ValidationError::Invalid {
            field: "capacity",
            reason: "must be at least 1",
        });
    }
    Ok(())
}

impl Entity for TeamMember {
    type Draft = TeamMemberDraft;
    type Patch = TeamMemberPatch;

    const KIND: EntityKind = EntityKind::TeamMember;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn from_draft(id: EntityId, draft: &TeamMemberDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            role: draft.role.clone(),
            email: draft.email.clone(),
            avatar: draft.avatar.clone().filter(|a| !a.is_empty()),
            tasks: Vec::new(),
            capacity: draft.capacity,
            created_at,
            updated_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &TeamMemberPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(role) = &patch.role {
            self.role = role.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(avatar) = &patch.avatar {
            self.avatar = avatar.clone();
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
    }
}

/// Load bucket used to colour the capacity bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CapacityBand {
    Available,
    MediumLoad,
    HighLoad,
}

impl CapacityBand {
    pub fn label(&self) -> &'static str {
        match self {
            CapacityBand::Available => "Available",
            CapacityBand::MediumLoad => "Medium Load",
            CapacityBand::HighLoad => "High Load",
        }
    }
}

impl fmt::Display for CapacityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Assigned tasks relative to capacity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub assigned: usize,
    pub capacity: u32,
    /// Unclamped ratio as a percentage; may exceed 100
    pub raw_percent: f64,
    /// Display percentage, clamped to `0..=100`
    pub percent: u8,
    pub band: CapacityBand,
}

impl Workload {
    pub fn of(member: &TeamMember) -> Self {
        Self::compute(member.tasks.len(), member.capacity)
    }

    /// A capacity of 0 counts as 1 so any assignment reads as fully loaded
    pub fn compute(assigned: usize, capacity: u32) -> Self {
        let raw_percent = assigned as f64 * 100.0 / f64::from(capacity.max(1));
        let band = if raw_percent >= HIGH_LOAD_PERCENT {
            CapacityBand::HighLoad
        } else if raw_percent >= MEDIUM_LOAD_PERCENT {
            CapacityBand::MediumLoad
        } else {
            CapacityBand::Available
        };

        Self {
            assigned,
            capacity,
            raw_percent,
            percent: raw_percent.round().clamp(0.0, 100.0) as u8,
            band,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(tasks: usize, capacity: u32) -> TeamMember {
        let mut member = TeamMember::from_draft(
            EntityId::new("m1"),
            &TeamMemberDraft::new("Ada", "Architect", "ada@studio.test"),
            Utc::now(),
        );
        member.tasks = (0..tasks).map(|i| EntityId::new(format!("t{}", i))).collect();
        member.capacity = capacity;
        member
    }

    #[test]
    fn test_workload_clamps_to_one_hundred() {
        let workload = Workload::of(&member(8, 5));

        assert_eq!(workload.percent, 100);
        assert_eq!(workload.raw_percent, 160.0);
        assert_eq!(workload.band, CapacityBand::HighLoad);
    }

    #[test]
    fn test_workload_bands() {
        assert_eq!(Workload::compute(0, 5).band, CapacityBand::Available);
        assert_eq!(Workload::compute(2, 5).band, CapacityBand::Available);
        assert_eq!(Workload::compute(3, 5).band, CapacityBand::MediumLoad);
        assert_eq!(Workload::compute(4, 5).band, CapacityBand::HighLoad);
        assert_eq!(Workload::compute(3, 5).percent, 60);
    }

    #[test]
    fn test_zero_capacity() {
        assert_eq!(Workload::compute(0, 0).percent, 0);
        assert_eq!(Workload::compute(1, 0).percent, 100);
    }

    #[test]
    fn test_capacity_defaults_to_five() {
        let json = r#"{"_id": "m1", "name": "Ada", "role": "Architect",
                       "email": "ada@studio.test", "createdAt": "2024-01-01T00:00:00Z"}"#;
        let member: TeamMember = serde_json::from_str(json).unwrap();

        assert_eq!(member.capacity, DEFAULT_CAPACITY);
        assert!(member.tasks.is_empty());
    }

    #[test]
    fn test_draft_validation() {
        let draft = TeamMemberDraft::new("Ada", "Architect", "ada@studio.test");
        assert!(draft.validate().is_ok());

        let bad_email = TeamMemberDraft::new("Ada", "Architect", "ada.studio.test");
        assert!(matches!(
            bad_email.validate(),
            Err(ValidationError::Invalid { field: "email", .. })
        ));

        let mut bad_avatar = draft.clone();
        bad_avatar.avatar = Some("avatar.png".to_string());
        assert!(bad_avatar.validate().is_err());

        let mut empty_avatar = draft;
        empty_avatar.avatar = Some(String::new());
        assert!(empty_avatar.validate().is_ok());
    }
}
