//! Inventory items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::{max_len, require, ValidationError};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

/// Item lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    Active,
    Inactive,
    Pending,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 3] = [ItemStatus::Active, ItemStatus::Inactive, ItemStatus::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "Active",
            ItemStatus::Inactive => "Inactive",
            ItemStatus::Pending => "Pending",
        }
    }
}

/// Inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub status: ItemStatus,
    pub price: f64,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Stock value of this line (price × quantity)
    pub fn value(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Payload for `POST /items`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub status: ItemStatus,
    pub price: f64,
    pub quantity: u32,
}

impl ItemDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        if let Some(description) = &self.description {
            max_len("description", description, MAX_DESCRIPTION_LEN)?;
        }
        require("category", &self.category)?;
        validate_price(self.price)
    }
}

/// Payload for `PUT /items/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` clears the description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl ItemPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(Some(description)) = &self.description {
            max_len("description", description, MAX_DESCRIPTION_LEN)?;
        }
        if let Some(category) = &self.category {
            require("category", category)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    require("name", name)?;
    max_len("name", name, MAX_NAME_LEN)
}

fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() {
        return Err(ValidationError::Invalid {
            field: "price",
            reason: "not a number",
        });
    }
    if price < 0.0 {
        return Err(ValidationError::Negative { field: "price" });
    }
    Ok(())
}

impl Entity for Item {
    type Draft = ItemDraft;
    type Patch = ItemPatch;

    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn from_draft(id: EntityId, draft: &ItemDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            status: draft.status,
            price: draft.price,
            quantity: draft.quantity,
            created_at,
            updated_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &ItemPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
    }
}

/// Inventory roll-up shown above the item table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    pub total: usize,
    pub total_value: f64,
    pub total_quantity: u64,
    pub active: usize,
    /// Count per category, in first-seen order
    pub by_category: Vec<(String, usize)>,
    /// Count per status, statuses with no items omitted
    pub by_status: Vec<(ItemStatus, usize)>,
}

impl ItemStats {
    pub fn compute(items: &[Item]) -> Self {
        let mut by_category: Vec<(String, usize)> = Vec::new();
        for item in items {
            match by_category.iter_mut().find(|(name, _)| *name == item.category) {
                Some((_, count)) => *count += 1,
                None => by_category.push((item.category.clone(), 1)),
            }
        }

        let by_status = ItemStatus::ALL
            .iter()
            .map(|status| (*status, items.iter().filter(|i| i.status == *status).count()))
            .filter(|(_, count)| *count > 0)
            .collect();

        Self {
            total: items.len(),
            total_value: items.iter().map(Item::value).sum(),
            total_quantity: items.iter().map(|i| u64::from(i.quantity)).sum(),
            active: items.iter().filter(|i| i.status == ItemStatus::Active).count(),
            by_category,
            by_status,
        }
    }
}
