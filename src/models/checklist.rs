use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{trip::Trip, FieldError};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChecklistItem {
    /// Assigned server-side so items can be toggled or removed individually.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub is_checked: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Checklist {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub user_id: ObjectId,
    pub list_name: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

/// Creation payload; incoming items have no ids yet.
#[derive(Debug, Deserialize)]
pub struct ChecklistPayload {
    pub trip_id: ObjectId,
    pub user_id: ObjectId,
    pub list_name: String,
    #[serde(default)]
    pub items: Vec<NewChecklistItem>,
}

#[derive(Debug, Deserialize)]
pub struct NewChecklistItem {
    pub name: String,
    #[serde(default)]
    pub is_checked: bool,
}

impl NewChecklistItem {
    pub fn into_item(self) -> ChecklistItem {
        ChecklistItem {
            id: ObjectId::new(),
            name: self.name,
            is_checked: self.is_checked,
        }
    }
}

impl ChecklistPayload {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.list_name.trim().is_empty() {
            errors.push(FieldError::new("list_name", "List name is required"));
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                errors.push(FieldError::new("items", "Item names cannot be empty"));
            }
        }

        errors
    }

    pub fn into_checklist(self) -> Checklist {
        Checklist {
            id: None,
            trip_id: self.trip_id,
            user_id: self.user_id,
            list_name: self.list_name,
            items: self.items.into_iter().map(|i| i.into_item()).collect(),
        }
    }
}

/// Read view with the owning trip resolved.
#[derive(Debug, Serialize)]
pub struct PopulatedChecklist {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub trip: Option<Trip>,
    pub user_id: ObjectId,
    pub list_name: String,
    pub items: Vec<ChecklistItem>,
}

impl PopulatedChecklist {
    pub fn new(checklist: Checklist, trip: Option<Trip>) -> Self {
        PopulatedChecklist {
            id: checklist.id,
            trip_id: checklist.trip_id,
            trip,
            user_id: checklist.user_id,
            list_name: checklist.list_name,
            items: checklist.items,
        }
    }
}
