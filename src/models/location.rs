use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{trip::Trip, FieldError};

pub const LOCATION_TYPES: &[&str] = &["Hotel", "Restaurant", "Attraction", "Other", "Cafe"];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Location {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub location_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub trip_id: ObjectId,
}

impl Location {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if self.address.trim().is_empty() {
            errors.push(FieldError::new("address", "Address is required"));
        }
        if !LOCATION_TYPES.contains(&self.location_type.as_str()) {
            errors.push(FieldError::new("type", "Invalid location type"));
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                errors.push(FieldError::new("rating", "Rating must be between 0 and 5"));
            }
        }

        errors
    }
}

/// Partial update payload for PUT /api/locations/{id}. Absent fields are
/// skipped on serialization so they never land in the $set doc.
#[derive(Debug, Deserialize, Serialize)]
pub struct LocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LocationUpdate {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if let Some(location_type) = &self.location_type {
            if !LOCATION_TYPES.contains(&location_type.as_str()) {
                errors.push(FieldError::new("type", "Invalid location type"));
            }
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                errors.push(FieldError::new("rating", "Rating must be between 0 and 5"));
            }
        }

        errors
    }
}

/// Read view with the owning trip resolved.
#[derive(Debug, Serialize)]
pub struct PopulatedLocation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub location_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub trip_id: ObjectId,
    pub trip: Option<Trip>,
}

impl PopulatedLocation {
    pub fn new(location: Location, trip: Option<Trip>) -> Self {
        PopulatedLocation {
            id: location.id,
            name: location.name,
            address: location.address,
            location_type: location.location_type,
            rating: location.rating,
            description: location.description,
            image: location.image,
            trip_id: location.trip_id,
            trip,
        }
    }
}
