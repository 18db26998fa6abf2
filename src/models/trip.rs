use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::FieldError;

/// Districts a trip destination may name. Matches the list the mobile app
/// presents when creating a trip.
pub const DISTRICTS: &[&str] = &[
    "Colombo",
    "Gampaha",
    "Kalutara",
    "Kandy",
    "Matale",
    "Nuwara Eliya",
    "Galle",
    "Matara",
    "Hambantota",
    "Jaffna",
    "Kilinochchi",
    "Mannar",
    "Vavuniya",
    "Mullaitivu",
    "Batticaloa",
    "Ampara",
    "Trincomalee",
    "Polonnaruwa",
    "Anuradhapura",
    "Kegalle",
    "Ratnapura",
    "Badulla",
    "Monaragala",
    "Kurunegala",
    "Puttalam",
];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Trip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_name: String,
    pub destination: String,
    #[serde(default)]
    pub collaboration: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<ObjectId>,
    #[serde(default)]
    pub preferences: HashMap<String, String>,
    pub user_id: ObjectId,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.trip_name.trim().is_empty() {
            errors.push(FieldError::new("trip_name", "Trip name is required"));
        }
        if !DISTRICTS.contains(&self.destination.as_str()) {
            errors.push(FieldError::new(
                "destination",
                format!("{} is not a valid district in Sri Lanka", self.destination),
            ));
        }

        errors
    }
}

/// Partial update payload for PUT /api/trips/{user_id}/{trip_id}. Absent
/// fields are skipped on serialization so they never land in the $set doc.
#[derive(Debug, Deserialize, Serialize)]
pub struct TripUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaboration: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize, Default)]
pub struct CategorizedTrips {
    pub past: Vec<Trip>,
    pub current: Vec<Trip>,
    pub upcoming: Vec<Trip>,
}

/// Buckets trips by comparing their date range against `now`. All stored
/// dates and `now` are UTC, so the comparison needs no timezone handling.
pub fn categorize_trips(trips: Vec<Trip>, now: DateTime<Utc>) -> CategorizedTrips {
    let mut categorized = CategorizedTrips::default();

    for trip in trips {
        if trip.end_date < now {
            categorized.past.push(trip);
        } else if trip.start_date <= now {
            categorized.current.push(trip);
        } else {
            categorized.upcoming.push(trip);
        }
    }

    categorized
}
