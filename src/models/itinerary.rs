use std::collections::{HashMap, HashSet};

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{location::Location, trip::Trip, FieldError};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Timeslot {
    /// Wall-clock label like "09:30 AM".
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Day {
    pub day_number: i32,
    #[serde(default)]
    pub timeslots: Vec<Timeslot>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutfitEntry {
    pub day_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outfit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Itinerary {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default)]
    pub outfits: Vec<OutfitEntry>,
}

impl Itinerary {
    /// Schema invariants, checked before every save: day numbers unique and
    /// positive, timeslots carry exactly one of location/activity, and every
    /// outfit entry names a day that exists in `days`.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let time_re = regex::Regex::new(r"(?i)^([01]?[0-9]|2[0-3]):[0-5][0-9] ?(AM|PM)$").unwrap();
        let url_re = regex::Regex::new(r#"^(http|https)://[^ "]+$"#).unwrap();

        let mut seen_days = HashSet::new();
        for day in &self.days {
            if day.day_number < 1 {
                errors.push(FieldError::new("days", "Day numbers must be 1 or greater"));
            }
            if !seen_days.insert(day.day_number) {
                errors.push(FieldError::new(
                    "days",
                    "Duplicate day numbers found in days array",
                ));
            }

            for timeslot in &day.timeslots {
                if !time_re.is_match(&timeslot.time) {
                    errors.push(FieldError::new(
                        "days",
                        format!("Invalid timeslot time: {}", timeslot.time),
                    ));
                }
                match (&timeslot.location, &timeslot.activity) {
                    (None, None) => errors.push(FieldError::new(
                        "days",
                        "Each timeslot needs a location or an activity",
                    )),
                    (Some(_), Some(_)) => errors.push(FieldError::new(
                        "days",
                        "A timeslot cannot have both a location and an activity",
                    )),
                    (None, Some(activity)) if activity.len() > 200 => errors.push(
                        FieldError::new("days", "Activity text is limited to 200 characters"),
                    ),
                    _ => {}
                }
            }
        }

        for outfit in &self.outfits {
            if outfit.day_number < 1 {
                errors.push(FieldError::new(
                    "outfits",
                    "Day numbers must be 1 or greater",
                ));
            }
            if !seen_days.contains(&outfit.day_number) {
                errors.push(FieldError::new(
                    "outfits",
                    "Outfit day numbers must match the day numbers in days array",
                ));
            }
            if let Some(outfit_text) = &outfit.outfit {
                if outfit_text.len() > 100 {
                    errors.push(FieldError::new(
                        "outfits",
                        "Outfit text is limited to 100 characters",
                    ));
                }
            }
            if let Some(image) = &outfit.image {
                if !url_re.is_match(image) {
                    errors.push(FieldError::new("outfits", "Invalid URL format for image"));
                }
            }
        }

        errors
    }

    /// Ids of every location referenced from a timeslot, for populate-on-read.
    pub fn location_ids(&self) -> Vec<ObjectId> {
        self.days
            .iter()
            .flat_map(|day| day.timeslots.iter())
            .filter_map(|slot| slot.location)
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct PopulatedTimeslot {
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PopulatedDay {
    pub day_number: i32,
    pub timeslots: Vec<PopulatedTimeslot>,
}

/// Read view with the owning trip and every timeslot location resolved.
#[derive(Debug, Serialize)]
pub struct PopulatedItinerary {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub trip: Option<Trip>,
    pub days: Vec<PopulatedDay>,
    pub outfits: Vec<OutfitEntry>,
}

impl PopulatedItinerary {
    pub fn new(
        itinerary: Itinerary,
        trip: Option<Trip>,
        locations: &HashMap<ObjectId, Location>,
    ) -> Self {
        let days = itinerary
            .days
            .into_iter()
            .map(|day| PopulatedDay {
                day_number: day.day_number,
                timeslots: day
                    .timeslots
                    .into_iter()
                    .map(|slot| PopulatedTimeslot {
                        time: slot.time,
                        location: slot.location.and_then(|id| locations.get(&id).cloned()),
                        activity: slot.activity,
                    })
                    .collect(),
            })
            .collect();

        PopulatedItinerary {
            id: itinerary.id,
            trip_id: itinerary.trip_id,
            trip,
            days,
            outfits: itinerary.outfits,
        }
    }
}
