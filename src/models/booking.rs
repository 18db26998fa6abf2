use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{location::Location, trip::Trip, user::UserPublic, FieldError};

pub const BOOKING_TYPES: &[&str] = &["Hotel", "Flight", "Activity", "Other"];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub user_id: ObjectId,
    pub location_id: ObjectId,
    #[serde(rename = "type")]
    pub booking_type: String,
    pub checkin: DateTime<Utc>,
    pub checkout: DateTime<Utc>,
    pub price: f64,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Raw creation payload. Ids and dates arrive as strings so each rule can
/// fail independently and the caller gets the full violation list.
#[derive(Debug, Deserialize)]
pub struct BookingPayload {
    pub trip_id: Option<String>,
    pub user_id: Option<String>,
    pub location_id: Option<String>,
    #[serde(rename = "type")]
    pub booking_type: Option<String>,
    pub checkin: Option<String>,
    pub checkout: Option<String>,
    pub price: Option<f64>,
}

impl BookingPayload {
    pub fn validate(&self) -> Result<Booking, Vec<FieldError>> {
        let mut errors = Vec::new();

        let trip_id = validate_object_id(&self.trip_id, "trip_id", "Invalid Trip ID", &mut errors);
        let user_id = validate_object_id(&self.user_id, "user_id", "Invalid User ID", &mut errors);
        let location_id = validate_object_id(
            &self.location_id,
            "location_id",
            "Invalid Location ID",
            &mut errors,
        );

        let booking_type = match &self.booking_type {
            Some(kind) if BOOKING_TYPES.contains(&kind.as_str()) => Some(kind.clone()),
            _ => {
                errors.push(FieldError::new("type", "Invalid booking type"));
                None
            }
        };

        let checkin = validate_date(&self.checkin, "checkin", "Invalid check-in date", &mut errors);
        let checkout = validate_date(
            &self.checkout,
            "checkout",
            "Invalid check-out date",
            &mut errors,
        );

        let price = match self.price {
            Some(price) if price >= 0.0 => Some(price),
            _ => {
                errors.push(FieldError::new(
                    "price",
                    "Price must be a non-negative number",
                ));
                None
            }
        };

        // Cross-field invariant, only meaningful once both dates parsed
        if let (Some(checkin), Some(checkout)) = (checkin, checkout) {
            if checkout <= checkin {
                errors.push(FieldError::new(
                    "checkout",
                    "Check-out date must be after check-in date",
                ));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Booking {
            id: None,
            trip_id: trip_id.unwrap(),
            user_id: user_id.unwrap(),
            location_id: location_id.unwrap(),
            booking_type: booking_type.unwrap(),
            checkin: checkin.unwrap(),
            checkout: checkout.unwrap(),
            price: price.unwrap(),
            deleted: false,
            created_at: None,
            updated_at: None,
        })
    }
}

fn validate_object_id(
    value: &Option<String>,
    field: &str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<ObjectId> {
    match value.as_deref().map(ObjectId::parse_str) {
        Some(Ok(id)) => Some(id),
        _ => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

fn validate_date(
    value: &Option<String>,
    field: &str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
    match value.as_deref().map(DateTime::parse_from_rfc3339) {
        Some(Ok(date)) => Some(date.with_timezone(&Utc)),
        _ => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

/// Partial update payload for PUT /api/bookings/{id}. Absent fields are
/// skipped on serialization so they never land in the $set doc.
#[derive(Debug, Deserialize, Serialize)]
pub struct BookingUpdate {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub booking_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl BookingUpdate {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if let Some(kind) = &self.booking_type {
            if !BOOKING_TYPES.contains(&kind.as_str()) {
                errors.push(FieldError::new("type", "Invalid booking type"));
            }
        }
        if let Some(price) = self.price {
            if price < 0.0 {
                errors.push(FieldError::new(
                    "price",
                    "Price must be a non-negative number",
                ));
            }
        }

        errors
    }
}

/// Read view with the referenced trip, user, and location resolved.
#[derive(Debug, Serialize)]
pub struct PopulatedBooking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip: Option<Trip>,
    pub user: Option<UserPublic>,
    pub location: Option<Location>,
    #[serde(rename = "type")]
    pub booking_type: String,
    pub checkin: DateTime<Utc>,
    pub checkout: DateTime<Utc>,
    pub price: f64,
    pub deleted: bool,
}

impl PopulatedBooking {
    pub fn new(
        booking: Booking,
        trip: Option<Trip>,
        user: Option<UserPublic>,
        location: Option<Location>,
    ) -> Self {
        PopulatedBooking {
            id: booking.id,
            trip,
            user,
            location,
            booking_type: booking.booking_type,
            checkin: booking.checkin,
            checkout: booking.checkout,
            price: booking.price,
            deleted: booking.deleted,
        }
    }
}
