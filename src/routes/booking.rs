use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::{BOOKINGS, DB_NAME, LOCATIONS, TRIPS, USERS};
use crate::models::booking::{Booking, BookingPayload, BookingUpdate, PopulatedBooking};
use crate::models::location::Location;
use crate::models::trip::Trip;
use crate::models::user::{User, UserPublic};

#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaginationParams {
    /// Normalized (page, limit, skip). The skip arithmetic runs in u64 so
    /// a maximal page number cannot overflow.
    pub fn normalize(&self) -> (u32, u32, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(10).clamp(1, 100);
        let skip = u64::from(page - 1) * u64::from(limit);
        (page, limit, skip)
    }
}

/// Filter shared by every booking read and the soft delete, so flagged
/// rows never resurface.
pub fn active_filter() -> Document {
    doc! { "deleted": false }
}

pub fn active_filter_for(field: &str, id: ObjectId) -> Document {
    let mut filter = active_filter();
    filter.insert(field, id);
    filter
}

/*
    POST /api/bookings

    The only resource with declarative request validation: every rule runs
    and the caller gets the full violation list, not just the first.
*/
pub async fn create_booking(
    data: web::Data<Arc<Client>>,
    input: web::Json<BookingPayload>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Booking> = client.database(DB_NAME).collection(BOOKINGS);

    let mut booking = match input.into_inner().validate() {
        Ok(booking) => booking,
        Err(errors) => return HttpResponse::BadRequest().json(json!({ "errors": errors })),
    };

    let curr_time = Utc::now();
    booking.created_at = Some(curr_time);
    booking.updated_at = Some(curr_time);

    match collection.insert_one(&booking).await {
        Ok(result) => {
            booking.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(booking)
        }
        Err(err) => {
            log::error!("Failed to insert booking: {:?}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    GET /api/bookings?page=&limit=

    Only non-deleted bookings, with trip/user/location populated.
*/
pub async fn get_bookings(
    data: web::Data<Arc<Client>>,
    params: web::Query<PaginationParams>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Booking> = client.database(DB_NAME).collection(BOOKINGS);

    let (page, limit, skip) = params.normalize();

    let total = match collection.count_documents(active_filter()).await {
        Ok(total) => total,
        Err(err) => {
            log::error!("Failed to count bookings: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };

    let bookings = match collection
        .find(active_filter())
        .skip(skip)
        .limit(i64::from(limit))
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<Booking>>().await {
            Ok(bookings) => bookings,
            Err(err) => {
                log::error!("Failed to collect bookings: {:?}", err);
                return HttpResponse::InternalServerError()
                    .json(json!({ "error": err.to_string() }));
            }
        },
        Err(err) => {
            log::error!("Failed to fetch bookings: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };

    let populated = populate_bookings(&client, bookings).await;

    HttpResponse::Ok().json(json!({
        "total": total,
        "page": page,
        "limit": limit,
        "bookings": populated,
    }))
}

/*
    GET /api/bookings/{id}
*/
pub async fn get_booking_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Booking> = client.database(DB_NAME).collection(BOOKINGS);

    let booking_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection
        .find_one(active_filter_for("_id", booking_id))
        .await
    {
        Ok(Some(booking)) => {
            let mut populated = populate_bookings(&client, vec![booking]).await;
            HttpResponse::Ok().json(populated.remove(0))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "Booking not found" })),
        Err(err) => {
            log::error!("Failed to fetch booking: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    GET /api/bookings/user/{user_id}
*/
pub async fn get_bookings_for_user(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid user ID" })),
    };
    scoped_bookings(data, active_filter_for("user_id", user_id)).await
}

/*
    GET /api/bookings/trip/{trip_id}
*/
pub async fn get_bookings_for_trip(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let trip_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid trip ID" })),
    };
    scoped_bookings(data, active_filter_for("trip_id", trip_id)).await
}

async fn scoped_bookings(data: web::Data<Arc<Client>>, filter: Document) -> HttpResponse {
    let client = data.into_inner();
    let collection: mongodb::Collection<Booking> = client.database(DB_NAME).collection(BOOKINGS);

    match collection.find(filter).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Booking>>().await {
            Ok(bookings) => {
                let populated = populate_bookings(&client, bookings).await;
                HttpResponse::Ok().json(populated)
            }
            Err(err) => {
                log::error!("Failed to collect bookings: {:?}", err);
                HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
            }
        },
        Err(err) => {
            log::error!("Failed to fetch bookings: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    PUT /api/bookings/{id}

    Re-checks the checkout-after-checkin invariant against the effective
    dates whenever either one changes.
*/
pub async fn update_booking(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<BookingUpdate>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Booking> = client.database(DB_NAME).collection(BOOKINGS);

    let booking_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    let updates = input.into_inner();
    let errors = updates.validate();
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    let existing = match collection
        .find_one(active_filter_for("_id", booking_id))
        .await
    {
        Ok(Some(booking)) => booking,
        Ok(None) => return HttpResponse::NotFound().json(json!({ "error": "Booking not found" })),
        Err(err) => {
            log::error!("Failed to fetch booking: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };

    let checkin = updates.checkin.unwrap_or(existing.checkin);
    let checkout = updates.checkout.unwrap_or(existing.checkout);
    if checkout <= checkin {
        return HttpResponse::BadRequest()
            .json(json!({ "error": "Check-out date must be after check-in date" }));
    }

    let mut update_doc = match mongodb::bson::to_document(&updates) {
        Ok(doc) => doc,
        Err(err) => {
            log::error!("Failed to serialize booking update: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };
    update_doc.insert("updated_at", to_bson(&Utc::now()).unwrap_or_default());

    match collection
        .find_one_and_update(active_filter_for("_id", booking_id), doc! { "$set": update_doc })
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(booking)) => HttpResponse::Ok().json(booking),
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "Booking not found" })),
        Err(err) => {
            log::error!("Failed to update booking: {:?}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    DELETE /api/bookings/{id}   (admin only)

    Soft delete: the row is flagged, never removed.
*/
pub async fn delete_booking(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Booking> = client.database(DB_NAME).collection(BOOKINGS);

    let booking_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection
        .find_one_and_update(
            active_filter_for("_id", booking_id),
            doc! { "$set": { "deleted": true } },
        )
        .await
    {
        Ok(Some(_)) => {
            HttpResponse::Ok().json(json!({ "message": "Booking soft-deleted successfully" }))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "Booking not found" })),
        Err(err) => {
            log::error!("Failed to soft-delete booking: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/// Resolves each booking's trip, user, and location references.
async fn populate_bookings(client: &Client, bookings: Vec<Booking>) -> Vec<PopulatedBooking> {
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);
    let users: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);
    let locations: mongodb::Collection<Location> = client.database(DB_NAME).collection(LOCATIONS);

    let mut populated = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let trip = trips
            .find_one(doc! { "_id": booking.trip_id })
            .await
            .ok()
            .flatten();
        let user = users
            .find_one(doc! { "_id": booking.user_id })
            .await
            .ok()
            .flatten()
            .map(UserPublic::from);
        let location = locations
            .find_one(doc! { "_id": booking.location_id })
            .await
            .ok()
            .flatten();

        populated.push(PopulatedBooking::new(booking, trip, user, location));
    }

    populated
}
