use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson};
use mongodb::options::ReturnDocument;
use mongodb::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::{DB_NAME, TRIPS, USERS};
use crate::models::trip::{Trip, TripUpdate};
use crate::models::user::{User, UserPublic};

#[derive(Debug, Deserialize)]
pub struct TripPayload {
    pub trip_name: String,
    pub destination: String,
    #[serde(default)]
    pub collaboration: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub preferences: HashMap<String, String>,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantsPayload {
    pub user_ids: Vec<String>,
}

/// Trip with its participant references resolved to public users.
#[derive(Debug, Serialize)]
pub struct TripWithParticipants {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_name: String,
    pub destination: String,
    pub collaboration: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub participants: Vec<UserPublic>,
    pub preferences: HashMap<String, String>,
    pub user_id: ObjectId,
}

/*
    POST /api/trips/create

    The trip insert and the owner's trips-list push happen inside one
    transaction so a failure cannot leave the collections inconsistent.
    Requires the server to be a replica set, as MongoDB transactions do.
*/
pub async fn create_trip(
    data: web::Data<Arc<Client>>,
    input: web::Json<TripPayload>,
) -> impl Responder {
    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);
    let users: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    let payload = input.into_inner();

    let owner_id = match ObjectId::parse_str(&payload.user_id) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid user ID" }))
        }
    };

    match users.find_one(doc! { "_id": owner_id }).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({ "message": "Organizer not found" }))
        }
        Err(err) => {
            log::error!("Failed to fetch organizer: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error creating trip", "error": err.to_string() }));
        }
    }

    let participants = match parse_id_list(&payload.participants) {
        Some(ids) => ids,
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Invalid participant IDs provided" }))
        }
    };

    let curr_time = Utc::now();
    let mut trip = Trip {
        id: None,
        trip_name: payload.trip_name,
        destination: payload.destination,
        collaboration: payload.collaboration,
        start_date: payload.start_date,
        end_date: payload.end_date,
        participants,
        preferences: payload.preferences,
        user_id: owner_id,
        created_at: Some(curr_time),
        updated_at: Some(curr_time),
    };

    let errors = trip.validate();
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    let mut session = match client.start_session().await {
        Ok(session) => session,
        Err(err) => {
            log::error!("Failed to start session: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error creating trip", "error": err.to_string() }));
        }
    };
    if let Err(err) = session.start_transaction().await {
        log::error!("Failed to start transaction: {:?}", err);
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Error creating trip", "error": err.to_string() }));
    }

    let trip_id = match trips.insert_one(&trip).session(&mut session).await {
        Ok(result) => match result.inserted_id.as_object_id() {
            Some(id) => id,
            None => {
                let _ = session.abort_transaction().await;
                return HttpResponse::InternalServerError()
                    .json(json!({ "message": "Error creating trip" }));
            }
        },
        Err(err) => {
            log::error!("Failed to insert trip: {:?}", err);
            let _ = session.abort_transaction().await;
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Error creating trip", "error": err.to_string() }));
        }
    };

    let owner_update = users
        .update_one(
            doc! { "_id": owner_id },
            doc! { "$push": { "trips": trip_id } },
        )
        .session(&mut session)
        .await;
    if let Err(err) = owner_update {
        log::error!("Failed to update organizer trips: {:?}", err);
        let _ = session.abort_transaction().await;
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Error creating trip", "error": err.to_string() }));
    }

    if let Err(err) = session.commit_transaction().await {
        log::error!("Failed to commit trip creation: {:?}", err);
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Error creating trip", "error": err.to_string() }));
    }

    trip.id = Some(trip_id);
    HttpResponse::Created().json(trip)
}

fn parse_id_list(ids: &[String]) -> Option<Vec<ObjectId>> {
    ids.iter()
        .map(|id| ObjectId::parse_str(id).ok())
        .collect::<Option<Vec<_>>>()
}

/// $addToSet with $each gives set-union semantics: submitting an id twice
/// still yields a single membership.
pub fn participants_union(user_ids: Vec<ObjectId>) -> mongodb::bson::Document {
    doc! { "$addToSet": { "participants": { "$each": user_ids } } }
}

/*
    GET /api/trips/{user_id}

    The user's owned trips, resolved from their trips list.
*/
pub async fn get_trips_for_user(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let users: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);

    let user_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid user ID" }))
        }
    };

    let user = match users.find_one(doc! { "_id": user_id }).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "message": "No trips found for this user" }))
        }
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching trips", "error": err.to_string() }));
        }
    };

    if user.trips.is_empty() {
        return HttpResponse::NotFound().json(json!({ "message": "No trips found for this user" }));
    }

    match trips.find(doc! { "_id": { "$in": &user.trips } }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(found) => HttpResponse::Ok().json(found),
            Err(err) => {
                log::error!("Failed to collect trips: {:?}", err);
                HttpResponse::InternalServerError()
                    .json(json!({ "message": "Error fetching trips", "error": err.to_string() }))
            }
        },
        Err(err) => {
            log::error!("Failed to fetch trips: {:?}", err);
            HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching trips", "error": err.to_string() }))
        }
    }
}

/*
    GET /api/trips/{user_id}/{trip_id}
*/
pub async fn get_trip(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);

    let (user_id, trip_id) = path.into_inner();
    let (user_id, trip_id) = match (ObjectId::parse_str(&user_id), ObjectId::parse_str(&trip_id)) {
        (Ok(user_id), Ok(trip_id)) => (user_id, trip_id),
        _ => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => HttpResponse::Ok().json(trip),
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "message": "Trip not found for this user" }))
        }
        Err(err) => {
            log::error!("Failed to fetch trip: {:?}", err);
            HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching trip", "error": err.to_string() }))
        }
    }
}

/*
    PUT /api/trips/{user_id}/{trip_id}
*/
pub async fn update_trip(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    input: web::Json<TripUpdate>,
) -> impl Responder {
    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);

    let (user_id, trip_id) = path.into_inner();
    let (user_id, trip_id) = match (ObjectId::parse_str(&user_id), ObjectId::parse_str(&trip_id)) {
        (Ok(user_id), Ok(trip_id)) => (user_id, trip_id),
        _ => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    let updates = input.into_inner();
    if let Some(destination) = &updates.destination {
        if !crate::models::trip::DISTRICTS.contains(&destination.as_str()) {
            return HttpResponse::BadRequest().json(json!({
                "message": format!("{} is not a valid district in Sri Lanka", destination)
            }));
        }
    }
    if let Some(trip_name) = &updates.trip_name {
        if trip_name.trim().is_empty() {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Trip name cannot be empty" }));
        }
    }

    let mut update_doc = match mongodb::bson::to_document(&updates) {
        Ok(doc) => doc,
        Err(err) => {
            log::error!("Failed to serialize trip update: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error updating trip", "error": err.to_string() }));
        }
    };
    update_doc.insert("updated_at", to_bson(&Utc::now()).unwrap_or_default());

    match trips
        .find_one_and_update(
            doc! { "_id": trip_id, "user_id": user_id },
            doc! { "$set": update_doc },
        )
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(trip)) => HttpResponse::Ok().json(trip),
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "message": "Trip not found for this user" }))
        }
        Err(err) => {
            log::error!("Failed to update trip: {:?}", err);
            HttpResponse::BadRequest()
                .json(json!({ "message": "Error updating trip", "error": err.to_string() }))
        }
    }
}

/*
    PUT /api/trips/{trip_id}/participants
*/
pub async fn add_participants(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<ParticipantsPayload>,
) -> impl Responder {
    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);
    let users: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    let trip_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid trip ID" }))
        }
    };

    let user_ids = match parse_id_list(&input.user_ids) {
        Some(ids) => ids,
        None => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid user IDs provided" }))
        }
    };

    let trip = match trips
        .find_one_and_update(doc! { "_id": trip_id }, participants_union(user_ids))
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().json(json!({ "message": "Trip not found" })),
        Err(err) => {
            log::error!("Failed to add participants: {:?}", err);
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Error adding participants", "error": err.to_string() }));
        }
    };

    let participants: Vec<UserPublic> = match users
        .find(doc! { "_id": { "$in": &trip.participants } })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<User>>().await {
            Ok(found) => found.into_iter().map(UserPublic::from).collect(),
            Err(err) => {
                log::error!("Failed to collect participants: {:?}", err);
                return HttpResponse::InternalServerError().json(
                    json!({ "message": "Error fetching participants", "error": err.to_string() }),
                );
            }
        },
        Err(err) => {
            log::error!("Failed to fetch participants: {:?}", err);
            return HttpResponse::InternalServerError().json(
                json!({ "message": "Error fetching participants", "error": err.to_string() }),
            );
        }
    };

    HttpResponse::Ok().json(TripWithParticipants {
        id: trip.id,
        trip_name: trip.trip_name,
        destination: trip.destination,
        collaboration: trip.collaboration,
        start_date: trip.start_date,
        end_date: trip.end_date,
        participants,
        preferences: trip.preferences,
        user_id: trip.user_id,
    })
}

/*
    GET /api/trips/participating/{user_id}
*/
pub async fn get_participating_trips(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);

    let user_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid user ID" }))
        }
    };

    match trips.find(doc! { "participants": user_id }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(found) => HttpResponse::Ok().json(found),
            Err(err) => {
                log::error!("Failed to collect participating trips: {:?}", err);
                HttpResponse::InternalServerError().json(
                    json!({ "message": "Error fetching participating trips", "error": err.to_string() }),
                )
            }
        },
        Err(err) => {
            log::error!("Failed to fetch participating trips: {:?}", err);
            HttpResponse::InternalServerError().json(
                json!({ "message": "Error fetching participating trips", "error": err.to_string() }),
            )
        }
    }
}

/*
    DELETE /api/trips/{user_id}/{trip_id}

    The trip removal and the owner's trips-list pull run inside one
    transaction, mirroring creation.
*/
pub async fn delete_trip(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);
    let users: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    let (user_id, trip_id) = path.into_inner();
    let (user_id, trip_id) = match (ObjectId::parse_str(&user_id), ObjectId::parse_str(&trip_id)) {
        (Ok(user_id), Ok(trip_id)) => (user_id, trip_id),
        _ => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    let mut session = match client.start_session().await {
        Ok(session) => session,
        Err(err) => {
            log::error!("Failed to start session: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error deleting trip", "error": err.to_string() }));
        }
    };
    if let Err(err) = session.start_transaction().await {
        log::error!("Failed to start transaction: {:?}", err);
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Error deleting trip", "error": err.to_string() }));
    }

    match trips
        .find_one_and_delete(doc! { "_id": trip_id, "user_id": user_id })
        .session(&mut session)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            let _ = session.abort_transaction().await;
            return HttpResponse::NotFound()
                .json(json!({ "message": "Trip not found for this user" }));
        }
        Err(err) => {
            log::error!("Failed to delete trip: {:?}", err);
            let _ = session.abort_transaction().await;
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error deleting trip", "error": err.to_string() }));
        }
    }

    let pull = users
        .update_one(
            doc! { "_id": user_id },
            doc! { "$pull": { "trips": trip_id } },
        )
        .session(&mut session)
        .await;
    if let Err(err) = pull {
        log::error!("Failed to pull trip from user: {:?}", err);
        let _ = session.abort_transaction().await;
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Error deleting trip", "error": err.to_string() }));
    }

    if let Err(err) = session.commit_transaction().await {
        log::error!("Failed to commit trip deletion: {:?}", err);
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Error deleting trip", "error": err.to_string() }));
    }

    HttpResponse::Ok().json(json!({ "message": "Trip deleted successfully" }))
}
