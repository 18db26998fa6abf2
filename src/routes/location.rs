use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::Client;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::mongo::{DB_NAME, LOCATIONS, TRIPS};
use crate::models::location::{Location, LocationUpdate, PopulatedLocation};
use crate::models::trip::Trip;

/*
    POST /api/locations/add
*/
pub async fn add_location(
    data: web::Data<Arc<Client>>,
    input: web::Json<Location>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Location> =
        client.database(DB_NAME).collection(LOCATIONS);

    let mut location = input.into_inner();
    location.id = None;

    let errors = location.validate();
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    match collection.insert_one(&location).await {
        Ok(result) => {
            location.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(location)
        }
        Err(err) => {
            log::error!("Failed to insert location: {:?}", err);
            HttpResponse::BadRequest()
                .json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    GET /api/locations
*/
pub async fn get_locations(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Location> =
        client.database(DB_NAME).collection(LOCATIONS);

    let locations = match collection.find(doc! {}).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Location>>().await {
            Ok(locations) => locations,
            Err(err) => {
                log::error!("Failed to collect locations: {:?}", err);
                return HttpResponse::InternalServerError()
                    .json(json!({ "error": err.to_string() }));
            }
        },
        Err(err) => {
            log::error!("Failed to fetch locations: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };

    let trip_ids: Vec<ObjectId> = locations.iter().map(|l| l.trip_id).collect();
    let trip_map = load_trips(&client, &trip_ids).await;

    let populated: Vec<PopulatedLocation> = locations
        .into_iter()
        .map(|location| {
            let trip = trip_map.get(&location.trip_id).cloned();
            PopulatedLocation::new(location, trip)
        })
        .collect();

    HttpResponse::Ok().json(populated)
}

/*
    GET /api/locations/{id}
*/
pub async fn get_location_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Location> =
        client.database(DB_NAME).collection(LOCATIONS);

    let location_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection.find_one(doc! { "_id": location_id }).await {
        Ok(Some(location)) => {
            let trip_map = load_trips(&client, &[location.trip_id]).await;
            let trip = trip_map.get(&location.trip_id).cloned();
            HttpResponse::Ok().json(PopulatedLocation::new(location, trip))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "Location not found" })),
        Err(err) => {
            log::error!("Failed to fetch location: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    PUT /api/locations/{id}
*/
pub async fn update_location(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<LocationUpdate>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Location> =
        client.database(DB_NAME).collection(LOCATIONS);

    let location_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    let updates = input.into_inner();
    let errors = updates.validate();
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    let update_doc = match mongodb::bson::to_document(&updates) {
        Ok(doc) => doc,
        Err(err) => {
            log::error!("Failed to serialize location update: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };

    match collection
        .find_one_and_update(doc! { "_id": location_id }, doc! { "$set": update_doc })
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(location)) => HttpResponse::Ok().json(location),
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "Location not found" })),
        Err(err) => {
            log::error!("Failed to update location: {:?}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    DELETE /api/locations/{id}
*/
pub async fn delete_location(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Location> =
        client.database(DB_NAME).collection(LOCATIONS);

    let location_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection
        .find_one_and_delete(doc! { "_id": location_id })
        .await
    {
        Ok(Some(_)) => {
            HttpResponse::Ok().json(json!({ "message": "Location deleted successfully" }))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "Location not found" })),
        Err(err) => {
            log::error!("Failed to delete location: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/// Fetches the referenced trips in one query for populate-on-read.
pub async fn load_trips(client: &Client, trip_ids: &[ObjectId]) -> HashMap<ObjectId, Trip> {
    if trip_ids.is_empty() {
        return HashMap::new();
    }

    let collection: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);
    match collection.find(doc! { "_id": { "$in": trip_ids } }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(trips) => trips
                .into_iter()
                .filter_map(|trip| trip.id.map(|id| (id, trip)))
                .collect(),
            Err(err) => {
                log::error!("Failed to collect trips for populate: {:?}", err);
                HashMap::new()
            }
        },
        Err(err) => {
            log::error!("Failed to fetch trips for populate: {:?}", err);
            HashMap::new()
        }
    }
}
