use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::mongo::{DB_NAME, ITINERARIES, LOCATIONS};
use crate::models::itinerary::{Itinerary, PopulatedItinerary};
use crate::models::location::Location;
use crate::routes::location::load_trips;

/*
    POST /api/itineraries
*/
pub async fn create_itinerary(
    data: web::Data<Arc<Client>>,
    input: web::Json<Itinerary>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Itinerary> =
        client.database(DB_NAME).collection(ITINERARIES);

    let mut itinerary = input.into_inner();
    itinerary.id = None;

    let errors = itinerary.validate();
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    match collection.insert_one(&itinerary).await {
        Ok(result) => {
            itinerary.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(itinerary)
        }
        Err(err) => {
            log::error!("Failed to insert itinerary: {:?}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    GET /api/itineraries
*/
pub async fn get_itineraries(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Itinerary> =
        client.database(DB_NAME).collection(ITINERARIES);

    let itineraries = match collection.find(doc! {}).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Itinerary>>().await {
            Ok(itineraries) => itineraries,
            Err(err) => {
                log::error!("Failed to collect itineraries: {:?}", err);
                return HttpResponse::InternalServerError()
                    .json(json!({ "error": err.to_string() }));
            }
        },
        Err(err) => {
            log::error!("Failed to fetch itineraries: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };

    let trip_ids: Vec<ObjectId> = itineraries.iter().map(|i| i.trip_id).collect();
    let location_ids: Vec<ObjectId> = itineraries.iter().flat_map(|i| i.location_ids()).collect();

    let trip_map = load_trips(&client, &trip_ids).await;
    let location_map = load_locations(&client, &location_ids).await;

    let populated: Vec<PopulatedItinerary> = itineraries
        .into_iter()
        .map(|itinerary| {
            let trip = trip_map.get(&itinerary.trip_id).cloned();
            PopulatedItinerary::new(itinerary, trip, &location_map)
        })
        .collect();

    HttpResponse::Ok().json(populated)
}

/*
    GET /api/itineraries/{id}
*/
pub async fn get_itinerary_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Itinerary> =
        client.database(DB_NAME).collection(ITINERARIES);

    let itinerary_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection.find_one(doc! { "_id": itinerary_id }).await {
        Ok(Some(itinerary)) => {
            let trip_map = load_trips(&client, &[itinerary.trip_id]).await;
            let location_map = load_locations(&client, &itinerary.location_ids()).await;
            let trip = trip_map.get(&itinerary.trip_id).cloned();
            HttpResponse::Ok().json(PopulatedItinerary::new(itinerary, trip, &location_map))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "Itinerary not found" })),
        Err(err) => {
            log::error!("Failed to fetch itinerary: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    PUT /api/itineraries/{id}

    Full replacement so the day/outfit invariants are re-checked as a whole.
*/
pub async fn update_itinerary(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<Itinerary>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Itinerary> =
        client.database(DB_NAME).collection(ITINERARIES);

    let itinerary_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    let mut itinerary = input.into_inner();
    itinerary.id = Some(itinerary_id);

    let errors = itinerary.validate();
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    match collection
        .replace_one(doc! { "_id": itinerary_id }, &itinerary)
        .await
    {
        Ok(result) if result.matched_count == 0 => {
            HttpResponse::NotFound().json(json!({ "error": "Itinerary not found" }))
        }
        Ok(_) => HttpResponse::Ok().json(itinerary),
        Err(err) => {
            log::error!("Failed to update itinerary: {:?}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    DELETE /api/itineraries/{id}
*/
pub async fn delete_itinerary(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Itinerary> =
        client.database(DB_NAME).collection(ITINERARIES);

    let itinerary_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection
        .find_one_and_delete(doc! { "_id": itinerary_id })
        .await
    {
        Ok(Some(_)) => {
            HttpResponse::Ok().json(json!({ "message": "Itinerary deleted successfully" }))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "Itinerary not found" })),
        Err(err) => {
            log::error!("Failed to delete itinerary: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/// Fetches the referenced locations in one query for populate-on-read.
pub async fn load_locations(
    client: &Client,
    location_ids: &[ObjectId],
) -> HashMap<ObjectId, Location> {
    if location_ids.is_empty() {
        return HashMap::new();
    }

    let collection: mongodb::Collection<Location> =
        client.database(DB_NAME).collection(LOCATIONS);
    match collection
        .find(doc! { "_id": { "$in": location_ids } })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<Location>>().await {
            Ok(locations) => locations
                .into_iter()
                .filter_map(|location| location.id.map(|id| (id, location)))
                .collect(),
            Err(err) => {
                log::error!("Failed to collect locations for populate: {:?}", err);
                HashMap::new()
            }
        },
        Err(err) => {
            log::error!("Failed to fetch locations for populate: {:?}", err);
            HashMap::new()
        }
    }
}
