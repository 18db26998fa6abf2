use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson};
use mongodb::options::ReturnDocument;
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::{CHECKLISTS, DB_NAME};
use crate::models::checklist::{Checklist, ChecklistPayload, NewChecklistItem, PopulatedChecklist};
use crate::routes::location::load_trips;

#[derive(Debug, Deserialize)]
pub struct ItemStatusPayload {
    pub is_checked: bool,
}

/*
    POST /api/checklists
*/
pub async fn create_checklist(
    data: web::Data<Arc<Client>>,
    input: web::Json<ChecklistPayload>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Checklist> =
        client.database(DB_NAME).collection(CHECKLISTS);

    let payload = input.into_inner();
    let errors = payload.validate();
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    let mut checklist = payload.into_checklist();

    match collection.insert_one(&checklist).await {
        Ok(result) => {
            checklist.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(checklist)
        }
        Err(err) => {
            log::error!("Failed to insert checklist: {:?}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    GET /api/checklists
*/
pub async fn get_checklists(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Checklist> =
        client.database(DB_NAME).collection(CHECKLISTS);

    let checklists = match collection.find(doc! {}).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Checklist>>().await {
            Ok(checklists) => checklists,
            Err(err) => {
                log::error!("Failed to collect checklists: {:?}", err);
                return HttpResponse::InternalServerError()
                    .json(json!({ "error": err.to_string() }));
            }
        },
        Err(err) => {
            log::error!("Failed to fetch checklists: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };

    let trip_ids: Vec<ObjectId> = checklists.iter().map(|c| c.trip_id).collect();
    let trip_map = load_trips(&client, &trip_ids).await;

    let populated: Vec<PopulatedChecklist> = checklists
        .into_iter()
        .map(|checklist| {
            let trip = trip_map.get(&checklist.trip_id).cloned();
            PopulatedChecklist::new(checklist, trip)
        })
        .collect();

    HttpResponse::Ok().json(populated)
}

/*
    GET /api/checklists/{id}
*/
pub async fn get_checklist_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Checklist> =
        client.database(DB_NAME).collection(CHECKLISTS);

    let checklist_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection.find_one(doc! { "_id": checklist_id }).await {
        Ok(Some(checklist)) => {
            let trip_map = load_trips(&client, &[checklist.trip_id]).await;
            let trip = trip_map.get(&checklist.trip_id).cloned();
            HttpResponse::Ok().json(PopulatedChecklist::new(checklist, trip))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({ "message": "Checklist not found" })),
        Err(err) => {
            log::error!("Failed to fetch checklist: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    POST /api/checklists/{id}/items

    Appends one item; the server assigns its id so it can be targeted later.
*/
pub async fn add_item(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<NewChecklistItem>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Checklist> =
        client.database(DB_NAME).collection(CHECKLISTS);

    let checklist_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    let new_item = input.into_inner();
    if new_item.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "Item name is required" }));
    }
    let item = new_item.into_item();

    let item_bson = match to_bson(&item) {
        Ok(bson) => bson,
        Err(err) => {
            log::error!("Failed to serialize checklist item: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }));
        }
    };

    match collection
        .find_one_and_update(
            doc! { "_id": checklist_id },
            doc! { "$push": { "items": item_bson } },
        )
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(checklist)) => HttpResponse::Ok().json(checklist),
        Ok(None) => HttpResponse::NotFound().json(json!({ "message": "Checklist not found" })),
        Err(err) => {
            log::error!("Failed to add checklist item: {:?}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    PATCH /api/checklists/{checklist_id}/items/{item_id}
*/
pub async fn update_item_status(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    input: web::Json<ItemStatusPayload>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Checklist> =
        client.database(DB_NAME).collection(CHECKLISTS);

    let (checklist_id, item_id) = path.into_inner();
    let (checklist_id, item_id) = match (
        ObjectId::parse_str(&checklist_id),
        ObjectId::parse_str(&item_id),
    ) {
        (Ok(checklist_id), Ok(item_id)) => (checklist_id, item_id),
        _ => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection
        .find_one_and_update(
            doc! { "_id": checklist_id, "items._id": item_id },
            doc! { "$set": { "items.$.is_checked": input.is_checked } },
        )
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(checklist)) => HttpResponse::Ok().json(checklist),
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "message": "Checklist or item not found" }))
        }
        Err(err) => {
            log::error!("Failed to update checklist item: {:?}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    DELETE /api/checklists/{checklist_id}/items/{item_id}
*/
pub async fn remove_item(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Checklist> =
        client.database(DB_NAME).collection(CHECKLISTS);

    let (checklist_id, item_id) = path.into_inner();
    let (checklist_id, item_id) = match (
        ObjectId::parse_str(&checklist_id),
        ObjectId::parse_str(&item_id),
    ) {
        (Ok(checklist_id), Ok(item_id)) => (checklist_id, item_id),
        _ => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection
        .find_one_and_update(
            doc! { "_id": checklist_id },
            doc! { "$pull": { "items": { "_id": item_id } } },
        )
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(checklist)) => HttpResponse::Ok().json(json!({
            "message": "Item deleted successfully",
            "checklist": checklist,
        })),
        Ok(None) => HttpResponse::NotFound().json(json!({ "message": "Checklist not found" })),
        Err(err) => {
            log::error!("Failed to remove checklist item: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    DELETE /api/checklists/{id}
*/
pub async fn delete_checklist(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Checklist> =
        client.database(DB_NAME).collection(CHECKLISTS);

    let checklist_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({ "message": "Invalid ID" })),
    };

    match collection
        .find_one_and_delete(doc! { "_id": checklist_id })
        .await
    {
        Ok(Some(checklist)) => HttpResponse::Ok().json(checklist),
        Ok(None) => HttpResponse::NotFound().json(json!({ "message": "Checklist not found" })),
        Err(err) => {
            log::error!("Failed to delete checklist: {:?}", err);
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}
