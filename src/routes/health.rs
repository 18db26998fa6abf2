use actix_web::{web, HttpResponse, Responder};
use mongodb::{bson::doc, Client};
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::DB_NAME;

pub async fn health_check(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();

    let mongodb = match client.database(DB_NAME).run_command(doc! { "ping": 1 }).await {
        Ok(_) => "ok",
        Err(err) => {
            log::warn!("Health check: MongoDB ping failed: {:?}", err);
            "unreachable"
        }
    };

    let status = if mongodb == "ok" { "ok" } else { "degraded" };

    HttpResponse::Ok().json(json!({
        "status": status,
        "services": { "mongodb": mongodb },
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
