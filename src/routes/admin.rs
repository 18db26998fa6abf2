use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::user::UserRole;

pub async fn dashboard() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Welcome to the admin dashboard" }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // Wrapped inside-out: AuthMiddleware (registered last) runs first and
    // populates the claims RequireRole reads.
    cfg.service(
        web::scope("/admin")
            .wrap(RequireRole::new(UserRole::Admin))
            .wrap(AuthMiddleware)
            .route("/dashboard", web::get().to(dashboard)),
    );
}
