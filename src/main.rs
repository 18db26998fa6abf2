use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use env_logger::Env;
use serde_json::json;

use tripmate_api::middleware::auth::AuthMiddleware;
use tripmate_api::middleware::role_auth::RequireRole;
use tripmate_api::models::user::UserRole;
use tripmate_api::{db, routes};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 5000;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(web::Data::new(client.clone()))
            .route("/health", web::get().to(routes::health::health_check))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/users")
                            .route("/signup", web::post().to(routes::user::signup))
                            .route("/login", web::post().to(routes::user::login))
                            .route("", web::get().to(routes::user::get_users))
                            .route(
                                "/{user_id}/trips/status",
                                web::get().to(routes::user::get_user_trips_status),
                            )
                            .route(
                                "/{user_id}/trips",
                                web::get().to(routes::user::get_user_with_trips),
                            )
                            .route("/{id}", web::get().to(routes::user::get_user_by_id))
                            .route("/{id}", web::put().to(routes::user::update_user))
                            .route("/{id}", web::delete().to(routes::user::delete_user)),
                    )
                    .service(
                        web::scope("/trips")
                            .route("/create", web::post().to(routes::trip::create_trip))
                            .route(
                                "/participating/{user_id}",
                                web::get().to(routes::trip::get_participating_trips),
                            )
                            .route(
                                "/{trip_id}/participants",
                                web::put().to(routes::trip::add_participants),
                            )
                            .route("/{user_id}", web::get().to(routes::trip::get_trips_for_user))
                            .route(
                                "/{user_id}/{trip_id}",
                                web::get().to(routes::trip::get_trip),
                            )
                            .route(
                                "/{user_id}/{trip_id}",
                                web::put().to(routes::trip::update_trip),
                            )
                            .route(
                                "/{user_id}/{trip_id}",
                                web::delete().to(routes::trip::delete_trip),
                            ),
                    )
                    .service(
                        web::scope("/locations")
                            .route("/add", web::post().to(routes::location::add_location))
                            .route("", web::get().to(routes::location::get_locations))
                            .route("/{id}", web::get().to(routes::location::get_location_by_id))
                            .route("/{id}", web::put().to(routes::location::update_location))
                            .route("/{id}", web::delete().to(routes::location::delete_location)),
                    )
                    .service(
                        web::scope("/itineraries")
                            .route("", web::post().to(routes::itinerary::create_itinerary))
                            .route("", web::get().to(routes::itinerary::get_itineraries))
                            .route(
                                "/{id}",
                                web::get().to(routes::itinerary::get_itinerary_by_id),
                            )
                            .route("/{id}", web::put().to(routes::itinerary::update_itinerary))
                            .route(
                                "/{id}",
                                web::delete().to(routes::itinerary::delete_itinerary),
                            ),
                    )
                    .service(
                        web::scope("/bookings")
                            .route("", web::post().to(routes::booking::create_booking))
                            .route("", web::get().to(routes::booking::get_bookings))
                            .route(
                                "/user/{user_id}",
                                web::get().to(routes::booking::get_bookings_for_user),
                            )
                            .route(
                                "/trip/{trip_id}",
                                web::get().to(routes::booking::get_bookings_for_trip),
                            )
                            .route("/{id}", web::get().to(routes::booking::get_booking_by_id))
                            .route("/{id}", web::put().to(routes::booking::update_booking))
                            // Soft delete is admin-gated; auth runs first, then
                            // the stored-role check.
                            .route(
                                "/{id}",
                                web::delete()
                                    .to(routes::booking::delete_booking)
                                    .wrap(RequireRole::new(UserRole::Admin))
                                    .wrap(AuthMiddleware),
                            ),
                    )
                    .service(
                        web::scope("/checklists")
                            .route("", web::post().to(routes::checklist::create_checklist))
                            .route("", web::get().to(routes::checklist::get_checklists))
                            .route(
                                "/{checklist_id}/items/{item_id}",
                                web::patch().to(routes::checklist::update_item_status),
                            )
                            .route(
                                "/{checklist_id}/items/{item_id}",
                                web::delete().to(routes::checklist::remove_item),
                            )
                            .route("/{id}/items", web::post().to(routes::checklist::add_item))
                            .route(
                                "/{id}",
                                web::get().to(routes::checklist::get_checklist_by_id),
                            )
                            .route(
                                "/{id}",
                                web::delete().to(routes::checklist::delete_checklist),
                            ),
                    )
                    .configure(routes::admin::config),
            )
            .default_service(web::route().to(|| async {
                HttpResponse::NotFound().json(json!({ "message": "Route not found" }))
            }))
    })
    .client_request_timeout(Duration::from_secs(30))
    .bind((host, port))?
    .run()
    .await
}
