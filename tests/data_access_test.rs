use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{test as actix_test, web, App};
use mongodb::bson::{oid::ObjectId, Bson};
use mongodb::{options::ClientOptions, Client};

use tripmate_api::routes::booking::{active_filter, active_filter_for, PaginationParams};
use tripmate_api::routes::trip::participants_union;
use tripmate_api::routes::user::get_users;

#[test]
fn pagination_normalizes_defaults_and_bounds() {
    let params = PaginationParams {
        page: None,
        limit: None,
    };
    assert_eq!(params.normalize(), (1, 10, 0));

    let params = PaginationParams {
        page: Some(0),
        limit: Some(500),
    };
    assert_eq!(params.normalize(), (1, 100, 0));

    let params = PaginationParams {
        page: Some(3),
        limit: Some(25),
    };
    assert_eq!(params.normalize(), (3, 25, 50));
}

#[test]
fn pagination_survives_maximum_page_numbers() {
    let params = PaginationParams {
        page: Some(u32::MAX),
        limit: Some(100),
    };

    let (page, limit, skip) = params.normalize();
    assert_eq!(page, u32::MAX);
    assert_eq!(limit, 100);
    assert_eq!(skip, u64::from(u32::MAX - 1) * 100);
}

#[test]
fn booking_reads_always_exclude_soft_deleted_rows() {
    assert!(!active_filter().get_bool("deleted").unwrap());

    let id = ObjectId::new();
    for field in ["_id", "user_id", "trip_id"] {
        let filter = active_filter_for(field, id);
        assert!(!filter.get_bool("deleted").unwrap());
        assert_eq!(filter.get_object_id(field).unwrap(), id);
    }
}

#[test]
fn adding_participants_uses_set_union_semantics() {
    let id = ObjectId::new();
    let update = participants_union(vec![id, id]);

    let each = update
        .get_document("$addToSet")
        .expect("update must add to the participant set")
        .get_document("participants")
        .expect("participants clause")
        .get_array("$each")
        .expect("$each form");
    assert_eq!(each, &vec![Bson::ObjectId(id), Bson::ObjectId(id)]);
    assert!(!update.contains_key("$push"));
}

#[actix_web::test]
async fn user_list_surfaces_database_errors() {
    // Nothing listens on port 9; selection fails fast and the handler
    // must report it rather than return a truncated list.
    let mut options = ClientOptions::parse("mongodb://127.0.0.1:9")
        .await
        .expect("options parse");
    options.server_selection_timeout = Some(Duration::from_millis(200));
    options.connect_timeout = Some(Duration::from_millis(200));
    let client = Arc::new(Client::with_options(options).expect("client builds"));

    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(client))
            .route("/api/users", web::get().to(get_users)),
    )
    .await;

    let req = actix_test::TestRequest::get().uri("/api/users").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
