use actix_web::http::StatusCode;
use actix_web::{test, web, App, HttpResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use serial_test::serial;

use tripmate_api::middleware::auth::{AuthMiddleware, Claims};
use tripmate_api::middleware::role_auth::RequireRole;
use tripmate_api::models::user::UserRole;

const TEST_SECRET: &str = "test_secret";

fn make_token(secret: &str, offset_hours: i64) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: "amara@example.com".to_string(),
        iat: (now - Duration::hours(1)).timestamp() as usize,
        exp: (now + Duration::hours(offset_hours)).timestamp() as usize,
        user_id: mongodb::bson::oid::ObjectId::new().to_hex(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .expect("token encodes")
}

async fn whoami(claims: Claims) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "email": claims.sub }))
}

#[actix_web::test]
#[serial]
async fn valid_token_reaches_handler_with_claims() {
    std::env::set_var("JWT_SECRET", TEST_SECRET);

    let app = test::init_service(
        App::new().service(
            web::scope("")
                .wrap(AuthMiddleware)
                .route("/me", web::get().to(whoami)),
        ),
    )
    .await;

    let token = make_token(TEST_SECRET, 24);
    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "amara@example.com");
}

#[actix_web::test]
#[serial]
async fn missing_header_is_unauthorized() {
    std::env::set_var("JWT_SECRET", TEST_SECRET);

    let app = test::init_service(
        App::new().service(
            web::scope("")
                .wrap(AuthMiddleware)
                .route("/me", web::get().to(whoami)),
        ),
    )
    .await;

    let req = test::TestRequest::get().uri("/me").to_request();
    match test::try_call_service(&app, req).await {
        Ok(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
        Err(err) => assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        ),
    }
}

#[actix_web::test]
#[serial]
async fn token_signed_with_wrong_secret_is_unauthorized() {
    std::env::set_var("JWT_SECRET", TEST_SECRET);

    let app = test::init_service(
        App::new().service(
            web::scope("")
                .wrap(AuthMiddleware)
                .route("/me", web::get().to(whoami)),
        ),
    )
    .await;

    let token = make_token("some_other_secret", 24);
    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();

    match test::try_call_service(&app, req).await {
        Ok(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
        Err(err) => assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        ),
    }
}

#[actix_web::test]
#[serial]
async fn expired_token_is_unauthorized() {
    std::env::set_var("JWT_SECRET", TEST_SECRET);

    let app = test::init_service(
        App::new().service(
            web::scope("")
                .wrap(AuthMiddleware)
                .route("/me", web::get().to(whoami)),
        ),
    )
    .await;

    // exp two hours in the past; jsonwebtoken's default leeway is 60s
    let token = make_token(TEST_SECRET, -2);
    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();

    match test::try_call_service(&app, req).await {
        Ok(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
        Err(err) => assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        ),
    }
}

#[actix_web::test]
#[serial]
async fn role_gate_without_prior_auth_is_unauthorized() {
    // RequireRole rejects before touching storage when no claims are present
    let app = test::init_service(
        App::new().service(
            web::scope("")
                .wrap(RequireRole::new(UserRole::Admin))
                .route(
                    "/dashboard",
                    web::get().to(|| async { HttpResponse::Ok().finish() }),
                ),
        ),
    )
    .await;

    let req = test::TestRequest::get().uri("/dashboard").to_request();
    match test::try_call_service(&app, req).await {
        Ok(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
        Err(err) => assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        ),
    }
}

#[actix_web::test]
#[serial]
async fn claims_extractor_without_middleware_is_unauthorized() {
    let app = test::init_service(App::new().route("/me", web::get().to(whoami))).await;

    let req = test::TestRequest::get().uri("/me").to_request();
    match test::try_call_service(&app, req).await {
        Ok(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
        Err(err) => assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        ),
    }
}
