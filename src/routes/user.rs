use actix_web::{web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use futures::TryStreamExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::WriteError;
use mongodb::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::{DB_NAME, TRIPS, USERS};
use crate::middleware::auth::Claims;
use crate::models::trip::{categorize_trips, Trip};
use crate::models::user::{
    is_valid_email, is_valid_phone, password_rule_violation, User, UserPublic, COUNTRIES, GENDERS,
    TRAVEL_PREFERENCES,
};
use crate::models::FieldError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub auth_token: String,
    pub user: UserPublic,
}

/// A user plus the ids of trips they participate in, for the list endpoint.
#[derive(Debug, Serialize)]
pub struct UserListEntry {
    #[serde(flatten)]
    pub user: UserPublic,
    pub participating_trips: Vec<ObjectId>,
}

/*
    POST /api/users/signup
*/
pub async fn signup(data: web::Data<Arc<Client>>, input: web::Json<User>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    let mut user = input.into_inner();

    let errors = user.validate();
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    match collection.find_one(doc! { "email": &user.email }).await {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Email already in use" }))
        }
        Ok(None) => {}
        Err(err) => {
            log::error!("Failed to check for existing email: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error creating user", "error": err.to_string() }));
        }
    }

    if user.hash_password().is_err() {
        return HttpResponse::InternalServerError()
            .json(json!({ "message": "Failed to hash password" }));
    }

    let curr_time = Utc::now();
    user.id = None;
    // Role and trip list are server-managed regardless of the payload
    user.role = crate::models::user::UserRole::User;
    user.trips = Vec::new();
    user.created_at = Some(curr_time);
    user.updated_at = Some(curr_time);

    match collection.insert_one(&user).await {
        Ok(result) => {
            user.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(json!({
                "message": "User created successfully",
                "user": UserPublic::from(user),
            }))
        }
        Err(err) => match *err.kind {
            // The unique index catches races the pre-insert check misses
            mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
                WriteError { code: 11000, .. },
            )) => HttpResponse::BadRequest()
                .json(json!({ "message": "Email or username already in use" })),
            _ => {
                log::error!("Failed to insert user: {:?}", err);
                HttpResponse::InternalServerError()
                    .json(json!({ "message": "Error creating user", "error": err.to_string() }))
            }
        },
    }
}

/*
    POST /api/users/login
*/
pub async fn login(data: web::Data<Arc<Client>>, input: web::Json<LoginRequest>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    let credentials = input.into_inner();

    match collection.find_one(doc! { "email": &credentials.email }).await {
        Ok(Some(user)) => {
            if !user.verify_password(&credentials.password) {
                return HttpResponse::Unauthorized()
                    .json(json!({ "message": "Invalid credentials" }));
            }

            let user_id = match user.id {
                Some(id) => id,
                None => {
                    return HttpResponse::InternalServerError()
                        .json(json!({ "message": "Stored user has no id" }))
                }
            };

            match generate_token(&user.email, user_id) {
                Ok(token) => HttpResponse::Ok().json(LoginResponse {
                    message: "Login successful".to_string(),
                    auth_token: token,
                    user: UserPublic::from(user),
                }),
                Err(err) => {
                    log::error!("Token generation failed: {:?}", err);
                    HttpResponse::InternalServerError()
                        .json(json!({ "message": "Token generation failed" }))
                }
            }
        }
        Ok(None) => HttpResponse::NotFound().json(json!({ "message": "User not found" })),
        Err(err) => {
            log::error!("Database error during login: {:?}", err);
            HttpResponse::InternalServerError()
                .json(json!({ "message": "Error logging in", "error": err.to_string() }))
        }
    }
}

pub fn generate_token(email: &str, user_id: ObjectId) -> Result<String, jsonwebtoken::errors::Error> {
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());
    let now = Utc::now();

    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(24)).timestamp() as usize,
        user_id: user_id.to_string(),
    };

    let header = Header::new(Algorithm::HS256);
    encode(&header, &claims, &EncodingKey::from_secret(secret.as_ref()))
}

/*
    GET /api/users
*/
pub async fn get_users(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let users: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);
    let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);

    let all_users = match users.find(doc! {}).await {
        Ok(cursor) => match cursor.try_collect::<Vec<User>>().await {
            Ok(users) => users,
            Err(err) => {
                log::error!("Failed to collect users: {:?}", err);
                return HttpResponse::InternalServerError()
                    .json(json!({ "message": "Error fetching users", "error": err.to_string() }));
            }
        },
        Err(err) => {
            log::error!("Failed to fetch users: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching users", "error": err.to_string() }));
        }
    };

    let mut entries = Vec::with_capacity(all_users.len());
    for user in all_users {
        let participating_trips = match user.id {
            Some(id) => match trips.find(doc! { "participants": id }).await {
                Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
                    Ok(found) => found.into_iter().filter_map(|t| t.id).collect(),
                    Err(err) => {
                        log::error!("Failed to collect participating trips: {:?}", err);
                        return HttpResponse::InternalServerError().json(
                            json!({ "message": "Error fetching users", "error": err.to_string() }),
                        );
                    }
                },
                Err(err) => {
                    log::error!("Failed to fetch participating trips: {:?}", err);
                    return HttpResponse::InternalServerError().json(
                        json!({ "message": "Error fetching users", "error": err.to_string() }),
                    );
                }
            },
            None => Vec::new(),
        };
        entries.push(UserListEntry {
            user: UserPublic::from(user),
            participating_trips,
        });
    }

    HttpResponse::Ok().json(entries)
}

/*
    GET /api/users/{id}
*/
pub async fn get_user_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    let user_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid user ID" }))
        }
    };

    match collection.find_one(doc! { "_id": user_id }).await {
        Ok(Some(user)) => HttpResponse::Ok().json(UserPublic::from(user)),
        Ok(None) => HttpResponse::NotFound().json(json!({ "message": "User not found" })),
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching user", "error": err.to_string() }))
        }
    }
}

/*
    PUT /api/users/{id}

    Partial update. A submitted password is re-validated and re-hashed; the
    other fields are validated only when present.
*/
pub async fn update_user(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<crate::models::user::UserUpdate>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    let user_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid user ID" }))
        }
    };

    let updates = input.into_inner();
    let errors = validate_update(&updates);
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "errors": errors }));
    }

    let mut user = match collection.find_one(doc! { "_id": user_id }).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({ "message": "User not found" }))
        }
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error updating user", "error": err.to_string() }));
        }
    };

    if let Some(name) = updates.name {
        user.name = name;
    }
    if let Some(phone) = updates.phone {
        user.phone = phone;
    }
    if let Some(profile_picture) = updates.profile_picture {
        user.profile_picture = Some(profile_picture);
    }
    if let Some(country) = updates.country {
        user.country = country;
    }
    if let Some(gender) = updates.gender {
        user.gender = Some(gender);
    }
    if let Some(username) = updates.username {
        user.username = username;
    }
    if let Some(email) = updates.email {
        user.email = email;
    }
    if let Some(preferences) = updates.preferences {
        user.preferences = Some(preferences);
    }
    if let Some(password) = updates.password {
        user.password = password;
        if user.hash_password().is_err() {
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Failed to hash password" }));
        }
    }
    user.updated_at = Some(Utc::now());

    match collection.replace_one(doc! { "_id": user_id }, &user).await {
        Ok(_) => HttpResponse::Ok().json(json!({
            "message": "User updated successfully",
            "user": UserPublic::from(user),
        })),
        Err(err) => {
            log::error!("Failed to update user: {:?}", err);
            HttpResponse::InternalServerError()
                .json(json!({ "message": "Error updating user", "error": err.to_string() }))
        }
    }
}

fn validate_update(updates: &crate::models::user::UserUpdate) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(name) = &updates.name {
        if name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name cannot be empty"));
        }
    }
    if let Some(phone) = &updates.phone {
        if !is_valid_phone(phone) {
            errors.push(FieldError::new(
                "phone",
                "Phone number must start with 0 and be exactly 10 digits long",
            ));
        }
    }
    if let Some(country) = &updates.country {
        if !COUNTRIES.contains(&country.as_str()) {
            errors.push(FieldError::new(
                "country",
                format!("{} is not a supported country", country),
            ));
        }
    }
    if let Some(gender) = &updates.gender {
        if !GENDERS.contains(&gender.as_str()) {
            errors.push(FieldError::new("gender", "Invalid gender"));
        }
    }
    if let Some(username) = &updates.username {
        if username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username cannot be empty"));
        }
    }
    if let Some(email) = &updates.email {
        if !is_valid_email(email) {
            errors.push(FieldError::new("email", "Invalid email format"));
        }
    }
    if let Some(preferences) = &updates.preferences {
        if !TRAVEL_PREFERENCES.contains(&preferences.as_str()) {
            errors.push(FieldError::new("preferences", "Invalid travel preference"));
        }
    }
    if let Some(password) = &updates.password {
        if let Some(err) = password_rule_violation(password) {
            errors.push(FieldError::new("password", err));
        }
    }

    errors
}

/*
    DELETE /api/users/{id}
*/
pub async fn delete_user(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    let user_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid user ID" }))
        }
    };

    match collection.find_one_and_delete(doc! { "_id": user_id }).await {
        Ok(Some(_)) => HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })),
        Ok(None) => HttpResponse::NotFound().json(json!({ "message": "User not found" })),
        Err(err) => {
            log::error!("Failed to delete user: {:?}", err);
            HttpResponse::InternalServerError()
                .json(json!({ "message": "Error deleting user", "error": err.to_string() }))
        }
    }
}

/*
    GET /api/users/{user_id}/trips
*/
pub async fn get_user_with_trips(
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
            return HttpResponse::NotFound().json(json!({ "message": "User not found" }))
        }
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching user data", "error": err.to_string() }));
        }
    };

    let owned_trips = match trips.find(doc! { "_id": { "$in": &user.trips } }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(found) => found,
            Err(err) => {
                log::error!("Failed to collect trips: {:?}", err);
                return HttpResponse::InternalServerError().json(
                    json!({ "message": "Error fetching user data", "error": err.to_string() }),
                );
            }
        },
        Err(err) => {
            log::error!("Failed to fetch trips: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching user data", "error": err.to_string() }));
        }
    };

    HttpResponse::Ok().json(json!({
        "user": UserPublic::from(user),
        "trips": owned_trips,
    }))
}

/*
    GET /api/users/{user_id}/trips/status

    Categorizes the trips the user participates in as past, current, or
    upcoming. All comparisons are against the current UTC time.
*/
pub async fn get_user_trips_status(
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

    match users.find_one(doc! { "_id": user_id }).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({ "message": "User not found" }))
        }
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching trips", "error": err.to_string() }));
        }
    }

    let participating = match trips.find(doc! { "participants": user_id }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(found) => found,
            Err(err) => {
                log::error!("Failed to collect trips: {:?}", err);
                return HttpResponse::InternalServerError()
                    .json(json!({ "message": "Error fetching trips", "error": err.to_string() }));
            }
        },
        Err(err) => {
            log::error!("Failed to fetch trips: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error fetching trips", "error": err.to_string() }));
        }
    };

    let categorized = categorize_trips(participating, Utc::now());

    HttpResponse::Ok().json(json!({
        "message": "Trips fetched successfully",
        "user_id": user_id,
        "categorized_trips": categorized,
    }))
}
