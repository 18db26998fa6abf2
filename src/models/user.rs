use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::FieldError;

pub const COUNTRIES: &[&str] = &["Sri Lanka", "India", "USA", "UK", "Australia"];
pub const GENDERS: &[&str] = &["Male", "Female", "Other"];
pub const TRAVEL_PREFERENCES: &[&str] = &["adventure", "religious", "relaxing"];

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    #[default]
    User,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub username: String,
    pub email: String,
    pub password: String, // Always a bcrypt hash by the time it reaches storage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub trips: Vec<ObjectId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The response view of a user. The password hash has no field here, so it
/// can never leak into a JSON body.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserPublic {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
    pub role: UserRole,
    pub trips: Vec<ObjectId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        UserPublic {
            id: user.id,
            name: user.name,
            phone: user.phone,
            profile_picture: user.profile_picture,
            country: user.country,
            gender: user.gender,
            username: user.username,
            email: user.email,
            preferences: user.preferences,
            role: user.role,
            trips: user.trips,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Partial update payload for PUT /api/users/{id}.
#[derive(Debug, Deserialize, Serialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub country: Option<String>,
    pub gender: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub preferences: Option<String>,
}

impl User {
    /// Runs the declarative field validators. Must be called on the
    /// plaintext password, before `hash_password`.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if !is_valid_phone(&self.phone) {
            errors.push(FieldError::new(
                "phone",
                "Phone number must start with 0 and be exactly 10 digits long",
            ));
        }
        if !COUNTRIES.contains(&self.country.as_str()) {
            errors.push(FieldError::new(
                "country",
                format!("{} is not a supported country", self.country),
            ));
        }
        if let Some(gender) = &self.gender {
            if !GENDERS.contains(&gender.as_str()) {
                errors.push(FieldError::new("gender", "Invalid gender"));
            }
        }
        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email format"));
        }
        if let Some(err) = password_rule_violation(&self.password) {
            errors.push(FieldError::new("password", err));
        }
        if let Some(preferences) = &self.preferences {
            if !TRAVEL_PREFERENCES.contains(&preferences.as_str()) {
                errors.push(FieldError::new("preferences", "Invalid travel preference"));
            }
        }

        errors
    }

    pub fn hash_password(&mut self) -> Result<(), bcrypt::BcryptError> {
        self.password = bcrypt::hash(&self.password, bcrypt::DEFAULT_COST)?;
        Ok(())
    }

    /// The only path by which a submitted password may be compared against
    /// the stored hash.
    pub fn verify_password(&self, candidate: &str) -> bool {
        bcrypt::verify(candidate, &self.password).unwrap_or(false)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let re = regex::Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    );
    re.unwrap().is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    let re = regex::Regex::new(r"^0\d{9}$");
    re.unwrap().is_match(phone)
}

/// At least 6 characters with one digit and one uppercase letter. Written as
/// plain checks since the regex crate has no lookahead.
pub fn password_rule_violation(password: &str) -> Option<&'static str> {
    if password.len() < 6
        || !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| c.is_ascii_uppercase())
    {
        return Some(
            "Password must be at least 6 characters long, include at least one number and one uppercase letter",
        );
    }
    None
}
