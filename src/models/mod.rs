pub mod booking;
pub mod checklist;
pub mod itinerary;
pub mod location;
pub mod trip;
pub mod user;

use serde::Serialize;

/// One field-level validation violation. Create handlers collect every
/// violation before rejecting so the caller sees the full list at once.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
