pub mod admin;
pub mod booking;
pub mod checklist;
pub mod health;
pub mod itinerary;
pub mod location;
pub mod trip;
pub mod user;
