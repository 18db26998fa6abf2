use chrono::{TimeZone, Utc};
use mongodb::bson::oid::ObjectId;

use tripmate_api::models::booking::{BookingPayload, BookingUpdate};
use tripmate_api::models::checklist::NewChecklistItem;
use tripmate_api::models::itinerary::{Day, Itinerary, OutfitEntry, Timeslot};
use tripmate_api::models::location::Location;
use tripmate_api::models::trip::{categorize_trips, Trip};
use tripmate_api::models::user::{User, UserPublic, UserRole};

fn valid_booking_payload() -> BookingPayload {
    BookingPayload {
        trip_id: Some(ObjectId::new().to_hex()),
        user_id: Some(ObjectId::new().to_hex()),
        location_id: Some(ObjectId::new().to_hex()),
        booking_type: Some("Hotel".to_string()),
        checkin: Some("2025-06-01T14:00:00Z".to_string()),
        checkout: Some("2025-06-05T10:00:00Z".to_string()),
        price: Some(250.0),
    }
}

#[test]
fn booking_payload_accepts_valid_input() {
    let booking = valid_booking_payload().validate().expect("should validate");
    assert_eq!(booking.booking_type, "Hotel");
    assert!(!booking.deleted);
    assert!(booking.checkout > booking.checkin);
}

#[test]
fn booking_payload_reports_every_violation() {
    let payload = BookingPayload {
        trip_id: Some("not-an-id".to_string()),
        user_id: None,
        location_id: Some("also-bad".to_string()),
        booking_type: Some("Cruise".to_string()),
        checkin: Some("last tuesday".to_string()),
        checkout: None,
        price: Some(-10.0),
    };

    let errors = payload.validate().unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

    assert!(fields.contains(&"trip_id"));
    assert!(fields.contains(&"user_id"));
    assert!(fields.contains(&"location_id"));
    assert!(fields.contains(&"type"));
    assert!(fields.contains(&"checkin"));
    assert!(fields.contains(&"checkout"));
    assert!(fields.contains(&"price"));
    assert_eq!(errors.len(), 7);
}

#[test]
fn booking_rejects_checkout_before_checkin() {
    let mut payload = valid_booking_payload();
    payload.checkin = Some("2025-06-05T10:00:00Z".to_string());
    payload.checkout = Some("2025-06-01T14:00:00Z".to_string());

    let errors = payload.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| e.message.contains("Check-out date must be after check-in date")));
}

#[test]
fn booking_rejects_checkout_equal_to_checkin() {
    let mut payload = valid_booking_payload();
    payload.checkin = Some("2025-06-01T14:00:00Z".to_string());
    payload.checkout = Some("2025-06-01T14:00:00Z".to_string());

    assert!(payload.validate().is_err());
}

#[test]
fn booking_update_validates_type_and_price() {
    let update = BookingUpdate {
        booking_type: Some("Cruise".to_string()),
        checkin: None,
        checkout: None,
        price: Some(-1.0),
    };
    assert_eq!(update.validate().len(), 2);

    let ok = BookingUpdate {
        booking_type: Some("Flight".to_string()),
        checkin: None,
        checkout: None,
        price: Some(0.0),
    };
    assert!(ok.validate().is_empty());
}

fn itinerary_with(days: Vec<Day>, outfits: Vec<OutfitEntry>) -> Itinerary {
    Itinerary {
        id: None,
        trip_id: ObjectId::new(),
        days,
        outfits,
    }
}

fn day(number: i32) -> Day {
    Day {
        day_number: number,
        timeslots: vec![Timeslot {
            time: "09:30 AM".to_string(),
            location: None,
            activity: Some("Breakfast".to_string()),
        }],
    }
}

#[test]
fn itinerary_accepts_consistent_days_and_outfits() {
    let itinerary = itinerary_with(
        vec![day(1), day(2)],
        vec![OutfitEntry {
            day_number: 2,
            outfit: Some("Hiking gear".to_string()),
            image: Some("https://example.com/outfit.jpg".to_string()),
        }],
    );
    assert!(itinerary.validate().is_empty());
}

#[test]
fn itinerary_rejects_duplicate_day_numbers() {
    let itinerary = itinerary_with(vec![day(1), day(1)], vec![]);
    let errors = itinerary.validate();
    assert!(errors
        .iter()
        .any(|e| e.message.contains("Duplicate day numbers")));
}

#[test]
fn itinerary_rejects_outfit_for_missing_day() {
    let itinerary = itinerary_with(
        vec![day(1)],
        vec![OutfitEntry {
            day_number: 3,
            outfit: None,
            image: None,
        }],
    );
    let errors = itinerary.validate();
    assert!(errors
        .iter()
        .any(|e| e.message.contains("Outfit day numbers must match")));
}

#[test]
fn itinerary_requires_exactly_one_of_location_or_activity() {
    let neither = itinerary_with(
        vec![Day {
            day_number: 1,
            timeslots: vec![Timeslot {
                time: "10:00 AM".to_string(),
                location: None,
                activity: None,
            }],
        }],
        vec![],
    );
    assert!(!neither.validate().is_empty());

    let both = itinerary_with(
        vec![Day {
            day_number: 1,
            timeslots: vec![Timeslot {
                time: "10:00 AM".to_string(),
                location: Some(ObjectId::new()),
                activity: Some("Tour".to_string()),
            }],
        }],
        vec![],
    );
    assert!(!both.validate().is_empty());
}

#[test]
fn itinerary_validates_timeslot_time_format() {
    for time in ["9:30 AM", "12:15 pm", "23:59 PM", "08:00AM"] {
        let itinerary = itinerary_with(
            vec![Day {
                day_number: 1,
                timeslots: vec![Timeslot {
                    time: time.to_string(),
                    location: None,
                    activity: Some("Walk".to_string()),
                }],
            }],
            vec![],
        );
        assert!(itinerary.validate().is_empty(), "expected {} to pass", time);
    }

    for time in ["25:00 AM", "10:65 PM", "morning", "10-30 AM"] {
        let itinerary = itinerary_with(
            vec![Day {
                day_number: 1,
                timeslots: vec![Timeslot {
                    time: time.to_string(),
                    location: None,
                    activity: Some("Walk".to_string()),
                }],
            }],
            vec![],
        );
        assert!(!itinerary.validate().is_empty(), "expected {} to fail", time);
    }
}

fn valid_user() -> User {
    User {
        id: None,
        name: "Amara Silva".to_string(),
        phone: "0712345678".to_string(),
        profile_picture: None,
        country: "Sri Lanka".to_string(),
        gender: Some("Female".to_string()),
        username: "amara".to_string(),
        email: "amara@example.com".to_string(),
        password: "Secret1pass".to_string(),
        preferences: Some("adventure".to_string()),
        role: UserRole::User,
        trips: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn user_accepts_valid_fields() {
    assert!(valid_user().validate().is_empty());
}

#[test]
fn user_rejects_bad_phone_email_and_password() {
    let mut user = valid_user();
    user.phone = "712345678".to_string(); // no leading zero
    user.email = "not-an-email".to_string();
    user.password = "short".to_string();

    let errors = user.validate();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"phone"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[test]
fn user_rejects_unknown_country_and_preference() {
    let mut user = valid_user();
    user.country = "Atlantis".to_string();
    user.preferences = Some("skydiving".to_string());

    let errors = user.validate();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"country"));
    assert!(fields.contains(&"preferences"));
}

#[test]
fn password_hash_round_trip_never_exposes_plaintext() {
    let mut user = valid_user();
    user.hash_password().expect("hashing should succeed");

    assert_ne!(user.password, "Secret1pass");
    assert!(user.verify_password("Secret1pass"));
    assert!(!user.verify_password("WrongPass1"));
}

#[test]
fn public_user_view_has_no_password_field() {
    let mut user = valid_user();
    user.hash_password().expect("hashing should succeed");

    let public = UserPublic::from(user);
    let body = serde_json::to_value(&public).expect("serializes");
    assert!(body.get("password").is_none());
    assert_eq!(body["email"], "amara@example.com");
}

fn trip(start: (i32, u32, u32), end: (i32, u32, u32)) -> Trip {
    Trip {
        id: Some(ObjectId::new()),
        trip_name: "Down south".to_string(),
        destination: "Galle".to_string(),
        collaboration: false,
        start_date: Utc
            .with_ymd_and_hms(start.0, start.1, start.2, 8, 0, 0)
            .unwrap(),
        end_date: Utc
            .with_ymd_and_hms(end.0, end.1, end.2, 20, 0, 0)
            .unwrap(),
        participants: Vec::new(),
        preferences: Default::default(),
        user_id: ObjectId::new(),
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn trip_rejects_unknown_destination() {
    let mut bad = trip((2025, 6, 1), (2025, 6, 5));
    bad.destination = "Narnia".to_string();
    assert!(!bad.validate().is_empty());

    let good = trip((2025, 6, 1), (2025, 6, 5));
    assert!(good.validate().is_empty());
}

#[test]
fn trips_are_categorized_against_a_fixed_now() {
    let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

    let past = trip((2025, 5, 1), (2025, 5, 10));
    let current = trip((2025, 6, 10), (2025, 6, 20));
    let upcoming = trip((2025, 7, 1), (2025, 7, 5));

    let categorized = categorize_trips(vec![past, current, upcoming], now);

    assert_eq!(categorized.past.len(), 1);
    assert_eq!(categorized.current.len(), 1);
    assert_eq!(categorized.upcoming.len(), 1);
    assert_eq!(categorized.past[0].start_date.date_naive().to_string(), "2025-05-01");
    assert_eq!(categorized.upcoming[0].start_date.date_naive().to_string(), "2025-07-01");
}

#[test]
fn trip_starting_now_counts_as_current() {
    let now = Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap();
    let starting = trip((2025, 6, 10), (2025, 6, 12));

    let categorized = categorize_trips(vec![starting], now);
    assert_eq!(categorized.current.len(), 1);
}

#[test]
fn location_validates_type_and_rating() {
    let location = Location {
        id: None,
        name: "Galle Fort".to_string(),
        address: "Church Street, Galle".to_string(),
        location_type: "Attraction".to_string(),
        rating: Some(4.5),
        description: None,
        image: None,
        trip_id: ObjectId::new(),
    };
    assert!(location.validate().is_empty());

    let mut bad = Location {
        rating: Some(7.0),
        location_type: "Spaceport".to_string(),
        ..location
    };
    bad.name = String::new();
    let errors = bad.validate();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"type"));
    assert!(fields.contains(&"rating"));
}

#[test]
fn new_checklist_items_get_distinct_ids() {
    let first = NewChecklistItem {
        name: "Passport".to_string(),
        is_checked: false,
    }
    .into_item();
    let second = NewChecklistItem {
        name: "Sunscreen".to_string(),
        is_checked: true,
    }
    .into_item();

    assert_ne!(first.id, second.id);
    assert!(!first.is_checked);
    assert!(second.is_checked);
}
