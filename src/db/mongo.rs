use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;

use crate::models::user::User;

pub const DB_NAME: &str = "TripMate";

pub const USERS: &str = "Users";
pub const TRIPS: &str = "Trips";
pub const LOCATIONS: &str = "Locations";
pub const ITINERARIES: &str = "Itineraries";
pub const BOOKINGS: &str = "Bookings";
pub const CHECKLISTS: &str = "Checklists";

pub async fn create_mongo_client(uri: &String) -> Arc<Client> {
    let mut client_options = ClientOptions::parse(uri)
        .await
        .expect("MongoDB URI may be incorrect! Failed to parse.");

    // Bounded timeouts so a dead server fails fast instead of hanging requests
    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client =
        Client::with_options(client_options).expect("Failed to create MongoDB client with options");

    match client
        .database(DB_NAME)
        .run_command(doc! { "ping": 1 })
        .await
    {
        Ok(_) => log::info!("Connected to MongoDB and verified with ping command"),
        Err(e) => {
            log::warn!("Connected to MongoDB but ping test failed: {}", e);
            log::warn!("The API may still work, but some functionality might be impaired");
        }
    }

    ensure_user_indexes(&client).await;

    Arc::new(client)
}

/// Unique indexes on email and username back the duplicate checks
/// done in the signup handler.
async fn ensure_user_indexes(client: &Client) {
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection(USERS);

    for field in ["email", "username"] {
        let index = IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        if let Err(err) = collection.create_index(index).await {
            log::warn!("Failed to create unique index on {}: {:?}", field, err);
        }
    }
}
