//! Shared setup for integration tests: an app wired to an in-memory SQLite
//! database with migrations applied.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;

use wasteflow_api::events::{process_events, EventSender};
use wasteflow_api::handlers::AppServices;
use wasteflow_api::migrator::Migrator;
use wasteflow_api::models::catalog::RequestType;
use wasteflow_api::models::request::RequestItemDetail;
use wasteflow_api::services::inventory::UpsertInventoryLevel;
use wasteflow_api::services::requests::NewContainerRequest;

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
}

pub async fn spawn_app() -> TestApp {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    // A single connection so every query sees the same in-memory database.
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("failed to connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("failed to run migrations");

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));

    let db = Arc::new(db);
    let services = AppServices::new(db.clone(), EventSender::new(tx));
    TestApp { db, services }
}

pub fn item(fraction_id: &str, capacity: i32, request_type: RequestType) -> RequestItemDetail {
    RequestItemDetail {
        fraction_id: fraction_id.to_string(),
        capacity,
        request_type,
    }
}

pub fn new_request(
    establishment: &str,
    items: Vec<RequestItemDetail>,
    requested_at: DateTime<Utc>,
) -> NewContainerRequest {
    NewContainerRequest {
        establishment: establishment.to_string(),
        items,
        requested_at: Some(requested_at),
        observations: None,
    }
}

pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, day, hour, 0, 0).unwrap()
}

pub async fn seed_level(app: &TestApp, fraction_id: &str, capacity: i32, quantity: i32) {
    app.services
        .inventory
        .set_level(UpsertInventoryLevel {
            fraction_id: fraction_id.to_string(),
            capacity,
            quantity,
        })
        .await
        .expect("failed to seed inventory level");
}
