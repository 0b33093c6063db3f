//! Wasteflow API Library
//!
//! Backend for waste-container swap requests and container inventory across
//! municipal establishments. Request fulfillment statuses are derived by a
//! pure allocation engine after every mutation; inventory is only ever
//! mutated by direct edits or the transactional delivery reconciler.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
            errors: None,
        }
    }
}

/// Build the `/api/v1` route tree.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/requests", handlers::requests::router())
        .nest("/inventory", handlers::inventory::router())
        .nest("/establishments", handlers::establishments::router())
        .route("/health", get(handlers::health::health_check))
}
