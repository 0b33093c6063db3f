pub mod establishments;
pub mod health;
pub mod inventory;
pub mod requests;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSender;
use crate::services::delivery::DeliveryService;
use crate::services::establishments::EstablishmentService;
use crate::services::inventory::InventoryService;
use crate::services::requests::RequestService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub requests: Arc<RequestService>,
    pub inventory: Arc<InventoryService>,
    pub establishments: Arc<EstablishmentService>,
    pub delivery: Arc<DeliveryService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        let requests = Arc::new(RequestService::new(db.clone(), event_sender.clone()));
        let inventory = Arc::new(InventoryService::new(db.clone(), event_sender.clone()));
        let establishments = Arc::new(EstablishmentService::new(db.clone(), event_sender.clone()));
        let delivery = Arc::new(DeliveryService::new(db, event_sender));

        Self {
            requests,
            inventory,
            establishments,
            delivery,
        }
    }
}
