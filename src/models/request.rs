use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::container_request;
use crate::models::catalog::{RequestStatus, RequestType};

/// One line of a container request.
///
/// The fraction id stays a raw string here: rows loaded from storage may
/// reference fractions that have since left the catalog, and the engine
/// degrades to displaying the raw id instead of refusing to work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RequestItemDetail {
    pub fraction_id: String,
    pub capacity: i32,
    pub request_type: RequestType,
}

/// The aggregate request record, as the engine and services see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRequest {
    pub id: Uuid,
    pub establishment: String,
    pub items: Vec<RequestItemDetail>,
    pub status: RequestStatus,
    pub status_detail: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub observations: Option<String>,
}

impl ContainerRequest {
    pub fn from_entity(model: container_request::Model) -> Self {
        let (items, skipped) = decode_items(&model.items);
        if skipped > 0 {
            warn!(
                request_id = %model.id,
                skipped,
                "request carries malformed item entries; they are ignored"
            );
        }
        let status = model
            .status
            .parse::<RequestStatus>()
            .unwrap_or(RequestStatus::EnPreparacion);
        Self {
            id: model.id,
            establishment: model.establishment,
            items,
            status,
            status_detail: model.status_detail,
            requested_at: model.requested_at,
            observations: model.observations,
        }
    }
}

/// Decodes the stored item array leniently.
///
/// Entries missing required fields (or the wrong shape entirely) are skipped
/// rather than failing the whole request; the caller logs the skip count.
pub fn decode_items(raw: &serde_json::Value) -> (Vec<RequestItemDetail>, usize) {
    let Some(entries) = raw.as_array() else {
        return (Vec::new(), 0);
    };
    let mut items = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for entry in entries {
        match serde_json::from_value::<RequestItemDetail>(entry.clone()) {
            Ok(item) => items.push(item),
            Err(_) => skipped += 1,
        }
    }
    (items, skipped)
}

pub fn encode_items(items: &[RequestItemDetail]) -> serde_json::Value {
    serde_json::to_value(items).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_skips_malformed_entries() {
        let raw = json!([
            { "fraction_id": "VIDRIO", "capacity": 240, "request_type": "ADD" },
            { "fraction_id": "VIDRIO" },
            { "bogus": true },
            { "fraction_id": "RESTA", "capacity": 120, "request_type": "REMOVE" },
        ]);
        let (items, skipped) = decode_items(&raw);
        assert_eq!(items.len(), 2);
        assert_eq!(skipped, 2);
        assert_eq!(items[0].request_type, RequestType::Add);
        assert_eq!(items[1].request_type, RequestType::Remove);
    }

    #[test]
    fn decode_tolerates_non_array_payload() {
        let (items, skipped) = decode_items(&json!({"not": "an array"}));
        assert!(items.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn items_round_trip_through_json() {
        let items = vec![RequestItemDetail {
            fraction_id: "ORGANICA".into(),
            capacity: 240,
            request_type: RequestType::Add,
        }];
        let (decoded, skipped) = decode_items(&encode_items(&items));
        assert_eq!(decoded, items);
        assert_eq!(skipped, 0);
    }
}
