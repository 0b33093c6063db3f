//! Property-based tests for the allocation engine.
//!
//! These use proptest to verify the engine's invariants across randomized
//! request/inventory snapshots: conservation for returns, all-or-nothing
//! allocation, determinism, and delivered-request passthrough.

use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use wasteflow_api::models::catalog::{RequestStatus, RequestType};
use wasteflow_api::models::inventory::InventoryLevel;
use wasteflow_api::models::request::{ContainerRequest, RequestItemDetail};
use wasteflow_api::services::allocation::recalculate_statuses;

fn fraction_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("RESTA".to_string()),
        Just("ENVASES".to_string()),
        Just("PAPEL_CARTON".to_string()),
        Just("ORGANICA".to_string()),
        Just("VIDRIO".to_string()),
    ]
}

fn capacity_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![Just(40), Just(120), Just(240), Just(1100)]
}

fn request_type_strategy() -> impl Strategy<Value = RequestType> + Clone {
    prop_oneof![Just(RequestType::Add), Just(RequestType::Remove)]
}

fn item_strategy(
    types: impl Strategy<Value = RequestType> + 'static,
) -> impl Strategy<Value = RequestItemDetail> {
    (fraction_strategy(), capacity_strategy(), types).prop_map(
        |(fraction_id, capacity, request_type)| RequestItemDetail {
            fraction_id,
            capacity,
            request_type,
        },
    )
}

fn status_strategy() -> impl Strategy<Value = RequestStatus> {
    prop_oneof![
        3 => Just(RequestStatus::EnPreparacion),
        2 => Just(RequestStatus::SinStock),
        1 => Just(RequestStatus::Realizado),
    ]
}

fn requests_strategy(
    types: impl Strategy<Value = RequestType> + Clone + 'static,
) -> impl Strategy<Value = Vec<ContainerRequest>> {
    prop::collection::vec(
        (
            prop::collection::vec(item_strategy(types.clone()), 0..5),
            0i64..10_000,
            status_strategy(),
        ),
        0..8,
    )
    .prop_map(|specs| {
        let base = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (items, offset_secs, status))| ContainerRequest {
                id: Uuid::from_u128(index as u128 + 1),
                establishment: format!("Establecimiento {}", index),
                items,
                status,
                status_detail: None,
                requested_at: base + Duration::seconds(offset_secs),
                observations: None,
            })
            .collect()
    })
}

fn inventory_strategy() -> impl Strategy<Value = Vec<InventoryLevel>> {
    prop::collection::vec(
        (fraction_strategy(), capacity_strategy(), 0i32..10),
        0..8,
    )
    .prop_map(|levels| {
        levels
            .into_iter()
            .map(|(fraction_id, capacity, quantity)| InventoryLevel {
                fraction_id,
                capacity,
                quantity,
                last_updated: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            })
            .collect()
    })
}

/// The engine builds its working map with last-one-wins semantics for
/// duplicate (fraction, capacity) rows; mirror that here.
fn stock_map(inventory: &[InventoryLevel]) -> HashMap<(String, i32), i64> {
    let mut map = HashMap::new();
    for level in inventory {
        map.insert(
            (level.fraction_id.clone(), level.capacity),
            i64::from(level.quantity),
        );
    }
    map
}

proptest! {
    #[test]
    fn remove_only_requests_always_end_in_preparation(
        requests in requests_strategy(Just(RequestType::Remove)),
        inventory in inventory_strategy(),
    ) {
        let result = recalculate_statuses(&requests, &inventory);
        for request in result {
            if request.status != RequestStatus::Realizado {
                prop_assert_eq!(request.status, RequestStatus::EnPreparacion);
                prop_assert_eq!(request.status_detail, None);
            }
        }
    }

    #[test]
    fn satisfied_demand_never_exceeds_stock(
        requests in requests_strategy(request_type_strategy()),
        inventory in inventory_strategy(),
    ) {
        let result = recalculate_statuses(&requests, &inventory);
        let stock = stock_map(&inventory);

        let mut committed: HashMap<(String, i32), i64> = HashMap::new();
        for request in &result {
            if request.status != RequestStatus::EnPreparacion {
                continue;
            }
            // Only requests that were pending going in took from working stock.
            let was_delivered = requests
                .iter()
                .find(|r| r.id == request.id)
                .map(|r| r.status == RequestStatus::Realizado)
                .unwrap_or(false);
            if was_delivered {
                continue;
            }
            for item in &request.items {
                if item.request_type == RequestType::Add {
                    *committed
                        .entry((item.fraction_id.clone(), item.capacity))
                        .or_insert(0) += 1;
                }
            }
        }

        for (key, demand) in committed {
            let available = stock.get(&key).copied().unwrap_or(0);
            prop_assert!(
                demand <= available,
                "over-committed {:?}: demand {} > stock {}",
                key,
                demand,
                available
            );
        }
    }

    #[test]
    fn recalculation_is_deterministic(
        requests in requests_strategy(request_type_strategy()),
        inventory in inventory_strategy(),
    ) {
        let first = recalculate_statuses(&requests, &inventory);
        let second = recalculate_statuses(&requests, &inventory);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn result_is_a_permutation_of_the_input(
        requests in requests_strategy(request_type_strategy()),
        inventory in inventory_strategy(),
    ) {
        let result = recalculate_statuses(&requests, &inventory);
        prop_assert_eq!(result.len(), requests.len());

        let mut input_ids: Vec<Uuid> = requests.iter().map(|r| r.id).collect();
        let mut output_ids: Vec<Uuid> = result.iter().map(|r| r.id).collect();
        input_ids.sort();
        output_ids.sort();
        prop_assert_eq!(input_ids, output_ids);
    }

    #[test]
    fn delivered_requests_are_untouched(
        requests in requests_strategy(request_type_strategy()),
        inventory in inventory_strategy(),
    ) {
        let result = recalculate_statuses(&requests, &inventory);
        for original in requests.iter().filter(|r| r.status == RequestStatus::Realizado) {
            let output = result
                .iter()
                .find(|r| r.id == original.id)
                .expect("delivered request dropped");
            prop_assert_eq!(output, original);
        }
    }

    #[test]
    fn every_pending_status_is_fully_derived(
        requests in requests_strategy(request_type_strategy()),
        inventory in inventory_strategy(),
    ) {
        let result = recalculate_statuses(&requests, &inventory);
        for request in result.iter().filter(|r| r.status != RequestStatus::Realizado) {
            match request.status {
                RequestStatus::EnPreparacion => prop_assert_eq!(request.status_detail.as_deref(), None),
                RequestStatus::SinStock => {
                    let detail = request.status_detail.as_deref().unwrap_or("");
                    prop_assert!(!detail.is_empty(), "SIN_STOCK without detail");
                    prop_assert!(detail.contains("No hay stock:"), "detail lacks blocker line: {}", detail);
                }
                RequestStatus::Realizado => unreachable!("filtered above"),
            }
        }
    }
}
