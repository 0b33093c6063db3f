//! Scenario tests for the allocation engine: pure recalculation against an
//! in-memory snapshot, no database involved.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use wasteflow_api::models::catalog::{RequestStatus, RequestType};
use wasteflow_api::models::inventory::InventoryLevel;
use wasteflow_api::models::request::{ContainerRequest, RequestItemDetail};
use wasteflow_api::services::allocation::recalculate_statuses;

fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, day, hour, 0, 0).unwrap()
}

fn item(fraction_id: &str, capacity: i32, request_type: RequestType) -> RequestItemDetail {
    RequestItemDetail {
        fraction_id: fraction_id.to_string(),
        capacity,
        request_type,
    }
}

fn request(
    seq: u128,
    requested_at: DateTime<Utc>,
    status: RequestStatus,
    items: Vec<RequestItemDetail>,
) -> ContainerRequest {
    ContainerRequest {
        id: Uuid::from_u128(seq),
        establishment: format!("Establecimiento {}", seq),
        items,
        status,
        status_detail: None,
        requested_at,
        observations: None,
    }
}

fn level(fraction_id: &str, capacity: i32, quantity: i32) -> InventoryLevel {
    InventoryLevel {
        fraction_id: fraction_id.to_string(),
        capacity,
        quantity,
        last_updated: ts(1, 0),
    }
}

fn find(result: &[ContainerRequest], seq: u128) -> &ContainerRequest {
    result
        .iter()
        .find(|r| r.id == Uuid::from_u128(seq))
        .expect("request missing from result")
}

#[test]
fn earlier_request_claims_scarce_stock() {
    let inventory = vec![level("PAPEL_CARTON", 240, 1)];
    let requests = vec![
        request(
            2,
            ts(23, 9),
            RequestStatus::EnPreparacion,
            vec![item("PAPEL_CARTON", 240, RequestType::Add)],
        ),
        request(
            1,
            ts(22, 9),
            RequestStatus::EnPreparacion,
            vec![item("PAPEL_CARTON", 240, RequestType::Add)],
        ),
    ];

    let result = recalculate_statuses(&requests, &inventory);

    let first = find(&result, 1);
    assert_eq!(first.status, RequestStatus::EnPreparacion);
    assert_eq!(first.status_detail, None);

    let second = find(&result, 2);
    assert_eq!(second.status, RequestStatus::SinStock);
    assert_eq!(
        second.status_detail.as_deref(),
        Some("No hay stock: Papel y Cartón 240L (sol: 1, disp: 0)")
    );
}

#[test]
fn remove_only_requests_are_always_satisfiable() {
    let requests = vec![request(
        1,
        ts(22, 9),
        RequestStatus::SinStock,
        vec![
            item("VIDRIO", 40, RequestType::Remove),
            item("VIDRIO", 40, RequestType::Remove),
        ],
    )];

    // No inventory at all: returns still go through.
    let result = recalculate_statuses(&requests, &[]);
    assert_eq!(result[0].status, RequestStatus::EnPreparacion);
    assert_eq!(result[0].status_detail, None);
}

#[test]
fn request_without_items_is_in_preparation() {
    let requests = vec![request(1, ts(22, 9), RequestStatus::SinStock, vec![])];
    let result = recalculate_statuses(&requests, &[]);
    assert_eq!(result[0].status, RequestStatus::EnPreparacion);
}

#[test]
fn allocation_is_all_or_nothing() {
    let inventory = vec![level("ENVASES", 120, 5), level("RESTA", 1100, 0)];
    let requests = vec![
        request(
            1,
            ts(22, 9),
            RequestStatus::EnPreparacion,
            vec![
                item("ENVASES", 120, RequestType::Add),
                item("RESTA", 1100, RequestType::Add),
            ],
        ),
        request(
            2,
            ts(23, 16),
            RequestStatus::EnPreparacion,
            vec![item("ENVASES", 120, RequestType::Add)],
        ),
    ];

    let result = recalculate_statuses(&requests, &inventory);

    // The mixed request fails on the scarce item and reserves nothing, so the
    // later request still sees all 5 containers.
    let blocked = find(&result, 1);
    assert_eq!(blocked.status, RequestStatus::SinStock);
    assert_eq!(
        blocked.status_detail.as_deref(),
        Some("Disponible: Envases 120L (sol: 1, disp: 5) | No hay stock: Resta 1100L (sol: 1, disp: 0)")
    );

    let unblocked = find(&result, 2);
    assert_eq!(unblocked.status, RequestStatus::EnPreparacion);
}

#[test]
fn successful_allocation_reserves_stock_for_later_requests() {
    let inventory = vec![level("ORGANICA", 240, 2)];
    let requests = vec![
        request(
            1,
            ts(20, 9),
            RequestStatus::EnPreparacion,
            vec![item("ORGANICA", 240, RequestType::Add)],
        ),
        request(
            2,
            ts(21, 9),
            RequestStatus::EnPreparacion,
            vec![item("ORGANICA", 240, RequestType::Add)],
        ),
        request(
            3,
            ts(22, 9),
            RequestStatus::EnPreparacion,
            vec![item("ORGANICA", 240, RequestType::Add)],
        ),
    ];

    let result = recalculate_statuses(&requests, &inventory);

    assert_eq!(find(&result, 1).status, RequestStatus::EnPreparacion);
    assert_eq!(find(&result, 2).status, RequestStatus::EnPreparacion);
    let starved = find(&result, 3);
    assert_eq!(starved.status, RequestStatus::SinStock);
    assert_eq!(
        starved.status_detail.as_deref(),
        Some("No hay stock: Orgánica 240L (sol: 1, disp: 0)")
    );
}

#[test]
fn duplicate_add_lines_aggregate_as_multi_unit_demand() {
    let inventory = vec![level("VIDRIO", 240, 1)];
    let requests = vec![request(
        1,
        ts(22, 9),
        RequestStatus::EnPreparacion,
        vec![
            item("VIDRIO", 240, RequestType::Add),
            item("VIDRIO", 240, RequestType::Add),
        ],
    )];

    let result = recalculate_statuses(&requests, &inventory);
    assert_eq!(result[0].status, RequestStatus::SinStock);
    assert_eq!(
        result[0].status_detail.as_deref(),
        Some("No hay stock: Vidrio 240L (sol: 2, disp: 1)")
    );
}

#[test]
fn equal_dates_keep_input_order() {
    let inventory = vec![level("RESTA", 120, 1)];
    let requests = vec![
        request(
            7,
            ts(22, 9),
            RequestStatus::EnPreparacion,
            vec![item("RESTA", 120, RequestType::Add)],
        ),
        request(
            8,
            ts(22, 9),
            RequestStatus::EnPreparacion,
            vec![item("RESTA", 120, RequestType::Add)],
        ),
    ];

    let result = recalculate_statuses(&requests, &inventory);
    assert_eq!(find(&result, 7).status, RequestStatus::EnPreparacion);
    assert_eq!(find(&result, 8).status, RequestStatus::SinStock);
}

#[test]
fn delivered_requests_pass_through_untouched_and_first() {
    let inventory = vec![level("PAPEL_CARTON", 240, 1)];
    let delivered = request(
        1,
        ts(19, 14),
        RequestStatus::Realizado,
        vec![item("PAPEL_CARTON", 240, RequestType::Add)],
    );
    let pending = request(
        2,
        ts(25, 15),
        RequestStatus::EnPreparacion,
        vec![item("PAPEL_CARTON", 240, RequestType::Add)],
    );

    let result = recalculate_statuses(&[pending, delivered.clone()], &inventory);

    // Delivered requests lead the result and are byte-identical to the input;
    // their items no longer consume working stock.
    assert_eq!(result[0], delivered);
    assert_eq!(find(&result, 2).status, RequestStatus::EnPreparacion);
}

#[test]
fn unknown_fraction_falls_back_to_raw_id() {
    let requests = vec![request(
        1,
        ts(22, 9),
        RequestStatus::EnPreparacion,
        vec![item("CHATARRA", 240, RequestType::Add)],
    )];

    let result = recalculate_statuses(&requests, &[]);
    assert_eq!(result[0].status, RequestStatus::SinStock);
    assert_eq!(
        result[0].status_detail.as_deref(),
        Some("No hay stock: CHATARRA 240L (sol: 1, disp: 0)")
    );
}

#[test]
fn inputs_are_not_mutated() {
    let inventory = vec![level("ENVASES", 120, 1)];
    let requests = vec![
        request(
            1,
            ts(22, 9),
            RequestStatus::SinStock,
            vec![item("ENVASES", 120, RequestType::Add)],
        ),
        request(
            2,
            ts(23, 9),
            RequestStatus::EnPreparacion,
            vec![item("ENVASES", 120, RequestType::Add)],
        ),
    ];
    let requests_before = requests.clone();
    let inventory_before = inventory.clone();

    let _ = recalculate_statuses(&requests, &inventory);

    assert_eq!(requests, requests_before);
    assert_eq!(inventory, inventory_before);
}

#[test]
fn recalculation_clears_stale_detail_when_stock_returns() {
    let inventory = vec![level("VIDRIO", 240, 1)];
    let mut stale = request(
        4,
        ts(25, 15),
        RequestStatus::SinStock,
        vec![item("VIDRIO", 240, RequestType::Add)],
    );
    stale.status_detail = Some("No hay stock: Vidrio 240L (sol: 1, disp: 0)".to_string());

    let result = recalculate_statuses(&[stale], &inventory);
    assert_eq!(result[0].status, RequestStatus::EnPreparacion);
    assert_eq!(result[0].status_detail, None);
}
