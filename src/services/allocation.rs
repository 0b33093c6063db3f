//! Allocation Engine
//!
//! Pure status recalculation: given every request and an inventory snapshot,
//! derive the fulfillment status of each non-delivered request. No I/O, no
//! mutation of inputs; callers persist whatever changed.

use std::collections::HashMap;

use crate::models::catalog::{Fraction, RequestStatus, RequestType};
use crate::models::inventory::InventoryLevel;
use crate::models::request::{ContainerRequest, RequestItemDetail};

/// Separator between per-item lines in a SIN_STOCK detail message.
const DETAIL_SEPARATOR: &str = " | ";

/// Recalculates the status of every non-delivered request against the given
/// inventory snapshot.
///
/// Pending requests are processed oldest-first; a satisfiable request
/// reserves its stock in a scratch copy so that lower-priority requests see
/// the reduced availability. Allocation is all-or-nothing: a request short on
/// any one item reserves nothing. Delivered requests pass through untouched,
/// ahead of the recalculated pending ones.
pub fn recalculate_statuses(
    requests: &[ContainerRequest],
    inventory: &[InventoryLevel],
) -> Vec<ContainerRequest> {
    let mut working: HashMap<(String, i32), i64> = HashMap::new();
    for level in inventory {
        working.insert(
            (level.fraction_id.clone(), level.capacity),
            i64::from(level.quantity),
        );
    }

    let (delivered, mut pending): (Vec<ContainerRequest>, Vec<ContainerRequest>) = requests
        .iter()
        .cloned()
        .partition(|request| request.status == RequestStatus::Realizado);

    // Stable sort: requests with equal dates keep their input order.
    pending.sort_by_key(|request| request.requested_at);

    let mut result = delivered;
    result.reserve(pending.len());

    for mut request in pending {
        let demand = aggregate_additions(&request.items);

        if demand.is_empty() {
            // Nothing to take from stock; returns alone are always satisfiable.
            request.status = RequestStatus::EnPreparacion;
            request.status_detail = None;
        } else if demand
            .iter()
            .all(|(key, count)| working.get(key).copied().unwrap_or(0) >= *count)
        {
            for (key, count) in &demand {
                *working.entry(key.clone()).or_insert(0) -= count;
            }
            request.status = RequestStatus::EnPreparacion;
            request.status_detail = None;
        } else {
            let lines: Vec<String> = demand
                .iter()
                .map(|((fraction_id, capacity), requested)| {
                    let available = working
                        .get(&(fraction_id.clone(), *capacity))
                        .copied()
                        .unwrap_or(0);
                    let name = Fraction::name_or_raw(fraction_id);
                    if available < *requested {
                        format!(
                            "No hay stock: {} {}L (sol: {}, disp: {})",
                            name, capacity, requested, available
                        )
                    } else {
                        format!(
                            "Disponible: {} {}L (sol: {}, disp: {})",
                            name, capacity, requested, available
                        )
                    }
                })
                .collect();
            request.status = RequestStatus::SinStock;
            request.status_detail = Some(lines.join(DETAIL_SEPARATOR));
        }

        result.push(request);
    }

    result
}

/// Aggregates the ADD lines of a request by (fraction, capacity), counting
/// repeats, in first-occurrence order. REMOVE lines never gate availability.
fn aggregate_additions(items: &[RequestItemDetail]) -> Vec<((String, i32), i64)> {
    let mut aggregated: Vec<((String, i32), i64)> = Vec::new();
    for item in items {
        match item.request_type {
            RequestType::Add => {
                let key = (item.fraction_id.clone(), item.capacity);
                match aggregated.iter_mut().find(|(existing, _)| *existing == key) {
                    Some((_, count)) => *count += 1,
                    None => aggregated.push((key, 1)),
                }
            }
            RequestType::Remove => {}
        }
    }
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(fraction_id: &str, capacity: i32, request_type: RequestType) -> RequestItemDetail {
        RequestItemDetail {
            fraction_id: fraction_id.into(),
            capacity,
            request_type,
        }
    }

    #[test]
    fn additions_aggregate_in_first_occurrence_order() {
        let items = vec![
            item("VIDRIO", 240, RequestType::Add),
            item("RESTA", 120, RequestType::Add),
            item("VIDRIO", 240, RequestType::Add),
            item("RESTA", 120, RequestType::Remove),
        ];
        let demand = aggregate_additions(&items);
        assert_eq!(
            demand,
            vec![
                (("VIDRIO".to_string(), 240), 2),
                (("RESTA".to_string(), 120), 1),
            ]
        );
    }

    #[test]
    fn removals_never_produce_demand() {
        let items = vec![
            item("ORGANICA", 240, RequestType::Remove),
            item("ORGANICA", 240, RequestType::Remove),
        ];
        assert!(aggregate_additions(&items).is_empty());
    }
}
