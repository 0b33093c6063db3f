//! Waste-fraction reference data and request lifecycle enums.
//!
//! The fraction catalog is immutable reference data: each fraction has a
//! display name and a fixed set of permitted container capacities in liters.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Container capacities (liters) that exist in the fleet at all.
pub const CAPACITIES: [i32; 4] = [40, 120, 240, 1100];

/// A waste category. Stored and transported as its SCREAMING_SNAKE id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Fraction {
    Resta,
    Envases,
    PapelCarton,
    Organica,
    Vidrio,
}

impl Fraction {
    /// Human-readable name used in status detail messages and summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            Fraction::Resta => "Resta",
            Fraction::Envases => "Envases",
            Fraction::PapelCarton => "Papel y Cartón",
            Fraction::Organica => "Orgánica",
            Fraction::Vidrio => "Vidrio",
        }
    }

    /// Capacities (liters) permitted for this fraction.
    pub fn capacities(&self) -> &'static [i32] {
        match self {
            Fraction::Resta | Fraction::Envases | Fraction::PapelCarton => &[40, 120, 240, 1100],
            Fraction::Organica | Fraction::Vidrio => &[40, 120, 240],
        }
    }

    pub fn allows_capacity(&self, capacity: i32) -> bool {
        self.capacities().contains(&capacity)
    }

    /// Display name for a raw fraction id; ids missing from the catalog
    /// degrade to the raw string rather than erroring.
    pub fn name_or_raw(fraction_id: &str) -> String {
        fraction_id
            .parse::<Fraction>()
            .map(|f| f.display_name().to_string())
            .unwrap_or_else(|_| fraction_id.to_string())
    }
}

/// Request lifecycle state.
///
/// `EnPreparacion` and `SinStock` are derived by recalculation; `Realizado`
/// is terminal and only ever set by the delivery reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    EnPreparacion,
    SinStock,
    Realizado,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::EnPreparacion => "EN_PREPARACION",
            RequestStatus::SinStock => "SIN_STOCK",
            RequestStatus::Realizado => "REALIZADO",
        }
    }
}

/// Direction of one request line: `Add` consumes inventory (a container is
/// delivered to the establishment), `Remove` replenishes it (a container
/// comes back). Every consumption site matches exhaustively on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestType {
    Add,
    Remove,
}
