//! # Response Mapping
//!
//! Turns the analysis service's JSON answer into display-ready [`NutritionRecord`]s.
//!
//! ## Expected Shape
//!
//! ```json
//! {
//!   "success": true,
//!   "data": { "volumes": [ { "object_name": "egg", "volume_cups": 0.41, "uncertainty_cups": 0.05 } ] },
//!   "macronutrients": { "data": [ {
//!       "requested_food": "egg",
//!       "found": true,
//!       "macros": { "calories": 596.66, "protein": 46.68, "fat": 42.68, "carbs": 2.28 },
//!       "calculated_weight": 100
//!   } ] }
//! }
//! ```
//!
//! ## Join Rules
//!
//! - One record per `macronutrients.data` entry, in received order.
//! - The volume is the first `data.volumes` entry whose `object_name` equals the
//!   entry's `requested_food`; without a match the volume stays empty (zero).
//! - Volume entries nobody asked for are dropped.
//! - `success` is informational; the body is mapped either way.
//!
//! Mapping is all-or-nothing: a missing or non-numeric required field fails the
//! whole body with `MalformedResponse`. Entries reporting `"found": false` may omit
//! `macros` and `calculated_weight`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ScanError, ScanResult};

/// Unit of [`VolumeEstimate`] values.
pub const VOLUME_UNIT: &str = "cups";
/// Unit of the calculated weight and macronutrient masses.
pub const WEIGHT_UNIT: &str = "g";

#[derive(Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    success: Option<bool>,
    data: VolumeSection,
    macronutrients: MacroSection,
}

#[derive(Deserialize)]
struct VolumeSection {
    volumes: Vec<VolumeEntry>,
}

#[derive(Deserialize)]
struct VolumeEntry {
    object_name: String,
    volume_cups: f64,
    #[serde(default)]
    uncertainty_cups: Option<f64>,
}

#[derive(Deserialize)]
struct MacroSection {
    data: Vec<MacroEntry>,
}

#[derive(Deserialize)]
struct MacroEntry {
    requested_food: String,
    #[serde(default = "found_by_default")]
    found: bool,
    #[serde(default)]
    macros: Option<Macros>,
    #[serde(default)]
    calculated_weight: Option<f64>,
}

fn found_by_default() -> bool {
    true
}

#[derive(Deserialize, Default, Clone, Copy)]
struct Macros {
    calories: f64,
    protein: f64,
    fat: f64,
    carbs: f64,
}

/// Estimated food volume as reported by the service.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VolumeEstimate {
    pub cups: f64,
    pub uncertainty_cups: f64,
}

/// Normalised nutrition facts for one food.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NutritionRecord {
    pub food_name: String,
    /// Whether the service found the food in its nutrition database
    pub found: bool,
    /// `None` when no volume entry matched this food
    pub volume: Option<VolumeEstimate>,
    pub calculated_weight: f64,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl NutritionRecord {
    /// Estimated volume in [`VOLUME_UNIT`], 0 when unknown.
    pub fn volume_cups(&self) -> f64 {
        self.volume.map(|v| v.cups).unwrap_or_default()
    }
}

impl fmt::Display for NutritionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.found {
            return write!(f, "{}: not found in nutrition database", self.food_name);
        }
        write!(
            f,
            "{}: {:.2} {}, {:.0} {}, {:.2} kcal (protein {:.2} {w}, fat {:.2} {w}, carbs {:.2} {w})",
            self.food_name,
            self.volume_cups(),
            VOLUME_UNIT,
            self.calculated_weight,
            WEIGHT_UNIT,
            self.calories,
            self.protein,
            self.fat,
            self.carbs,
            w = WEIGHT_UNIT,
        )
    }
}

/// Totals across all records of one capture.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NutritionSummary {
    pub items: usize,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl NutritionSummary {
    pub fn from_records(records: &[NutritionRecord]) -> Self {
        records.iter().fold(Self::default(), |acc, r| Self {
            items: acc.items + 1,
            calories: acc.calories + r.calories,
            protein: acc.protein + r.protein,
            fat: acc.fat + r.fat,
            carbs: acc.carbs + r.carbs,
        })
    }
}

/// Map a success body into records, all or nothing.
pub fn map(body: &str) -> ScanResult<Vec<NutritionRecord>> {
    let response: ServiceResponse = serde_json::from_str(body)?;
    if response.success == Some(false) {
        debug!("service reported success=false, mapping body anyway");
    }

    let volumes = response.data.volumes;
    response
        .macronutrients
        .data
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let volume = volumes
                .iter()
                .find(|v| v.object_name == entry.requested_food)
                .map(|v| VolumeEstimate {
                    cups: v.volume_cups,
                    uncertainty_cups: v.uncertainty_cups.unwrap_or_default(),
                });

            let (macros, calculated_weight) = if entry.found {
                let macros = entry.macros.ok_or_else(|| {
                    ScanError::malformed_response(format!(
                        "macronutrients.data[{}] ({}) has no macros",
                        index, entry.requested_food
                    ))
                })?;
                let weight = entry.calculated_weight.ok_or_else(|| {
                    ScanError::malformed_response(format!(
                        "macronutrients.data[{}] ({}) has no calculated_weight",
                        index, entry.requested_food
                    ))
                })?;
                (macros, weight)
            } else {
                (entry.macros.unwrap_or_default(), entry.calculated_weight.unwrap_or_default())
            };

            Ok(NutritionRecord {
                food_name: entry.requested_food,
                found: entry.found,
                volume,
                calculated_weight,
                calories: macros.calories,
                protein: macros.protein,
                fat: macros.fat,
                carbs: macros.carbs,
            })
        })
        .collect()
}
