//! Load search filtering.
//!
//! A pure, order-preserving filter over the load collection. Origin and
//! destination match case-insensitively as substrings ("Chicago" matches
//! "Chicago, IL"); equipment type must match exactly. All present criteria
//! are combined with AND logic.

use crate::types::{EquipmentType, Load};

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const MIN_MAX_RESULTS: usize = 1;
pub const MAX_MAX_RESULTS: usize = 20;

/// Search criteria, validated and clamped at construction.
///
/// Absent fields impose no constraint; `max_results` always holds a value in
/// `[1, 20]` no matter what the caller asked for.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub equipment_type: Option<EquipmentType>,
    pub max_results: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            origin: None,
            destination: None,
            equipment_type: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchCriteria {
    pub fn new(
        origin: Option<String>,
        destination: Option<String>,
        equipment_type: Option<EquipmentType>,
        max_results: Option<usize>,
    ) -> Self {
        Self {
            origin: origin.filter(|s| !s.trim().is_empty()),
            destination: destination.filter(|s| !s.trim().is_empty()),
            equipment_type,
            max_results: clamp_max_results(max_results),
        }
    }

    fn matches(&self, load: &Load) -> bool {
        if let Some(origin) = &self.origin {
            if !contains_ignore_case(&load.origin, origin) {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if !contains_ignore_case(&load.destination, destination) {
                return false;
            }
        }
        if let Some(equipment) = self.equipment_type {
            if load.equipment_type != equipment {
                return false;
            }
        }
        true
    }
}

/// Clamp a requested result limit into `[1, 20]`, defaulting to 5
pub fn clamp_max_results(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(MIN_MAX_RESULTS, MAX_MAX_RESULTS)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}

/// Filter the load collection against the criteria.
///
/// Pure function: the input collection is never mutated, results keep the
/// original relative order, and the output never exceeds
/// `criteria.max_results` entries. A criteria set matching nothing yields an
/// empty vec, never an error.
pub fn search(criteria: &SearchCriteria, loads: &[Load]) -> Vec<Load> {
    loads
        .iter()
        .filter(|load| criteria.matches(load))
        .take(criteria.max_results)
        .cloned()
        .collect()
}
