//! Result validation, deduplication, and ordering.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use rcfinder_core::{Coordinate, Provider, SortOption};
use rcfinder_geo::distance_miles;

/// A provider annotated with its distance from the search reference point.
///
/// `distance_miles` is transient: recomputed on every search, never
/// persisted. `location_unavailable` marks records whose coordinate is
/// missing or unusable — they are excluded from map/distance views but kept
/// here so a list view can show a "location unavailable" indicator.
#[derive(Debug, Clone, Serialize)]
pub struct RankedProvider {
    #[serde(flatten)]
    pub provider: Provider,
    pub distance_miles: Option<f64>,
    pub location_unavailable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedResults {
    pub providers: Vec<RankedProvider>,
    /// Upstream rows dropped because an earlier row had the same id.
    pub duplicates_dropped: usize,
}

impl RankedResults {
    /// True when at least one provider lacks a usable coordinate.
    #[must_use]
    pub fn has_partial_data(&self) -> bool {
        self.providers.iter().any(|p| p.location_unavailable)
    }
}

/// Validate, deduplicate, and sort raw provider records.
///
/// Records with a missing, non-finite, or (0, 0) coordinate are flagged
/// rather than silently dropped. Duplicate ids keep their first occurrence.
/// All sorts are stable and idempotent: re-ranking an already ranked list
/// with the same option and reference point is a no-op.
#[must_use]
pub fn rank(raw: Vec<Provider>, reference: Coordinate, sort: SortOption) -> RankedResults {
    let mut seen = HashSet::new();
    let mut duplicates_dropped = 0usize;
    let mut providers: Vec<RankedProvider> = Vec::with_capacity(raw.len());

    for provider in raw {
        if !seen.insert(provider.id.clone()) {
            duplicates_dropped += 1;
            continue;
        }
        let distance = provider
            .coordinate()
            .map(|coord| distance_miles(reference, coord));
        if distance.is_none() {
            tracing::debug!(id = %provider.id, "provider has no usable coordinate");
        }
        providers.push(RankedProvider {
            location_unavailable: distance.is_none(),
            distance_miles: distance,
            provider,
        });
    }

    match sort {
        SortOption::Distance => providers.sort_by(compare_by_distance),
        SortOption::Name => providers.sort_by(|a, b| compare_names(a, b)),
        SortOption::Type => providers.sort_by(|a, b| {
            a.provider
                .provider_type
                .cmp(&b.provider.provider_type)
                .then_with(|| compare_names(a, b))
        }),
    }

    RankedResults {
        providers,
        duplicates_dropped,
    }
}

/// Ascending by distance; providers with no usable coordinate sort last;
/// ties broken by case-insensitive name.
fn compare_by_distance(a: &RankedProvider, b: &RankedProvider) -> Ordering {
    match (a.distance_miles, b.distance_miles) {
        (Some(da), Some(db)) => da.total_cmp(&db).then_with(|| compare_names(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_names(a, b),
    }
}

fn compare_names(a: &RankedProvider, b: &RankedProvider) -> Ordering {
    a.provider
        .name
        .to_lowercase()
        .cmp(&b.provider.name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: Coordinate = Coordinate::new(34.05, -118.25);

    fn provider(id: &str, name: &str, kind: &str, coord: Option<(f64, f64)>) -> Provider {
        Provider {
            id: id.to_string(),
            name: name.to_string(),
            provider_type: kind.to_string(),
            latitude: coord.map(|c| c.0),
            longitude: coord.map(|c| c.1),
            address: None,
            phone: None,
            website: None,
            therapy_types: vec![],
            age_groups: vec![],
            diagnoses_treated: vec![],
            insurance_accepted: vec![],
        }
    }

    fn ids(results: &RankedResults) -> Vec<&str> {
        results
            .providers
            .iter()
            .map(|p| p.provider.id.as_str())
            .collect()
    }

    #[test]
    fn sorts_by_distance_ascending() {
        let raw = vec![
            provider("far", "Far Clinic", "clinic", Some((34.50, -118.25))),
            provider("near", "Near Clinic", "clinic", Some((34.06, -118.25))),
            provider("mid", "Mid Clinic", "clinic", Some((34.20, -118.25))),
        ];
        let results = rank(raw, REFERENCE, SortOption::Distance);
        assert_eq!(ids(&results), vec!["near", "mid", "far"]);
        let distances: Vec<f64> = results
            .providers
            .iter()
            .map(|p| p.distance_miles.unwrap())
            .collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn null_island_provider_is_flagged_not_dropped() {
        let raw = vec![
            provider("ok", "Valid Clinic", "clinic", Some((34.06, -118.25))),
            provider("null", "Null Island Clinic", "clinic", Some((0.0, 0.0))),
        ];
        let results = rank(raw, REFERENCE, SortOption::Distance);
        assert_eq!(results.providers.len(), 2);
        let flagged = results
            .providers
            .iter()
            .find(|p| p.provider.id == "null")
            .unwrap();
        assert!(flagged.location_unavailable);
        assert!(flagged.distance_miles.is_none());
        assert!(results.has_partial_data());
        // Excluded from the distance ordering proper: it sorts last.
        assert_eq!(ids(&results), vec!["ok", "null"]);
    }

    #[test]
    fn coordinate_less_providers_sort_last_with_name_ties() {
        let raw = vec![
            provider("b", "Beta Services", "clinic", None),
            provider("a", "Alpha Services", "clinic", None),
            provider("c", "Close Clinic", "clinic", Some((34.06, -118.25))),
        ];
        let results = rank(raw, REFERENCE, SortOption::Distance);
        assert_eq!(ids(&results), vec!["c", "a", "b"]);
    }

    #[test]
    fn distance_ties_break_by_case_insensitive_name() {
        let raw = vec![
            provider("z", "zeta clinic", "clinic", Some((34.06, -118.25))),
            provider("a", "Alpha Clinic", "clinic", Some((34.06, -118.25))),
        ];
        let results = rank(raw, REFERENCE, SortOption::Distance);
        assert_eq!(ids(&results), vec!["a", "z"]);
    }

    #[test]
    fn deduplicates_by_id_keeping_first() {
        let raw = vec![
            provider("p1", "First Row", "clinic", Some((34.06, -118.25))),
            provider("p1", "Duplicate Row", "clinic", Some((34.50, -118.25))),
            provider("p2", "Other", "clinic", Some((34.10, -118.25))),
        ];
        let results = rank(raw, REFERENCE, SortOption::Name);
        assert_eq!(results.providers.len(), 2);
        assert_eq!(results.duplicates_dropped, 1);
        assert!(results
            .providers
            .iter()
            .any(|p| p.provider.name == "First Row"));
    }

    #[test]
    fn name_sort_is_case_insensitive() {
        let raw = vec![
            provider("1", "beta Therapy", "clinic", Some((34.06, -118.25))),
            provider("2", "Alpha Therapy", "clinic", Some((34.06, -118.25))),
            provider("3", "GAMMA Therapy", "clinic", Some((34.06, -118.25))),
        ];
        let results = rank(raw, REFERENCE, SortOption::Name);
        assert_eq!(ids(&results), vec!["2", "1", "3"]);
    }

    #[test]
    fn type_sort_orders_by_type_then_name() {
        let raw = vec![
            provider("1", "Zeta", "speech", Some((34.06, -118.25))),
            provider("2", "Alpha", "speech", Some((34.06, -118.25))),
            provider("3", "Beta", "aba", Some((34.06, -118.25))),
        ];
        let results = rank(raw, REFERENCE, SortOption::Type);
        assert_eq!(ids(&results), vec!["3", "2", "1"]);
    }

    #[test]
    fn reranking_is_idempotent() {
        let raw = vec![
            provider("far", "Far Clinic", "clinic", Some((34.50, -118.25))),
            provider("none", "No Location", "clinic", None),
            provider("near", "Near Clinic", "clinic", Some((34.06, -118.25))),
        ];
        let first = rank(raw, REFERENCE, SortOption::Distance);
        let again = rank(
            first.providers.iter().map(|p| p.provider.clone()).collect(),
            REFERENCE,
            SortOption::Distance,
        );
        assert_eq!(ids(&first), ids(&again));
    }

    #[test]
    fn empty_input_yields_empty_results() {
        let results = rank(vec![], REFERENCE, SortOption::Distance);
        assert!(results.providers.is_empty());
        assert!(!results.has_partial_data());
        assert_eq!(results.duplicates_dropped, 0);
    }
}
