use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Default search radius in miles when a caller does not supply one.
pub const DEFAULT_RADIUS_MILES: f64 = 25.0;

/// Fallback reference point when device location cannot be acquired:
/// roughly the Los Angeles County population center.
pub const COUNTY_CENTROID: Coordinate = Coordinate {
    lat: 34.05,
    lng: -118.25,
};

/// A WGS-84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// A coordinate is usable when both components are finite, within
    /// lat/lng range, and not the (0, 0) null island that upstream records
    /// use as a missing-location placeholder.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
            && !(self.lat == 0.0 && self.lng == 0.0)
    }

    /// Validates the coordinate, rejecting non-finite components.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] when the coordinate is not usable.
    pub fn validated(self) -> Result<Self, CoreError> {
        if self.is_usable() {
            Ok(self)
        } else {
            Err(CoreError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// Contact details for a regional center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionContact {
    pub phone: String,
    pub website: String,
}

/// A regional center: the administrative authority covering one geographic
/// catchment area. Loaded once at startup; immutable for process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    /// Stable identifier; the short acronym (e.g. `SCLARC`).
    pub id: String,
    pub name: String,
    pub acronym: String,
    pub contact: RegionContact,
    /// Display color token consumed by every UI surface (one lookup table,
    /// not per-screen switch statements).
    pub color: String,
    /// Marker/center coordinate: explicit office location when the dataset
    /// has one, otherwise the boundary centroid.
    pub center: Coordinate,
    pub catchment_desc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    EarlyIntervention,
    SchoolAge,
    Transition,
    Adult,
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgeGroup::EarlyIntervention => write!(f, "early_intervention"),
            AgeGroup::SchoolAge => write!(f, "school_age"),
            AgeGroup::Transition => write!(f, "transition"),
            AgeGroup::Adult => write!(f, "adult"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    Autism,
    CerebralPalsy,
    Epilepsy,
    IntellectualDisability,
    Other,
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnosis::Autism => write!(f, "autism"),
            Diagnosis::CerebralPalsy => write!(f, "cerebral_palsy"),
            Diagnosis::Epilepsy => write!(f, "epilepsy"),
            Diagnosis::IntellectualDisability => write!(f, "intellectual_disability"),
            Diagnosis::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insurance {
    MediCal,
    Private,
    RegionalCenterFunded,
}

impl std::fmt::Display for Insurance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insurance::MediCal => write!(f, "medi_cal"),
            Insurance::Private => write!(f, "private"),
            Insurance::RegionalCenterFunded => write!(f, "regional_center_funded"),
        }
    }
}

/// Facet selection for a provider search. Owned by the UI layer and passed
/// by value into the search pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub age_group: Option<AgeGroup>,
    pub diagnosis: Option<Diagnosis>,
    pub insurance: Option<Insurance>,
    /// Multi-valued; element order is irrelevant to the query identity.
    pub therapy_types: Vec<String>,
    pub radius_miles: f64,
    pub free_text: Option<String>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            age_group: None,
            diagnosis: None,
            insurance: None,
            therapy_types: Vec::new(),
            radius_miles: DEFAULT_RADIUS_MILES,
            free_text: None,
        }
    }
}

/// How ranked results are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    Distance,
    Name,
    Type,
}

/// A service provider record as returned by the provider search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub provider_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub therapy_types: Vec<String>,
    #[serde(default)]
    pub age_groups: Vec<String>,
    #[serde(default)]
    pub diagnoses_treated: Vec<String>,
    #[serde(default)]
    pub insurance_accepted: Vec<String>,
}

impl Provider {
    /// The provider's coordinate, if it has a usable one. `(0, 0)` and
    /// non-finite values count as missing.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                let coord = Coordinate::new(lat, lng);
                coord.is_usable().then_some(coord)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_at(lat: Option<f64>, lng: Option<f64>) -> Provider {
        Provider {
            id: "p1".to_string(),
            name: "Test Provider".to_string(),
            provider_type: "clinic".to_string(),
            latitude: lat,
            longitude: lng,
            address: None,
            phone: None,
            website: None,
            therapy_types: vec![],
            age_groups: vec![],
            diagnoses_treated: vec![],
            insurance_accepted: vec![],
        }
    }

    #[test]
    fn usable_coordinate_in_range() {
        assert!(Coordinate::new(34.05, -118.25).is_usable());
    }

    #[test]
    fn null_island_is_not_usable() {
        assert!(!Coordinate::new(0.0, 0.0).is_usable());
    }

    #[test]
    fn non_finite_coordinate_is_not_usable() {
        assert!(!Coordinate::new(f64::NAN, -118.25).is_usable());
        assert!(!Coordinate::new(34.05, f64::INFINITY).is_usable());
    }

    #[test]
    fn out_of_range_coordinate_is_not_usable() {
        assert!(!Coordinate::new(91.0, 0.1).is_usable());
        assert!(!Coordinate::new(0.1, 181.0).is_usable());
    }

    #[test]
    fn validated_rejects_null_island() {
        let err = Coordinate::new(0.0, 0.0).validated().unwrap_err();
        assert!(matches!(err, CoreError::InvalidCoordinate { .. }));
    }

    #[test]
    fn provider_coordinate_requires_both_components() {
        assert!(provider_at(Some(34.0), None).coordinate().is_none());
        assert!(provider_at(None, Some(-118.0)).coordinate().is_none());
        assert!(provider_at(Some(34.0), Some(-118.0)).coordinate().is_some());
    }

    #[test]
    fn provider_null_island_coordinate_is_missing() {
        assert!(provider_at(Some(0.0), Some(0.0)).coordinate().is_none());
    }

    #[test]
    fn provider_deserializes_with_missing_optional_fields() {
        let raw = r#"{"id":"42","name":"Bright Steps Therapy","latitude":33.9,"longitude":-118.2}"#;
        let provider: Provider = serde_json::from_str(raw).unwrap();
        assert_eq!(provider.id, "42");
        assert!(provider.provider_type.is_empty());
        assert!(provider.therapy_types.is_empty());
    }
}
