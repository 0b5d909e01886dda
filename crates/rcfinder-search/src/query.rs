//! Canonical query construction and cache fingerprinting.

use sha2::{Digest, Sha256};

use rcfinder_core::{Coordinate, CoreError, SearchFilters};

/// Which upstream endpoint a query is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Generic radius search around a coordinate.
    Radius,
    /// Regional-center-scoped search: the free text was a 5-digit ZIP.
    Zip,
}

/// A fully canonicalized search query: the wire parameters plus a stable
/// fingerprint used as the cache/debounce key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub scope: Scope,
    /// Query parameters in canonical order, ready for the wire.
    pub params: Vec<(String, String)>,
    /// SHA-256 hex of the canonical serialization. Identical logical
    /// queries always produce identical fingerprints, regardless of the
    /// insertion order of multi-valued filters.
    pub fingerprint: String,
    /// The ZIP driving a `Scope::Zip` query.
    pub zip: Option<String>,
}

/// Build the canonical query for a filter set anchored at a location.
///
/// Multi-valued filters are sorted case-insensitively before serialization
/// so that element order never changes the fingerprint. Free text of exactly
/// five digits switches the query to [`Scope::Zip`].
///
/// # Errors
///
/// - [`CoreError::InvalidRadius`] unless the radius is positive and finite.
/// - [`CoreError::InvalidCoordinate`] for an unusable location.
pub fn build_query(filters: &SearchFilters, location: Coordinate) -> Result<SearchQuery, CoreError> {
    if !filters.radius_miles.is_finite() || filters.radius_miles <= 0.0 {
        return Err(CoreError::InvalidRadius {
            radius_miles: filters.radius_miles,
        });
    }
    let location = location.validated()?;

    let free_text = filters
        .free_text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let zip = free_text
        .filter(|s| s.len() == 5 && s.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string);
    let scope = if zip.is_some() { Scope::Zip } else { Scope::Radius };

    let mut therapy_types: Vec<&str> = filters
        .therapy_types
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    therapy_types.sort_by_key(|t| t.to_lowercase());
    therapy_types.dedup();

    let mut params: Vec<(String, String)> = Vec::new();
    match &zip {
        Some(zip) => {
            params.push(("zip_code".to_string(), zip.clone()));
        }
        None => {
            if let Some(q) = free_text {
                params.push(("q".to_string(), q.to_string()));
            }
            params.push(("lat".to_string(), format!("{:.5}", location.lat)));
            params.push(("lng".to_string(), format!("{:.5}", location.lng)));
            params.push(("radius".to_string(), format!("{:.1}", filters.radius_miles)));
        }
    }
    if let Some(age) = filters.age_group {
        params.push(("age".to_string(), age.to_string()));
    }
    if let Some(diagnosis) = filters.diagnosis {
        params.push(("diagnosis".to_string(), diagnosis.to_string()));
    }
    if let Some(insurance) = filters.insurance {
        params.push(("insurance".to_string(), insurance.to_string()));
    }
    for therapy in &therapy_types {
        params.push(("therapy".to_string(), (*therapy).to_string()));
    }

    let fingerprint = fingerprint_of(scope, &params);

    Ok(SearchQuery {
        scope,
        params,
        fingerprint,
        zip,
    })
}

fn fingerprint_of(scope: Scope, params: &[(String, String)]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(match scope {
        Scope::Radius => "scope=radius\n",
        Scope::Zip => "scope=zip\n",
    });
    for (key, value) in params {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
