//! Catchment boundary index: GeoJSON parsing and point-in-polygon tests.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use rcfinder_core::{ConfigError, Coordinate};

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("failed to read boundary file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse boundary file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("boundary feature '{acronym}' has no usable ring")]
    EmptyRing { acronym: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    acronym: String,
    #[serde(rename = "regionalCenter")]
    regional_center: String,
    #[serde(rename = "catchmentAreaDesc", default)]
    catchment_area_desc: Option<String>,
}

/// Geometry as GeoJSON ships it: rings of `[lng, lat]` positions.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

/// One region's boundary: every ring of every polygon, flattened. A region
/// may have disjoint exclaves (MultiPolygon).
#[derive(Debug, Clone)]
pub struct BoundaryRegion {
    pub acronym: String,
    pub name: String,
    pub catchment_desc: Option<String>,
    rings: Vec<Vec<[f64; 2]>>,
}

impl BoundaryRegion {
    /// True when any ring contains the coordinate (even-odd ray casting,
    /// winding-order independent).
    #[must_use]
    pub fn contains(&self, coord: Coordinate) -> bool {
        self.rings
            .iter()
            .any(|ring| ring_contains(ring, coord.lng, coord.lat))
    }

    /// Vertex-average centroid of the first ring. Good enough for a map
    /// marker when the dataset carries no explicit office coordinate.
    #[must_use]
    pub fn centroid(&self) -> Coordinate {
        let ring = &self.rings[0];
        // GeoJSON rings repeat the first vertex at the end; skip the closer.
        let n = if ring.len() > 1 && ring[0] == ring[ring.len() - 1] {
            ring.len() - 1
        } else {
            ring.len()
        };
        let (sum_lng, sum_lat) = ring[..n]
            .iter()
            .fold((0.0, 0.0), |(lng, lat), v| (lng + v[0], lat + v[1]));
        #[allow(clippy::cast_precision_loss)]
        Coordinate::new(sum_lat / n as f64, sum_lng / n as f64)
    }
}

/// All regions' boundaries in dataset order.
///
/// Containment scans linearly: O(regions × vertices), fine at county scale
/// (seven regions, a few hundred vertices each).
#[derive(Debug, Clone)]
pub struct BoundaryIndex {
    regions: Vec<BoundaryRegion>,
}

impl BoundaryIndex {
    /// Load the index from a GeoJSON FeatureCollection file.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the file cannot be read or parsed, or if a
    /// feature carries no usable ring.
    pub fn load(path: &Path) -> Result<Self, GeoError> {
        let content = std::fs::read_to_string(path).map_err(|e| GeoError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_geojson_str(&content)
    }

    /// Parse the index from GeoJSON text.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Parse`] for malformed GeoJSON and
    /// [`GeoError::EmptyRing`] when a feature has no vertices.
    pub fn from_geojson_str(content: &str) -> Result<Self, GeoError> {
        let collection: FeatureCollection = serde_json::from_str(content)?;

        let mut regions = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let rings: Vec<Vec<[f64; 2]>> = match feature.geometry {
                Geometry::Polygon { coordinates } => coordinates,
                Geometry::MultiPolygon { coordinates } => {
                    coordinates.into_iter().flatten().collect()
                }
            };

            if rings.is_empty() || rings.iter().any(|r| r.len() < 4) {
                return Err(GeoError::EmptyRing {
                    acronym: feature.properties.acronym,
                });
            }

            regions.push(BoundaryRegion {
                acronym: feature.properties.acronym,
                name: feature.properties.regional_center,
                catchment_desc: feature.properties.catchment_area_desc,
                rings,
            });
        }

        Ok(Self { regions })
    }

    /// The first region (in dataset order) whose boundary contains the
    /// coordinate.
    ///
    /// The source polygons are assumed non-overlapping; if they do overlap,
    /// first-match-wins is a tie-break policy, not a correctness guarantee.
    #[must_use]
    pub fn containing(&self, coord: Coordinate) -> Option<&BoundaryRegion> {
        self.regions.iter().find(|region| region.contains(coord))
    }

    #[must_use]
    pub fn get(&self, acronym: &str) -> Option<&BoundaryRegion> {
        self.regions.iter().find(|r| r.acronym == acronym)
    }

    #[must_use]
    pub fn regions(&self) -> &[BoundaryRegion] {
        &self.regions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Even-odd ray cast: count edge crossings of a horizontal ray to the east
/// of the point. Odd count means inside. Winding order does not matter.
fn ring_contains(ring: &[[f64; 2]], lng: f64, lat: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > lat) != (yj > lat) && lng < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
