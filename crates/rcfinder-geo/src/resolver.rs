//! Region resolution: polygon containment first, ZIP fallback second.

use std::collections::HashMap;
use std::path::Path;

use rcfinder_core::{load_regions, Coordinate, CoreError, Region, RegionContact, RegionsFile};

use crate::boundary::{BoundaryIndex, GeoError};
use crate::zipcodes::ZipFallbackTable;

/// The location half of a search: either or both of a device coordinate and
/// a user-entered ZIP code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    pub coordinate: Option<Coordinate>,
    pub zip: Option<String>,
}

impl LocationQuery {
    #[must_use]
    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self {
            coordinate: Some(coordinate),
            zip: None,
        }
    }

    #[must_use]
    pub fn from_zip(zip: impl Into<String>) -> Self {
        Self {
            coordinate: None,
            zip: Some(zip.into()),
        }
    }
}

/// Stateless resolver from location to regional center. Safe to call
/// concurrently from multiple search sessions (`&self`, no interior state).
#[derive(Debug, Clone)]
pub struct RegionResolver {
    catalog: Vec<Region>,
    by_acronym: HashMap<String, usize>,
    index: BoundaryIndex,
    zips: ZipFallbackTable,
}

impl RegionResolver {
    /// Build the resolver from the parsed dataset and boundary index.
    ///
    /// Each region's `center` is its explicit office coordinate when the
    /// dataset has one, otherwise the boundary centroid. Boundary features
    /// with no matching dataset entry are skipped with a warning.
    #[must_use]
    pub fn new(regions_file: &RegionsFile, index: BoundaryIndex) -> Self {
        let zips = ZipFallbackTable::from_regions(regions_file);

        let mut catalog = Vec::with_capacity(regions_file.regions.len());
        let mut by_acronym = HashMap::new();
        for config in &regions_file.regions {
            let boundary = index.get(&config.acronym);
            if boundary.is_none() {
                tracing::warn!(
                    acronym = %config.acronym,
                    "region has no boundary feature; coordinate resolution will rely on the ZIP table"
                );
            }
            let center = config
                .office
                .or_else(|| boundary.map(super::BoundaryRegion::centroid))
                .unwrap_or(rcfinder_core::COUNTY_CENTROID);

            by_acronym.insert(config.acronym.clone(), catalog.len());
            catalog.push(Region {
                id: config.acronym.clone(),
                name: config.name.clone(),
                acronym: config.acronym.clone(),
                contact: RegionContact {
                    phone: config.phone.clone(),
                    website: config.website.clone(),
                },
                color: config.color.clone(),
                center,
                catchment_desc: boundary.and_then(|b| b.catchment_desc.clone()),
            });
        }

        Self {
            catalog,
            by_acronym,
            index,
            zips,
        }
    }

    /// Load the resolver from the bundled dataset files.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if either file cannot be read, parsed, or validated.
    pub fn load(regions_path: &Path, boundaries_path: &Path) -> Result<Self, GeoError> {
        let regions_file = load_regions(regions_path)?;
        let index = BoundaryIndex::load(boundaries_path)?;
        Ok(Self::new(&regions_file, index))
    }

    /// Resolve a location to the regional center covering it.
    ///
    /// Tries polygon containment for the coordinate first, then the ZIP
    /// fallback table. `Ok(None)` means the location is outside every known
    /// catchment — a no-match, not an error.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingLocation`] when the query has neither input.
    /// - [`CoreError::InvalidCoordinate`] for a non-finite or null-island coordinate.
    /// - [`CoreError::InvalidZip`] for a malformed ZIP.
    pub fn resolve(&self, query: &LocationQuery) -> Result<Option<&Region>, CoreError> {
        if query.coordinate.is_none() && query.zip.is_none() {
            return Err(CoreError::MissingLocation);
        }

        if let Some(coordinate) = query.coordinate {
            let coordinate = coordinate.validated()?;
            if let Some(boundary) = self.index.containing(coordinate) {
                tracing::debug!(acronym = %boundary.acronym, "resolved region by polygon containment");
                if let Some(region) = self.region(&boundary.acronym) {
                    return Ok(Some(region));
                }
                tracing::warn!(
                    acronym = %boundary.acronym,
                    "boundary matched a region missing from the dataset"
                );
            }
        }

        if let Some(zip) = query.zip.as_deref() {
            if let Some(acronym) = self.zips.lookup(zip)? {
                tracing::debug!(acronym, zip, "resolved region by ZIP fallback");
                return Ok(self.region(acronym));
            }
        }

        Ok(None)
    }

    #[must_use]
    pub fn region(&self, acronym: &str) -> Option<&Region> {
        self.by_acronym.get(acronym).map(|&i| &self.catalog[i])
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.catalog
    }

    #[must_use]
    pub fn zip_table(&self) -> &ZipFallbackTable {
        &self.zips
    }

    #[must_use]
    pub fn boundaries(&self) -> &BoundaryIndex {
        &self.index
    }
}
