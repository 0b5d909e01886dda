use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Coordinate};

/// One regional center as declared in `regions.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub acronym: String,
    pub phone: String,
    pub website: String,
    pub color: String,
    /// Explicit office coordinate; when absent the boundary centroid is used
    /// as the region's marker/center.
    pub office: Option<Coordinate>,
    /// ZIP codes this region is responsible for. Many-to-one: a region owns
    /// many ZIPs, a ZIP belongs to at most one region.
    pub zip_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegionsFile {
    pub regions: Vec<RegionConfig>,
}

/// Load and validate the region dataset from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_regions(path: &Path) -> Result<RegionsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegionsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let regions_file: RegionsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::RegionsFileParse)?;

    validate_regions(&regions_file)?;

    Ok(regions_file)
}

fn validate_regions(regions_file: &RegionsFile) -> Result<(), ConfigError> {
    if regions_file.regions.is_empty() {
        return Err(ConfigError::Validation(
            "regions file must declare at least one region".to_string(),
        ));
    }

    let mut seen_acronyms = HashSet::new();
    let mut seen_zips: HashSet<&str> = HashSet::new();

    for region in &regions_file.regions {
        if region.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "region name must be non-empty".to_string(),
            ));
        }

        if region.acronym.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "region '{}' has an empty acronym",
                region.name
            )));
        }

        if !seen_acronyms.insert(region.acronym.to_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate region acronym: '{}'",
                region.acronym
            )));
        }

        if let Some(office) = region.office {
            if !office.is_usable() {
                return Err(ConfigError::Validation(format!(
                    "region '{}' has an invalid office coordinate ({}, {})",
                    region.acronym, office.lat, office.lng
                )));
            }
        }

        for zip in &region.zip_codes {
            if zip.len() != 5 || !zip.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ConfigError::Validation(format!(
                    "region '{}' declares malformed ZIP code '{}'",
                    region.acronym, zip
                )));
            }

            // The ZIP lists and the polygon boundaries are two independently
            // maintained sources of truth and can disagree for boundary
            // ZIPs. A ZIP claimed by two regions is a data-quality defect:
            // flag it and keep the first owner.
            if !seen_zips.insert(zip.as_str()) {
                tracing::warn!(
                    zip,
                    region = %region.acronym,
                    "ZIP code already claimed by an earlier region; keeping first owner"
                );
            }
        }
    }

    Ok(())
}
