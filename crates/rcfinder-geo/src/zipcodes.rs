//! Static ZIP → region fallback table.

use std::collections::HashMap;

use rcfinder_core::{CoreError, RegionsFile};

/// O(1) ZIP-to-region lookup used when polygon containment is unavailable
/// (no coordinate) or comes up empty.
#[derive(Debug, Clone, Default)]
pub struct ZipFallbackTable {
    map: HashMap<String, String>,
}

impl ZipFallbackTable {
    /// Build the table from the per-region ZIP lists in the dataset.
    ///
    /// A ZIP claimed by more than one region keeps its first owner; the
    /// dataset loader has already flagged the conflict.
    #[must_use]
    pub fn from_regions(regions_file: &RegionsFile) -> Self {
        let mut map = HashMap::new();
        for region in &regions_file.regions {
            for zip in &region.zip_codes {
                map.entry(zip.clone())
                    .or_insert_with(|| region.acronym.clone());
            }
        }
        Self { map }
    }

    /// Look up the region acronym owning a ZIP code.
    ///
    /// Returns `Ok(None)` for a well-formed ZIP that is simply outside the
    /// covered county; that is a no-match, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidZip`] unless `zip` is exactly 5 ASCII digits.
    pub fn lookup(&self, zip: &str) -> Result<Option<&str>, CoreError> {
        if !is_valid_zip(zip) {
            return Err(CoreError::InvalidZip {
                zip: zip.to_string(),
            });
        }
        Ok(self.map.get(zip).map(String::as_str))
    }

    /// Iterate over every ZIP in the table with its owning region acronym.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(z, a)| (z.as_str(), a.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Exactly five ASCII digits.
#[must_use]
pub(crate) fn is_valid_zip(zip: &str) -> bool {
    zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit())
}
