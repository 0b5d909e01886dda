//! Location resolution for the regional center finder.
//!
//! Maps an arbitrary location (coordinate or 5-digit ZIP) to the regional
//! center whose catchment area covers it: polygon containment first, ZIP
//! fallback table second.

mod boundary;
mod distance;
mod resolver;
mod zipcodes;

pub use boundary::{BoundaryIndex, BoundaryRegion, GeoError};
pub use distance::{distance_miles, format_distance};
pub use resolver::{LocationQuery, RegionResolver};
pub use zipcodes::ZipFallbackTable;
