mod app_config;
mod config;
mod dataset;
mod error;
mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use dataset::{load_regions, RegionConfig, RegionsFile};
pub use error::{ConfigError, CoreError};
pub use types::{
    AgeGroup, Coordinate, Diagnosis, Insurance, Provider, Region, RegionContact, SearchFilters,
    SortOption, COUNTY_CENTROID, DEFAULT_RADIUS_MILES,
};
