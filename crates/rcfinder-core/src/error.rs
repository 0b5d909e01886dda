use thiserror::Error;

/// Synchronous input-validation failures. These fail fast and are never
/// retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid ZIP code \"{zip}\": must be exactly 5 digits")]
    InvalidZip { zip: String },

    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("invalid search radius {radius_miles}: must be a positive, finite number of miles")]
    InvalidRadius { radius_miles: f64 },

    #[error("location query must include a coordinate or a ZIP code")]
    MissingLocation,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read regions file {path}: {source}")]
    RegionsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse regions file: {0}")]
    RegionsFileParse(#[from] serde_yaml::Error),

    #[error("regions file validation failed: {0}")]
    Validation(String),
}
