//! Device-location acquisition with bounded retry and a county-centroid
//! fallback.
//!
//! Acquiring a device location can fail or hang; search must not. The
//! policy retries a caller-supplied async source a fixed number of times,
//! then falls back to a well-known reference point, tagged so the caller
//! can tell the user the results are not location-specific.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rcfinder_core::{AppConfig, Coordinate, COUNTY_CENTROID};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
    /// Reference point used once every attempt has failed.
    pub fallback: Coordinate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            fallback: COUNTY_CENTROID,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.locate_max_attempts,
            delay: Duration::from_millis(config.locate_retry_delay_ms),
            fallback: COUNTY_CENTROID,
        }
    }
}

/// The reference point a search is anchored to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferencePoint {
    /// A usable coordinate from the location source.
    Device(Coordinate),
    /// The policy fallback; results anchored here are not
    /// location-specific and should be labelled as such.
    Fallback(Coordinate),
}

impl ReferencePoint {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        match *self {
            Self::Device(c) | Self::Fallback(c) => c,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Drive `source` under `policy` until it yields a usable coordinate.
///
/// A source error or an unusable coordinate (non-finite, out of range, or
/// null island) counts as a failed attempt. This never fails: exhaustion
/// returns [`ReferencePoint::Fallback`].
pub async fn acquire_reference_point<F, Fut, E>(policy: &RetryPolicy, mut source: F) -> ReferencePoint
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Coordinate, E>>,
    E: Display,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match source().await {
            Ok(coordinate) if coordinate.is_usable() => {
                return ReferencePoint::Device(coordinate);
            }
            Ok(coordinate) => {
                tracing::warn!(
                    attempt,
                    lat = coordinate.lat,
                    lng = coordinate.lng,
                    "location source returned an unusable coordinate"
                );
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "location acquisition failed");
            }
        }
        if attempt < attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    tracing::warn!(
        attempts,
        "location acquisition exhausted; using fallback reference point"
    );
    ReferencePoint::Fallback(policy.fallback)
}
