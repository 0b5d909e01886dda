//! Provider search pipeline: canonical query construction, debounced and
//! cached request coordination, and distance-based result ranking.

mod cache;
mod client;
mod coordinator;
mod error;
mod locate;
mod query;
mod ranker;
mod retry;

pub use cache::TtlCache;
pub use client::{ProviderApiClient, RegionRecord, SearchBackend};
pub use coordinator::{CoordinatorConfig, SearchCoordinator, SearchPhase, SearchResult};
pub use error::SearchError;
pub use locate::{acquire_reference_point, ReferencePoint, RetryPolicy};
pub use query::{build_query, Scope, SearchQuery};
pub use ranker::{rank, RankedProvider, RankedResults};
