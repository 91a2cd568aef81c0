//! Storage and messaging port traits for the search engine.
//! Implemented by lc_search_postgres and lc_search_amqp — core logic
//! depends only on these traits.

use async_trait::async_trait;

use crate::error::SearchError;
use crate::types::{CountyFilter, RecordedRequest, SearchParameters, SearchRequest, StoredResult};

pub type Result<T> = std::result::Result<T, SearchError>;

/// The precomputed county name → legacy key mapping.
#[async_trait]
pub trait CountyKeyStore: Send + Sync {
    /// Fetch the legacy-compatible key for a county name, matched exactly
    /// and case-insensitively. Exactly one row must match; zero or more
    /// than one is `AmbiguousOrMissingKey`, surfaced untransformed.
    async fn fetch_key(&self, name: &str) -> Result<String>;
}

/// Read-only queries against the register of filings. Every method
/// returns distinct registration ids and only considers active
/// registrations (`cancelled_by IS NULL`). Names are matched exactly,
/// case-insensitively.
#[async_trait]
pub trait RegisterStore: Send + Sync {
    /// Bankruptcy-style exact lookup on the indexed party name.
    async fn registrations_by_name(&self, name: &str) -> Result<Vec<i32>>;

    /// Bankruptcy-style exact lookup on the complex name index.
    async fn registrations_by_complex_name(&self, name: &str) -> Result<Vec<i32>>;

    /// Full search on the party name, restricted by county and by
    /// registration year (inclusive).
    async fn full_by_name(
        &self,
        name: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>>;

    /// Full search on the company name.
    async fn full_by_company(
        &self,
        name: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>>;

    /// Full search on the (authority name, authority area) pair.
    async fn full_by_local_authority(
        &self,
        name: &str,
        area: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>>;

    /// Full search on the free-text other name.
    async fn full_by_other_name(
        &self,
        name: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>>;

    /// Full search on one complex name variation.
    async fn full_by_complex_name(
        &self,
        name: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>>;
}

/// The search request/result audit trail.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Persist a request, its details row, and one name row per item, all
    /// in a single transaction — a partial insert sequence is never
    /// observable. Returns the generated ids, `name_ids[i]` correlating
    /// with `parameters.items[i]`.
    async fn record_request(
        &self,
        request: &SearchRequest,
        parameters: &SearchParameters,
    ) -> Result<RecordedRequest>;

    /// Persist one name item's result payload. Independent of the
    /// request's transaction.
    async fn record_result(
        &self,
        request_id: i32,
        details_id: i32,
        name_id: i32,
        result: &serde_json::Value,
    ) -> Result<()>;

    /// Read back previously recorded result payloads.
    ///
    /// TODO: `only_unissued` has no effect yet — the unprinted/unissued
    /// semantics were never specified upstream.
    async fn read_all(&self, only_unissued: bool) -> Result<Vec<StoredResult>>;
}

/// Topic-style broker publish capability. Fire-and-forget from the search
/// engine's perspective: implementations must bound their wait and a
/// failure never rolls back committed rows.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, routing_key: &str, payload: &serde_json::Value) -> Result<()>;
}
