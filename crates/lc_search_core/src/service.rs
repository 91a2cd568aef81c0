//! SearchService — the central domain service for the search engine.
//!
//! Takes port traits via `Arc<dyn PortTrait>` so that the same logic works
//! against Postgres and the broker, or against test doubles.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::SearchError;
use crate::ports::{CountyKeyStore, EventPublisher, RegisterStore, Result, SearchStore};
use crate::search_key::derive_key;
use crate::types::{
    CanonicalKey, CountyFilter, NameCriterion, NameSearchResult, RecordedRequest, ResultPayload,
    SearchNameItem, SearchParameters, SearchRequest, SearchType, StoredResult,
};

/// Routing key used by the reference deployment's topic exchange.
const ROUTING_KEY: &str = "simple";

/// Outcome of one search workflow run. Recording has committed by the
/// time this exists; a publish failure is reported here, not raised.
#[derive(Debug)]
pub struct SearchOutcome {
    pub recorded: RecordedRequest,
    pub results: Vec<NameSearchResult>,
    pub publish_error: Option<String>,
}

pub struct SearchService {
    register: Arc<dyn RegisterStore>,
    searches: Arc<dyn SearchStore>,
    county_keys: Arc<dyn CountyKeyStore>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl SearchService {
    pub fn new(
        register: Arc<dyn RegisterStore>,
        searches: Arc<dyn SearchStore>,
        county_keys: Arc<dyn CountyKeyStore>,
    ) -> Self {
        Self {
            register,
            searches,
            county_keys,
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Derive the searchable name key stored against a registration.
    pub async fn registration_key(&self, criterion: &NameCriterion) -> Result<CanonicalKey> {
        derive_key(criterion, self.county_keys.as_ref()).await
    }

    /// Run the full search workflow: record the request (atomically),
    /// execute the matcher per name item, record each result, then
    /// announce the outcome to the broker if one is configured.
    pub async fn run_search(
        &self,
        request: &SearchRequest,
        parameters: &SearchParameters,
    ) -> Result<SearchOutcome> {
        for item in &parameters.items {
            item.criterion.validate()?;
        }

        let recorded = self.searches.record_request(request, parameters).await?;
        debug!(
            request_id = recorded.request_id,
            details_id = recorded.details_id,
            "search request recorded"
        );

        let results = self.perform_search(&recorded, parameters).await?;

        for result in &results {
            self.searches
                .record_result(
                    recorded.request_id,
                    recorded.details_id,
                    result.name_id,
                    &result.to_record(),
                )
                .await?;
        }

        let publish_error = self.announce(&recorded, &results).await;

        Ok(SearchOutcome {
            recorded,
            results,
            publish_error,
        })
    }

    /// Execute the matcher for every name item of an already-recorded
    /// request. County normalization happens here: an absent or empty
    /// list means no geographic restriction.
    pub async fn perform_search(
        &self,
        recorded: &RecordedRequest,
        parameters: &SearchParameters,
    ) -> Result<Vec<NameSearchResult>> {
        let counties = CountyFilter::normalize(&parameters.counties);
        let mut results = Vec::with_capacity(parameters.items.len());
        match parameters.search_type {
            SearchType::Full => {
                info!("perform full search");
                for (item, name_id) in parameters.items.iter().zip(&recorded.name_ids) {
                    let payload = self.full_search_item(item, &counties).await?;
                    results.push(NameSearchResult {
                        name_id: *name_id,
                        payload,
                    });
                }
            }
            SearchType::Bankruptcy => {
                info!("perform bankruptcy search");
                for (item, name_id) in parameters.items.iter().zip(&recorded.name_ids) {
                    let payload = self.bankruptcy_search_item(item).await?;
                    results.push(NameSearchResult {
                        name_id: *name_id,
                        payload,
                    });
                }
            }
        }
        Ok(results)
    }

    async fn full_search_item(
        &self,
        item: &SearchNameItem,
        counties: &CountyFilter,
    ) -> Result<ResultPayload> {
        let (year_from, year_to) = match (item.year_from, item.year_to) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                return Err(SearchError::MalformedCriterion(format!(
                    "full search item '{}' is missing its year range",
                    item.criterion.search_text()
                )))
            }
        };

        let ids = match &item.criterion {
            NameCriterion::ComplexName { variations, .. } => {
                // Search against every variation of the complex name and
                // union the matches into one result.
                let mut seen = HashSet::new();
                let mut build = Vec::new();
                for variation in variations {
                    let matched = self
                        .register
                        .full_by_complex_name(&variation.name, counties, year_from, year_to)
                        .await?;
                    for id in matched {
                        if seen.insert(id) {
                            build.push(id);
                        }
                    }
                }
                build
            }
            NameCriterion::PrivateIndividual {
                forenames, surname, ..
            } => {
                let name = format!("{} {}", forenames.join(" "), surname);
                self.register
                    .full_by_name(&name, counties, year_from, year_to)
                    .await?
            }
            NameCriterion::LimitedCompany { name } => {
                self.register
                    .full_by_company(name, counties, year_from, year_to)
                    .await?
            }
            NameCriterion::CountyCouncil { name, area }
            | NameCriterion::ParishCouncil { name, area }
            | NameCriterion::RuralCouncil { name, area }
            | NameCriterion::OtherCouncil { name, area } => {
                self.register
                    .full_by_local_authority(name, area, counties, year_from, year_to)
                    .await?
            }
            NameCriterion::DevelopmentCorporation { name } | NameCriterion::Other { name } => {
                self.register
                    .full_by_other_name(name, counties, year_from, year_to)
                    .await?
            }
            NameCriterion::NullComplexName => {
                return Err(SearchError::UnimplementedCategory(item.criterion.category()))
            }
        };
        Ok(ResultPayload::Registrations(ids))
    }

    async fn bankruptcy_search_item(&self, item: &SearchNameItem) -> Result<ResultPayload> {
        let name = item.criterion.search_text();
        let registration_ids = match &item.criterion {
            NameCriterion::ComplexName { name, .. } => {
                self.register.registrations_by_complex_name(name).await?
            }
            NameCriterion::NullComplexName => {
                return Err(SearchError::UnimplementedCategory(item.criterion.category()))
            }
            _ => self.register.registrations_by_name(&name).await?,
        };
        Ok(ResultPayload::NamedRegistrations {
            name,
            registration_ids,
        })
    }

    /// Read back previously recorded search results.
    pub async fn read_searches(&self, only_unissued: bool) -> Result<Vec<StoredResult>> {
        self.searches.read_all(only_unissued).await
    }

    /// Announce the outcome. Failure is logged and reported to the
    /// caller, never raised — the recorded rows stay committed.
    async fn announce(
        &self,
        recorded: &RecordedRequest,
        results: &[NameSearchResult],
    ) -> Option<String> {
        let publisher = self.publisher.as_ref()?;
        let payload = serde_json::json!({
            "application": "search",
            "request_id": recorded.request_id,
            "details_id": recorded.details_id,
            "results": results.iter().map(NameSearchResult::to_record).collect::<Vec<_>>(),
        });
        match publisher.publish(ROUTING_KEY, &payload).await {
            Ok(()) => None,
            Err(err) => {
                warn!("search event publish failed: {err}");
                Some(err.to_string())
            }
        }
    }
}
