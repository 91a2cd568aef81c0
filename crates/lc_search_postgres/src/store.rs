//! Postgres implementations of the lc_search_core port traits.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) to avoid a compile-time DB requirement.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::debug;

use lc_search_core::error::SearchError;
use lc_search_core::ports::{CountyKeyStore, RegisterStore, Result, SearchStore};
use lc_search_core::types::{
    CountyFilter, RecordedRequest, SearchParameters, SearchRequest, StoredResult,
};

// ── PgCountyKeyStore ─────────────────────────────────────────

/// The precomputed county name → legacy key lookup table.
pub struct PgCountyKeyStore {
    pool: PgPool,
}

impl PgCountyKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CountyKeyStore for PgCountyKeyStore {
    async fn fetch_key(&self, name: &str) -> Result<String> {
        let mut rows = sqlx::query_scalar::<_, String>(
            "SELECT key FROM county_search_keys WHERE UPPER(name) = $1",
        )
        .bind(name.to_uppercase())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        if rows.len() == 1 {
            Ok(rows.remove(0))
        } else {
            Err(SearchError::AmbiguousOrMissingKey {
                name: name.to_string(),
                matches: rows.len(),
            })
        }
    }
}

// ── PgRegisterStore ──────────────────────────────────────────

/// Read-only matcher queries against the register of filings.
pub struct PgRegisterStore {
    pool: PgPool,
}

impl PgRegisterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run one full-search query variant. `predicate` names the indexed
    /// party-name column(s) with placeholders starting at $3 ($1/$2 are
    /// the year range; the county array, when present, binds last).
    async fn full_query(
        &self,
        predicate: &str,
        values: &[&str],
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>> {
        let rows = match counties {
            CountyFilter::All => {
                debug!("all counties search");
                let sql = format!(
                    "SELECT DISTINCT r.id \
                     FROM party_name pn, register r, party_name_rel pnr, party p, register_details rd \
                     WHERE {predicate} \
                       AND r.debtor_reg_name_id = pn.id \
                       AND pnr.party_name_id = pn.id AND pnr.party_id = p.id \
                       AND p.register_detl_id = rd.id \
                       AND EXTRACT(YEAR FROM rd.registration_date) BETWEEN $1 AND $2 \
                       AND rd.cancelled_by IS NULL"
                );
                let mut query = sqlx::query_scalar::<_, i32>(&sql).bind(year_from).bind(year_to);
                for value in values {
                    query = query.bind(value.to_uppercase());
                }
                query.fetch_all(&self.pool).await
            }
            CountyFilter::Named(counties) => {
                debug!("not all counties search");
                let county_slot = 3 + values.len();
                let sql = format!(
                    "SELECT DISTINCT r.id \
                     FROM party_name pn, register r, party_name_rel pnr, party p, party_address pa, \
                          address a, address_detail ad, register_details rd \
                     WHERE {predicate} \
                       AND r.debtor_reg_name_id = pn.id \
                       AND pnr.party_name_id = pn.id AND pnr.party_id = p.id AND p.id = pa.party_id \
                       AND pa.address_id = a.id AND a.detail_id = ad.id \
                       AND UPPER(ad.county) = ANY(${county_slot}) \
                       AND p.register_detl_id = rd.id \
                       AND EXTRACT(YEAR FROM rd.registration_date) BETWEEN $1 AND $2 \
                       AND rd.cancelled_by IS NULL"
                );
                let uc_counties: Vec<String> = counties.iter().map(|c| c.to_uppercase()).collect();
                let mut query = sqlx::query_scalar::<_, i32>(&sql).bind(year_from).bind(year_to);
                for value in values {
                    query = query.bind(value.to_uppercase());
                }
                query.bind(uc_counties).fetch_all(&self.pool).await
            }
        }
        .map_err(|e| anyhow!(e))?;
        Ok(rows)
    }

    async fn simple_query(&self, column: &str, name: &str) -> Result<Vec<i32>> {
        let sql = format!(
            "SELECT r.id \
             FROM party_name n, register r, register_details rd \
             WHERE UPPER(n.{column}) = $1 \
               AND r.debtor_reg_name_id = n.id \
               AND r.details_id = rd.id \
               AND rd.cancelled_by IS NULL"
        );
        let rows = sqlx::query_scalar::<_, i32>(&sql)
            .bind(name.to_uppercase())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(rows)
    }
}

#[async_trait]
impl RegisterStore for PgRegisterStore {
    async fn registrations_by_name(&self, name: &str) -> Result<Vec<i32>> {
        self.simple_query("party_name", name).await
    }

    async fn registrations_by_complex_name(&self, name: &str) -> Result<Vec<i32>> {
        self.simple_query("complex_name", name).await
    }

    async fn full_by_name(
        &self,
        name: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>> {
        self.full_query(
            "UPPER(pn.party_name) = $3",
            &[name],
            counties,
            year_from,
            year_to,
        )
        .await
    }

    async fn full_by_company(
        &self,
        name: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>> {
        self.full_query(
            "UPPER(pn.company_name) = $3",
            &[name],
            counties,
            year_from,
            year_to,
        )
        .await
    }

    async fn full_by_local_authority(
        &self,
        name: &str,
        area: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>> {
        self.full_query(
            "UPPER(pn.local_authority_name) = $3 AND UPPER(pn.local_authority_area) = $4",
            &[name, area],
            counties,
            year_from,
            year_to,
        )
        .await
    }

    async fn full_by_other_name(
        &self,
        name: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>> {
        self.full_query(
            "UPPER(pn.other_name) = $3",
            &[name],
            counties,
            year_from,
            year_to,
        )
        .await
    }

    async fn full_by_complex_name(
        &self,
        name: &str,
        counties: &CountyFilter,
        year_from: i32,
        year_to: i32,
    ) -> Result<Vec<i32>> {
        self.full_query(
            "UPPER(pn.complex_name) = $3",
            &[name],
            counties,
            year_from,
            year_to,
        )
        .await
    }
}

// ── PgSearchStore ────────────────────────────────────────────

/// The search request/result audit trail.
pub struct PgSearchStore {
    pool: PgPool,
}

impl PgSearchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchStore for PgSearchStore {
    /// Request, details, and name rows commit together or not at all.
    async fn record_request(
        &self,
        request: &SearchRequest,
        parameters: &SearchParameters,
    ) -> Result<RecordedRequest> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        let request_id: i32 = sqlx::query_scalar(
            "INSERT INTO request (key_number, application_type, application_reference, \
                                  application_date, ins_request_id, document_ref, \
                                  customer_name, customer_address) \
             VALUES ($1, 'SEARCH', $2, $3, NULL, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&request.customer.key_number)
        .bind(&request.customer.reference)
        .bind(Utc::now())
        .bind(&request.document_id)
        .bind(&request.customer.name)
        .bind(&request.customer.address)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        let counties = CountyFilter::normalize(&parameters.counties).as_wire();
        let details_id: i32 = sqlx::query_scalar(
            "INSERT INTO search_details (request_id, search_timestamp, type, counties) \
             VALUES ($1, current_timestamp, $2, $3) \
             RETURNING id",
        )
        .bind(request_id)
        .bind(parameters.search_type.as_str())
        .bind(&counties)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        let mut name_ids = Vec::with_capacity(parameters.items.len());
        for item in &parameters.items {
            let fields = item.criterion.fields();
            let name_id: i32 = sqlx::query_scalar(
                "INSERT INTO search_name (details_id, name_type, forenames, surname, \
                                          complex_name, complex_number, company_name, \
                                          local_authority_name, local_authority_area, \
                                          other_name, year_from, year_to) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 RETURNING id",
            )
            .bind(details_id)
            .bind(item.criterion.category().as_str())
            .bind(&fields.forenames)
            .bind(&fields.surname)
            .bind(&fields.complex_name)
            .bind(fields.complex_number)
            .bind(&fields.company_name)
            .bind(&fields.local_authority_name)
            .bind(&fields.local_authority_area)
            .bind(&fields.other_name)
            .bind(item.year_from)
            .bind(item.year_to)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
            name_ids.push(name_id);
        }

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(RecordedRequest {
            request_id,
            details_id,
            name_ids,
        })
    }

    async fn record_result(
        &self,
        request_id: i32,
        details_id: i32,
        name_id: i32,
        result: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO search_results (request_id, search_details_id, name_id, result) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(request_id)
        .bind(details_id)
        .bind(name_id)
        .bind(result)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn read_all(&self, only_unissued: bool) -> Result<Vec<StoredResult>> {
        // TODO: apply the unissued filter once its semantics are agreed upstream.
        let _ = only_unissued;
        let rows = sqlx::query(
            "SELECT request_id, search_details_id, name_id, result FROM search_results",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter()
            .map(|row| {
                Ok(StoredResult {
                    request_id: row.try_get("request_id").map_err(|e| anyhow!(e))?,
                    details_id: row.try_get("search_details_id").map_err(|e| anyhow!(e))?,
                    name_id: row.try_get("name_id").map_err(|e| anyhow!(e))?,
                    result: row.try_get("result").map_err(|e| anyhow!(e))?,
                })
            })
            .collect()
    }
}

// ── PgStores ─────────────────────────────────────────────────

/// All Postgres-backed ports over one pool.
pub struct PgStores {
    pub county_keys: PgCountyKeyStore,
    pub register: PgRegisterStore,
    pub searches: PgSearchStore,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            county_keys: PgCountyKeyStore::new(pool.clone()),
            register: PgRegisterStore::new(pool.clone()),
            searches: PgSearchStore::new(pool),
        }
    }
}
