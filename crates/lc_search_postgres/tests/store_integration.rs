//! DB-backed adapter tests.
//!
//! Run with `cargo test -- --ignored` against a scratch database:
//!   LC_DATABASE_URL=postgresql://localhost/lc_search_test
//!
//! The schema is applied idempotently on connect; seeded names carry a
//! per-run nonce so tests can share a database.

use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use lc_search_core::error::SearchError;
use lc_search_core::ports::{CountyKeyStore, RegisterStore, SearchStore};
use lc_search_core::types::{
    CountyFilter, CustomerDetails, NameCriterion, SearchNameItem, SearchParameters, SearchRequest,
    SearchType,
};
use lc_search_postgres::PgStores;

const SCHEMA: &str = include_str!("../migrations/001_search_tables.sql");

async fn test_pool() -> PgPool {
    let url = std::env::var("LC_DATABASE_URL").expect("LC_DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("failed to connect to database");
    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("failed to apply schema");
    pool
}

fn nonce() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos()
}

/// Seed one registration: a party name row, its register/details rows, a
/// party related to the name, and optionally an address in a county.
async fn seed_registration(
    pool: &PgPool,
    name_column: &str,
    value: &str,
    county: Option<&str>,
    year: i32,
    cancelled: bool,
) -> i32 {
    let name_id: i32 = sqlx::query_scalar(&format!(
        "INSERT INTO party_name ({name_column}) VALUES ($1) RETURNING id"
    ))
    .bind(value)
    .fetch_one(pool)
    .await
    .expect("party_name insert");

    let details_id: i32 = sqlx::query_scalar(
        "INSERT INTO register_details (registration_date, cancelled_by) \
         VALUES (make_date($1, 6, 1), $2) RETURNING id",
    )
    .bind(year)
    .bind(cancelled.then_some(1))
    .fetch_one(pool)
    .await
    .expect("register_details insert");

    let register_id: i32 = sqlx::query_scalar(
        "INSERT INTO register (debtor_reg_name_id, details_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(name_id)
    .bind(details_id)
    .fetch_one(pool)
    .await
    .expect("register insert");

    let party_id: i32 =
        sqlx::query_scalar("INSERT INTO party (register_detl_id) VALUES ($1) RETURNING id")
            .bind(details_id)
            .fetch_one(pool)
            .await
            .expect("party insert");

    sqlx::query("INSERT INTO party_name_rel (party_name_id, party_id) VALUES ($1, $2)")
        .bind(name_id)
        .bind(party_id)
        .execute(pool)
        .await
        .expect("party_name_rel insert");

    if let Some(county) = county {
        let detail_id: i32 =
            sqlx::query_scalar("INSERT INTO address_detail (county) VALUES ($1) RETURNING id")
                .bind(county)
                .fetch_one(pool)
                .await
                .expect("address_detail insert");
        let address_id: i32 =
            sqlx::query_scalar("INSERT INTO address (detail_id) VALUES ($1) RETURNING id")
                .bind(detail_id)
                .fetch_one(pool)
                .await
                .expect("address insert");
        sqlx::query("INSERT INTO party_address (party_id, address_id) VALUES ($1, $2)")
            .bind(party_id)
            .bind(address_id)
            .execute(pool)
            .await
            .expect("party_address insert");
    }

    register_id
}

fn request(key_number: &str) -> SearchRequest {
    SearchRequest {
        customer: CustomerDetails {
            reference: "reference 11".into(),
            key_number: key_number.into(),
            name: "P334 Team".into(),
            address: "2 William Prance Road, Plymouth".into(),
        },
        document_id: "17".into(),
    }
}

fn company_item(name: &str) -> SearchNameItem {
    SearchNameItem {
        criterion: NameCriterion::LimitedCompany { name: name.into() },
        year_from: Some(1950),
        year_to: Some(2030),
    }
}

#[tokio::test]
#[ignore] // requires LC_DATABASE_URL
async fn cancelled_registrations_never_match() {
    let pool = test_pool().await;
    let stores = PgStores::new(pool.clone());
    let name = format!("CANCELTEST {}", nonce());

    let active = seed_registration(&pool, "party_name", &name, None, 2001, false).await;
    let cancelled = seed_registration(&pool, "party_name", &name, None, 2001, true).await;

    let simple = stores
        .register
        .registrations_by_name(&name)
        .await
        .expect("simple search");
    assert_eq!(simple, vec![active]);

    let full = stores
        .register
        .full_by_name(&name, &CountyFilter::All, 1990, 2010)
        .await
        .expect("full search");
    assert_eq!(full, vec![active]);
    assert!(!full.contains(&cancelled));
}

#[tokio::test]
#[ignore] // requires LC_DATABASE_URL
async fn county_filter_is_case_insensitive_and_all_is_unfiltered() {
    let pool = test_pool().await;
    let stores = PgStores::new(pool.clone());
    let name = format!("COUNTYTEST {}", nonce());

    let id = seed_registration(&pool, "company_name", &name, Some("Devon"), 2005, false).await;

    let unfiltered = stores
        .register
        .full_by_company(&name, &CountyFilter::All, 2000, 2010)
        .await
        .expect("unfiltered");
    assert_eq!(unfiltered, vec![id]);

    let matched = stores
        .register
        .full_by_company(
            &name,
            &CountyFilter::Named(vec!["devon".into()]),
            2000,
            2010,
        )
        .await
        .expect("county match");
    assert_eq!(matched, unfiltered);

    let elsewhere = stores
        .register
        .full_by_company(
            &name,
            &CountyFilter::Named(vec!["Cornwall".into()]),
            2000,
            2010,
        )
        .await
        .expect("county miss");
    assert!(elsewhere.is_empty());
}

#[tokio::test]
#[ignore] // requires LC_DATABASE_URL
async fn year_range_is_inclusive() {
    let pool = test_pool().await;
    let stores = PgStores::new(pool.clone());
    let name = format!("YEARTEST {}", nonce());

    let early = seed_registration(&pool, "party_name", &name, None, 1980, false).await;
    let late = seed_registration(&pool, "party_name", &name, None, 2000, false).await;

    let matched = stores
        .register
        .full_by_name(&name, &CountyFilter::All, 1990, 2000)
        .await
        .expect("full search");
    assert_eq!(matched, vec![late]);
    assert!(!matched.contains(&early));
}

#[tokio::test]
#[ignore] // requires LC_DATABASE_URL
async fn county_key_lookup_requires_exactly_one_row() {
    let pool = test_pool().await;
    let stores = PgStores::new(pool.clone());
    let name = format!("LOAMSHIRE {}", nonce());

    let missing = stores.county_keys.fetch_key(&name).await.unwrap_err();
    assert!(matches!(
        missing,
        SearchError::AmbiguousOrMissingKey { matches: 0, .. }
    ));

    sqlx::query("INSERT INTO county_search_keys (name, key) VALUES ($1, 'LOAM')")
        .bind(&name)
        .execute(&pool)
        .await
        .expect("key insert");
    let key = stores
        .county_keys
        .fetch_key(&name.to_lowercase())
        .await
        .expect("single key");
    assert_eq!(key, "LOAM");

    sqlx::query("INSERT INTO county_search_keys (name, key) VALUES ($1, 'LOA2')")
        .bind(&name)
        .execute(&pool)
        .await
        .expect("second key insert");
    let ambiguous = stores.county_keys.fetch_key(&name).await.unwrap_err();
    assert!(matches!(
        ambiguous,
        SearchError::AmbiguousOrMissingKey { matches: 2, .. }
    ));
}

#[tokio::test]
#[ignore] // requires LC_DATABASE_URL
async fn record_request_commits_all_rows_together() {
    let pool = test_pool().await;
    let stores = PgStores::new(pool.clone());
    let key_number = format!("K{}", nonce());

    let parameters = SearchParameters {
        search_type: SearchType::Full,
        counties: vec![],
        items: vec![company_item("Dartmoor Hotels"), company_item("Tamar Motors")],
    };
    let recorded = stores
        .searches
        .record_request(&request(&key_number), &parameters)
        .await
        .expect("record");

    assert_eq!(recorded.name_ids.len(), 2);

    let counties: Vec<String> =
        sqlx::query_scalar("SELECT counties FROM search_details WHERE id = $1")
            .bind(recorded.details_id)
            .fetch_one(&pool)
            .await
            .expect("details row");
    assert_eq!(counties, vec!["ALL".to_string()]);

    let name_count: i64 = sqlx::query_scalar("SELECT count(*) FROM search_name WHERE details_id = $1")
        .bind(recorded.details_id)
        .fetch_one(&pool)
        .await
        .expect("name count");
    assert_eq!(name_count, 2);
}

#[tokio::test]
#[ignore] // requires LC_DATABASE_URL
async fn record_request_rolls_back_on_a_mid_sequence_fault() {
    let pool = test_pool().await;
    let stores = PgStores::new(pool.clone());
    let key_number = format!("K{}", nonce());

    // The third item's surname exceeds the column limit, so its insert
    // fails after two name rows have already gone in.
    let oversize = "X".repeat(500);
    let parameters = SearchParameters {
        search_type: SearchType::Full,
        counties: vec![],
        items: vec![
            company_item("Dartmoor Hotels"),
            company_item("Tamar Motors"),
            SearchNameItem {
                criterion: NameCriterion::PrivateIndividual {
                    forenames: vec!["Jo".into()],
                    surname: oversize,
                },
                year_from: Some(1950),
                year_to: Some(2030),
            },
        ],
    };
    let err = stores
        .searches
        .record_request(&request(&key_number), &parameters)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Storage(_)));

    let request_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM request WHERE key_number = $1")
            .bind(&key_number)
            .fetch_one(&pool)
            .await
            .expect("request count");
    assert_eq!(request_count, 0);

    let orphan_count: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM search_name sn, search_details sd, request r \
         WHERE sn.details_id = sd.id AND sd.request_id = r.id AND r.key_number = $1",
    )
    .bind(&key_number)
    .fetch_one(&pool)
    .await
    .expect("orphan count");
    assert_eq!(orphan_count, 0);
}

#[tokio::test]
#[ignore] // requires LC_DATABASE_URL
async fn recorded_results_can_be_read_back() {
    let pool = test_pool().await;
    let stores = PgStores::new(pool.clone());
    let key_number = format!("K{}", nonce());

    let parameters = SearchParameters {
        search_type: SearchType::Full,
        counties: vec!["Devon".to_string()],
        items: vec![company_item("Dartmoor Hotels")],
    };
    let recorded = stores
        .searches
        .record_request(&request(&key_number), &parameters)
        .await
        .expect("record");

    let payload = serde_json::json!({"name_result": [7, 9], "name_id": recorded.name_ids[0]});
    stores
        .searches
        .record_result(
            recorded.request_id,
            recorded.details_id,
            recorded.name_ids[0],
            &payload,
        )
        .await
        .expect("record result");

    let all = stores.searches.read_all(false).await.expect("read back");
    let row = all
        .iter()
        .find(|r| r.request_id == recorded.request_id)
        .expect("recorded row present");
    assert_eq!(row.details_id, recorded.details_id);
    assert_eq!(row.name_id, recorded.name_ids[0]);
    assert_eq!(row.result, payload);
}
