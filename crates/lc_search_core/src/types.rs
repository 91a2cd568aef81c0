//! Core domain types for the land charges search engine.
//! These are pure value types — no sqlx, no broker dependencies.

// Enums here use `from_str() -> Option<Self>` instead of `FromStr` because
// they return None for unknown register values rather than an error.
#![allow(clippy::should_implement_trait)]

use serde::{Deserialize, Serialize};

// ── Name categories ──────────────────────────────────────────

/// Register name category — the discriminator stored in
/// `search_name.name_type` and carried through error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameCategory {
    PrivateIndividual,
    LimitedCompany,
    CountyCouncil,
    ParishCouncil,
    RuralCouncil,
    OtherCouncil,
    DevelopmentCorporation,
    ComplexName,
    NullComplexName,
    Other,
}

impl NameCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrivateIndividual => "Private Individual",
            Self::LimitedCompany => "Limited Company",
            Self::CountyCouncil => "County Council",
            Self::ParishCouncil => "Parish Council",
            Self::RuralCouncil => "Rural Council",
            Self::OtherCouncil => "Other Council",
            Self::DevelopmentCorporation => "Development Corporation",
            Self::ComplexName => "Complex Name",
            Self::NullComplexName => "Null Complex Name",
            Self::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Private Individual" => Some(Self::PrivateIndividual),
            "Limited Company" => Some(Self::LimitedCompany),
            "County Council" => Some(Self::CountyCouncil),
            "Parish Council" => Some(Self::ParishCouncil),
            "Rural Council" => Some(Self::RuralCouncil),
            "Other Council" => Some(Self::OtherCouncil),
            "Development Corporation" => Some(Self::DevelopmentCorporation),
            "Complex Name" => Some(Self::ComplexName),
            "Null Complex Name" => Some(Self::NullComplexName),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for NameCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Name criteria ────────────────────────────────────────────

/// One variation of a complex name, as held on the complex names index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexNameVariation {
    pub name: String,
    pub number: Option<i64>,
}

/// A typed search/registration name. Exactly one variant's fields are
/// populated per criterion; dispatch over this enum is always exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NameCriterion {
    #[serde(rename = "Private Individual")]
    PrivateIndividual {
        forenames: Vec<String>,
        surname: String,
    },
    #[serde(rename = "Limited Company")]
    LimitedCompany { name: String },
    #[serde(rename = "County Council")]
    CountyCouncil { name: String, area: String },
    #[serde(rename = "Parish Council")]
    ParishCouncil { name: String, area: String },
    #[serde(rename = "Rural Council")]
    RuralCouncil { name: String, area: String },
    #[serde(rename = "Other Council")]
    OtherCouncil { name: String, area: String },
    #[serde(rename = "Development Corporation")]
    DevelopmentCorporation { name: String },
    #[serde(rename = "Complex Name")]
    ComplexName {
        name: String,
        number: Option<i64>,
        variations: Vec<ComplexNameVariation>,
    },
    #[serde(rename = "Null Complex Name")]
    NullComplexName,
    #[serde(rename = "Other")]
    Other { name: String },
}

impl NameCriterion {
    pub fn category(&self) -> NameCategory {
        match self {
            Self::PrivateIndividual { .. } => NameCategory::PrivateIndividual,
            Self::LimitedCompany { .. } => NameCategory::LimitedCompany,
            Self::CountyCouncil { .. } => NameCategory::CountyCouncil,
            Self::ParishCouncil { .. } => NameCategory::ParishCouncil,
            Self::RuralCouncil { .. } => NameCategory::RuralCouncil,
            Self::OtherCouncil { .. } => NameCategory::OtherCouncil,
            Self::DevelopmentCorporation { .. } => NameCategory::DevelopmentCorporation,
            Self::ComplexName { .. } => NameCategory::ComplexName,
            Self::NullComplexName => NameCategory::NullComplexName,
            Self::Other { .. } => NameCategory::Other,
        }
    }

    /// The raw display name used by the bankruptcy-style exact lookup and
    /// by error reporting. Never canonicalized.
    pub fn search_text(&self) -> String {
        match self {
            Self::PrivateIndividual {
                forenames, surname, ..
            } => format!("{} {}", forenames.join(" "), surname),
            Self::LimitedCompany { name }
            | Self::CountyCouncil { name, .. }
            | Self::ParishCouncil { name, .. }
            | Self::RuralCouncil { name, .. }
            | Self::OtherCouncil { name, .. }
            | Self::DevelopmentCorporation { name }
            | Self::ComplexName { name, .. }
            | Self::Other { name } => name.clone(),
            Self::NullComplexName => String::new(),
        }
    }

    /// Check that every field the declared category requires is present.
    pub fn validate(&self) -> Result<(), crate::error::SearchError> {
        use crate::error::SearchError::MalformedCriterion;
        let missing = |field: &str| {
            Err(MalformedCriterion(format!(
                "category '{}' requires a non-empty {}",
                self.category(),
                field
            )))
        };
        match self {
            Self::PrivateIndividual { surname, .. } if surname.is_empty() => missing("surname"),
            Self::LimitedCompany { name }
            | Self::DevelopmentCorporation { name }
            | Self::ComplexName { name, .. }
            | Self::Other { name }
                if name.is_empty() =>
            {
                missing("name")
            }
            Self::CountyCouncil { name, area }
            | Self::ParishCouncil { name, area }
            | Self::RuralCouncil { name, area }
            | Self::OtherCouncil { name, area }
                if name.is_empty() || area.is_empty() =>
            {
                missing("name and area")
            }
            _ => Ok(()),
        }
    }

    /// Flatten into the legacy `search_name` row shape. Complex names keep
    /// their own name and number; variations are search-time data only.
    pub fn fields(&self) -> SearchNameFields {
        let mut fields = SearchNameFields::default();
        match self {
            Self::PrivateIndividual {
                forenames, surname, ..
            } => {
                fields.forenames = Some(forenames.join(" "));
                fields.surname = Some(surname.clone());
            }
            Self::LimitedCompany { name } => fields.company_name = Some(name.clone()),
            Self::CountyCouncil { name, area }
            | Self::ParishCouncil { name, area }
            | Self::RuralCouncil { name, area }
            | Self::OtherCouncil { name, area } => {
                fields.local_authority_name = Some(name.clone());
                fields.local_authority_area = Some(area.clone());
            }
            Self::DevelopmentCorporation { name } | Self::Other { name } => {
                fields.other_name = Some(name.clone())
            }
            Self::ComplexName { name, number, .. } => {
                fields.complex_name = Some(name.clone());
                fields.complex_number = *number;
            }
            Self::NullComplexName => {}
        }
        fields
    }
}

/// The flattened column set of a `search_name` row. Unpopulated columns
/// are NULL, exactly as the register stores them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchNameFields {
    pub forenames: Option<String>,
    pub surname: Option<String>,
    pub complex_name: Option<String>,
    pub complex_number: Option<i64>,
    pub company_name: Option<String>,
    pub local_authority_name: Option<String>,
    pub local_authority_area: Option<String>,
    pub other_name: Option<String>,
}

// ── Canonical keys ───────────────────────────────────────────

/// A legacy-compatible searchable name key: uppercase alphanumeric, or the
/// literal sentinel `"NULL KEY"` for an authority area that reduced to
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for CanonicalKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CanonicalKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Search requests ──────────────────────────────────────────

/// Which search workflow a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Full,
    Bankruptcy,
}

impl SearchType {
    /// Wire value stored in `search_details.type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Bankruptcy => "banks",
        }
    }

    /// `"full"` selects the full search; everything else takes the
    /// bankruptcy-style path, matching the register's dispatch.
    pub fn from_wire(s: &str) -> Self {
        if s == "full" {
            Self::Full
        } else {
            Self::Bankruptcy
        }
    }
}

/// Geographic restriction on a full search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountyFilter {
    All,
    Named(Vec<String>),
}

impl CountyFilter {
    /// An absent or empty county list means "no geographic restriction",
    /// as does the explicit `ALL` sentinel.
    pub fn normalize(counties: &[String]) -> Self {
        match counties.first() {
            None => Self::All,
            Some(first) if first == "ALL" => Self::All,
            Some(_) => Self::Named(counties.to_vec()),
        }
    }

    /// The legacy wire/persistence form: `{"ALL"}` or the explicit list.
    pub fn as_wire(&self) -> Vec<String> {
        match self {
            Self::All => vec!["ALL".to_string()],
            Self::Named(counties) => counties.clone(),
        }
    }
}

/// Customer metadata carried on an incoming application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub reference: String,
    pub key_number: String,
    pub name: String,
    pub address: String,
}

/// An incoming search application. Immutable once recorded; the
/// application type is fixed to `SEARCH` and the application date is
/// assigned at insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub customer: CustomerDetails,
    pub document_id: String,
}

/// One name criterion of a request, with its optional registration-year
/// range. The raw (not canonical) fields are what gets persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchNameItem {
    pub criterion: NameCriterion,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

/// The search parameters of a request: workflow, county restriction, and
/// the ordered name items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    pub search_type: SearchType,
    pub counties: Vec<String>,
    pub items: Vec<SearchNameItem>,
}

// ── Recording & results ──────────────────────────────────────

/// Generated identifiers from recording a request: one request row, one
/// details row, and one name row per item (`name_ids[i]` correlates with
/// `items[i]`). Returned explicitly rather than written back into the
/// caller's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub request_id: i32,
    pub details_id: i32,
    pub name_ids: Vec<i32>,
}

/// Matched registration ids for one name item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultPayload {
    /// Full-search result: the distinct matching registration ids.
    Registrations(Vec<i32>),
    /// Bankruptcy-style result: the searched name mapped to its matches.
    NamedRegistrations {
        name: String,
        registration_ids: Vec<i32>,
    },
}

/// One result per name item. Created after the matcher runs; never
/// mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameSearchResult {
    pub name_id: i32,
    pub payload: ResultPayload,
}

impl NameSearchResult {
    /// The persisted/broadcast record shape, matching the register's
    /// historical payloads: `{"name_result": [...], "name_id": n}` for a
    /// full search, `{"<name>": [...]}` for a bankruptcy-style search.
    pub fn to_record(&self) -> serde_json::Value {
        match &self.payload {
            ResultPayload::Registrations(ids) => serde_json::json!({
                "name_result": ids,
                "name_id": self.name_id,
            }),
            ResultPayload::NamedRegistrations {
                name,
                registration_ids,
            } => {
                let mut record = serde_json::Map::new();
                record.insert(name.clone(), serde_json::json!(registration_ids));
                serde_json::Value::Object(record)
            }
        }
    }
}

/// A previously recorded result row, as read back by the retriever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResult {
    pub request_id: i32,
    pub details_id: i32,
    pub name_id: i32,
    pub result: serde_json::Value,
}
