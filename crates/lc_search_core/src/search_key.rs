//! The searchable name key rules.
//!
//! On registration a "searchable name key" is derived and stored
//! (indexed) against the filing. The rules reproduce the legacy search
//! routine exactly — the legal position is "do what the existing service
//! does" — so that data synchronised back into the legacy system is
//! unchanged. Get this wrong and the downstream Portal service is
//! adversely impacted.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::SearchError;
use crate::ports::{CountyKeyStore, Result};
use crate::types::{CanonicalKey, NameCriterion};

/// Sentinel key for an authority area that reduces to the empty string.
pub const NULL_KEY: &str = "NULL KEY";

// ── Fixed lookup tables ──────────────────────────────────────

/// Connective words removed from company names after the leading/trailing
/// article pass.
const NOISE: &[&str] = &["AND", "OF", "FOR", "TO", "&"];

/// Canonical short form → every accepted spelling. Includes the Welsh
/// company designations and the three specific "-ies" plurals.
const COMMON_WORDS: &[(&str, &[&str])] = &[
    (
        "ASS",
        &[
            "ASS",
            "ASSOC",
            "ASSOCS",
            "ASSOCIATE",
            "ASSOCIATED",
            "ASSOCIATES",
            "ASSOCIATION",
            "ASSOCIATIONS",
        ],
    ),
    (
        "LD",
        &[
            "LD",
            "PUBLIC LIMITED COMPANY",
            "CWMNI CYFYNGEDIG CYHOEDDUS",
            "CWMNI CYF CYHOEDDUS",
            "LTD",
            "LIMITED",
            "CYFYNGEDIG",
            "CYF",
            "CCC",
            "C C C",
            "PLC",
            "P L C",
        ],
    ),
    (
        "SOC",
        &[
            "SOC", "SOCS", "SOCY", "SOCYS", "SOCIETY", "SOCIETYS", "SOCIETIES",
        ],
    ),
    ("ST", &["ST", "STREET", "SAINT"]),
    (
        "CO",
        &[
            "CO", "COS", "COY", "COMP", "COYS", "COMPS", "COMPANY", "COMPANIES",
        ],
    ),
    ("DR", &["DR", "DOC", "DOCTOR"]),
    ("BRO", &["BRO", "BROS", "BROTHER", "BROTHERS"]),
    ("AND", &["&", "AND"]),
    ("CHARITY", &["CHARITIES"]),
    ("PROPERTY", &["PROPERTIES"]),
    ("INDUSTRY", &["INDUSTRIES"]),
];

/// Words that lose their trailing S.
const S_WORDS: &[&str] = &[
    "BROKERS",
    "BUILDERS",
    "COLLEGES",
    "COMMISSIONERS",
    "CONSTRUCTIONS",
    "CONTRACTORS",
    "DECORATORS",
    "DEVELOPERS",
    "DEVELOPMENTS",
    "ENTERPRISES",
    "ESTATES",
    "GARAGES",
    "HOLDINGS",
    "HOTELS",
    "INVESTMENTS",
    "MOTORS",
    "PRODUCTIONS",
    "SCHOOLS",
    "SONS",
    "STORES",
    "TRUSTS",
    "WARDENS",
];

/// Phrases marking a name as "complex" (institutional/legal). Matched as
/// whole words or phrases, bounded by whitespace or string edges. The
/// COMMISIONER spelling is the legacy system's.
const COMPLEX_NAME_INDICATORS: &[&str] = &[
    "ARCHBISHOP",
    "ARCHDEACON",
    "AUTHORITY",
    "BISHOP",
    "BUILDING SOCIETY",
    "BUILDING SOC",
    "BUILDING SOCY",
    "CATHEDRAL",
    "CATHOLIC",
    "CHAPEL",
    "CHARITY",
    "CHARITIES",
    "CHURCH",
    "COLLEGE",
    "COLLEGES",
    "CONGREGATIONAL",
    "CO-OPERATIVE",
    "CO OPERATIVE",
    "COOPERATIVE",
    "CO-OP",
    "CO OP",
    "COOP",
    "COMMISIONER",
    "COMMISSIONERS",
    "COUNCIL",
    "DEAN",
    "DIOCESAN",
    "FELLOWSHIP",
    "FOUNDATION",
    "GOVERNOR",
    "GOVERNORS",
    "HOSPITAL",
    "INCORPORATED",
    "INC",
    "INCUMBENT",
    "MASTER",
    "MINISTER",
    "MINISTRY",
    "METHODIST",
    "RECTOR",
    "REGISTERED",
    "ROYAL",
    "SANATORIUM",
    "SCHOOL",
    "SCHOOLS",
    "STATE",
    "TRUST",
    "TRUSTS",
    "TRUSTEE",
    "TRUSTEES",
    "UNIVERSITY",
    "VICAR",
    "WARDEN",
    "WARDENS",
];

/// Local-authority abbreviations (SAINT, compass points, and the
/// SUPER/SUR of "Weston Super Mare" style names).
const LA_ABBREVIATIONS: &[(&str, &str)] = &[
    ("SAINT", "ST"),
    ("SAINTS", "ST"),
    ("NORTH", "N"),
    ("SOUTH", "S"),
    ("WEST", "W"),
    ("EAST", "E"),
    ("NORTHWEST", "NW"),
    ("SOUTHWEST", "SW"),
    ("NORTHEAST", "NE"),
    ("SOUTHEAST", "SE"),
    ("SUPER", "S"),
    ("SUR", "S"),
];

/// Company/legal-entity words that carry no key information. GOVENORS is
/// the legacy system's spelling.
const NON_KEY_WORDS: &[&str] = &[
    "BOARD",
    "GOVERNOR",
    "GOVENORS",
    "GUARDIAN",
    "GUARDIANS",
    "INCUMBENT",
    "INCORPORATED",
    "INC",
    "PROPRIETOR",
    "PROPRIETORS",
    "REGISTERED",
    "TRUSTEE",
    "TRUSTEES",
];

/// Local-authority connective words that carry no key information.
const LA_NON_KEY_WORDS: &[&str] = &[
    "AND", "&", "AT", "BY", "CITY", "CUM", "DE", "DU", "EN", "IN", "LA", "LE", "NEXT", "OF", "ON",
    "OVER", "OUT", "SEA", "THE", "U", "UNDER", "UPON", "WITH",
];

// ── Shared transforms ────────────────────────────────────────

/// Drop every character that is not an ASCII letter or digit.
pub fn strip_non_alphanumeric(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Replace each token found in the common-word table with its canonical
/// short form, and strip the trailing S from the listed plural words.
fn canonicalize_synonyms(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|word| {
            let mut replaced = word.clone();
            for (canonical, options) in COMMON_WORDS {
                if options.contains(&word.as_str()) {
                    replaced = (*canonical).to_string();
                }
            }
            if S_WORDS.contains(&word.as_str()) {
                replaced = word[..word.len() - 1].to_string();
            }
            replaced
        })
        .collect()
}

/// Drop a leading THE or MESSRS, a trailing THE, then every remaining
/// noise word.
fn strip_noise(mut words: Vec<String>) -> Vec<String> {
    if matches!(words.first(), Some(w) if w == "THE" || w == "MESSRS") {
        words.remove(0);
    }
    if matches!(words.last(), Some(w) if w == "THE") {
        words.pop();
    }
    words.retain(|word| !NOISE.contains(&word.as_str()));
    words
}

/// Remove every token present in the given stop-word list.
fn strip_listed(words: Vec<String>, stoplist: &[&str]) -> Vec<String> {
    words
        .into_iter()
        .filter(|word| !stoplist.contains(&word.as_str()))
        .collect()
}

/// Replace tokens found in the abbreviation table.
fn apply_abbreviations(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|word| {
            match LA_ABBREVIATIONS
                .iter()
                .find(|(full, _)| *full == word.as_str())
            {
                Some((_, abbreviation)) => (*abbreviation).to_string(),
                None => word,
            }
        })
        .collect()
}

// ── Per-category keys ────────────────────────────────────────

/// The private-individual key is not used by the synchroniser — sync
/// recreates it and keeps the lost detail in the legacy hex encoding.
fn private_individual_key(forenames: &[String], surname: &str) -> CanonicalKey {
    let name_text = format!("{}{}", forenames.concat(), surname);
    CanonicalKey::from(strip_non_alphanumeric(&name_text.to_uppercase()))
}

fn limited_company_key(company: &str) -> CanonicalKey {
    let words: Vec<String> = company
        .to_uppercase()
        .split(' ')
        .map(str::to_string)
        .collect();
    let words = canonicalize_synonyms(words);
    let words = strip_noise(words);
    let words = strip_listed(words, NON_KEY_WORDS);
    CanonicalKey::from(strip_non_alphanumeric(&words.join(" ")))
}

fn local_authority_key(area: &str) -> CanonicalKey {
    let words: Vec<String> = area.to_uppercase().split(' ').map(str::to_string).collect();
    let words = strip_listed(words, LA_NON_KEY_WORDS);
    let words = apply_abbreviations(words);
    let key = strip_non_alphanumeric(&words.join(" "));
    if key.is_empty() {
        CanonicalKey::from(NULL_KEY)
    } else {
        CanonicalKey::from(key)
    }
}

/// Derive the searchable name key for a criterion.
///
/// Pure and total for every category except County Council, which is
/// resolved through the county key lookup and fails with
/// `AmbiguousOrMissingKey` on anything but exactly one row, and the
/// categories whose legacy rules are still undocumented, which fail with
/// `UnimplementedCategory`.
pub async fn derive_key(
    criterion: &NameCriterion,
    counties: &dyn CountyKeyStore,
) -> Result<CanonicalKey> {
    match criterion {
        NameCriterion::PrivateIndividual {
            forenames, surname, ..
        } => Ok(private_individual_key(forenames, surname)),
        NameCriterion::LimitedCompany { name } => Ok(limited_company_key(name)),
        NameCriterion::CountyCouncil { area, .. } => {
            counties.fetch_key(area).await.map(CanonicalKey::from)
        }
        NameCriterion::ParishCouncil { area, .. }
        | NameCriterion::RuralCouncil { area, .. }
        | NameCriterion::OtherCouncil { area, .. } => Ok(local_authority_key(area)),
        NameCriterion::DevelopmentCorporation { name } => Ok(local_authority_key(name)),
        NameCriterion::Other { .. }
        | NameCriterion::ComplexName { .. }
        | NameCriterion::NullComplexName => {
            Err(SearchError::UnimplementedCategory(criterion.category()))
        }
    }
}

// ── Classification primitives ────────────────────────────────

/// Count the words of a tokenized name. A maximal run of adjacent
/// single-character tokens counts as one word: "B O F HOWARD" is a
/// two-word name, not four.
pub fn word_count<S: AsRef<str>>(words: &[S]) -> usize {
    let mut count = 0;
    let mut previous_was_initial = false;
    for word in words {
        if word.as_ref().len() > 1 {
            count += 1;
            previous_was_initial = false;
        } else {
            if !previous_was_initial {
                count += 1;
            }
            previous_was_initial = true;
        }
    }
    count
}

fn indicator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let phrases = COMPLEX_NAME_INDICATORS
            .iter()
            .map(|phrase| regex::escape(phrase))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(^|\s)({phrases})(\s|$)")).expect("indicator pattern is valid")
    })
}

/// True iff any complex-name indicator phrase occurs in the (uppercased)
/// name as a whole word or phrase, bounded by whitespace or string edges.
pub fn contains_complex_indicators(name: &str) -> bool {
    indicator_pattern().is_match(name)
}
