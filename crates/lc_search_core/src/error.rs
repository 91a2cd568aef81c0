use thiserror::Error;

use crate::types::NameCategory;

#[derive(Debug, Error)]
pub enum SearchError {
    /// County key lookup matched zero rows or more than one row.
    /// Never resolved silently — an ambiguous mapping would corrupt the
    /// data synchronised back into the legacy system.
    #[error("county key lookup for '{name}' matched {matches} row(s)")]
    AmbiguousOrMissingKey { name: String, matches: usize },

    /// Key derivation for this category is not implemented; the legacy
    /// VARNAM rules for it are still undocumented.
    #[error("name key derivation not implemented for category '{0}'")]
    UnimplementedCategory(NameCategory),

    /// A required field is absent or empty for the declared category.
    #[error("malformed criterion: {0}")]
    MalformedCriterion(String),

    #[error("storage: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("publish: {0}")]
    Publish(#[source] anyhow::Error),
}
