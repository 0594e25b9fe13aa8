use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use typed_builder::TypedBuilder;

/// Identity of a stored [`UrlMapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingId(i64);

impl MappingId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// The id following this one, used when the store assigns ids.
    ///
    /// Returns `None` once the id space is exhausted.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl From<i64> for MappingId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for MappingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An association between an original URL and its short token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMapping {
    pub id: MappingId,
    /// The destination address.
    pub original_url: String,
    /// The short token. Unique across all live mappings.
    pub shortened_url: String,
}

/// A candidate mapping submitted for creation.
///
/// The id is optional; stores assign one when it is absent.
///
/// ```
/// use shorten_core::NewMapping;
///
/// let candidate = NewMapping::builder()
///     .original_url("https://example.com")
///     .shortened_url("abc123")
///     .build();
/// assert!(candidate.id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct NewMapping {
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub id: Option<MappingId>,
    #[builder(setter(into))]
    pub original_url: String,
    #[builder(setter(into))]
    pub shortened_url: String,
}

impl NewMapping {
    /// Checks that both fields carry a value.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("original_url", &self.original_url)?;
        require_non_empty("shortened_url", &self.shortened_url)
    }

    /// Materializes the candidate under the given id.
    pub fn into_mapping(self, id: MappingId) -> UrlMapping {
        UrlMapping {
            id,
            original_url: self.original_url,
            shortened_url: self.shortened_url,
        }
    }
}

/// New values for an existing mapping. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct MappingUpdate {
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub original_url: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub shortened_url: Option<String>,
}

impl MappingUpdate {
    /// Checks that every provided value is non-empty.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.original_url {
            require_non_empty("original_url", url)?;
        }
        if let Some(token) = &self.shortened_url {
            require_non_empty("shortened_url", token)?;
        }
        Ok(())
    }

    /// Writes the provided values onto `mapping`.
    pub fn apply_to(&self, mapping: &mut UrlMapping) {
        if let Some(url) = &self.original_url {
            mapping.original_url.clone_from(url);
        }
        if let Some(token) = &self.shortened_url {
            mapping.shortened_url.clone_from(token);
        }
    }
}

impl From<NewMapping> for MappingUpdate {
    fn from(candidate: NewMapping) -> Self {
        Self {
            original_url: Some(candidate.original_url),
            shortened_url: Some(candidate.shortened_url),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}
