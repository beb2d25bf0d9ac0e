use std::fmt;

use artsy_core::ArtworkId;
use serde::{Deserialize, Deserializer};

/// One artwork record as returned by the museum API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Artwork {
    #[serde(default)]
    pub id: ArtworkId,
    #[serde(default = "untitled", deserialize_with = "title_or_untitled")]
    pub title: String,
    #[serde(default)]
    pub artist_display: Option<String>,
    #[serde(default)]
    pub date_display: Option<String>,
    #[serde(default)]
    pub medium_display: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_public_domain: bool,
    #[serde(default)]
    pub credit_line: Option<String>,
    #[serde(default)]
    pub department_title: Option<String>,
    #[serde(default)]
    pub artwork_type_title: Option<String>,
    #[serde(default)]
    pub style_title: Option<String>,
    #[serde(default)]
    pub classification_title: Option<String>,
    #[serde(default)]
    pub place_of_origin: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alt_image_ids: Vec<String>,
}

fn untitled() -> String {
    "Untitled".to_string()
}

fn title_or_untitled<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(untitled))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchPage {
    pub artworks: Vec<Artwork>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl SearchPage {
    pub fn has_more(&self) -> bool {
        self.offset + (self.artworks.len() as u64) < self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
