use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use url::Url;

use artsy_core::ArtworkId;

use crate::iiif::{iiif_url, ImageSize};
use crate::{Artwork, FailureKind, ProviderError, SearchPage};

pub const DEFAULT_API_BASE: &str = "https://api.artic.edu/api/v1/";
pub const DEFAULT_IIIF_BASE: &str = "https://www.artic.edu/iiif/2/";
/// Largest page the search endpoint serves.
pub const MAX_PAGE_SIZE: u32 = 100;

const SEARCH_FIELDS: &[&str] = &[
    "id",
    "title",
    "artist_display",
    "date_display",
    "medium_display",
    "dimensions",
    "image_id",
    "thumbnail",
    "is_public_domain",
    "credit_line",
    "department_title",
    "artwork_type_title",
    "style_title",
    "classification_title",
    "place_of_origin",
    "description",
    "alt_image_ids",
];

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_base: String,
    pub iiif_base: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_image_bytes: u64,
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            iiif_base: DEFAULT_IIIF_BASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_image_bytes: 64 * 1024 * 1024,
            user_agent: concat!("artsy/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Source of artworks: paginated text search plus per-item image retrieval.
#[async_trait::async_trait]
pub trait ArtProvider: Send + Sync {
    async fn search(&self, query: &str, offset: u64, size: u32)
        -> Result<SearchPage, ProviderError>;

    async fn fetch_detail(&self, id: ArtworkId) -> Result<Artwork, ProviderError>;

    async fn download_image(
        &self,
        image_id: &str,
        size: ImageSize,
    ) -> Result<Vec<u8>, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    data: Vec<Artwork>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    data: Artwork,
}

/// HTTP client for the Art Institute of Chicago public API.
#[derive(Debug, Clone)]
pub struct ArticClient {
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl ArticClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|err| ProviderError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { settings, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        // `Url::join` drops the last segment of a base without a trailing slash.
        let base = if self.settings.api_base.ends_with('/') {
            self.settings.api_base.clone()
        } else {
            format!("{}/", self.settings.api_base)
        };
        Url::parse(&base)
            .and_then(|base| base.join(path))
            .map_err(|err| ProviderError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn get_bytes(&self, url: Url, max_bytes: u64) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ProviderError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ProviderError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ProviderError> {
        let body = self.get_bytes(url, self.settings.max_image_bytes).await?;
        serde_json::from_slice(&body)
            .map_err(|err| ProviderError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ArtProvider for ArticClient {
    async fn search(
        &self,
        query: &str,
        offset: u64,
        size: u32,
    ) -> Result<SearchPage, ProviderError> {
        let size = size.min(MAX_PAGE_SIZE);
        let mut url = self.endpoint("artworks/search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("size", &size.to_string())
            .append_pair("from", &offset.to_string())
            .append_pair("fields", &SEARCH_FIELDS.join(","));

        let envelope: SearchEnvelope = self.get_json(url).await?;
        Ok(SearchPage {
            artworks: envelope.data,
            total: envelope.pagination.total,
            offset: envelope.pagination.offset.unwrap_or(offset),
            limit: envelope.pagination.limit.unwrap_or(u64::from(size)),
        })
    }

    async fn fetch_detail(&self, id: ArtworkId) -> Result<Artwork, ProviderError> {
        let url = self.endpoint(&format!("artworks/{id}"))?;
        let envelope: DetailEnvelope = self.get_json(url).await?;
        Ok(envelope.data)
    }

    async fn download_image(
        &self,
        image_id: &str,
        size: ImageSize,
    ) -> Result<Vec<u8>, ProviderError> {
        let raw = iiif_url(&self.settings.iiif_base, image_id, size);
        let url = Url::parse(&raw)
            .map_err(|err| ProviderError::new(FailureKind::InvalidUrl, err.to_string()))?;
        self.get_bytes(url, self.settings.max_image_bytes).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        return ProviderError::new(FailureKind::Timeout, err.to_string());
    }
    ProviderError::new(FailureKind::Network, err.to_string())
}
