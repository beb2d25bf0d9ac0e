use std::path::{Path, PathBuf};
use std::sync::Arc;

use artsy_core::{ArtworkId, ArtworkView, SavedArtwork, Session, TEMP_IMAGE_URL};
use artsy_logging::{artsy_debug, artsy_info, artsy_warn};

use crate::iiif::ImageSize;
use crate::images::ImageStore;
use crate::provider::ArtProvider;
use crate::Artwork;

/// Results requested per search call.
pub const PAGE_SIZE: u32 = 20;
/// Pages scanned per fetch before giving up.
pub const MAX_ATTEMPTS: usize = 10;

/// The staged, not-yet-saved artwork and its downloaded temp image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub artwork: Artwork,
    pub image_path: PathBuf,
}

impl Candidate {
    pub fn id(&self) -> ArtworkId {
        self.artwork.id
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn view(&self) -> ArtworkView {
        ArtworkView {
            id: self.artwork.id,
            title: self.artwork.title.clone(),
            artist_display: self.artwork.artist_display.clone(),
            date_display: self.artwork.date_display.clone(),
            place_of_origin: self.artwork.place_of_origin.clone(),
            description: self.artwork.description.clone(),
            image_url: Some(TEMP_IMAGE_URL.to_string()),
        }
    }

    pub fn to_saved(&self, image_path: PathBuf) -> SavedArtwork {
        SavedArtwork {
            id: self.artwork.id,
            title: self.artwork.title.clone(),
            artist_display: self.artwork.artist_display.clone(),
            date_display: self.artwork.date_display.clone(),
            place_of_origin: self.artwork.place_of_origin.clone(),
            image_path,
            description: self.artwork.description.clone().filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Staged(Candidate),
    /// Nothing available for the current query right now.
    Exhausted,
}

/// Walks search result pages for the session's query and stages the first
/// unseen artwork whose image downloads successfully.
pub struct DiscoverEngine {
    provider: Arc<dyn ArtProvider>,
    images: ImageStore,
    image_size: ImageSize,
}

impl DiscoverEngine {
    pub fn new(provider: Arc<dyn ArtProvider>, images: ImageStore, image_size: ImageSize) -> Self {
        Self {
            provider,
            images,
            image_size,
        }
    }

    /// Advances `session.current_search_offset` past pages with nothing
    /// usable and resets it to 0 when the provider runs out of results.
    /// Provider failures end the fetch as [`FetchOutcome::Exhausted`].
    pub async fn fetch_next(&self, session: &mut Session) -> FetchOutcome {
        let query = session.search_query.clone();
        let mut offset = session.current_search_offset;

        for attempt in 0..MAX_ATTEMPTS {
            let page = match self.provider.search(&query, offset, PAGE_SIZE).await {
                Ok(page) => page,
                Err(err) => {
                    artsy_warn!("Search for {:?} at offset {} failed: {}", query, offset, err);
                    return FetchOutcome::Exhausted;
                }
            };

            if page.artworks.is_empty() {
                artsy_info!("No more results for {:?}; rewinding offset", query);
                session.current_search_offset = 0;
                return FetchOutcome::Exhausted;
            }

            for artwork in page.artworks {
                if session.has_seen(artwork.id) {
                    continue;
                }
                let Some(image_id) = artwork.image_id.clone() else {
                    continue;
                };
                if let Some(image_path) = self.stage_image(artwork.id, &image_id).await {
                    artsy_debug!(
                        "Staged artwork {} from offset {} (attempt {})",
                        artwork.id,
                        offset,
                        attempt + 1
                    );
                    return FetchOutcome::Staged(Candidate {
                        artwork,
                        image_path,
                    });
                }
            }

            offset += u64::from(PAGE_SIZE);
            session.current_search_offset = offset;
        }

        artsy_info!(
            "Gave up on {:?} after {} pages without a usable artwork",
            query,
            MAX_ATTEMPTS
        );
        FetchOutcome::Exhausted
    }

    async fn stage_image(&self, artwork_id: ArtworkId, image_id: &str) -> Option<PathBuf> {
        let bytes = match self.provider.download_image(image_id, self.image_size).await {
            Ok(bytes) => bytes,
            Err(err) => {
                artsy_warn!("Error downloading artwork {}: {}", artwork_id, err);
                return None;
            }
        };
        match self.images.write_temp(artwork_id, image_id, &bytes).await {
            Ok(path) => Some(path),
            Err(err) => {
                artsy_warn!("Error storing image for artwork {}: {}", artwork_id, err);
                None
            }
        }
    }
}
