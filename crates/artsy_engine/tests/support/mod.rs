#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use artsy_core::ArtworkId;
use artsy_engine::{
    ArtProvider, Artwork, Broadcaster, DiscoverEngine, FailureKind, ImageSize, ImageStore,
    ProviderError, SearchPage, SessionController, StateStore,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(artsy_logging::initialize_for_tests);
}

pub fn artwork(id: ArtworkId, image: bool) -> Artwork {
    Artwork {
        id,
        title: format!("Artwork {id}"),
        artist_display: Some(format!("Artist {id}")),
        date_display: Some("1890".to_string()),
        place_of_origin: Some("France".to_string()),
        image_id: image.then(|| format!("img{id}")),
        ..Artwork::default()
    }
}

/// Page of `count` image-bearing artworks with consecutive ids.
pub fn page(first_id: ArtworkId, count: u64) -> Vec<Artwork> {
    (first_id..first_id + count).map(|id| artwork(id, true)).collect()
}

/// Scripted provider: pages keyed by `(query, offset)`, everything else empty.
#[derive(Default)]
pub struct FakeProvider {
    pages: Mutex<HashMap<(String, u64), Vec<Artwork>>>,
    details: Mutex<BTreeMap<ArtworkId, Artwork>>,
    failing_images: Mutex<BTreeSet<String>>,
    search_fails: Mutex<bool>,
    pub searches: Mutex<Vec<(String, u64, u32)>>,
    pub downloads: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_page(&self, query: &str, offset: u64, artworks: Vec<Artwork>) {
        self.pages
            .lock()
            .unwrap()
            .insert((query.to_string(), offset), artworks);
    }

    pub fn with_detail(&self, artwork: Artwork) {
        self.details.lock().unwrap().insert(artwork.id, artwork);
    }

    pub fn fail_image(&self, image_id: &str) {
        self.failing_images
            .lock()
            .unwrap()
            .insert(image_id.to_string());
    }

    pub fn fail_searches(&self) {
        *self.search_fails.lock().unwrap() = true;
    }

    pub fn search_offsets(&self) -> Vec<u64> {
        self.searches
            .lock()
            .unwrap()
            .iter()
            .map(|(_, offset, _)| *offset)
            .collect()
    }
}

#[async_trait::async_trait]
impl ArtProvider for FakeProvider {
    async fn search(
        &self,
        query: &str,
        offset: u64,
        size: u32,
    ) -> Result<SearchPage, ProviderError> {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), offset, size));
        if *self.search_fails.lock().unwrap() {
            return Err(ProviderError {
                kind: FailureKind::HttpStatus(503),
                message: "unavailable".to_string(),
            });
        }
        let artworks = self
            .pages
            .lock()
            .unwrap()
            .get(&(query.to_string(), offset))
            .cloned()
            .unwrap_or_default();
        Ok(SearchPage {
            total: offset + artworks.len() as u64,
            offset,
            limit: u64::from(size),
            artworks,
        })
    }

    async fn fetch_detail(&self, id: ArtworkId) -> Result<Artwork, ProviderError> {
        self.details
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ProviderError {
                kind: FailureKind::HttpStatus(404),
                message: "not found".to_string(),
            })
    }

    async fn download_image(
        &self,
        image_id: &str,
        _size: ImageSize,
    ) -> Result<Vec<u8>, ProviderError> {
        self.downloads.lock().unwrap().push(image_id.to_string());
        if self.failing_images.lock().unwrap().contains(image_id) {
            return Err(ProviderError {
                kind: FailureKind::Timeout,
                message: "slow".to_string(),
            });
        }
        Ok(format!("jpeg:{image_id}").into_bytes())
    }
}

pub fn controller(data_dir: &Path, provider: Arc<FakeProvider>) -> SessionController {
    let images = ImageStore::new(data_dir);
    let discover = DiscoverEngine::new(provider, images.clone(), ImageSize::Max);
    SessionController::new(
        StateStore::new(data_dir),
        images,
        discover,
        Broadcaster::new(),
    )
    .with_seed(42)
}
