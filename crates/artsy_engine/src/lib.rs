//! Artsy engine: museum API client, persistence and the session controller.
mod backfill;
mod broadcast;
mod controller;
mod discover;
mod iiif;
mod images;
mod persist;
mod provider;
mod types;

pub use backfill::{backfill_descriptions, BackfillSummary};
pub use broadcast::{Broadcaster, SubscriberId, Subscription};
pub use controller::{Applied, ControllerError, SessionController};
pub use discover::{Candidate, DiscoverEngine, FetchOutcome, MAX_ATTEMPTS, PAGE_SIZE};
pub use iiif::{iiif_url, ImageSize, ParseImageSizeError};
pub use images::{ImageStore, SAVED_DIRNAME, TEMP_DIRNAME};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StateStore, STATE_FILENAME};
pub use provider::{
    ArtProvider, ArticClient, ProviderSettings, DEFAULT_API_BASE, DEFAULT_IIIF_BASE,
    MAX_PAGE_SIZE,
};
pub use types::{Artwork, FailureKind, ProviderError, SearchPage};
