//! Artsy core: session model, pure state machine and view-model helpers.
pub mod display;
mod effect;
mod error;
mod input;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::CommandError;
pub use input::{clamp_timer, coerce_int, normalize_query};
pub use msg::Msg;
pub use state::{
    ArtworkId, Mode, Rotation, SavedArtwork, Session, DEFAULT_QUERY, DEFAULT_TIMER_SECONDS,
    TIMER_MAX_SECONDS, TIMER_MIN_SECONDS,
};
pub use update::{update, Transition};
pub use view_model::{
    current_artwork, event_payload, saved_image_url, snapshot, ArtworkView, EventKind,
    EventMessage, Snapshot, TEMP_IMAGE_URL,
};
