use serde::Serialize;
use serde_json::{json, Value};

use crate::{display, ArtworkId, Mode, Rotation, SavedArtwork, Session};

pub const TEMP_IMAGE_URL: &str = "/api/image/temp";

pub fn saved_image_url(id: ArtworkId) -> String {
    format!("/api/image/saved/{id}")
}

/// Public view of the artwork currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtworkView {
    pub id: ArtworkId,
    pub title: String,
    pub artist_display: Option<String>,
    pub date_display: Option<String>,
    pub place_of_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl From<&SavedArtwork> for ArtworkView {
    fn from(artwork: &SavedArtwork) -> Self {
        Self {
            id: artwork.id,
            title: artwork.title.clone(),
            artist_display: artwork.artist_display.clone(),
            date_display: artwork.date_display.clone(),
            place_of_origin: artwork.place_of_origin.clone(),
            description: artwork.description.clone(),
            image_url: Some(saved_image_url(artwork.id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub timer_seconds: u32,
    pub search_query: String,
    pub paused: bool,
    pub rotation: Rotation,
    pub saved_count: usize,
    pub current_artwork: Option<ArtworkView>,
}

/// Artwork to show: the staged candidate in discover mode, the playlist
/// entry under the cursor in display mode.
pub fn current_artwork(session: &Session, candidate: Option<&ArtworkView>) -> Option<ArtworkView> {
    match session.mode {
        Mode::Discover => candidate.cloned(),
        Mode::Display => display::current_view(session).map(ArtworkView::from),
    }
}

pub fn snapshot(session: &Session, candidate: Option<&ArtworkView>) -> Snapshot {
    Snapshot {
        mode: session.mode,
        timer_seconds: session.timer_seconds,
        search_query: session.search_query.clone(),
        paused: session.paused,
        rotation: session.rotation,
        saved_count: session.saved_count(),
        current_artwork: current_artwork(session, candidate),
    }
}

/// Kinds of push notification sent to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Full snapshot, sent once when a subscriber attaches.
    State,
    ModeChange,
    TimerChange,
    RotationChange,
    QueryChange,
    ArtworkSaved,
    ArtworkChange,
    PauseChange,
    ArtworkDeleted,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::State => "state",
            EventKind::ModeChange => "mode_change",
            EventKind::TimerChange => "timer_change",
            EventKind::RotationChange => "rotation_change",
            EventKind::QueryChange => "query_change",
            EventKind::ArtworkSaved => "artwork_saved",
            EventKind::ArtworkChange => "artwork_change",
            EventKind::PauseChange => "pause_change",
            EventKind::ArtworkDeleted => "artwork_deleted",
        }
    }
}

/// Wire shape of a push notification: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl EventMessage {
    pub fn new(kind: EventKind, data: Value) -> Self {
        Self {
            kind,
            data: Some(data),
        }
    }
}

/// Fields changed by an event, as broadcast to subscribers.
pub fn event_payload(kind: EventKind, session: &Session, current: Option<&ArtworkView>) -> Value {
    match kind {
        EventKind::State => {
            let snapshot = Snapshot {
                mode: session.mode,
                timer_seconds: session.timer_seconds,
                search_query: session.search_query.clone(),
                paused: session.paused,
                rotation: session.rotation,
                saved_count: session.saved_count(),
                current_artwork: current.cloned(),
            };
            serde_json::to_value(snapshot).unwrap_or(Value::Null)
        }
        EventKind::ModeChange => json!({
            "mode": session.mode,
            "current_artwork": current,
        }),
        EventKind::TimerChange => json!({ "timer_seconds": session.timer_seconds }),
        EventKind::RotationChange => json!({ "rotation": session.rotation }),
        EventKind::QueryChange => json!({
            "search_query": session.search_query,
            "current_artwork": current,
        }),
        EventKind::ArtworkSaved | EventKind::ArtworkDeleted => json!({
            "saved_count": session.saved_count(),
            "current_artwork": current,
        }),
        EventKind::ArtworkChange => json!({ "current_artwork": current }),
        EventKind::PauseChange => json!({ "paused": session.paused }),
    }
}
