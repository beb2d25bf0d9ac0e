use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{clamp_timer, CommandError};

pub type ArtworkId = u64;

pub const TIMER_MIN_SECONDS: u32 = 5;
pub const TIMER_MAX_SECONDS: u32 = 300;
pub const DEFAULT_TIMER_SECONDS: u32 = 30;
pub const DEFAULT_QUERY: &str = "impressionism";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Discover,
    Display,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Discover => "discover",
            Mode::Display => "display",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discover" => Ok(Mode::Discover),
            "display" => Ok(Mode::Display),
            _ => Err(CommandError::InvalidArgument("Invalid mode".into())),
        }
    }
}

/// Display rotation in degrees. Unsupported angles collapse to `Zero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u16")]
pub enum Rotation {
    #[default]
    Zero,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees {
            90 => Rotation::Quarter,
            180 => Rotation::Half,
            270 => Rotation::ThreeQuarter,
            _ => Rotation::Zero,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Zero => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }
}

impl From<i64> for Rotation {
    fn from(degrees: i64) -> Self {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// An artwork the user kept, with its image stored on local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedArtwork {
    pub id: ArtworkId,
    pub title: String,
    #[serde(default)]
    pub artist_display: Option<String>,
    #[serde(default)]
    pub date_display: Option<String>,
    #[serde(default)]
    pub place_of_origin: Option<String>,
    pub image_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The single persisted session record.
///
/// Every field has a default, so documents written by older versions (or
/// edited by hand) load with the missing keys backfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub mode: Mode,
    pub timer_seconds: u32,
    pub search_query: String,
    pub paused: bool,
    pub rotation: Rotation,
    pub seen_artwork_ids: BTreeSet<ArtworkId>,
    pub saved_artworks: Vec<SavedArtwork>,
    pub current_search_offset: u64,
    pub display_history: Vec<ArtworkId>,
    pub display_index: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            mode: Mode::Discover,
            timer_seconds: DEFAULT_TIMER_SECONDS,
            search_query: DEFAULT_QUERY.to_string(),
            paused: false,
            rotation: Rotation::Zero,
            seen_artwork_ids: BTreeSet::new(),
            saved_artworks: Vec::new(),
            current_search_offset: 0,
            display_history: Vec::new(),
            display_index: 0,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, id: ArtworkId) -> bool {
        self.seen_artwork_ids.contains(&id)
    }

    pub fn mark_seen(&mut self, id: ArtworkId) {
        self.seen_artwork_ids.insert(id);
    }

    pub fn saved(&self, id: ArtworkId) -> Option<&SavedArtwork> {
        self.saved_artworks.iter().find(|artwork| artwork.id == id)
    }

    pub fn saved_count(&self) -> usize {
        self.saved_artworks.len()
    }

    /// Pull hand-edited or legacy values back into range.
    pub fn normalize(&mut self) {
        self.timer_seconds = clamp_timer(i64::from(self.timer_seconds));
    }
}
