//! Display playlist: a shuffled permutation of the saved artwork ids plus a
//! wrapping cursor into it.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{SavedArtwork, Session};

/// Replace the playlist with a uniformly random permutation of the saved ids
/// and rewind the cursor.
pub fn shuffle<R: Rng + ?Sized>(session: &mut Session, rng: &mut R) {
    let mut ids: Vec<_> = session.saved_artworks.iter().map(|a| a.id).collect();
    ids.shuffle(rng);
    session.display_history = ids;
    session.display_index = 0;
}

/// Artwork under the cursor, if the playlist is non-empty.
pub fn current_view(session: &Session) -> Option<&SavedArtwork> {
    let len = session.display_history.len();
    if len == 0 {
        return None;
    }
    let id = session.display_history[session.display_index % len];
    session.saved(id)
}

/// Move the cursor one step forward or back, wrapping at both ends.
pub fn step(session: &mut Session, forward: bool) {
    let len = session.display_history.len();
    if len == 0 {
        return;
    }
    let index = session.display_index % len;
    session.display_index = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
}

/// Remove the artwork under the cursor from both the playlist and the saved
/// list. The cursor keeps its position, normalized to the shorter playlist.
pub fn remove_current(session: &mut Session) -> Option<SavedArtwork> {
    let len = session.display_history.len();
    if len == 0 {
        return None;
    }
    let id = session.display_history.remove(session.display_index % len);
    let removed = session
        .saved_artworks
        .iter()
        .position(|artwork| artwork.id == id)
        .map(|pos| session.saved_artworks.remove(pos));

    let remaining = session.display_history.len();
    session.display_index = if remaining == 0 {
        0
    } else {
        session.display_index % remaining
    };
    removed
}
