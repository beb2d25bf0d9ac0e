use std::path::PathBuf;

/// Side effects requested by [`crate::update`], executed in order by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the staged candidate with the next unseen artwork for the
    /// session's query. Any existing candidate is discarded first.
    FetchCandidate,
    /// Move the candidate's temp image into permanent storage and append it
    /// to the saved artworks.
    PromoteCandidate,
    /// Reshuffle the display playlist from the saved artworks.
    ShufflePlaylist,
    /// Delete a saved image file once the new state is durable.
    RemoveImage(PathBuf),
}
