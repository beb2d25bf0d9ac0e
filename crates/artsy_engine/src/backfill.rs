use artsy_logging::{artsy_info, artsy_warn};

use crate::persist::{PersistError, StateStore};
use crate::provider::ArtProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackfillSummary {
    /// Saved artworks that lacked a description.
    pub missing: usize,
    pub updated: usize,
    /// Lookups that failed at the provider.
    pub failed: usize,
}

/// Fill in descriptions for saved artworks that were stored without one.
///
/// The state document is written once, and only if something changed.
pub async fn backfill_descriptions(
    store: &StateStore,
    provider: &dyn ArtProvider,
) -> Result<BackfillSummary, PersistError> {
    let mut session = store.load();
    let mut summary = BackfillSummary::default();

    for artwork in session
        .saved_artworks
        .iter_mut()
        .filter(|artwork| artwork.description.as_deref().map_or(true, str::is_empty))
    {
        summary.missing += 1;
        match provider.fetch_detail(artwork.id).await {
            Ok(detail) => match detail.description.filter(|d| !d.trim().is_empty()) {
                Some(description) => {
                    artsy_info!("Backfilled description for {} ({})", artwork.id, artwork.title);
                    artwork.description = Some(description);
                    summary.updated += 1;
                }
                None => artsy_info!("No description available for {}", artwork.id),
            },
            Err(err) => {
                artsy_warn!("Detail lookup for {} failed: {}", artwork.id, err);
                summary.failed += 1;
            }
        }
    }

    if summary.updated > 0 {
        store.save(&session)?;
    }
    Ok(summary)
}
