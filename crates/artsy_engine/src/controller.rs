use std::io;
use std::path::{Path, PathBuf};

use artsy_core::{
    display, event_payload, snapshot, update, ArtworkId, ArtworkView, CommandError, Effect,
    EventKind, EventMessage, Msg, Session, Snapshot, Transition,
};
use artsy_logging::{artsy_error, artsy_info, artsy_warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::broadcast::{Broadcaster, Subscription};
use crate::discover::{Candidate, DiscoverEngine, FetchOutcome};
use crate::images::ImageStore;
use crate::persist::{PersistError, StateStore};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("failed to persist session: {0}")]
    Persist(#[from] PersistError),
    #[error("image storage error: {0}")]
    Image(#[from] io::Error),
}

impl ControllerError {
    /// Short machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            ControllerError::Command(err) => err.reason(),
            ControllerError::Persist(_) | ControllerError::Image(_) => "internal",
        }
    }
}

/// Outcome of a committed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub session: Session,
    pub current_artwork: Option<ArtworkView>,
    pub event: Option<EventKind>,
}

impl Applied {
    /// Fields changed by the operation, as broadcast.
    pub fn payload(&self) -> Option<Value> {
        self.event
            .map(|kind| event_payload(kind, &self.session, self.current_artwork.as_ref()))
    }
}

struct Inner {
    candidate: Option<Candidate>,
    rng: StdRng,
}

/// Changes staged while running effects; applied only after the session has
/// been persisted.
#[derive(Default)]
struct Staged {
    /// `Some(slot)` once the candidate slot has been replaced.
    candidate: Option<Option<Candidate>>,
    /// `(temp, saved)` for a promoted candidate image.
    promoted: Option<(PathBuf, PathBuf)>,
    /// Temp images downloaded during this operation.
    fresh: Vec<PathBuf>,
    /// Files to delete once the new state is durable.
    obsolete: Vec<PathBuf>,
}

/// Single entry point for every session operation.
///
/// Operations are serialized behind one async mutex: each reloads the
/// session, applies the state machine, runs its effects, persists and
/// broadcasts before the next one starts. Discover fetches await network
/// I/O while holding the lock, so they hold off every other operation until
/// they finish.
pub struct SessionController {
    inner: Mutex<Inner>,
    store: StateStore,
    images: ImageStore,
    discover: DiscoverEngine,
    broadcaster: Broadcaster,
}

impl SessionController {
    pub fn new(
        store: StateStore,
        images: ImageStore,
        discover: DiscoverEngine,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                candidate: None,
                rng: StdRng::from_entropy(),
            }),
            store,
            images,
            discover,
            broadcaster,
        }
    }

    /// Use a deterministic playlist shuffle.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.inner.get_mut().rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock().await;
        let session = self.store.load();
        let candidate = inner.candidate.as_ref().map(Candidate::view);
        snapshot(&session, candidate.as_ref())
    }

    /// Attach a push subscriber; its first event is a `state` snapshot taken
    /// atomically with registration.
    pub async fn subscribe(&self) -> Subscription {
        let inner = self.inner.lock().await;
        let session = self.store.load();
        let candidate = inner.candidate.as_ref().map(Candidate::view);
        let current = artsy_core::current_artwork(&session, candidate.as_ref());
        let initial = EventMessage::new(
            EventKind::State,
            event_payload(EventKind::State, &session, current.as_ref()),
        );
        self.broadcaster.subscribe(&initial)
    }

    pub async fn set_mode(&self, mode: &str) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::SetMode(mode.to_string())).await
    }

    pub async fn set_timer(&self, seconds: Value) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::SetTimer(seconds)).await
    }

    pub async fn set_rotation(&self, rotation: Value) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::SetRotation(rotation)).await
    }

    pub async fn set_query(&self, query: &str) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::SetQuery(query.to_string())).await
    }

    pub async fn save_current_candidate(&self) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::SaveCandidate).await
    }

    pub async fn advance(&self) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::Next).await
    }

    pub async fn retreat(&self) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::Prev).await
    }

    pub async fn toggle_pause(&self) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::TogglePause).await
    }

    pub async fn delete_current_displayed(&self) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::DeleteCurrent).await
    }

    /// Idempotent bootstrap for process start and client attach. Does not broadcast.
    pub async fn initialize(&self) -> Result<Applied, ControllerError> {
        self.dispatch(Msg::Initialize).await
    }

    /// Path of the staged candidate's temp image.
    pub async fn temp_image(&self) -> Result<PathBuf, ControllerError> {
        let inner = self.inner.lock().await;
        inner
            .candidate
            .as_ref()
            .map(|candidate| candidate.image_path.clone())
            .filter(|path| path.is_file())
            .ok_or_else(|| CommandError::NotFound("No artwork staged".into()).into())
    }

    /// Path of a saved artwork's image.
    pub async fn saved_image(&self, id: ArtworkId) -> Result<PathBuf, ControllerError> {
        let _inner = self.inner.lock().await;
        let session = self.store.load();
        session
            .saved(id)
            .map(|artwork| artwork.image_path.clone())
            .filter(|path| path.is_file())
            .ok_or_else(|| CommandError::NotFound(format!("No saved image for {id}")).into())
    }

    async fn dispatch(&self, msg: Msg) -> Result<Applied, ControllerError> {
        let mut inner = self.inner.lock().await;
        let session = self.store.load();
        let staged_id = inner.candidate.as_ref().map(Candidate::id);
        let Transition {
            mut session,
            effects,
            event,
        } = update(session, msg, staged_id)?;

        let mut staged = Staged::default();
        for effect in effects {
            if let Err(err) = self
                .run_effect(&mut inner, &mut session, &mut staged, effect)
                .await
            {
                self.roll_back(&inner, staged);
                return Err(err);
            }
        }

        if let Err(err) = self.store.save(&session) {
            artsy_error!("Failed to persist session: {}", err);
            self.roll_back(&inner, staged);
            return Err(err.into());
        }
        self.commit(&mut inner, staged);

        let candidate = inner.candidate.as_ref().map(Candidate::view);
        let current_artwork = artsy_core::current_artwork(&session, candidate.as_ref());
        if let Some(kind) = event {
            let message = EventMessage::new(
                kind,
                event_payload(kind, &session, current_artwork.as_ref()),
            );
            self.broadcaster.publish(&message);
        }

        Ok(Applied {
            session,
            current_artwork,
            event,
        })
    }

    async fn run_effect(
        &self,
        inner: &mut Inner,
        session: &mut Session,
        staged: &mut Staged,
        effect: Effect,
    ) -> Result<(), ControllerError> {
        match effect {
            Effect::FetchCandidate => {
                let previous = current_candidate(inner, staged).map(|c| c.image_path.clone());
                if let Some(path) = previous {
                    if let Some(pos) = staged.fresh.iter().position(|p| *p == path) {
                        staged.fresh.remove(pos);
                        self.images.remove(&path);
                    } else {
                        staged.obsolete.push(path);
                    }
                }
                staged.candidate = Some(None);

                match self.discover.fetch_next(session).await {
                    FetchOutcome::Staged(candidate) => {
                        staged.fresh.push(candidate.image_path.clone());
                        staged.candidate = Some(Some(candidate));
                    }
                    FetchOutcome::Exhausted => {
                        artsy_info!("No artwork available for {:?}", session.search_query);
                    }
                }
            }
            Effect::PromoteCandidate => {
                let Some(candidate) = current_candidate(inner, staged).cloned() else {
                    return Err(CommandError::InvalidState("No artwork to save".into()).into());
                };
                let saved_path = self.images.promote(candidate.image_path())?;
                session
                    .saved_artworks
                    .push(candidate.to_saved(saved_path.clone()));
                staged.fresh.retain(|p| *p != candidate.image_path);
                staged.promoted = Some((candidate.image_path.clone(), saved_path));
                staged.candidate = Some(None);
            }
            Effect::ShufflePlaylist => display::shuffle(session, &mut inner.rng),
            Effect::RemoveImage(path) => staged.obsolete.push(path),
        }
        Ok(())
    }

    fn commit(&self, inner: &mut Inner, staged: Staged) {
        if let Some(slot) = staged.candidate {
            inner.candidate = slot;
        }
        let keep = inner.candidate.as_ref().map(Candidate::image_path);
        for path in staged.obsolete {
            if keep != Some(path.as_path()) {
                self.images.remove(&path);
            }
        }
    }

    fn roll_back(&self, inner: &Inner, staged: Staged) {
        if let Some((temp, saved)) = staged.promoted {
            if let Err(err) = self.images.demote(&saved, &temp) {
                artsy_error!("Failed to restore {:?} to {:?}: {}", saved, temp, err);
            }
        }
        let keep: Option<&Path> = inner.candidate.as_ref().map(Candidate::image_path);
        for path in staged.fresh {
            if keep != Some(path.as_path()) {
                self.images.remove(&path);
            } else {
                artsy_warn!("Kept {:?}; it still backs the staged artwork", path);
            }
        }
    }
}

/// The candidate as of this point in the operation: the staged replacement
/// if the slot was already changed, the committed one otherwise.
fn current_candidate<'a>(inner: &'a Inner, staged: &'a Staged) -> Option<&'a Candidate> {
    match &staged.candidate {
        Some(slot) => slot.as_ref(),
        None => inner.candidate.as_ref(),
    }
}
