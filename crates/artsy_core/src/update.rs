use crate::{
    clamp_timer, coerce_int, display, normalize_query, ArtworkId, CommandError, Effect,
    EventKind, Mode, Msg, Rotation, Session,
};

/// Result of applying one message: the next session value, the effects the
/// controller must run, and the event to broadcast once they have run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
    pub event: Option<EventKind>,
}

impl Transition {
    fn new(session: Session, effects: Vec<Effect>, event: Option<EventKind>) -> Self {
        Self {
            session,
            effects,
            event,
        }
    }
}

/// Pure update function: applies a message to the session and returns the
/// resulting transition, or the reason the message was rejected.
///
/// `staged` is the id of the candidate currently staged in discover mode.
pub fn update(
    mut session: Session,
    msg: Msg,
    staged: Option<ArtworkId>,
) -> Result<Transition, CommandError> {
    let transition = match msg {
        Msg::SetMode(raw) => {
            let mode: Mode = raw.parse()?;
            session.mode = mode;
            session.paused = false;
            let mut effects = Vec::new();
            match mode {
                Mode::Discover if staged.is_none() => effects.push(Effect::FetchCandidate),
                Mode::Display if !session.saved_artworks.is_empty() => {
                    effects.push(Effect::ShufflePlaylist)
                }
                Mode::Discover | Mode::Display => {}
            }
            Transition::new(session, effects, Some(EventKind::ModeChange))
        }
        Msg::SetTimer(raw) => {
            let seconds = coerce_int(&raw)
                .ok_or_else(|| CommandError::InvalidArgument("Invalid timer value".into()))?;
            session.timer_seconds = clamp_timer(seconds);
            Transition::new(session, Vec::new(), Some(EventKind::TimerChange))
        }
        Msg::SetRotation(raw) => {
            let degrees = coerce_int(&raw)
                .ok_or_else(|| CommandError::InvalidArgument("Invalid rotation value".into()))?;
            session.rotation = Rotation::from_degrees(degrees);
            Transition::new(session, Vec::new(), Some(EventKind::RotationChange))
        }
        Msg::SetQuery(raw) => {
            let query = normalize_query(&raw);
            if query.is_empty() {
                return Err(CommandError::InvalidArgument(
                    "Query cannot be empty".into(),
                ));
            }
            session.search_query = query;
            session.current_search_offset = 0;
            let effects = if session.mode == Mode::Discover {
                vec![Effect::FetchCandidate]
            } else {
                Vec::new()
            };
            Transition::new(session, effects, Some(EventKind::QueryChange))
        }
        Msg::SaveCandidate => {
            if session.mode != Mode::Discover {
                return Err(CommandError::InvalidState(
                    "Can only save in discover mode".into(),
                ));
            }
            let id = staged
                .ok_or_else(|| CommandError::InvalidState("No artwork to save".into()))?;
            session.mark_seen(id);
            Transition::new(
                session,
                vec![Effect::PromoteCandidate, Effect::FetchCandidate],
                Some(EventKind::ArtworkSaved),
            )
        }
        Msg::Next => match session.mode {
            Mode::Discover => {
                if let Some(id) = staged {
                    session.mark_seen(id);
                }
                Transition::new(
                    session,
                    vec![Effect::FetchCandidate],
                    Some(EventKind::ArtworkChange),
                )
            }
            Mode::Display => {
                display::step(&mut session, true);
                Transition::new(session, Vec::new(), Some(EventKind::ArtworkChange))
            }
        },
        Msg::Prev => {
            if session.mode != Mode::Display {
                return Err(CommandError::InvalidState(
                    "Can only go back in display mode".into(),
                ));
            }
            display::step(&mut session, false);
            Transition::new(session, Vec::new(), Some(EventKind::ArtworkChange))
        }
        Msg::TogglePause => {
            session.paused = !session.paused;
            Transition::new(session, Vec::new(), Some(EventKind::PauseChange))
        }
        Msg::DeleteCurrent => {
            if session.mode != Mode::Display {
                return Err(CommandError::InvalidState(
                    "Can only delete in display mode".into(),
                ));
            }
            if session.display_history.is_empty() {
                return Err(CommandError::InvalidState("No artwork to delete".into()));
            }
            let effects = display::remove_current(&mut session)
                .map(|removed| vec![Effect::RemoveImage(removed.image_path)])
                .unwrap_or_default();
            Transition::new(session, effects, Some(EventKind::ArtworkDeleted))
        }
        Msg::Initialize => {
            let mut effects = Vec::new();
            match session.mode {
                Mode::Discover if staged.is_none() => effects.push(Effect::FetchCandidate),
                Mode::Display
                    if !session.saved_artworks.is_empty()
                        && session.display_history.is_empty() =>
                {
                    effects.push(Effect::ShufflePlaylist)
                }
                Mode::Discover | Mode::Display => {}
            }
            Transition::new(session, effects, None)
        }
    };

    Ok(transition)
}
