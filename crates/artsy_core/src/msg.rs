use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Switch between discover and display (raw mode name from the client).
    SetMode(String),
    /// Slideshow interval; coerced to an integer and clamped.
    SetTimer(Value),
    /// Display rotation in degrees.
    SetRotation(Value),
    /// New search text for discover mode.
    SetQuery(String),
    /// Keep the staged candidate.
    SaveCandidate,
    /// Dislike in discover mode, skip forward in display mode.
    Next,
    /// Step back in display mode.
    Prev,
    TogglePause,
    /// Remove the artwork currently shown in display mode.
    DeleteCurrent,
    /// Startup / client attach bootstrap.
    Initialize,
}
