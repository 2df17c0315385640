//! Shared types for the countdown display

use serde::Deserialize;

/// Coarse screen region a tap falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerZone {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Middle,
}

impl CornerZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopRight => "top_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomRight => "bottom_right",
            Self::Middle => "middle",
        }
    }
}

impl std::fmt::Display for CornerZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer position in logical surface pixels (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Logical surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// Interaction state of the display loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Run,
    SetVisit,
    /// Terminal: the outer loop exits
    Quit,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::SetVisit => "set_visit",
            Self::Quit => "quit",
        }
    }
}

/// Outcome of evaluating the accumulated tap sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Sequence equals the quit code
    MatchQuit,
    /// Sequence equals the set-date code (sequence cleared)
    MatchSet,
    /// Idle deadline passed (sequence cleared)
    IdleReset,
    Continue,
}
