//! Corner tap-code recognition
//!
//! Taps are classified into screen corners and accumulated into a sequence
//! which is compared against two fixed codes:
//! - quit code: leave the program
//! - set code: enter set-date mode
//!
//! Matching is on the whole sequence, not its suffix. A sequence that grows
//! past a code without matching stays unmatched until it is cleared by the
//! idle timeout.

use crate::domain::types::{CornerZone, Decision, Point, SurfaceSize};
use crate::infra::config::Config;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Classify a point into a corner zone.
///
/// A corner needs the point within `sensitivity` of both of its edges.
/// Boundary values count as inside the corner.
pub fn classify(point: Point, surface: SurfaceSize, sensitivity: f32) -> CornerZone {
    let x = f64::from(point.x);
    let y = f64::from(point.y);
    let width = f64::from(surface.width);
    let height = f64::from(surface.height);
    let sensitivity = f64::from(sensitivity);

    let left = x <= width * sensitivity;
    let right = width - x <= width * sensitivity;
    let top = y <= height * sensitivity;
    let bottom = height - y <= height * sensitivity;

    match (left, right, top, bottom) {
        (true, _, true, _) => CornerZone::TopLeft,
        (true, _, _, true) => CornerZone::BottomLeft,
        (_, true, true, _) => CornerZone::TopRight,
        (_, true, _, true) => CornerZone::BottomRight,
        _ => CornerZone::Middle,
    }
}

/// A recorded tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tap {
    pub zone: CornerZone,
    pub at: Instant,
}

pub struct GestureRecognizer {
    surface: SurfaceSize,
    sensitivity: f32,
    tap_idle: Duration,
    quit_code: Vec<CornerZone>,
    set_code: Vec<CornerZone>,
    sequence: Vec<Tap>,
    idle_deadline: Instant,
}

impl GestureRecognizer {
    pub fn new(config: &Config, now: Instant) -> Self {
        Self {
            surface: config.surface(),
            sensitivity: config.sensitivity(),
            tap_idle: config.tap_idle(),
            quit_code: config.quit_code().to_vec(),
            set_code: config.set_code().to_vec(),
            sequence: Vec::new(),
            idle_deadline: now,
        }
    }

    /// Classify against the configured surface and sensitivity
    pub fn classify(&self, point: Point) -> CornerZone {
        classify(point, self.surface, self.sensitivity)
    }

    /// Append a tap and push the idle deadline out.
    ///
    /// A sequence whose idle deadline has already passed is dropped first, so
    /// taps further apart than the idle interval never join up.
    pub fn record_tap(&mut self, zone: CornerZone, now: Instant) {
        if now > self.idle_deadline && !self.sequence.is_empty() {
            debug!(dropped = %self.sequence.len(), "tap_sequence_expired");
            self.sequence.clear();
        }

        self.sequence.push(Tap { zone, at: now });
        self.idle_deadline = now + self.tap_idle;

        debug!(
            zone = %zone,
            sequence = ?self.zones(),
            "tap_recorded"
        );
    }

    /// Compare the sequence against the codes and the idle deadline
    pub fn evaluate(&mut self, now: Instant) -> Decision {
        if self.matches(&self.quit_code) {
            info!(code = "quit", "gesture_matched");
            return Decision::MatchQuit;
        }

        if self.matches(&self.set_code) {
            info!(code = "set", "gesture_matched");
            self.sequence.clear();
            return Decision::MatchSet;
        }

        if now > self.idle_deadline {
            if !self.sequence.is_empty() {
                debug!(dropped = %self.sequence.len(), "tap_sequence_reset");
            }
            self.sequence.clear();
            return Decision::IdleReset;
        }

        Decision::Continue
    }

    /// Drop any accumulated taps
    pub fn reset(&mut self) {
        self.sequence.clear();
    }

    pub fn sequence(&self) -> &[Tap] {
        &self.sequence
    }

    pub fn zones(&self) -> Vec<CornerZone> {
        self.sequence.iter().map(|tap| tap.zone).collect()
    }

    fn matches(&self, code: &[CornerZone]) -> bool {
        self.sequence.len() == code.len()
            && self.sequence.iter().zip(code).all(|(tap, zone)| tap.zone == *zone)
    }
}
