//! Screen layout: turns a `Screen` into surface calls
//!
//! The countdown text drifts slowly around the screen to avoid burn-in.

use crate::domain::countdown::{CountdownText, Screen};
use crate::domain::types::{Point, SurfaceSize};
use crate::infra::config::{Config, FontsConfig, Rgb};
use crate::io::display::Surface;
use std::time::Duration;

/// Drift circle centre and radii, in logical pixels
const DRIFT_BASE: (f64, f64) = (60.0, 130.0);
const DRIFT_RADIUS: (f64, f64) = (60.0, 80.0);

/// Clock line sits this far above the headline
const CLOCK_RAISE: f32 = 20.0;

/// Fixed position of the visit date in set mode
const VISIT_LABEL_AT: Point = Point { x: 50.0, y: 150.0 };

/// Headline origin after `elapsed` running time.
///
/// One whole degree around the drift ellipse every ten seconds, a full
/// lap per hour.
pub fn drift_origin(elapsed: Duration) -> Point {
    let degrees = ((elapsed.as_secs() % 3600) / 10) as f64;
    let radians = degrees.to_radians();
    Point::new(
        (DRIFT_BASE.0 + DRIFT_RADIUS.0 * radians.cos()) as f32,
        (DRIFT_BASE.1 + DRIFT_RADIUS.1 * radians.sin()) as f32,
    )
}

/// Keep a drifting origin on surfaces smaller than the drift path
fn clamp_to(point: Point, size: SurfaceSize) -> Point {
    Point::new(point.x.min(size.width as f32), point.y.min(size.height as f32))
}

pub struct Layout {
    fonts: FontsConfig,
    background: Rgb,
    foreground: Rgb,
}

impl Layout {
    pub fn new(config: &Config) -> Self {
        Self {
            fonts: config.fonts().clone(),
            background: config.background(),
            foreground: config.foreground(),
        }
    }

    /// Draw and present one frame
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        screen: &Screen,
        elapsed: Duration,
    ) -> anyhow::Result<()> {
        surface.fill(self.background);

        match screen {
            Screen::Countdown { headline, clock } => {
                let origin = clamp_to(drift_origin(elapsed), surface.size());
                self.draw_headline(surface, *headline, origin);
                let clock_at = Point::new(origin.x, origin.y - CLOCK_RAISE);
                surface.draw_text(clock, clock_at, self.fonts.clock_px, self.foreground);
            }
            Screen::VisitDate { label } => {
                surface.draw_text(label, VISIT_LABEL_AT, self.fonts.date_px, self.foreground);
            }
        }

        surface.present()
    }

    fn draw_headline<S: Surface + ?Sized>(&self, surface: &mut S, headline: CountdownText, origin: Point) {
        match headline {
            CountdownText::Today | CountdownText::OneDay => {
                surface.draw_text(&headline.to_string(), origin, self.fonts.number_px, self.foreground);
            }
            CountdownText::Days(days) => {
                let number = days.to_string();
                surface.draw_text(&number, origin, self.fonts.number_px, self.foreground);

                let width = surface.text_width(&number, self.fonts.number_px);
                let unit_at = Point::new(
                    origin.x + width as f32,
                    origin.y + self.fonts.unit_y_offset as f32,
                );
                surface.draw_text(" days", unit_at, self.fonts.unit_px, self.foreground);
            }
        }
    }
}
