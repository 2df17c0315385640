//! Display and input collaborators
//!
//! The countdown core never touches a screen directly. It draws through
//! `Surface` and receives taps through `PointerInput`, both in logical pixel
//! coordinates of the configured surface size.

use crate::domain::types::{Point, SurfaceSize};
use crate::infra::config::Rgb;
use std::time::Duration;

/// Drawing target for one frame
pub trait Surface {
    /// Logical size in pixels
    fn size(&self) -> SurfaceSize;

    /// Clear the frame with a solid color
    fn fill(&mut self, color: Rgb);

    /// Width in logical pixels of `text` drawn at `font_px`
    fn text_width(&self, text: &str, font_px: u32) -> u32;

    /// Draw `text` with its top-left corner at `at`
    fn draw_text(&mut self, text: &str, at: Point, font_px: u32, color: Rgb);

    /// Show the completed frame
    fn present(&mut self) -> anyhow::Result<()>;
}

/// Source of pointer-down events
pub trait PointerInput {
    /// Wait up to `timeout` for input, then drain every pending primary-button
    /// press. An empty batch means the frame interval elapsed quietly.
    fn poll(&mut self, timeout: Duration) -> anyhow::Result<Vec<Point>>;
}
