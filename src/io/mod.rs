//! IO modules - display and input
//!
//! - `display` - Surface and pointer input traits
//! - `render` - Screen layout onto a surface
//! - `terminal` - ratatui/crossterm backend

pub mod display;
pub mod render;
pub mod terminal;

pub use display::{PointerInput, Surface};
pub use render::Layout;
pub use terminal::TerminalScreen;
