//! Domain models - core types and date policy
//!
//! This module contains the data types used throughout the system:
//! - `VisitDate` - the persisted next-visit date and its day arithmetic
//! - `CountdownText` / `Screen` - what the display shows
//! - `CornerZone`, `AppState`, `Decision` - gesture and mode vocabulary

pub mod countdown;
pub mod types;
pub mod visit_date;

// Re-export commonly used types at module level
pub use countdown::{CountdownText, Screen};
pub use types::{AppState, CornerZone, Decision, Point, SurfaceSize};
pub use visit_date::{VisitDate, VisitDateError};
