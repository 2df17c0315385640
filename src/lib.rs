//! Visit countdown library
//!
//! Exposes modules for integration testing and the display binary.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
