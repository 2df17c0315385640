//! Services - interaction logic and state management
//!
//! - `gesture` - Corner classification and tap-code matching
//! - `visit_store` - Ownership and persistence of the visit date
//! - `session` - RUN / SET_VISIT / QUIT state machine and display loop

pub mod gesture;
pub mod session;
pub mod visit_store;

pub use gesture::GestureRecognizer;
pub use session::CountdownSession;
pub use visit_store::VisitDateStore;
