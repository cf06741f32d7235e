//! Recommendation quiz: the question list, per-session progress, and the
//! worker-local state the route handlers share.

pub mod questions;
pub mod session;
pub mod state;
