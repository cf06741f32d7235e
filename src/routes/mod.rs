//! Request handlers behind [`crate::handle_request`].
//!
//! Every handler takes the raw query string or body and returns the text the
//! Service Worker hands back to HTMX: an HTML fragment, or JSON for the
//! lookup and session-export routes.

pub mod deck;
pub mod lookup;
pub mod quiz;
pub mod table;
pub mod util;
