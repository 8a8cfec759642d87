//! User-facing text and logging helpers.
//!
//! All strings shown to the user or written to the log come from the
//! [`Message`] enum; `display.rs` holds the wording, `macros.rs` the routing.

pub mod display;
pub mod macros;
pub mod types;

pub use types::Message;
