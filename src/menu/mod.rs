//! Inline-keyboard menu for editing route sources from a private chat.
//!
//! `actions` holds the callback data grammar, `view` renders screens and
//! `handler` applies presses through [`RelayControl`](crate::relay::RelayControl).

pub mod actions;
pub mod handler;
pub mod view;

pub use actions::MenuAction;
pub use handler::MenuHandler;
