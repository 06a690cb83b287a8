//! Session lifecycle: the single owner of media, relay link and session state

mod controller;

pub use controller::{ControllerParts, SessionController};
