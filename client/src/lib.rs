//! StrangerLink client core
//!
//! Drives one visitor through matchmaking and peer negotiation: acquires
//! local media, joins the relay's queue, runs the offer/answer exchange
//! with the assigned partner and tears everything down on departure.
//!
//! Media capture, the peer connection engine and rendering are supplied by
//! the embedding application through the traits in [`media`], [`peer`] and
//! [`relay`]; progress is reported as [`ClientUpdate`]s.

pub mod config;
pub mod events;
pub mod infrastructure;
pub mod lifecycle;
pub mod media;
pub mod negotiation;
pub mod peer;
pub mod relay;

pub use config::ClientConfig;
pub use events::{ClientEvent, ClientUpdate, UserCommand};
pub use lifecycle::SessionController;
pub use negotiation::{EndReason, NegotiationState, Role, Status};
