//! Domain core of the proofing engine.
//!
//! Holds the selection model and state machine, the gallery and lightbox
//! types, the completion outbox model, and the traits implemented by the
//! infrastructure layer. Nothing here performs I/O.

pub mod config;
pub mod error;
pub mod gallery;
pub mod lightbox;
pub mod notification;
pub mod selection;

pub use error::{ProofingError, Result};
