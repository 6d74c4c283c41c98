//! Lightbox module.
//!
//! Sequential viewer over the candidate photo list. The lightbox only tracks
//! which photo is focused; selection mutations go through the selection
//! state machine using the focused photo's id.

mod keyboard;
mod navigator;

pub use keyboard::{BindingId, KeyBindingHost, KeyBindingRegistry, LightboxCommand, LightboxKey};
pub use navigator::LightboxNavigator;
