//! Data Transfer Objects (DTOs) for persistence.
//!
//! Each stored entity has versioned DTOs with explicit migrations and a
//! migrator factory. Domain models never touch the file format directly.

pub mod config;
pub mod outbox_event;
pub mod selection_session;

pub use config::{ProofingConfigV1_0_0, create_config_migrator};
pub use outbox_event::{OutboxEventV1_0_0, create_outbox_event_migrator};
pub use selection_session::{
    SelectionSessionDTO, SelectionSessionV1_0_0, SelectionSessionV1_1_0,
    create_selection_session_migrator,
};
