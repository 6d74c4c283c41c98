//! File storage primitives shared by the TOML repositories.

mod atomic_toml;

pub use atomic_toml::{VersionedTomlFile, list_toml_files};
