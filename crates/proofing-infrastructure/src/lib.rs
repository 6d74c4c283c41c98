pub mod access_token;
pub mod config_service;
pub mod dto;
pub mod http_email_dispatcher;
pub mod http_file_listing_provider;
pub mod local_directory_provider;
pub mod paths;
pub mod storage;
pub mod toml_outbox_repository;
pub mod toml_selection_session_repository;

pub use crate::access_token::generate_access_token;
pub use crate::config_service::ConfigService;
pub use crate::http_email_dispatcher::HttpEmailDispatcher;
pub use crate::http_file_listing_provider::HttpFileListingProvider;
pub use crate::local_directory_provider::LocalDirectoryProvider;
pub use crate::paths::ProofingPaths;
pub use crate::toml_outbox_repository::TomlOutboxRepository;
pub use crate::toml_selection_session_repository::TomlSelectionSessionRepository;
