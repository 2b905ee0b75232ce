pub mod config;
pub mod console;
pub mod context;
pub mod download;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod mirror;
pub mod paths;
pub mod prune;
pub mod registry;
pub mod resolve;

pub use config::MirrorConfig;
pub use context::RunContext;
pub use error::MirrorError;
pub use manifest::Manifest;

pub type Result<T> = std::result::Result<T, MirrorError>;
