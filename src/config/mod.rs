//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, format compilation)
//!     → AppConfig (validated, immutable)
//!     → AccessLogLayer::from_config / DemoServer::new
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the compiled format never changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, ErrorReportingConfig, GistConfig, LoggerConfig, ObservabilityConfig,
    PosterConfig, ServerConfig, ShortenerConfig, SkipConfig,
};
pub use validation::{validate_config, ValidationError};
