//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → YopClient::from_config (credential, endpoints, trust anchor, timeout)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a client is rebuilt to change it
//! - All fields have defaults to allow minimal configs
//! - The private key may come from the environment instead of the file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ClientConfig;
pub use schema::CredentialConfig;
pub use schema::EndpointConfig;
pub use schema::ObservabilityConfig;
pub use schema::PlatformConfig;
pub use schema::TimeoutConfig;
