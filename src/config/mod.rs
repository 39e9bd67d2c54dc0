//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (WALLETCONNECT_PROJECT_ID, SIGN_BRIDGE_URL)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → read by the controller, the bridge factory and the view
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::BridgeConfig;
pub use schema::ChainConfig;
pub use schema::ObservabilityConfig;
pub use schema::SessionConfig;
pub use schema::TransactionConfig;
