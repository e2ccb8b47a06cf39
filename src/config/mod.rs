//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, NODE<id>_URL overrides)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → shared by value with all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; node descriptors never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    FailoverConfig, HealthCheckConfig, ListenerConfig, MergeMode, NodeConfig, NodeRole,
    ObservabilityConfig, ReadConfig, RouterConfig, ShardingConfig, StrategyKind,
};
