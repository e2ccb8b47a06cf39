//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check node identity and role consistency
//! - Validate value ranges (intervals > 0, page size bounds)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::backend::is_supported_target;
use crate::config::schema::{NodeRole, RouterConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.nodes.is_empty() {
        errors.push(ValidationError::new("nodes", "at least one node is required"));
    }

    let mut seen = HashSet::new();
    for (i, node) in config.nodes.iter().enumerate() {
        let field = format!("nodes[{i}]");
        if node.id == 0 {
            errors.push(ValidationError::new(&field, "id must be positive"));
        }
        if !seen.insert(node.id) {
            errors.push(ValidationError::new(&field, format!("duplicate id {}", node.id)));
        }
        if node.role == NodeRole::Replica && node.shard.is_none() {
            errors.push(ValidationError::new(&field, "replica nodes must name a shard"));
        }
        if !is_supported_target(&node.target) {
            errors.push(ValidationError::new(
                &field,
                format!("unsupported target '{}'", node.target),
            ));
        }
    }

    if config.health.interval_secs == 0 {
        errors.push(ValidationError::new("health.interval_secs", "must be greater than 0"));
    }
    if config.health.timeout_ms == 0 {
        errors.push(ValidationError::new("health.timeout_ms", "must be greater than 0"));
    }
    if config.failover.operation_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "failover.operation_timeout_ms",
            "must be greater than 0",
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.reads.default_page_size == 0 {
        errors.push(ValidationError::new("reads.default_page_size", "must be greater than 0"));
    }
    if config.reads.max_page_size < config.reads.default_page_size {
        errors.push(ValidationError::new(
            "reads.max_page_size",
            "must not be smaller than reads.default_page_size",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
