//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::shard::Shard;

/// Root configuration for the appointment router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Backend node definitions.
    pub nodes: Vec<NodeConfig>,

    /// Region to shard assignment.
    pub sharding: ShardingConfig,

    /// Health check settings.
    pub health: HealthCheckConfig,

    /// Failover settings.
    pub failover: FailoverConfig,

    /// Paged read settings.
    pub reads: ReadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl RouterConfig {
    /// Configuration used when no file is given: a central master and one
    /// replica per region, all in memory.
    pub fn with_default_nodes() -> Self {
        Self {
            nodes: vec![
                NodeConfig {
                    id: 1,
                    role: NodeRole::Master,
                    shard: None,
                    target: "memory://node1".to_string(),
                },
                NodeConfig {
                    id: 2,
                    role: NodeRole::Replica,
                    shard: Some(Shard::Luzon),
                    target: "memory://node2".to_string(),
                },
                NodeConfig {
                    id: 3,
                    role: NodeRole::Replica,
                    shard: Some(Shard::Vismin),
                    target: "memory://node3".to_string(),
                },
            ],
            ..Self::default()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Static role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Writable node holding every shard.
    Master,
    /// Node holding a single region shard.
    Replica,
    /// Unsharded node holding everything.
    Peer,
}

/// Backend node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Node identifier; callers name it in their `node` preference.
    pub id: u32,

    /// Static role.
    pub role: NodeRole,

    /// Shard served by a replica. Ignored for other roles.
    #[serde(default)]
    pub shard: Option<Shard>,

    /// Connection target (e.g., "sqlite://data/node1.db", "memory://node1").
    pub target: String,
}

/// Region to shard assignment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShardingConfig {
    /// Regions owned by the Luzon shard. Everything else belongs to Vismin.
    pub luzon_regions: Vec<String>,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self {
            luzon_regions: [
                "National Capital Region (NCR)",
                "Cordillera Administrative Region (CAR)",
                "Ilocos Region (I)",
                "Cagayan Valley (II)",
                "Central Luzon (III)",
                "CALABARZON (IV-A)",
                "MIMAROPA (IV-B)",
                "Bicol Region (V)",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the periodic monitor. The first probe always runs.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Per-node probe timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5,
            timeout_ms: 2000,
        }
    }
}

/// How the default node is chosen among available nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Random,
    RoundRobin,
}

/// Failover configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Upper bound for one operation against one node, in milliseconds.
    pub operation_timeout_ms: u64,

    /// Default node selection strategy.
    pub strategy: StrategyKind,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: 5000,
            strategy: StrategyKind::Random,
        }
    }
}

/// Cross-shard page assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Each shard is paged on its own before the merge. Cheap, but page
    /// boundaries are only approximate when shard sizes differ.
    Independent,
    /// Both shards are read from the start up to the end of the requested
    /// page, so the merged page is exact.
    #[default]
    Exact,
}

/// Paged read configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadConfig {
    pub merge_mode: MergeMode,

    /// Page size when the caller gives none.
    pub default_page_size: usize,

    /// Largest page a caller may request.
    pub max_page_size: usize,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            merge_mode: MergeMode::Exact,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml() {
        let raw = r#"
            [[nodes]]
            id = 1
            role = "master"
            target = "memory://central"

            [[nodes]]
            id = 2
            role = "replica"
            shard = "luzon"
            target = "sqlite://data/node2.db"

            [health]
            interval_secs = 10

            [reads]
            merge_mode = "independent"
        "#;
        let config: RouterConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[1].shard, Some(Shard::Luzon));
        assert_eq!(config.health.interval_secs, 10);
        assert_eq!(config.health.timeout_ms, 2000);
        assert_eq!(config.reads.merge_mode, MergeMode::Independent);
        assert_eq!(config.failover.strategy, StrategyKind::Random);
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_default_nodes_cover_both_shards() {
        let config = RouterConfig::with_default_nodes();
        assert_eq!(config.nodes.len(), 3);
        assert!(config.nodes.iter().any(|n| n.shard == Some(Shard::Luzon)));
        assert!(config.nodes.iter().any(|n| n.shard == Some(Shard::Vismin)));
    }
}
