//! Region to shard resolution.
//!
//! # Responsibilities
//! - Map a region name to the shard that owns it
//! - Produce the storage filter selecting a shard's records
//!
//! # Design Decisions
//! - Total function: unknown regions belong to Vismin
//! - Trimmed, case-insensitive comparison
//! - Immutable after construction (thread-safe without locks)

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::{normalize_region, RegionFilter};

/// A regional partition of the appointment data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shard {
    Luzon,
    Vismin,
}

impl Shard {
    /// Every shard, in the order cross-shard lookups consult them.
    pub const ALL: [Shard; 2] = [Shard::Luzon, Shard::Vismin];
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shard::Luzon => write!(f, "luzon"),
            Shard::Vismin => write!(f, "vismin"),
        }
    }
}

/// Static assignment of regions to shards.
#[derive(Debug, Clone)]
pub struct ShardMap {
    luzon: HashSet<String>,
}

impl ShardMap {
    pub fn new<I, S>(luzon_regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            luzon: luzon_regions
                .into_iter()
                .map(|r| normalize_region(r.as_ref()))
                .collect(),
        }
    }

    /// Shard owning `region`.
    pub fn resolve(&self, region: &str) -> Shard {
        if self.luzon.contains(&normalize_region(region)) {
            Shard::Luzon
        } else {
            Shard::Vismin
        }
    }

    /// Storage predicate selecting the records of `shard`.
    pub fn filter(&self, shard: Shard) -> RegionFilter {
        let mut regions: Vec<String> = self.luzon.iter().cloned().collect();
        regions.sort();
        match shard {
            Shard::Luzon => RegionFilter::In(regions),
            Shard::Vismin => RegionFilter::NotIn(regions),
        }
    }
}
