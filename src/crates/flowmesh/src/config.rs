//! Runtime configuration.
//!
//! This crate has no on-disk config of its own — config-file loading is an
//! explicitly out-of-scope collaborator — but the channel capacities and
//! payload limits that shape the runtime's behavior are still pulled from
//! the environment the way the rest of this family of crates does it,
//! rather than hardcoded.

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Tunables for the graph runtime. Construct with [`RuntimeConfig::default`]
/// or [`RuntimeConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Capacity of a block's default input channel.
    pub in_chan_capacity: usize,
    /// Capacity of a block's mutation (`addChan`) channel.
    pub add_chan_capacity: usize,
    /// Capacity of each declared route channel.
    pub route_chan_capacity: usize,
    /// Maximum accepted size, in bytes, of a route call or import payload's
    /// serialized JSON form.
    pub max_payload_bytes: usize,
}

const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1_024_768;

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            in_chan_capacity: 64,
            add_chan_capacity: 16,
            route_chan_capacity: 16,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl RuntimeConfig {
    /// Build a config from `FLOWMESH_*` environment variables, falling back
    /// to [`RuntimeConfig::default`] for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            in_chan_capacity: env_parse_or("FLOWMESH_IN_CHAN_CAPACITY", defaults.in_chan_capacity),
            add_chan_capacity: env_parse_or(
                "FLOWMESH_ADD_CHAN_CAPACITY",
                defaults.add_chan_capacity,
            ),
            route_chan_capacity: env_parse_or(
                "FLOWMESH_ROUTE_CHAN_CAPACITY",
                defaults.route_chan_capacity,
            ),
            max_payload_bytes: env_parse_or(
                "FLOWMESH_MAX_PAYLOAD_BYTES",
                defaults.max_payload_bytes,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_payload_limit_is_roughly_one_mebibyte() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.max_payload_bytes, 1_024_768);
    }
}
