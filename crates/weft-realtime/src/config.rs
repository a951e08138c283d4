//! Realtime configuration
//!
//! Constructed once at boot and passed by reference; there is no global
//! configuration state.

/// Configuration for the realtime layer
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Per-channel broadcast buffer size
    ///
    /// A subscriber that falls further behind than this lags (skips ahead)
    /// rather than blocking dispatch to others.
    pub broadcast_capacity: usize,
}

impl RealtimeConfig {
    /// Create configuration with defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            broadcast_capacity: 64,
        }
    }

    /// Set the per-channel broadcast buffer size
    #[inline]
    #[must_use]
    pub fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = RealtimeConfig::new();
        assert_eq!(config.broadcast_capacity, 64);
    }

    #[test]
    fn capacity_floor_is_one() {
        let config = RealtimeConfig::new().with_broadcast_capacity(0);
        assert_eq!(config.broadcast_capacity, 1);
    }
}
