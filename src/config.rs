/*!
 * Runtime gateway configuration.
 *
 * Replaces compile-time build flags: the write format, bus/queue sizing, the
 * per-iteration send budget, and whether CAN I/O is real or simulated are
 * all plain data selected at startup.
 */

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::write_request::WriteFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Wire encoding of host write requests.
    pub write_format: WriteFormat,
    /// Number of physical CAN buses.
    pub bus_count: usize,
    /// Capacity of each receive and send queue.
    pub queue_capacity: usize,
    /// Maximum frames flushed from each send queue per loop iteration.
    /// Bounded so a backed-up send queue cannot starve the receive side.
    pub send_batch_limit: usize,
    /// Run against simulated CAN hardware instead of a physical controller.
    pub simulated_io: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            write_format: WriteFormat::Json,
            bus_count: 1,
            queue_capacity: 32,
            send_batch_limit: 8,
            simulated_io: false,
        }
    }
}

impl GatewayConfig {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| GatewayError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.write_format, WriteFormat::Json);
        assert_eq!(config.bus_count, 1);
        assert_eq!(config.send_batch_limit, 8);
        assert!(!config.simulated_io);
    }

    #[test]
    fn test_from_json_partial_override() {
        let config =
            GatewayConfig::from_json(br#"{"write_format":"binary","bus_count":2}"#).unwrap();
        assert_eq!(config.write_format, WriteFormat::Binary);
        assert_eq!(config.bus_count, 2);
        // Unspecified fields keep their defaults.
        assert_eq!(config.queue_capacity, 32);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(GatewayConfig::from_json(b"write_format=binary").is_err());
    }
}
