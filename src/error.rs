/*!
 * Error types for the gateway core.
 *
 * Every failure here is local and non-fatal: nothing in this taxonomy may
 * terminate the polling loop. Callers on the host-facing paths log and drop.
 */

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Write attempted against a signal not marked writable.
    #[error("signal '{0}' is not writable")]
    NotWritable(String),

    /// Engineering value outside the signal's declared [min, max] range.
    #[error("value {value} out of range [{min}, {max}] for signal '{name}'")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Bounded queue refused the item; the frame is dropped.
    #[error("send queue full, dropping frame with id 0x{0:X}")]
    QueueFull(u32),

    /// CAN driver reported a failure on initialize or transmit.
    #[error("driver error: {0}")]
    Driver(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
