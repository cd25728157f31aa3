/*!
 * canbridge: the translation core of a CAN-to-host gateway.
 *
 * Decodes raw CAN frames into named, scaled signal values for a host, and
 * encodes host write requests (binary-framed or JSON) back into raw frames
 * queued for transmission. Single-threaded cooperative polling; the CAN
 * controller, host transports, and decoded-signal consumer plug in through
 * the traits in `dispatcher` and `signals`.
 */

pub mod bitfield;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod queue;
pub mod signals;
pub mod sim;
pub mod write_request;

pub use config::GatewayConfig;
pub use dispatcher::{CanDriver, Gateway, HostTransport};
pub use error::{GatewayError, Result};
pub use message::{CanBus, CanMessage};
pub use signals::{CanCommand, CanSignal, SignalCatalog, SignalListener};
pub use write_request::{WriteFormat, WriteRequest, WriteRequestParser};
