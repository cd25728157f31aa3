/*!
 * Simulated CAN driver and host transport.
 *
 * The runtime stand-ins for physical I/O (`GatewayConfig::simulated_io`):
 * the driver records what would have gone onto the wire, and the transport
 * replays pre-queued host byte batches.
 */

use std::collections::VecDeque;

use crate::dispatcher::{CanDriver, HostTransport};
use crate::error::{GatewayError, Result};
use crate::message::CanMessage;
use crate::write_request::HOST_BUFFER_LEN;

/// Records every transmit instead of touching hardware.
#[derive(Debug, Default)]
pub struct SimulatedDriver {
    /// (bus index, frame) in transmission order.
    pub transmitted: Vec<(usize, CanMessage)>,
    pub initializations: usize,
    /// Make every transmit fail, for exercising the drop path.
    pub fail_transmit: bool,
}

impl CanDriver for SimulatedDriver {
    fn initialize(&mut self, _bus_index: usize) -> Result<()> {
        self.initializations += 1;
        Ok(())
    }

    fn transmit(&mut self, bus_index: usize, message: &CanMessage) -> Result<()> {
        if self.fail_transmit {
            return Err(GatewayError::Driver("simulated transmit failure".to_string()));
        }
        self.transmitted.push((bus_index, *message));
        Ok(())
    }
}

/// Replays queued byte batches, one batch per poll.
#[derive(Debug, Default)]
pub struct BufferTransport {
    batches: VecDeque<Vec<u8>>,
}

impl BufferTransport {
    /// Queue one batch of host bytes for a later poll. Batches longer than
    /// the host buffer are truncated on delivery.
    pub fn queue_bytes(&mut self, bytes: &[u8]) {
        self.batches.push_back(bytes.to_vec());
    }
}

impl HostTransport for BufferTransport {
    fn poll(&mut self, buffer: &mut [u8; HOST_BUFFER_LEN]) -> usize {
        let Some(batch) = self.batches.pop_front() else {
            return 0;
        };
        let count = batch.len().min(HOST_BUFFER_LEN);
        buffer[..count].copy_from_slice(&batch[..count]);
        count
    }
}
