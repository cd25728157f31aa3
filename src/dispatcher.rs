/*!
 * The gateway's polling loop: round-robins over buses and host transports
 * once per iteration.
 *
 * Each `run_once` pops at most one received frame per bus (bounding
 * per-iteration latency and keeping the buses fair against each other),
 * processes one batch of pending host bytes per transport, then flushes a
 * bounded batch of each send queue to the driver. Nothing here blocks;
 * liveness depends only on the caller's polling cadence.
 */

use tracing::warn;

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::message::{CanBus, CanMessage};
use crate::signals::{decode_can_message, SignalCatalog, SignalListener};
use crate::write_request::{WriteRequestParser, HOST_BUFFER_LEN};

/// The physical CAN controller, or a simulation of one.
pub trait CanDriver {
    fn initialize(&mut self, bus_index: usize) -> Result<()>;
    fn transmit(&mut self, bus_index: usize, message: &CanMessage) -> Result<()>;
}

/// A host-facing byte channel (USB, serial, network).
pub trait HostTransport {
    /// Copy any pending host bytes into `buffer` and return how many were
    /// written; 0 means nothing pending. Never blocks.
    fn poll(&mut self, buffer: &mut [u8; HOST_BUFFER_LEN]) -> usize;
}

/// The gateway context: catalog, buses, transports, and collaborators,
/// owned explicitly so multiple independent instances can coexist.
pub struct Gateway<D: CanDriver, L: SignalListener> {
    catalog: SignalCatalog,
    buses: Vec<CanBus>,
    transports: Vec<Box<dyn HostTransport>>,
    parser: WriteRequestParser,
    config: GatewayConfig,
    driver: D,
    listener: L,
}

impl<D: CanDriver, L: SignalListener> Gateway<D, L> {
    /// Build the bus set from the configuration and initialize the driver
    /// for every bus.
    pub fn new(
        catalog: SignalCatalog,
        config: GatewayConfig,
        mut driver: D,
        listener: L,
    ) -> Result<Self> {
        let mut buses = Vec::with_capacity(config.bus_count);
        for index in 0..config.bus_count {
            driver.initialize(index)?;
            buses.push(CanBus::new(config.queue_capacity));
        }
        Ok(Gateway {
            catalog,
            buses,
            transports: Vec::new(),
            parser: WriteRequestParser::new(config.write_format),
            config,
            driver,
            listener,
        })
    }

    pub fn add_transport(&mut self, transport: Box<dyn HostTransport>) {
        self.transports.push(transport);
    }

    pub fn catalog(&self) -> &SignalCatalog {
        &self.catalog
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn bus_mut(&mut self, index: usize) -> Option<&mut CanBus> {
        self.buses.get_mut(index)
    }

    /// Hand a received frame to the gateway, as the driver's receive side
    /// would. Returns false when the receive queue is full (frame dropped).
    #[must_use]
    pub fn inject_receive(&mut self, bus_index: usize, message: CanMessage) -> bool {
        match self.buses.get_mut(bus_index) {
            Some(bus) => bus.receive_queue.push(message),
            None => false,
        }
    }

    /// One polling iteration: receive, host writes, send flush.
    pub fn run_once(&mut self) {
        // At most one frame per bus per iteration, never drain-to-empty.
        for bus in &mut self.buses {
            if let Some(message) = bus.receive_queue.pop() {
                decode_can_message(&self.catalog, message.id, &message.data, &mut self.listener);
            }
        }

        // One batch of pending bytes per transport. Host write requests
        // always target bus 0.
        let mut buffer = [0u8; HOST_BUFFER_LEN];
        for transport in &mut self.transports {
            let count = transport.poll(&mut buffer);
            if count == 0 {
                continue;
            }
            if let Some(bus) = self.buses.first_mut() {
                self.parser.receive(&buffer[..count], &self.catalog, bus);
            }
        }

        // Flush a bounded batch of each send queue to the driver.
        for (index, bus) in self.buses.iter_mut().enumerate() {
            for _ in 0..self.config.send_batch_limit {
                let Some(message) = bus.send_queue.pop() else {
                    break;
                };
                if let Err(e) = self.driver.transmit(index, &message) {
                    warn!(bus = index, error = %e, "transmit failed, dropping frame");
                }
            }
        }
    }

    /// Re-initialize the CAN driver for every bus. Catalog state and queue
    /// contents are left untouched.
    pub fn reset(&mut self) -> Result<()> {
        for index in 0..self.buses.len() {
            self.driver.initialize(index)?;
        }
        Ok(())
    }
}
