/*!
 * Demo binary: runs the gateway against simulated hardware.
 *
 * Builds a small catalog, injects one received frame and one JSON write
 * request, runs a few polling iterations, and logs what came out on each
 * side. Set CANBRIDGE_CONFIG to a JSON config file to override defaults.
 */

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use canbridge::sim::{BufferTransport, SimulatedDriver};
use canbridge::{CanMessage, CanSignal, Gateway, GatewayConfig, SignalCatalog, SignalListener};

struct LoggingListener;

impl SignalListener for LoggingListener {
    fn on_signal(&mut self, name: &str, value: f64) {
        info!(name, value, "decoded signal");
    }
    fn on_raw_message(&mut self, id: u32, data: &[u8; 8]) {
        info!(id, ?data, "undecoded frame");
    }
}

fn demo_catalog() -> SignalCatalog {
    let mut catalog = SignalCatalog::new(
        vec![
            CanSignal {
                name: "engine_speed".to_string(),
                message_id: 0x110,
                bit_position: 0,
                bit_size: 16,
                factor: 0.25,
                offset: 0.0,
                min: 0.0,
                max: 16383.75,
                writable: false,
            },
            CanSignal {
                name: "heater_level".to_string(),
                message_id: 0x310,
                bit_position: 0,
                bit_size: 8,
                factor: 1.0,
                offset: 0.0,
                min: 0.0,
                max: 255.0,
                writable: false,
            },
        ],
        Vec::new(),
    );
    catalog.mark_writable(&["heater_level"]);
    catalog
}

fn load_config() -> anyhow::Result<GatewayConfig> {
    match std::env::var("CANBRIDGE_CONFIG") {
        Ok(path) => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
            Ok(GatewayConfig::from_json(&bytes)?)
        }
        Err(_) => Ok(GatewayConfig {
            simulated_io: true,
            ..Default::default()
        }),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = load_config()?;
    anyhow::ensure!(
        config.simulated_io,
        "this demo only runs against simulated CAN hardware"
    );

    let mut gateway = Gateway::new(
        demo_catalog(),
        config,
        SimulatedDriver::default(),
        LoggingListener,
    )?;

    let mut transport = BufferTransport::default();
    transport.queue_bytes(br#"{"name":"heater_level","value":3}"#);
    transport.queue_bytes(br#"{"id":291,"data":"0102030405060708"}"#);
    gateway.add_transport(Box::new(transport));

    // 8000 raw = 2000 rpm once the 0.25 factor is applied.
    if !gateway.inject_receive(
        0,
        CanMessage {
            id: 0x110,
            data: [0x1F, 0x40, 0, 0, 0, 0, 0, 0],
        },
    ) {
        anyhow::bail!("receive queue full before the loop even started");
    }

    for _ in 0..4 {
        gateway.run_once();
    }

    for (bus, frame) in &gateway.driver().transmitted {
        info!(bus = *bus, id = frame.id, data = ?frame.data, "transmitted frame");
    }
    Ok(())
}
