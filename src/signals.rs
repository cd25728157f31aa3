/*!
 * Signal and command catalog: the static description of what lives on the
 * bus, plus the decode (frame -> named value) and encode (named value ->
 * frame) paths built on top of it.
 *
 * The catalog is loaded once at startup and read-only afterwards; nothing in
 * it is created or destroyed at runtime.
 */

use tracing::{debug, warn};

use crate::bitfield::{get_bit_field, set_bit_field};
use crate::error::{GatewayError, Result};
use crate::message::{CanBus, CanMessage, CAN_PAYLOAD_LEN};

/// One named, scaled field within a CAN message payload.
///
/// `bit_position` uses the gateway's big-endian, byte-major, MSB-first
/// numbering (bit 0 = MSB of payload byte 0). Invariant:
/// `bit_position + bit_size <= 64`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanSignal {
    pub name: String,
    pub message_id: u32,
    pub bit_position: usize,
    pub bit_size: usize,
    /// Affine transform to engineering units: value = raw * factor + offset.
    pub factor: f64,
    pub offset: f64,
    pub min: f64,
    pub max: f64,
    /// Only writable signals are reachable from host write requests.
    pub writable: bool,
}

/// Handler invoked for a named write that targets a command rather than a
/// signal, with the requested name, value, and the catalog for context.
pub type CommandHandler = fn(&str, f64, &SignalCatalog);

/// A named write target backed by custom logic instead of a bit-field.
#[derive(Clone)]
pub struct CanCommand {
    pub name: String,
    pub handler: CommandHandler,
}

/// Consumer of the decode path: one call per matched signal per received
/// frame, or a raw event when no signal matches the frame's id.
pub trait SignalListener {
    fn on_signal(&mut self, name: &str, value: f64);
    fn on_raw_message(&mut self, id: u32, data: &[u8; CAN_PAYLOAD_LEN]);
}

/// Static tables of signals and commands, with name-based lookup.
#[derive(Default)]
pub struct SignalCatalog {
    signals: Vec<CanSignal>,
    commands: Vec<CanCommand>,
}

impl SignalCatalog {
    pub fn new(signals: Vec<CanSignal>, commands: Vec<CanCommand>) -> Self {
        debug_assert!(
            signals
                .iter()
                .all(|s| s.bit_position + s.bit_size <= CAN_PAYLOAD_LEN * 8),
            "signal bit range exceeds the 8-byte payload"
        );
        Self { signals, commands }
    }

    /// Build a catalog from a DBC database.
    ///
    /// DBC big-endian start bits (MSB position, lsb0-within-byte numbering)
    /// are converted to this gateway's byte-major MSB-first numbering.
    /// Little-endian signals do not occupy one contiguous range in that
    /// numbering and are skipped with a warning. Imported signals start out
    /// non-writable; opt them in with `mark_writable`.
    pub fn from_dbc(dbc: &can_dbc::DBC) -> Self {
        let mut signals = Vec::new();
        for message in dbc.messages() {
            let message_id = message.message_id().raw();
            for signal in message.signals() {
                match signal.byte_order() {
                    can_dbc::ByteOrder::BigEndian => {
                        let byte_index = (signal.start_bit / 8) as usize;
                        let msb_in_byte = 7 - (signal.start_bit % 8) as usize;
                        signals.push(CanSignal {
                            name: signal.name().clone(),
                            message_id,
                            bit_position: byte_index * 8 + msb_in_byte,
                            bit_size: signal.signal_size as usize,
                            factor: *signal.factor(),
                            offset: *signal.offset(),
                            min: *signal.min(),
                            max: *signal.max(),
                            writable: false,
                        });
                    }
                    can_dbc::ByteOrder::LittleEndian => {
                        warn!(
                            signal = signal.name().as_str(),
                            "skipping little-endian DBC signal"
                        );
                    }
                }
            }
        }
        Self::new(signals, Vec::new())
    }

    /// Flag the named signals writable. Names with no catalog entry are
    /// ignored. Call during startup, before the catalog is shared.
    pub fn mark_writable(&mut self, names: &[&str]) {
        for signal in &mut self.signals {
            if names.contains(&signal.name.as_str()) {
                signal.writable = true;
            }
        }
    }

    pub fn add_command(&mut self, command: CanCommand) {
        self.commands.push(command);
    }

    pub fn signals(&self) -> &[CanSignal] {
        &self.signals
    }

    /// Exact-name signal lookup. With `writable_only`, a matching signal
    /// that is not writable counts as not found.
    pub fn lookup_signal(&self, name: &str, writable_only: bool) -> Option<&CanSignal> {
        self.signals
            .iter()
            .find(|signal| signal.name == name && (!writable_only || signal.writable))
    }

    /// Exact-name command lookup.
    pub fn lookup_command(&self, name: &str) -> Option<&CanCommand> {
        self.commands.iter().find(|command| command.name == name)
    }
}

/// Decode one received frame against the catalog.
///
/// Every signal whose `message_id` matches gets its raw bits extracted and
/// the affine transform applied; the listener receives one `(name, value)`
/// pair per signal. An id with no matching signals is forwarded as a raw
/// event instead -- whether it matters is the listener's call.
pub fn decode_can_message(
    catalog: &SignalCatalog,
    id: u32,
    data: &[u8; CAN_PAYLOAD_LEN],
    listener: &mut dyn SignalListener,
) {
    let mut matched = false;
    for signal in catalog.signals() {
        if signal.message_id != id {
            continue;
        }
        matched = true;
        let raw = get_bit_field(data, signal.bit_position, signal.bit_size);
        let value = raw as f64 * signal.factor + signal.offset;
        listener.on_signal(&signal.name, value);
    }
    if !matched {
        listener.on_raw_message(id, data);
    }
}

/// Convert an engineering value back to the raw unsigned integer packed into
/// the payload, truncated to the signal's bit width:
///   value = raw * factor + offset  =>  raw = round((value - offset) / factor)
pub fn compute_raw_value(signal: &CanSignal, value: f64) -> u64 {
    let raw = ((value - signal.offset) / signal.factor).round() as u64;
    if signal.bit_size >= 64 {
        raw
    } else {
        raw & ((1u64 << signal.bit_size) - 1)
    }
}

/// Encode a single signal write into a fresh frame and queue it for
/// transmission on `bus`.
///
/// Fails on a non-writable signal, a value outside the signal's declared
/// [min, max] range (rejected, never clamped -- a truncated actuator command
/// is worse than a dropped one), or a full send queue. All failures are
/// logged and local; the frame is simply not sent.
pub fn send_can_signal(signal: &CanSignal, value: f64, bus: &mut CanBus) -> Result<()> {
    if !signal.writable {
        debug!(signal = signal.name.as_str(), "rejecting write to non-writable signal");
        return Err(GatewayError::NotWritable(signal.name.clone()));
    }
    if value < signal.min || value > signal.max {
        debug!(
            signal = signal.name.as_str(),
            value,
            min = signal.min,
            max = signal.max,
            "rejecting out-of-range write"
        );
        return Err(GatewayError::OutOfRange {
            name: signal.name.clone(),
            value,
            min: signal.min,
            max: signal.max,
        });
    }

    let raw = compute_raw_value(signal, value);
    let mut data = [0u8; CAN_PAYLOAD_LEN];
    set_bit_field(&mut data, signal.bit_position, signal.bit_size, raw);

    let message = CanMessage {
        id: signal.message_id,
        data,
    };
    if !bus.send_queue.push(message) {
        warn!(id = message.id, "send queue full, dropping frame");
        return Err(GatewayError::QueueFull(message.id));
    }
    Ok(())
}
