/*!
 * Host write-request parsing: two independent wire encodings of "put this
 * frame on the bus".
 *
 * The binary format packs fixed 15-byte entries back to back:
 *
 *   '{' <4 byte id> '|' <8 bytes of data> '}'
 *
 * terminated early by a '!' sentinel. The JSON format is an object in one of
 * two mutually exclusive shapes, validated into a typed `WriteRequest`
 * before anything is dispatched:
 *
 *   {"name": "<signal or command name>", "value": <number>}
 *   {"id": <integer>, "data": "<16 hex chars>"}
 */

use tracing::debug;

use crate::message::{CanBus, CanMessage, CAN_PAYLOAD_LEN};
use crate::signals::{send_can_signal, SignalCatalog};

/// Fixed length of one binary write entry: '{' + id + '|' + data + '}'.
const BINARY_PACKET_LEN: usize = 15;

/// Host receive buffers are at most this long; longer input is not scanned.
pub const HOST_BUFFER_LEN: usize = 64;

/// Wire encoding the host uses for write requests. A static configuration
/// choice of the surrounding system, never a per-message decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteFormat {
    #[default]
    Json,
    Binary,
}

/// A schema-validated write request, produced before dispatch so every
/// downstream branch is exhaustive.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    /// Translated write, addressed by signal or command name.
    Named { name: String, value: f64 },
    /// Raw write: destination id and full payload supplied directly.
    Raw {
        id: u32,
        data: [u8; CAN_PAYLOAD_LEN],
    },
    /// Structurally a JSON object, but not a usable request.
    Invalid { reason: String },
}

impl WriteRequest {
    /// Validate a parsed JSON object into a typed request. `name` wins over
    /// `id` when both are present, matching the original wire protocol.
    pub fn from_json(root: &serde_json::Value) -> WriteRequest {
        if let Some(name) = root.get("name") {
            let Some(name) = name.as_str() else {
                return WriteRequest::Invalid {
                    reason: "name is not a string".to_string(),
                };
            };
            let Some(value) = root.get("value").and_then(serde_json::Value::as_f64) else {
                return WriteRequest::Invalid {
                    reason: format!("write request for {name} missing value"),
                };
            };
            return WriteRequest::Named {
                name: name.to_string(),
                value,
            };
        }

        if let Some(id) = root.get("id") {
            let Some(id) = id.as_u64().and_then(|id| u32::try_from(id).ok()) else {
                return WriteRequest::Invalid {
                    reason: "id is not a 32-bit unsigned integer".to_string(),
                };
            };
            let Some(data) = root.get("data").and_then(serde_json::Value::as_str) else {
                return WriteRequest::Invalid {
                    reason: format!("raw write request for 0x{id:X} missing data"),
                };
            };
            return match parse_hex_payload(data) {
                Some(data) => WriteRequest::Raw { id, data },
                None => WriteRequest::Invalid {
                    reason: format!("raw write data '{data}' is not a 64-bit hex string"),
                },
            };
        }

        WriteRequest::Invalid {
            reason: "write request is malformed, missing name or id".to_string(),
        }
    }
}

/// Parse a hex string into payload bytes, laid out in hex-digit order
/// (the string is a big-endian 64-bit quantity).
fn parse_hex_payload(hex: &str) -> Option<[u8; CAN_PAYLOAD_LEN]> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() > 16 {
        return None;
    }
    let value = u64::from_str_radix(hex, 16).ok()?;
    Some(value.to_be_bytes())
}

/// Parses host-supplied byte buffers in the configured wire format and
/// dispatches the resulting requests against a catalog and a send bus.
#[derive(Debug, Clone, Copy)]
pub struct WriteRequestParser {
    format: WriteFormat,
}

impl WriteRequestParser {
    pub fn new(format: WriteFormat) -> Self {
        Self { format }
    }

    /// Process one batch of host bytes. Returns true if a message was
    /// recognized; false means "no message found" and the caller may retry
    /// delivery of the same bytes (JSON mode only -- the binary scanner
    /// always consumes its buffer).
    pub fn receive(&self, buffer: &[u8], catalog: &SignalCatalog, bus: &mut CanBus) -> bool {
        match self.format {
            WriteFormat::Binary => {
                receive_binary_write_request(buffer, bus);
                true
            }
            WriteFormat::Json => receive_json_write_request(buffer, catalog, bus),
        }
    }
}

/// Scan a host buffer for packed 15-byte binary write entries and queue each
/// valid frame on the bus. Returns the number of frames queued.
///
/// Scanning stops at a '!' sentinel or when fewer than 15 bytes remain. A
/// corrupted entry (delimiter mismatch) is logged with its surrounding bytes
/// and the scan advances by a single byte, so a corrupt buffer costs at most
/// one pass -- it can never stall the polling loop.
pub fn receive_binary_write_request(buffer: &[u8], bus: &mut CanBus) -> usize {
    let buffer = &buffer[..buffer.len().min(HOST_BUFFER_LEN)];
    let mut index = 0;
    let mut queued = 0;

    while index + BINARY_PACKET_LEN <= buffer.len() && buffer[index] != b'!' {
        if buffer[index] != b'{' || buffer[index + 5] != b'|' || buffer[index + 14] != b'}' {
            let window_end = (index + 16).min(buffer.len());
            debug!(
                bytes = format_hex(&buffer[index..window_end]).as_str(),
                "received a corrupted binary write entry"
            );
            index += 1;
            continue;
        }

        let mut id_bytes = [0u8; 4];
        id_bytes.copy_from_slice(&buffer[index + 1..index + 5]);
        let mut data = [0u8; CAN_PAYLOAD_LEN];
        data.copy_from_slice(&buffer[index + 6..index + 14]);

        let outgoing = CanMessage {
            // The id travels in the host's native (little-endian) byte order.
            id: u32::from_le_bytes(id_bytes),
            data,
        };
        if bus.send_queue.push(outgoing) {
            queued += 1;
        } else {
            debug!(id = outgoing.id, "send queue full, dropping binary write");
        }
        index += BINARY_PACKET_LEN;
    }
    queued
}

/// Parse a host buffer as one JSON write request and dispatch it.
///
/// Returns true when a JSON object was recognized at all, even if the
/// request inside it was rejected; false only when the buffer is
/// unparseable, so the caller can distinguish "garbage" from "refused".
pub fn receive_json_write_request(
    buffer: &[u8],
    catalog: &SignalCatalog,
    bus: &mut CanBus,
) -> bool {
    let root: serde_json::Value = match serde_json::from_slice(buffer) {
        Ok(root) => root,
        Err(_) => {
            debug!(
                buffer = String::from_utf8_lossy(buffer).as_ref(),
                "unable to parse JSON write request"
            );
            return false;
        }
    };

    match WriteRequest::from_json(&root) {
        WriteRequest::Named { name, value } => handle_named_write(&name, value, catalog, bus),
        WriteRequest::Raw { id, data } => {
            let message = CanMessage { id, data };
            if !bus.send_queue.push(message) {
                debug!(id, "send queue full, dropping raw write");
            }
        }
        WriteRequest::Invalid { reason } => debug!(reason = reason.as_str(), "dropping write request"),
    }
    true
}

/// Dispatch a translated write: writable signals first, then commands.
/// Unknown names and non-writable signals are deliberately indistinguishable
/// to the host -- both are logged and inert.
fn handle_named_write(name: &str, value: f64, catalog: &SignalCatalog, bus: &mut CanBus) {
    if let Some(signal) = catalog.lookup_signal(name, true) {
        // Failures inside the send path are already logged there.
        let _ = send_can_signal(signal, value, bus);
    } else if let Some(command) = catalog.lookup_command(name) {
        (command.handler)(name, value, catalog);
    } else {
        debug!(name, "writing not allowed for signal");
    }
}

fn format_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 3);
    for byte in bytes {
        write!(s, "{byte:02x} ").unwrap();
    }
    s
}
