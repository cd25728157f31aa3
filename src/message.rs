/*!
 * CAN message and bus types.
 */

use crate::queue::BoundedQueue;

/// Payload length of a classic CAN frame. Shorter frames are zero-padded so
/// every queued message carries exactly 8 bytes.
pub const CAN_PAYLOAD_LEN: usize = 8;

/// One unit of CAN I/O: a numeric id plus an 8-byte payload.
/// Immutable once queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanMessage {
    // CAN ID: 11-bit standard or 29-bit extended ID
    pub id: u32,
    pub data: [u8; CAN_PAYLOAD_LEN],
}

impl Default for CanMessage {
    fn default() -> Self {
        CanMessage {
            id: 0,
            data: [0; CAN_PAYLOAD_LEN],
        }
    }
}

/// One physical CAN bus: a receive queue filled by the driver and drained by
/// the dispatcher, and a send queue filled by the write path and drained to
/// the driver.
#[derive(Debug)]
pub struct CanBus {
    pub receive_queue: BoundedQueue<CanMessage>,
    pub send_queue: BoundedQueue<CanMessage>,
}

impl CanBus {
    pub fn new(queue_capacity: usize) -> Self {
        CanBus {
            receive_queue: BoundedQueue::new(queue_capacity),
            send_queue: BoundedQueue::new(queue_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_is_zeroed() {
        let message = CanMessage::default();
        assert_eq!(message.id, 0);
        assert_eq!(message.data, [0u8; CAN_PAYLOAD_LEN]);
    }

    #[test]
    fn test_bus_queues_are_independent() {
        let mut bus = CanBus::new(2);
        assert!(bus.receive_queue.push(CanMessage {
            id: 0x100,
            data: [1; 8]
        }));
        assert!(bus.send_queue.is_empty());
        assert_eq!(bus.receive_queue.len(), 1);
    }
}
