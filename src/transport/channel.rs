//! Byte-at-a-time channel seen by [`Controller::service`](crate::control::Controller::service).

use std::collections::VecDeque;

/// A full-duplex byte link to the host.
pub trait ByteChannel {
    /// Offer one byte to the host. Returns `false` if it cannot take it now.
    fn send_byte(&mut self, byte: u8) -> bool;

    /// Next byte from the host, if one is waiting.
    fn recv_byte(&mut self) -> Option<u8>;
}

/// In-memory link for driving a controller without I/O.
///
/// The host side pushes with [`host_send`](Self::host_send) and collects
/// with [`host_recv_all`](Self::host_recv_all). An optional limit on the
/// outgoing side simulates a slow host.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    to_device: VecDeque<u8>,
    to_host: VecDeque<u8>,
    host_limit: Option<usize>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse device bytes once `limit` are waiting for the host.
    pub fn with_host_limit(limit: usize) -> Self {
        Self {
            host_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Queue bytes from the host towards the device.
    pub fn host_send(&mut self, bytes: &[u8]) {
        self.to_device.extend(bytes);
    }

    /// Collect every byte the device has sent.
    pub fn host_recv_all(&mut self) -> Vec<u8> {
        self.to_host.drain(..).collect()
    }

    /// Bytes from the host not yet taken by the device.
    pub fn pending_to_device(&self) -> usize {
        self.to_device.len()
    }
}

impl ByteChannel for MemoryChannel {
    fn send_byte(&mut self, byte: u8) -> bool {
        if let Some(limit) = self.host_limit {
            if self.to_host.len() >= limit {
                return false;
            }
        }
        self.to_host.push_back(byte);
        true
    }

    fn recv_byte(&mut self) -> Option<u8> {
        self.to_device.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_flow_both_ways() {
        let mut ch = MemoryChannel::new();
        ch.host_send(&[1, 2, 3]);
        assert_eq!(ch.pending_to_device(), 3);
        assert_eq!(ch.recv_byte(), Some(1));
        assert_eq!(ch.recv_byte(), Some(2));

        assert!(ch.send_byte(9));
        assert!(ch.send_byte(8));
        assert_eq!(ch.host_recv_all(), vec![9, 8]);
        assert!(ch.host_recv_all().is_empty());
    }

    #[test]
    fn test_host_limit() {
        let mut ch = MemoryChannel::with_host_limit(1);
        assert!(ch.send_byte(1));
        assert!(!ch.send_byte(2));
        ch.host_recv_all();
        assert!(ch.send_byte(2));
    }
}
