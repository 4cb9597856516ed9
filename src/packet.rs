use static_assertions::const_assert;

/// Fixed capacity of the network ingest buffer.
pub const FRAME_CAPACITY: usize = 256;

const_assert!(FRAME_CAPACITY >= 2);

/// Reusable fixed-capacity ingest buffer.
///
/// Owned exclusively by the network task and reused in place across cycles,
/// so steady-state operation performs no allocation. The payload beyond
/// `length` is never handed out.
#[derive(Debug)]
pub struct RawFrame {
    payload: [u8; FRAME_CAPACITY],
    length: usize,
}

impl RawFrame {
    pub fn new() -> Self {
        Self {
            payload: [0; FRAME_CAPACITY],
            length: 0,
        }
    }

    /// Full-capacity view for the packet source to fill.
    pub fn payload_mut(&mut self) -> &mut [u8; FRAME_CAPACITY] {
        &mut self.payload
    }

    /// Apply the defensive terminator policy after a read of `bytes_read`
    /// bytes and fix the usable length.
    ///
    /// The terminator is never written past the last addressable byte: a
    /// read that exactly fills the buffer gives up its final byte to the
    /// terminator, reducing the usable length by one.
    pub fn seal(&mut self, bytes_read: usize) -> usize {
        let usable = if bytes_read >= FRAME_CAPACITY {
            self.payload[FRAME_CAPACITY - 1] = 0;
            FRAME_CAPACITY - 1
        } else {
            self.payload[bytes_read] = 0;
            bytes_read
        };
        self.length = usable;
        usable
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload[..self.length]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl Default for RawFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of raw network frames.
///
/// `poll` fills up to `buffer.len()` bytes and returns the count read;
/// zero means "no data this cycle". Implementations never block —
/// production versions replace this with a real transport.
pub trait PacketSource {
    fn poll(&mut self, buffer: &mut [u8]) -> usize;
}

// Minimal MQTT CONNECT: control type 1, remaining length 12, 12 payload bytes.
const CONNECT_FRAME_LEN: usize = 14;

/// Stub uplink producing a minimal valid MQTT CONNECT frame each cycle.
#[derive(Debug, Default)]
pub struct SimulatedUplink;

impl SimulatedUplink {
    pub fn new() -> Self {
        Self
    }
}

impl PacketSource for SimulatedUplink {
    fn poll(&mut self, buffer: &mut [u8]) -> usize {
        if buffer.len() < CONNECT_FRAME_LEN {
            return 0;
        }

        buffer[0] = 0x10;
        buffer[1] = 12;
        for (i, byte) in buffer[2..CONNECT_FRAME_LEN].iter_mut().enumerate() {
            *byte = (i + 2) as u8;
        }
        CONNECT_FRAME_LEN
    }
}
