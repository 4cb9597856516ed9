use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MQTT_CONTROL_TYPE_MIN: u8 = 1;
pub const MQTT_CONTROL_TYPE_MAX: u8 = 14;
pub const MAX_REMAINING_LENGTH: u32 = (1 << 28) - 1;

// Base-128 varint: 7 data bits per byte, at most 4 encoded bytes.
const VARINT_SHIFT_LIMIT: u32 = 28;

/// Generic two-byte header: declared type and payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketHeader {
    pub packet_type: u8,
    pub payload_len: u8,
}

/// Result of a successful MQTT fixed-header decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttFixedHeader {
    pub control_type: u8,
    pub remaining_length: u32,
    /// Control byte plus 1-4 remaining-length bytes.
    pub header_size: u8,
}

/// Structural rejection classes for the generic header check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("frame shorter than the two-byte header")]
    TooShort,
    #[error("declared payload length exceeds received bytes")]
    PayloadOverrun,
}

/// Rejection classes for the MQTT fixed-header decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MqttDecodeError {
    #[error("frame shorter than the two-byte fixed header")]
    TooShort,
    #[error("control type {0} outside the valid range 1..=14")]
    ControlTypeOutOfRange(u8),
    #[error("remaining-length varint runs past the end of the frame")]
    TruncatedRemainingLength,
    #[error("remaining-length varint exceeds four encoded bytes")]
    OversizedRemainingLength,
    #[error("declared remaining length exceeds received bytes")]
    RemainingLengthOverrun,
}

/// Validation outcome for one received frame.
///
/// `AcceptedGeneric` means the structural check passed but the same bytes do
/// not parse as an MQTT fixed header; the decode error is carried so callers
/// can log the reason class without re-decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rejected(RejectReason),
    AcceptedGeneric(PacketHeader, MqttDecodeError),
    AcceptedMqtt(PacketHeader, MqttFixedHeader),
}

/// Validate one received frame.
///
/// The generic structural check must pass before the MQTT decode is
/// attempted. Both interpretations run against the same raw bytes under
/// different schemas. Pure function of the input span: no side effects, no
/// reads past `frame.len()`.
pub fn validate(frame: &[u8]) -> Outcome {
    if frame.len() < 2 {
        return Outcome::Rejected(RejectReason::TooShort);
    }

    let header = PacketHeader {
        packet_type: frame[0],
        payload_len: frame[1],
    };

    // Bounds check before anything downstream reads past the header.
    if usize::from(header.payload_len) > frame.len() - 2 {
        return Outcome::Rejected(RejectReason::PayloadOverrun);
    }

    match decode_mqtt_header(frame) {
        Ok(mqtt) => Outcome::AcceptedMqtt(header, mqtt),
        Err(reason) => Outcome::AcceptedGeneric(header, reason),
    }
}

/// Decode the standard MQTT fixed header: one control byte followed by a
/// 1-4 byte base-128 remaining-length varint.
pub fn decode_mqtt_header(frame: &[u8]) -> Result<MqttFixedHeader, MqttDecodeError> {
    if frame.len() < 2 {
        return Err(MqttDecodeError::TooShort);
    }

    let control_type = (frame[0] >> 4) & 0x0F;
    if !(MQTT_CONTROL_TYPE_MIN..=MQTT_CONTROL_TYPE_MAX).contains(&control_type) {
        return Err(MqttDecodeError::ControlTypeOutOfRange(control_type));
    }

    let mut offset = 1usize;
    let mut remaining_length: u32 = 0;
    let mut shift: u32 = 0;

    loop {
        if offset >= frame.len() {
            return Err(MqttDecodeError::TruncatedRemainingLength);
        }

        let encoded = frame[offset];
        offset += 1;
        remaining_length |= u32::from(encoded & 0x7F) << shift;
        shift += 7;

        if encoded & 0x80 == 0 {
            break;
        }

        // A continuation bit on the fourth byte would demand a fifth encoded
        // byte and a shift past 28; the field is bounded at 2^28 - 1.
        if shift >= VARINT_SHIFT_LIMIT {
            return Err(MqttDecodeError::OversizedRemainingLength);
        }
    }

    // The declared payload must fit in what was actually received.
    if remaining_length as usize > frame.len() - offset {
        return Err(MqttDecodeError::RemainingLengthOverrun);
    }

    Ok(MqttFixedHeader {
        control_type,
        remaining_length,
        header_size: offset as u8,
    })
}
