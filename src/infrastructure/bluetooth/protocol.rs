//! Govee BLE Protocol
//!
//! Frame codec for the Govee control characteristic. Every write is a
//! fixed 20-byte frame whose last byte is the XOR of the 19 before it.
//! The device never acknowledges a frame, so a bad checksum is silently
//! dropped on the other end.
//!
//! # Single frame
//!
//! ```text
//! [0]      0x33 header
//! [1]      command (POWER, BRIGHTNESS, COLOR)
//! [2..18]  payload, up to 16 bytes, zero padded
//! [19]     checksum
//! ```
//!
//! # Multi-frame sequence
//!
//! Payloads longer than 16 bytes are split into 14-byte chunks, one per
//! frame, written in order:
//!
//! ```text
//! [0]      0xA3 header
//! [1]      frame index, 0xFF on the final frame
//! [2]      total frame count
//! [3]      command
//! [4]      chunk length
//! [5..18]  chunk, zero padded
//! [19]     checksum
//! ```

use crate::domain::models::Rgb;
use crate::domain::profile::ColorEncoding;
use crate::error::{Error, Result};

/// Govee light control service UUID.
pub const SERVICE_UUID: &str = "00010203-0405-0607-0809-0a0b0c0d1910";

/// Control characteristic UUID - where command frames are written.
pub const CONTROL_CHAR_UUID: &str = "00010203-0405-0607-0809-0a0b0c0d2b11";

/// Length of every frame on the wire.
pub const FRAME_LEN: usize = 20;

pub const SINGLE_HEADER: u8 = 0x33;
pub const MULTI_HEADER: u8 = 0xA3;

/// Index byte of the last frame in a multi-frame sequence.
pub const FINAL_MARKER: u8 = 0xFF;

/// Largest payload [`encode_single`] accepts.
pub const MAX_SINGLE_PAYLOAD: usize = FRAME_LEN - 4;

const MULTI_PREFIX_LEN: usize = 5;

/// Payload bytes carried by each frame of a multi-frame sequence.
pub const MULTI_CHUNK_LEN: usize = FRAME_LEN - MULTI_PREFIX_LEN - 1;

/// Longest sequence whose indices all stay below [`FINAL_MARKER`].
pub const MAX_MULTI_FRAMES: usize = FINAL_MARKER as usize - 1;

/// Trailer of a segmented COLOR payload selecting every segment.
const ALL_SEGMENTS: [u8; 7] = [0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x7F];

/// Segment selector byte that precedes the color in a segmented payload.
const SEGMENT_SELECTOR: u8 = 0x01;

pub type Frame = [u8; FRAME_LEN];

/// Command type carried in the second byte of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedCommand {
    Power = 0x01,
    Brightness = 0x04,
    Color = 0x05,
}

impl LedCommand {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for LedCommand {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Power),
            0x04 => Ok(Self::Brightness),
            0x05 => Ok(Self::Color),
            other => Err(Error::MalformedFrame(format!("unknown command 0x{other:02X}"))),
        }
    }
}

/// Mode byte leading a COLOR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedMode {
    Manual = 0x02,
    Rgbww = 0x0D,
    Segments = 0x15,
}

/// XOR of every byte in `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Whether the last byte of `frame` matches the XOR of the rest.
pub fn verify_checksum(frame: &Frame) -> bool {
    frame[FRAME_LEN - 1] == checksum(&frame[..FRAME_LEN - 1])
}

fn seal(mut frame: Frame) -> Frame {
    frame[FRAME_LEN - 1] = checksum(&frame[..FRAME_LEN - 1]);
    frame
}

/// Build one frame: `0x33, command, payload, zero padding, checksum`.
pub fn encode_single(command: LedCommand, payload: &[u8]) -> Result<Frame> {
    if payload.len() > MAX_SINGLE_PAYLOAD {
        return Err(Error::PayloadTooLarge {
            len: payload.len(),
            max: MAX_SINGLE_PAYLOAD,
        });
    }

    let mut frame = [0u8; FRAME_LEN];
    frame[0] = SINGLE_HEADER;
    frame[1] = command.as_byte();
    frame[2..2 + payload.len()].copy_from_slice(payload);
    Ok(seal(frame))
}

/// Split `payload` into a numbered frame sequence.
///
/// Produces `ceil(len / 14)` frames. Frame `i` carries index `i` except the
/// last, which carries [`FINAL_MARKER`].
pub fn encode_multi(command: LedCommand, payload: &[u8]) -> Result<Vec<Frame>> {
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }

    let count = payload.len().div_ceil(MULTI_CHUNK_LEN);
    if count > MAX_MULTI_FRAMES {
        return Err(Error::PayloadTooLarge {
            len: payload.len(),
            max: MAX_MULTI_FRAMES * MULTI_CHUNK_LEN,
        });
    }

    let frames = payload
        .chunks(MULTI_CHUNK_LEN)
        .enumerate()
        .map(|(index, chunk)| {
            let mut frame = [0u8; FRAME_LEN];
            frame[0] = MULTI_HEADER;
            frame[1] = if index + 1 == count {
                FINAL_MARKER
            } else {
                index as u8
            };
            frame[2] = count as u8;
            frame[3] = command.as_byte();
            frame[4] = chunk.len() as u8;
            frame[MULTI_PREFIX_LEN..MULTI_PREFIX_LEN + chunk.len()].copy_from_slice(chunk);
            seal(frame)
        })
        .collect();

    Ok(frames)
}

/// Encode a command as a single frame when it fits, otherwise as a sequence.
pub fn encode(command: LedCommand, payload: &[u8]) -> Result<Vec<Frame>> {
    if payload.len() <= MAX_SINGLE_PAYLOAD {
        Ok(vec![encode_single(command, payload)?])
    } else {
        encode_multi(command, payload)
    }
}

/// Rebuild the command and payload of a multi-frame sequence.
///
/// Inverse of [`encode_multi`]. Every frame must have a valid checksum,
/// the multi-frame header, a consistent count and command, and the
/// expected index in order.
pub fn reassemble(frames: &[Frame]) -> Result<(LedCommand, Vec<u8>)> {
    let first = frames
        .first()
        .ok_or_else(|| Error::MalformedFrame("empty sequence".into()))?;
    let count = first[2] as usize;
    if count != frames.len() {
        return Err(Error::MalformedFrame(format!(
            "sequence declares {count} frames, got {}",
            frames.len()
        )));
    }
    let command = first[3];

    let mut payload = Vec::with_capacity(count * MULTI_CHUNK_LEN);
    for (index, frame) in frames.iter().enumerate() {
        if !verify_checksum(frame) {
            return Err(Error::MalformedFrame(format!("bad checksum in frame {index}")));
        }
        if frame[0] != MULTI_HEADER {
            return Err(Error::MalformedFrame(format!(
                "frame {index} has header 0x{:02X}",
                frame[0]
            )));
        }
        let expected = if index + 1 == count {
            FINAL_MARKER
        } else {
            index as u8
        };
        if frame[1] != expected {
            return Err(Error::MalformedFrame(format!(
                "frame {index} has index byte 0x{:02X}, expected 0x{expected:02X}",
                frame[1]
            )));
        }
        if frame[2] as usize != count || frame[3] != command {
            return Err(Error::MalformedFrame(format!(
                "frame {index} disagrees with sequence header"
            )));
        }
        let len = frame[4] as usize;
        if len == 0 || len > MULTI_CHUNK_LEN {
            return Err(Error::MalformedFrame(format!("frame {index} has chunk length {len}")));
        }
        payload.extend_from_slice(&frame[MULTI_PREFIX_LEN..MULTI_PREFIX_LEN + len]);
    }

    Ok((LedCommand::try_from(command)?, payload))
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn power_payload(on: bool) -> Vec<u8> {
    vec![u8::from(on)]
}

/// Brightness payload. Zero is not "off"; it is rejected like anything above 100.
pub fn brightness_payload(percent: u8) -> Result<Vec<u8>> {
    if !(1..=100).contains(&percent) {
        return Err(Error::InvalidBrightness(percent));
    }
    Ok(vec![percent])
}

pub fn color_payload(encoding: ColorEncoding, rgb: Rgb) -> Vec<u8> {
    let [r, g, b] = rgb.to_bytes();
    match encoding {
        ColorEncoding::Manual => vec![LedMode::Manual as u8, r, g, b],
        ColorEncoding::Rgbww => vec![LedMode::Rgbww as u8, r, g, b],
        ColorEncoding::Segments => {
            let mut payload = vec![LedMode::Segments as u8, SEGMENT_SELECTOR, r, g, b];
            payload.extend_from_slice(&ALL_SEGMENTS);
            payload
        }
    }
}

/// Color temperature payload: `RGBWW, rgb, kelvin (big-endian), rgb`.
pub fn color_temp_payload(kelvin: u16, rgb: Rgb) -> Vec<u8> {
    let [r, g, b] = rgb.to_bytes();
    let [hi, lo] = kelvin.to_be_bytes();
    vec![LedMode::Rgbww as u8, r, g, b, hi, lo, r, g, b]
}
