//! Fixed-size serial frame codec.
//!
//! Wire format (16 bytes, bit-exact):
//! ```text
//! ┌──────┬─────────────┬─────────┬───────────────┬───────┬───────┬──────┐
//! │ 0xFF │ 04 0C 08 0E │ 05 08   │ reserved (6B) │ index │ value │ 0x0A │
//! │ [0]  │ [1..5)      │ [5..7)  │ [7..13)       │ [13]  │ [14]  │ [15] │
//! └──────┴─────────────┴─────────┴───────────────┴───────┴───────┴──────┘
//! ```
//!
//! Each buffer is decoded on its own.  There is no reassembly across reads:
//! a short or corrupted read is rejected wholesale and the caller simply asks
//! for the next one.  Reserved bytes are opaque and never checked.
//!
//! Index, value and reserved bytes may all equal `0x0A`, so a line reader
//! cannot stop at the first newline.  [`newline_ends_read`] tells it whether a
//! newline it just read is the terminator or payload.

use crate::error::FrameRejected;
use crate::protocol::ActuatorCommand;

/// Total frame length in bytes.
pub const FRAME_SIZE: usize = 16;

pub const SENTINEL: u8 = 0xFF;
pub const TERMINATOR: u8 = 0x0A;
pub const MAGIC_HEADER: [u8; 4] = [0x04, 0x0C, 0x08, 0x0E];
pub const COMMAND_SERVO_POSITION: [u8; 2] = [0x05, 0x08];

const HEADER_OFFSET: usize = 1;
const COMMAND_OFFSET: usize = HEADER_OFFSET + MAGIC_HEADER.len();
const INDEX_OFFSET: usize = FRAME_SIZE - 3;
const VALUE_OFFSET: usize = FRAME_SIZE - 2;
const PREFIX_LEN: usize = COMMAND_OFFSET + COMMAND_SERVO_POSITION.len();

/// Fixed bytes every frame starts with.
const PREFIX: [u8; PREFIX_LEN] = [
    SENTINEL,
    MAGIC_HEADER[0],
    MAGIC_HEADER[1],
    MAGIC_HEADER[2],
    MAGIC_HEADER[3],
    COMMAND_SERVO_POSITION[0],
    COMMAND_SERVO_POSITION[1],
];

/// Whether a `\n` just read ends the line.  `read` holds every byte of the
/// current read, that newline last.
///
/// While the bytes so far still match the start of a frame the newline is
/// payload, unless it sits in the terminator slot.  Anything that has already
/// diverged from a frame ends at its first newline.
pub fn newline_ends_read(read: &[u8]) -> bool {
    if read.len() >= FRAME_SIZE {
        return true;
    }
    read.iter().zip(PREFIX).any(|(got, want)| *got != want)
}

/// Validate `buf` and extract the command it carries.
///
/// Checks run in a fixed order and the first failure is reported:
/// size, sentinel, terminator, header, command code.
pub fn decode(buf: &[u8]) -> Result<ActuatorCommand, FrameRejected> {
    let frame: &[u8; FRAME_SIZE] = buf.try_into().map_err(|_| FrameRejected::SizeMismatch)?;

    if frame[0] != SENTINEL {
        return Err(FrameRejected::BadSentinel);
    }
    if frame[FRAME_SIZE - 1] != TERMINATOR {
        return Err(FrameRejected::BadTerminator);
    }
    if frame[HEADER_OFFSET..COMMAND_OFFSET] != MAGIC_HEADER {
        return Err(FrameRejected::BadHeader);
    }
    if frame[COMMAND_OFFSET..PREFIX_LEN] != COMMAND_SERVO_POSITION {
        return Err(FrameRejected::BadCommand);
    }

    Ok(ActuatorCommand {
        index: frame[INDEX_OFFSET],
        raw_value: frame[VALUE_OFFSET],
    })
}

/// Build the frame that [`decode`] turns back into `cmd`.  Reserved bytes are zero.
pub fn encode(cmd: ActuatorCommand) -> [u8; FRAME_SIZE] {
    let mut frame = [0u8; FRAME_SIZE];
    frame[0] = SENTINEL;
    frame[HEADER_OFFSET..COMMAND_OFFSET].copy_from_slice(&MAGIC_HEADER);
    frame[COMMAND_OFFSET..PREFIX_LEN].copy_from_slice(&COMMAND_SERVO_POSITION);
    frame[INDEX_OFFSET] = cmd.index;
    frame[VALUE_OFFSET] = cmd.raw_value;
    frame[FRAME_SIZE - 1] = TERMINATOR;
    frame
}
