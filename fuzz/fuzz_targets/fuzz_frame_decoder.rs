//! Fuzz target: `frame::decode`
//!
//! Arbitrary bytes must either decode to a command whose encoding decodes
//! back to itself, or be rejected.  Never a panic.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use servobridge::error::FrameRejected;
use servobridge::protocol::frame::{self, FRAME_SIZE};

fuzz_target!(|data: &[u8]| {
    match frame::decode(data) {
        Ok(cmd) => {
            assert_eq!(data.len(), FRAME_SIZE);
            assert_eq!(frame::decode(&frame::encode(cmd)), Ok(cmd));
        }
        Err(FrameRejected::SizeMismatch) => assert_ne!(data.len(), FRAME_SIZE),
        Err(_) => assert_eq!(data.len(), FRAME_SIZE),
    }
});
