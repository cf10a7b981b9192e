//! Fuzz target: `SerialFrameSource::poll`
//!
//! Two passes over each input:
//!
//! 1. The raw bytes are streamed through the line reader the way the UART
//!    would deliver them.  Every poll must return `Ok` and the stream must
//!    drain; rejected lines are counted, never surfaced.
//! 2. The bytes are read as `(index, value)` pairs, each encoded as a frame
//!    and streamed back to back.  Every pair must come out exactly once, in
//!    order, with nothing rejected.
//!
//! cargo fuzz run fuzz_serial_stream

#![no_main]

use libfuzzer_sys::fuzz_target;
use servobridge::app::ports::{CommandBus, SerialLinePort};
use servobridge::bus::serial::SerialFrameSource;
use servobridge::error::BusError;
use servobridge::protocol::ActuatorCommand;
use servobridge::protocol::frame;

struct Stream<'a> {
    data: &'a [u8],
}

impl SerialLinePort for Stream<'_> {
    fn read_line(&mut self, buf: &mut [u8]) -> Result<usize, BusError> {
        let mut n = 0;
        while n < buf.len() {
            let Some((&b, rest)) = self.data.split_first() else {
                break;
            };
            self.data = rest;
            buf[n] = b;
            n += 1;
            if b == b'\n' && frame::newline_ends_read(&buf[..n]) {
                break;
            }
        }
        Ok(n)
    }
}

fuzz_target!(|data: &[u8]| {
    let mut src = SerialFrameSource::new(Stream { data });
    // Each poll consumes at least one byte until the stream is empty.
    for _ in 0..=data.len() {
        assert!(src.poll().is_ok());
    }
    assert!(src.port_mut().data.is_empty());

    let sent: Vec<ActuatorCommand> = data
        .chunks_exact(2)
        .map(|p| ActuatorCommand::new(p[0], p[1]))
        .collect();
    let wire: Vec<u8> = sent.iter().flat_map(|&cmd| frame::encode(cmd)).collect();

    let mut src = SerialFrameSource::new(Stream { data: &wire });
    let mut got = Vec::with_capacity(sent.len());
    while let Ok(Some(cmd)) = src.poll() {
        got.push(cmd);
    }
    assert_eq!(got, sent);
    assert_eq!(src.rejected(), 0);
});
