//! Fuzz target: controller response decoding
//!
//! Drives arbitrary bytes through `decode_lines` and every resulting line
//! through `parse_echo`. Neither may panic; decoded lines are never empty
//! and any parsed echo is a valid attention value.
//!
//! cargo fuzz run fuzz_response_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use mindctl::protocol::codec::{decode_lines, parse_echo};

fuzz_target!(|data: &[u8]| {
    for line in decode_lines(data) {
        assert!(!line.is_empty(), "decoder must not yield empty lines");
        if let Some(echo) = parse_echo(&line) {
            assert!(echo.raw_attention <= 100, "echo attention out of range");
        }
    }
});
