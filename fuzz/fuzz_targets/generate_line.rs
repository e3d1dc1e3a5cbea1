#![no_main]

use libfuzzer_sys::fuzz_target;

// Exercises the full text-to-wire pipeline (time-prefix parsing, RTP/RTCP
// dispatch, the descriptor parser, and every serializer it can reach) on
// arbitrary byte input. Only a parse/serialize panic is a bug here; a
// returned `Err` for malformed input is the expected, documented behavior.
fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = rtpreplay::fuzz_targets::generate_line(text);
    }
});
