#![no_main]

use cm_protocol::core::envelope::classify;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Classification must reject bad frames without panicking, before and
    // after the handshake.
    let _ = classify(data, false);
    let _ = classify(data, true);
});
