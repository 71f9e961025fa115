#![no_main]

use cm_protocol::config::ProtocolConfig;
use cm_protocol::protocol::handshake::HandshakeGate;
use cm_protocol::service::client::CmClient;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Full receive path, including server-list body decoding.
    let client = CmClient::with_gate(ProtocolConfig::default(), HandshakeGate::assume_complete());
    let _ = client.on_bytes_received(data);
});
