//! Concurrency tests: one client shared by many receive tasks

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::BytesMut;
use cm_protocol::config::ProtocolConfig;
use cm_protocol::core::emsg::EMsg;
use cm_protocol::core::header::{ExtendedClientMsgHdr, MsgHdr, MsgHdrProtoBuf};
use cm_protocol::core::proto::c_msg_client_server_list::Server;
use cm_protocol::core::proto::CMsgClientServerList;
use cm_protocol::protocol::handshake::HandshakeGate;
use cm_protocol::protocol::server_list::ServerKind;
use cm_protocol::service::client::CmClient;
use prost::Message;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;

fn server_list_frame(first_octet_seed: u32, count: u32) -> Vec<u8> {
    let body = CMsgClientServerList {
        servers: (0..count)
            .map(|i| Server {
                server_type: Some(ServerKind::CM.0),
                server_ip: Some(0x0A00_0000 | (first_octet_seed << 8) | i),
                server_port: Some(27017),
            })
            .collect(),
    };
    let mut raw = BytesMut::new();
    MsgHdrProtoBuf::new(EMsg::ClientServerList).write_to(&mut raw);
    raw.extend_from_slice(&body.encode_to_vec());
    raw.to_vec()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_server_list_merges() {
    let client = Arc::new(CmClient::with_gate(
        ProtocolConfig::default(),
        HandshakeGate::assume_complete(),
    ));

    let tasks_count = 16u32;
    let per_list = 32u32;
    let mut tasks = JoinSet::new();
    for task in 0..tasks_count {
        let client = Arc::clone(&client);
        tasks.spawn(async move {
            // Half of the tasks announce an overlapping list.
            let seed = task % (tasks_count / 2);
            let frame = server_list_frame(seed, per_list);
            for _ in 0..50 {
                let envelope = client.on_bytes_received(&frame).unwrap();
                assert!(envelope.is_some());
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let expected = (tasks_count / 2 * per_list) as usize;
    assert_eq!(client.servers_of_type(ServerKind::CM).unwrap().len(), expected);
    assert_eq!(
        client.metrics().snapshot().servers_merged,
        expected as u64
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn gate_completion_races_with_receivers() {
    let client = Arc::new(CmClient::new(ProtocolConfig::default()));
    let delivered = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&delivered);
    client
        .dispatcher()
        .register(EMsg::ClientLoggedOff, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    let frame = ExtendedClientMsgHdr::new(EMsg::ClientLoggedOff).to_bytes().to_vec();
    let iterations = 1_000usize;

    let mut tasks = JoinSet::new();
    for _ in 0..4 {
        let client = Arc::clone(&client);
        let frame = frame.clone();
        tasks.spawn(async move {
            for _ in 0..iterations {
                client.on_bytes_received(&frame).unwrap();
                tokio::task::yield_now().await;
            }
        });
    }

    let completer = Arc::clone(&client);
    tasks.spawn(async move {
        let result = MsgHdr::new(EMsg::ChannelEncryptResult).to_bytes();
        completer.on_bytes_received(&result).unwrap();
        completer.handshake_gate().complete();
    });

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let snapshot = client.metrics().snapshot();
    let total = (4 * iterations) as u64;
    assert_eq!(
        snapshot.gate_drops + delivered.load(Ordering::SeqCst) as u64,
        total
    );
    assert_eq!(snapshot.handshake_envelopes, 1);
    assert!(client.handshake_gate().is_complete());

    // Once complete, nothing is dropped any more.
    let before = snapshot.gate_drops;
    client.on_bytes_received(&frame).unwrap();
    assert_eq!(client.metrics().snapshot().gate_drops, before);
}
