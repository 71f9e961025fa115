//! Integration tests for server-list tracking through the client

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::BytesMut;
use cm_protocol::config::ProtocolConfig;
use cm_protocol::core::emsg::EMsg;
use cm_protocol::core::header::{ExtendedClientMsgHdr, MsgHdrProtoBuf};
use cm_protocol::core::proto::c_msg_client_server_list::Server;
use cm_protocol::core::proto::CMsgClientServerList;
use cm_protocol::protocol::handshake::HandshakeGate;
use cm_protocol::protocol::server_list::{ServerEntry, ServerKind};
use cm_protocol::service::client::CmClient;
use prost::Message;
use std::net::Ipv4Addr;

fn server_list_frame(servers: Vec<Server>) -> Vec<u8> {
    let body = CMsgClientServerList { servers };
    let mut raw = BytesMut::new();
    MsgHdrProtoBuf::new(EMsg::ClientServerList).write_to(&mut raw);
    raw.extend_from_slice(&body.encode_to_vec());
    raw.to_vec()
}

fn cm_server(ip: Ipv4Addr, port: u32) -> Server {
    Server {
        server_type: Some(ServerKind::CM.0),
        server_ip: Some(u32::from(ip)),
        server_port: Some(port),
    }
}

fn encrypted_client() -> CmClient {
    CmClient::with_gate(ProtocolConfig::default(), HandshakeGate::assume_complete())
}

#[test]
fn test_server_list_adds_and_deduplicates() {
    let client = encrypted_client();
    let first = Ipv4Addr::new(127, 0, 0, 1);
    let second = Ipv4Addr::new(127, 0, 0, 2);

    assert!(client.servers_of_type(ServerKind::CM).unwrap().is_empty());

    client
        .on_bytes_received(&server_list_frame(vec![cm_server(first, 1234)]))
        .unwrap();
    assert_eq!(client.servers_of_type(ServerKind::CM).unwrap().len(), 1);

    client
        .on_bytes_received(&server_list_frame(vec![cm_server(second, 1235)]))
        .unwrap();
    assert_eq!(client.servers_of_type(ServerKind::CM).unwrap().len(), 2);

    client
        .on_bytes_received(&server_list_frame(vec![cm_server(first, 1234)]))
        .unwrap();
    let servers = client.servers_of_type(ServerKind::CM).unwrap();
    assert_eq!(servers.len(), 2);
    assert!(servers.contains(&ServerEntry::new(ServerKind::CM, first, 1234)));
    assert!(servers.contains(&ServerEntry::new(ServerKind::CM, second, 1235)));
}

#[test]
fn test_server_list_before_handshake_is_ignored() {
    let client = CmClient::new(ProtocolConfig::default());
    let frame = server_list_frame(vec![cm_server(Ipv4Addr::LOCALHOST, 27017)]);

    assert!(client.on_bytes_received(&frame).unwrap().is_none());
    assert_eq!(client.server_count().unwrap(), 0);
}

#[test]
fn test_mixed_kinds_and_bad_entries() {
    let client = encrypted_client();
    let servers = vec![
        cm_server(Ipv4Addr::new(10, 0, 0, 1), 27017),
        Server {
            server_type: Some(ServerKind::UFS.0),
            server_ip: Some(u32::from(Ipv4Addr::new(10, 0, 0, 2))),
            server_port: Some(27030),
        },
        // port does not fit in 16 bits
        cm_server(Ipv4Addr::new(10, 0, 0, 3), 70_000),
        Server {
            server_type: Some(ServerKind::CS.0),
            server_ip: None,
            server_port: Some(80),
        },
    ];

    client.on_bytes_received(&server_list_frame(servers)).unwrap();

    assert_eq!(client.servers_of_type(ServerKind::CM).unwrap().len(), 1);
    assert_eq!(client.servers_of_type(ServerKind::UFS).unwrap().len(), 1);
    assert!(client.servers_of_type(ServerKind::CS).unwrap().is_empty());
    assert_eq!(client.server_count().unwrap(), 2);
}

#[test]
fn test_legacy_server_list_is_not_merged() {
    let client = encrypted_client();
    let frame = ExtendedClientMsgHdr::new(EMsg::ClientServerList).to_bytes();
    let envelope = client.on_bytes_received(&frame).unwrap();
    assert!(envelope.is_some());
    assert_eq!(client.server_count().unwrap(), 0);
}
