//! Integration tests for the nautica-core packet codec.
//!
//! These tests go through the public API only, the same way the session
//! layer uses it: raw frame text in, typed packets out, and back again.

use nautica_core::{decode_packet, encode_packet, MessageKind, Packet, PacketError, ServerSummary};
use serde_json::json;

#[test]
fn test_list_reply_yields_servers_in_order() {
    // Arrange: a reply as produced by the device's nr.list route
    let frame = r#"{
        "id": "nr.list",
        "ok": true,
        "servers": [
            {"label": "lab", "node": "n1", "ip": "10.0.0.5", "port": 9000},
            {"label": "attic", "node": "n2", "ip": "10.0.0.6", "port": 9001}
        ]
    }"#;

    // Act
    let packet = decode_packet(frame).expect("valid reply must decode");
    let servers = packet.servers().expect("servers must decode");

    // Assert
    assert_eq!(packet.id, MessageKind::List);
    assert_eq!(packet.is_ok(), Some(true));
    assert_eq!(
        servers,
        vec![
            ServerSummary {
                label: "lab".to_string(),
                node: "n1".to_string(),
                ip: "10.0.0.5".to_string(),
                port: 9000,
            },
            ServerSummary {
                label: "attic".to_string(),
                node: "n2".to_string(),
                ip: "10.0.0.6".to_string(),
                port: 9001,
            },
        ]
    );
}

#[test]
fn test_list_reply_with_bad_entry_is_malformed() {
    let packet = decode_packet(r#"{"id":"nr.list","servers":[{"label":"x"}]}"#).unwrap();
    assert!(matches!(packet.servers(), Err(PacketError::Malformed(_))));
}

#[test]
fn test_application_packet_survives_reencoding() {
    // Frames for application-defined kinds must pass through untouched.
    let packet = Packet::new("lights.set")
        .with("level", 80)
        .with("rooms", json!(["hall", "kitchen"]));

    let text = encode_packet(&packet).unwrap();
    let decoded = decode_packet(&text).unwrap();

    assert_eq!(decoded, packet);
    assert!(text.starts_with(r#"{"id":"lights.set","#), "id must lead: {text}");
}

#[test]
fn test_error_packet_from_client_and_server_both_yield_content() {
    let from_client = decode_packet(r#"{"id":"error","content":"bad-key"}"#).unwrap();
    let from_server = decode_packet(r#"{"id":"error","ok":false,"error":"bad-key"}"#).unwrap();

    assert_eq!(from_client.error_content(), json!("bad-key"));
    assert_eq!(from_server.error_content(), json!("bad-key"));
}

#[test]
fn test_truncated_frame_is_malformed_not_panic() {
    let result = decode_packet(r#"{"id":"nr.li"#);
    assert!(matches!(result, Err(PacketError::Malformed(_))));
}
