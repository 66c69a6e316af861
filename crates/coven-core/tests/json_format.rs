#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;
use serde_json::{json, Value};

use coven_core::protocol::{Envelope, JsonFormat, WireFormat};

fn decode(raw: &str) -> coven_core::Result<Envelope<Value>> {
    JsonFormat::<Value>::new().decode(Bytes::from(raw.to_owned()))
}

#[test]
fn decodes_full_envelope() {
    let env = decode(r#"{"header":{"from":"a","to":"*"},"payload":{"text":"hi"}}"#).unwrap();
    assert!(env.is_broadcast());
    assert_eq!(env.from(), &"a");
    assert_eq!(env.payload(), &json!({"text": "hi"}));
}

#[test]
fn encodes_header_and_payload() {
    let env = Envelope::of("s", "peer", json!([1, 2])).unwrap();
    let bytes = JsonFormat::new().encode(&env).unwrap();
    let v: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v, json!({"header": {"from": "s", "to": "peer"}, "payload": [1, 2]}));
}

#[test]
fn missing_payload_is_rejected() {
    let err = decode(r#"{"header":{"from":"a","to":"s"}}"#).unwrap_err();
    assert_eq!(err.code(), "BAD_FRAME");
}

#[test]
fn missing_header_field_is_rejected() {
    let err = decode(r#"{"header":{"from":"a"},"payload":1}"#).unwrap_err();
    assert_eq!(err.code(), "BAD_FRAME");
}

#[test]
fn blank_address_is_rejected() {
    let err = decode(r#"{"header":{"from":"","to":"s"},"payload":1}"#).unwrap_err();
    assert_eq!(err.code(), "INVALID_ADDRESS");
}

#[test]
fn unknown_header_field_is_rejected() {
    let err = decode(r#"{"header":{"from":"a","to":"s","via":"x"},"payload":1}"#).unwrap_err();
    assert_eq!(err.code(), "BAD_FRAME");
}

#[test]
fn garbage_is_rejected() {
    let err = decode("not json").unwrap_err();
    assert_eq!(err.code(), "BAD_FRAME");
}
