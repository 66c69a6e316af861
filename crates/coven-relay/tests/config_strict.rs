#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use coven_core::ErrorClass;
use coven_relay::config::{self, schema::RoutingMode};
use coven_relay::server::IdentityMode;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  port: 7070
  max_clientz: 4 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
    assert_eq!(err.class(), ErrorClass::Config);
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.port, 7070);
    assert_eq!(cfg.server.max_clients, 100);
    assert!(cfg.server.include_sender_in_broadcasts);
    assert_eq!(cfg.server.write_timeout_ms, 0);
    assert_eq!(cfg.server.identity, IdentityMode::Connection);
    assert_eq!(cfg.routing.mode, RoutingMode::AllowAll);
}

#[test]
fn full_config_parses() {
    let ok = r#"
version: 1
server:
  host: "127.0.0.1"
  port: 9000
  max_clients: 8
  include_sender_in_broadcasts: false
  write_timeout_ms: 250
  identity: connection
routing:
  mode: allowlist
  allow: ["peer:server", "server:*"]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.server.max_clients, 8);
    assert!(!cfg.server.include_sender_in_broadcasts);
    assert_eq!(cfg.routing.mode, RoutingMode::Allowlist);
    assert_eq!(cfg.routing.allow.len(), 2);
}

#[test]
fn unsupported_version_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code(), "UNSUPPORTED_VERSION");
}

#[test]
fn zero_port_rejected() {
    let err = config::load_from_str("version: 1\nserver: { port: 0 }\n").expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
}

#[test]
fn zero_max_clients_rejected() {
    let err = config::load_from_str("version: 1\nserver: { max_clients: 0 }\n").expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
}

#[test]
fn allow_rules_require_allowlist_mode() {
    let bad = r#"
version: 1
routing:
  mode: allow_all
  allow: ["peer:server"]
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
}

#[test]
fn unknown_route_class_rejected() {
    let bad = r#"
version: 1
routing:
  mode: allowlist
  allow: ["peer:nobody"]
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code(), "CONFIG");
}

#[test]
fn authenticated_identity_parses() {
    let cfg = config::load_from_str("version: 1\nserver: { identity: authenticated }\n").expect("must parse");
    assert_eq!(cfg.server.identity, IdentityMode::Authenticated);
}

#[test]
fn missing_file_is_config_error() {
    let err = config::load_from_file("/nonexistent/coven.yaml").expect_err("must fail");
    assert_eq!(err.class(), ErrorClass::Config);
}
