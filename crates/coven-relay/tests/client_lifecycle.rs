#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use coven_core::{AllowAll, ErrorClass};
use coven_relay::{Client, ClientOptions, Node};

use common::*;

#[test]
fn invalid_options_are_rejected() {
    let err = Client::<String>::new(ClientOptions::new("  ", 7070), codec()).err().unwrap();
    assert_eq!(err.code(), "CONFIG");

    let err = Client::<String>::new(ClientOptions::new("127.0.0.1", 0), codec()).err().unwrap();
    assert_eq!(err.code(), "CONFIG");
}

#[tokio::test]
async fn sending_requires_a_connection() {
    let client = Client::<String>::new(ClientOptions::new("127.0.0.1", free_port()), codec()).unwrap();
    assert!(!client.is_connected());

    let err = client.broadcast("hi".into()).await.unwrap_err();
    assert_eq!(err.code(), "NOT_CONNECTED");
    let err = client.disconnect().await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Precondition);
}

#[tokio::test]
async fn connect_to_nothing_is_a_transport_error() {
    let client = Client::<String>::new(ClientOptions::new("127.0.0.1", free_port()), codec()).unwrap();
    let err = client.connect().await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Transport);
    assert!(!client.is_connected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn connect_and_disconnect_are_guarded() {
    let srv = start_server(Arc::new(AllowAll), true).await;
    let peer = connect_peer(&srv.server, srv.port).await;
    assert!(peer.client.is_connected());
    assert_eq!(peer.client.host(), "127.0.0.1");
    assert_eq!(peer.client.port(), srv.port);

    let err = peer.client.connect().await.unwrap_err();
    assert_eq!(err.code(), "ALREADY_CONNECTED");

    peer.client.disconnect().await.unwrap();
    assert!(!peer.client.is_connected());
    let err = peer.client.disconnect().await.unwrap_err();
    assert_eq!(err.code(), "NOT_CONNECTED");

    // the server notices and forgets the peer
    wait_until(|| srv.server.peer_count() == 0).await;

    srv.server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn client_can_reconnect() {
    let srv = start_server(Arc::new(AllowAll), true).await;
    let peer = connect_peer(&srv.server, srv.port).await;

    peer.client.disconnect().await.unwrap();
    wait_until(|| srv.server.peer_count() == 0).await;
    peer.client.connect().await.unwrap();
    wait_until(|| srv.server.peer_count() == 1).await;

    srv.server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn server_shutdown_marks_client_disconnected() {
    let srv = start_server(Arc::new(AllowAll), true).await;
    let peer = connect_peer(&srv.server, srv.port).await;

    srv.server.stop().await.unwrap();
    wait_until(|| !peer.client.is_connected()).await;

    let err = peer.client.broadcast("late".into()).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Transport);

    // the reader already tore the connection down
    let err = peer.client.disconnect().await.unwrap_err();
    assert_eq!(err.code(), "NOT_CONNECTED");
    // and a reconnect is attempted rather than refused as ALREADY_CONNECTED
    let err = peer.client.connect().await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Transport);
}
