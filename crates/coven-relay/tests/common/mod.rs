//! Shared helpers for loopback relay tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;

use coven_core::protocol::{Envelope, JsonFormat};
use coven_core::{PeerId, RoutingPolicy};
use coven_relay::{Client, ClientOptions, Codec, FramedCodec, Node, Server, ServerOptions, SharedListener};

pub type Inbox = UnboundedReceiver<Envelope<String>>;

pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

pub fn codec() -> Arc<dyn Codec<String>> {
    Arc::new(FramedCodec::new(JsonFormat::<String>::new()))
}

pub fn channel_listener(tx: UnboundedSender<Envelope<String>>) -> SharedListener<String> {
    Arc::new(move |env: Envelope<String>| -> coven_core::Result<()> {
        let _ = tx.send(env);
        Ok(())
    })
}

pub fn options(port: u16) -> ServerOptions {
    ServerOptions {
        host: "127.0.0.1".into(),
        ..ServerOptions::with_port(port)
    }
}

pub struct TestServer {
    pub server: Server<String>,
    pub port: u16,
    pub inbox: Inbox,
}

pub async fn start_server_with(opts: ServerOptions, policy: Arc<dyn RoutingPolicy<String>>) -> TestServer {
    let port = opts.port;
    let server = Server::new(opts, codec(), policy).unwrap();
    let (tx, inbox) = unbounded_channel();
    server.set_listener(Some(channel_listener(tx)));
    server.start().await.unwrap();
    TestServer { server, port, inbox }
}

pub async fn start_server(policy: Arc<dyn RoutingPolicy<String>>, include_sender: bool) -> TestServer {
    let opts = ServerOptions {
        include_sender_in_broadcasts: include_sender,
        ..options(free_port())
    };
    start_server_with(opts, policy).await
}

pub struct TestPeer {
    pub client: Client<String>,
    /// Identity the server assigned to this connection.
    pub id: PeerId,
    pub inbox: Inbox,
}

/// Connect a client and learn the id the server registered it under.
pub async fn connect_peer(server: &Server<String>, port: u16) -> TestPeer {
    let before: HashSet<PeerId> = server.peer_ids().into_iter().collect();

    let client = Client::new(ClientOptions::new("127.0.0.1", port), codec()).unwrap();
    let (tx, inbox) = unbounded_channel();
    client.set_listener(Some(channel_listener(tx)));
    client.connect().await.unwrap();

    let id = wait_for(|| server.peer_ids().into_iter().find(|id| !before.contains(id))).await;
    TestPeer { client, id, inbox }
}

pub async fn wait_for<R>(mut check: impl FnMut() -> Option<R>) -> R {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(r) = check() {
            return r;
        }
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    wait_for(|| cond().then_some(())).await
}

pub async fn recv(inbox: &mut Inbox) -> Envelope<String> {
    timeout(Duration::from_secs(3), inbox.recv())
        .await
        .expect("timed out waiting for message")
        .expect("listener channel closed")
}

pub async fn assert_silent(inbox: &mut Inbox) {
    match timeout(Duration::from_millis(300), inbox.recv()).await {
        Err(_) | Ok(None) => {}
        Ok(Some(env)) => panic!("unexpected message: {env:?}"),
    }
}
