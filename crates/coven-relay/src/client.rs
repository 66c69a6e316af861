//! Outbound relay client: one connection to one server, one reader task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::Instrument;

use coven_core::error::{CovenError, Result};
use coven_core::protocol::{Address, Envelope, Header};
use coven_core::{Payload, PeerId};

use crate::config::ClientOptions;
use crate::node::{Node, NodeCore, SharedListener};
use crate::obs::RelayMetrics;
use crate::transport::{split_stream, BoxedReader, BoxedWriter, Codec};

type SharedWriter = Arc<Mutex<Option<BoxedWriter>>>;

#[derive(Default)]
struct Connection {
    writer: Option<SharedWriter>,
    reader_task: Option<JoinHandle<()>>,
}

pub struct Client<T> {
    node: Arc<NodeCore<T>>,
    opts: ClientOptions,
    connected: Arc<AtomicBool>,
    conn: Mutex<Connection>,
}

impl<T: Payload> Client<T> {
    pub fn new(opts: ClientOptions, codec: Arc<dyn Codec<T>>) -> Result<Self> {
        opts.validate()?;
        Ok(Self {
            node: Arc::new(NodeCore::new(codec, Arc::new(RelayMetrics::new()))),
            opts,
            connected: Arc::new(AtomicBool::new(false)),
            conn: Mutex::new(Connection::default()),
        })
    }

    pub fn host(&self) -> &str {
        &self.opts.host
    }

    pub fn port(&self) -> u16 {
        self.opts.port
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Open the connection and start the reader task.
    pub async fn connect(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        if self.is_connected() {
            return Err(CovenError::AlreadyConnected);
        }

        let stream = TcpStream::connect((self.opts.host.as_str(), self.opts.port)).await?;
        let (reader, writer) = split_stream(stream);
        let writer: SharedWriter = Arc::new(Mutex::new(Some(writer)));

        self.connected.store(true, Ordering::Release);
        let span = tracing::info_span!("client", id = %self.node.id(), host = %self.opts.host, port = self.opts.port);
        let task = tokio::spawn(
            read_loop(
                Arc::clone(&self.node),
                reader,
                Arc::clone(&writer),
                Arc::clone(&self.connected),
            )
            .instrument(span),
        );

        conn.writer = Some(writer);
        conn.reader_task = Some(task);
        tracing::info!(host = %self.opts.host, port = self.opts.port, "client connected");
        Ok(())
    }

    /// Stop the reader task and close the connection. Close errors are ignored.
    ///
    /// Once the reader has ended on its own (server gone, bad frame) the
    /// client is already disconnected and this returns `NotConnected`.
    pub async fn disconnect(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        if !self.is_connected() {
            return Err(CovenError::NotConnected);
        }

        self.connected.store(false, Ordering::Release);
        if let Some(task) = conn.reader_task.take() {
            task.abort();
        }
        if let Some(writer) = conn.writer.take() {
            close_writer(&writer).await;
        }
        Ok(())
    }

    async fn write(&self, envelope: Envelope<T>) -> Result<()> {
        let writer = self
            .conn
            .lock()
            .await
            .writer
            .clone()
            .ok_or(CovenError::NotConnected)?;
        let mut guard = writer.lock().await;
        let w = guard.as_mut().ok_or(CovenError::ConnectionClosed)?;
        self.node.codec().write_envelope(&envelope, &mut **w).await
    }
}

async fn read_loop<T: Payload>(
    node: Arc<NodeCore<T>>,
    mut reader: BoxedReader,
    writer: SharedWriter,
    connected: Arc<AtomicBool>,
) {
    let reason = loop {
        match node.codec().read_envelope(&mut *reader).await {
            Ok(env) => node.notify(env),
            Err(e) => break e,
        }
    };

    if reason.is_disconnect() {
        tracing::info!("server closed the connection");
    } else {
        tracing::warn!(code = reason.code(), error = %reason, "error in client connection");
    }
    close_writer(&writer).await;
    connected.store(false, Ordering::Release);
}

async fn close_writer(writer: &SharedWriter) {
    let taken = writer.lock().await.take();
    if let Some(mut w) = taken {
        let _ = w.shutdown().await;
    }
}

#[async_trait]
impl<T: Payload> Node<T> for Client<T> {
    fn id(&self) -> PeerId {
        self.node.id()
    }

    /// Ask the server to relay `payload` to every peer: `{from: own id, to: "*"}`.
    async fn broadcast(&self, payload: T) -> Result<()> {
        let header = Header::new(Address::from(self.node.id()), Address::broadcast());
        self.write(Envelope::new(header, payload)).await
    }

    /// Hand `payload` to the server addressed to `to` (`"s"` or a peer id).
    /// The server re-stamps the sender and routes it; there is no direct peer link.
    async fn send(&self, to: &str, payload: T) -> Result<()> {
        let header = Header::new(Address::from(self.node.id()), Address::parse(to)?);
        self.write(Envelope::new(header, payload)).await
    }

    fn listener(&self) -> Option<SharedListener<T>> {
        self.node.listener()
    }

    fn set_listener(&self, listener: Option<SharedListener<T>>) {
        self.node.set_listener(listener);
    }
}
