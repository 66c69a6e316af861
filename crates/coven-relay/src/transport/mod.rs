//! Transport layer (TCP).
//!
//! Exposes the stream codec that decodes whole envelopes before they reach the
//! relay engine, plus the boxed stream halves the registry stores.

pub mod codec;

pub use codec::{BoxedReader, BoxedWriter, Codec, FramedCodec, DEFAULT_MAX_FRAME_BYTES};

use tokio::net::TcpStream;

/// Split a connected socket into the boxed halves the codec works on.
pub(crate) fn split_stream(stream: TcpStream) -> (BoxedReader, BoxedWriter) {
    let _ = stream.set_nodelay(true);
    let (r, w) = stream.into_split();
    (Box::new(r), Box::new(w))
}
