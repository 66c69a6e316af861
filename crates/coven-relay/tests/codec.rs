#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;
use tokio::io::{duplex, AsyncWriteExt};

use coven_core::protocol::{BinaryFormat, Envelope, JsonFormat};
use coven_core::CovenError;
use coven_relay::{Codec, FramedCodec};

fn json_codec(max: usize) -> FramedCodec<JsonFormat<String>> {
    FramedCodec::with_max_frame_bytes(JsonFormat::new(), max)
}

#[tokio::test]
async fn frames_survive_a_stream() {
    let codec = json_codec(1024);
    let (mut a, mut b) = duplex(4096);

    let first = Envelope::of("s", "*", "one".to_string()).unwrap();
    let second = Envelope::of("s", "m", "two".to_string()).unwrap();
    codec.write_envelope(&first, &mut a).await.unwrap();
    codec.write_envelope(&second, &mut a).await.unwrap();

    let got: Envelope<String> = codec.read_envelope(&mut b).await.unwrap();
    assert_eq!(got, first);
    let got: Envelope<String> = codec.read_envelope(&mut b).await.unwrap();
    assert_eq!(got, second);
}

#[tokio::test]
async fn binary_payloads_keep_their_bytes() {
    let codec = FramedCodec::new(BinaryFormat::new());
    let (mut a, mut b) = duplex(4096);

    let env = Envelope::of("s", "*", Bytes::from_static(&[0, 159, 255])).unwrap();
    codec.write_envelope(&env, &mut a).await.unwrap();

    let got: Envelope<Bytes> = codec.read_envelope(&mut b).await.unwrap();
    assert_eq!(got.payload().as_ref(), &[0, 159, 255]);
}

#[tokio::test]
async fn eof_at_frame_boundary_is_connection_closed() {
    let codec = json_codec(1024);
    let (a, mut b) = duplex(64);
    drop(a);

    let err = Codec::<String>::read_envelope(&codec, &mut b).await.unwrap_err();
    assert!(matches!(err, CovenError::ConnectionClosed));
    assert!(err.is_disconnect());
}

#[tokio::test]
async fn eof_inside_length_prefix_is_bad_frame() {
    let codec = json_codec(1024);
    let (mut a, mut b) = duplex(64);
    a.write_all(&[0, 0]).await.unwrap();
    drop(a);

    let err = Codec::<String>::read_envelope(&codec, &mut b).await.unwrap_err();
    assert_eq!(err.code(), "BAD_FRAME");
    assert!(!err.is_disconnect());
}

#[tokio::test]
async fn prefix_split_across_writes_is_reassembled() {
    let codec = json_codec(1024);
    let (mut a, mut b) = duplex(4096);

    let env = Envelope::of("s", "*", "split".to_string()).unwrap();
    let mut framed = Vec::new();
    codec.write_envelope(&env, &mut framed).await.unwrap();

    let reader = tokio::spawn(async move {
        let codec = json_codec(1024);
        let got: Envelope<String> = codec.read_envelope(&mut b).await.unwrap();
        got
    });
    for chunk in framed.chunks(3) {
        a.write_all(chunk).await.unwrap();
        a.flush().await.unwrap();
        tokio::task::yield_now().await;
    }

    assert_eq!(reader.await.unwrap(), env);
}

#[tokio::test]
async fn eof_inside_frame_is_bad_frame() {
    let codec = json_codec(1024);
    let (mut a, mut b) = duplex(64);
    a.write_u32(40).await.unwrap();
    a.write_all(b"{\"header\"").await.unwrap();
    drop(a);

    let err = Codec::<String>::read_envelope(&codec, &mut b).await.unwrap_err();
    assert_eq!(err.code(), "BAD_FRAME");
}

#[tokio::test]
async fn oversized_prefix_is_rejected_before_reading() {
    let codec = json_codec(16);
    let (mut a, mut b) = duplex(64);
    a.write_u32(1 << 30).await.unwrap();

    let err = Codec::<String>::read_envelope(&codec, &mut b).await.unwrap_err();
    assert!(matches!(err, CovenError::FrameTooLarge { len, max: 16 } if len == 1 << 30));
}

#[tokio::test]
async fn oversized_envelope_is_not_written() {
    let codec = json_codec(16);
    let (mut a, _b) = duplex(64);

    let env = Envelope::of("s", "*", "x".repeat(64)).unwrap();
    let err = codec.write_envelope(&env, &mut a).await.unwrap_err();
    assert_eq!(err.code(), "FRAME_TOO_LARGE");
}

#[tokio::test]
async fn undecodable_frame_is_bad_frame() {
    let codec = json_codec(1024);
    let (mut a, mut b) = duplex(64);
    a.write_u32(3).await.unwrap();
    a.write_all(b"xyz").await.unwrap();

    let err = Codec::<String>::read_envelope(&codec, &mut b).await.unwrap_err();
    assert_eq!(err.code(), "BAD_FRAME");
}
