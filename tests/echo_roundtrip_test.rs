//! End-to-end exchange against a local echo listener, covering the
//! full connect / send / read / disconnect flow with each payload
//! encoding.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tcplink::{codec, ClientRegistry, Encoding};

async fn spawn_echo_listener() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    addr
}

#[tokio::test]
async fn utf8_ping_round_trip() {
    let addr = spawn_echo_listener().await;
    let registry = ClientRegistry::default();

    let handle = registry
        .connect("127.0.0.1", addr.port(), None)
        .await
        .unwrap();
    assert_eq!(handle, 0);

    let payload = codec::decode("ping", Encoding::Utf8).unwrap();
    registry.send(handle, &payload).await.unwrap();

    let bytes = registry
        .read(handle, Some(4), Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(codec::encode(&bytes), "ping");

    assert_eq!(registry.disconnect(handle).await.unwrap(), 0);
}

#[tokio::test]
async fn hex_payload_arrives_as_raw_bytes() {
    let addr = spawn_echo_listener().await;
    let registry = ClientRegistry::default();

    let handle = registry
        .connect("127.0.0.1", addr.port(), None)
        .await
        .unwrap();

    // "68656c6c6f" is "hello" in hex.
    let payload = codec::decode("68656c6c6f", Encoding::Hex).unwrap();
    registry.send(handle, &payload).await.unwrap();

    let bytes = registry
        .read(handle, Some(16), Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"hello");
    assert_eq!(codec::encode(&bytes), "hello");

    registry.disconnect(handle).await.unwrap();
}

#[tokio::test]
async fn base64_payload_arrives_decoded() {
    let addr = spawn_echo_listener().await;
    let registry = ClientRegistry::default();

    let handle = registry
        .connect("127.0.0.1", addr.port(), None)
        .await
        .unwrap();

    let payload = codec::decode("aGVsbG8=", Encoding::Base64).unwrap();
    registry.send(handle, &payload).await.unwrap();

    let bytes = registry
        .read(handle, None, Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(codec::encode(&bytes), "hello");

    registry.disconnect(handle).await.unwrap();
}

#[tokio::test]
async fn read_is_capped_at_expect_len() {
    let addr = spawn_echo_listener().await;
    let registry = ClientRegistry::default();

    let handle = registry
        .connect("127.0.0.1", addr.port(), None)
        .await
        .unwrap();
    registry.send(handle, b"abcdefgh").await.unwrap();

    let bytes = registry
        .read(handle, Some(4), Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(bytes.len(), 4);
    assert_eq!(&bytes[..], b"abcd");

    registry.disconnect(handle).await.unwrap();
}

#[tokio::test]
async fn non_utf8_response_encodes_to_empty_string() {
    // A listener that answers every connection with raw non-UTF-8 bytes.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = stream.write_all(&[0xff, 0xfe, 0xfd]).await;
            });
        }
    });

    let registry = ClientRegistry::default();
    let handle = registry
        .connect("127.0.0.1", addr.port(), None)
        .await
        .unwrap();

    let bytes = registry
        .read(handle, None, Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(&bytes[..], &[0xff, 0xfe, 0xfd]);
    // The raw bytes came through; the text rendering soft-fails to "".
    assert_eq!(codec::encode(&bytes), "");

    registry.disconnect(handle).await.unwrap();
}
