//! A scripted in-process server for driving the client over real sockets.

#![allow(dead_code)]

use bytes::{Bytes, BytesMut};
use credis_lib::{frame, Config, Reply};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time;

/// What the stub does after reading one request.
pub enum Step {
    /// Write the bytes in one go.
    Reply(&'static [u8]),
    /// Write the bytes one at a time, flushing after each.
    Trickle(&'static [u8]),
    /// Wait, then write the bytes.
    Delay(Duration, &'static [u8]),
    /// Never answer; keep reading until the client goes away.
    Hang,
    /// Drop the socket.
    Close,
    /// Write the bytes, then drop the socket.
    ReplyThenClose(&'static [u8]),
}

pub struct StubServer {
    pub config: Config,
    handle: JoinHandle<Vec<Reply>>,
}

impl StubServer {
    /// Accept one connection and answer its requests following `script`.
    pub async fn start(script: Vec<Step>) -> StubServer {
        let (listener, config) = bind().await;

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            let mut requests = Vec::new();

            for step in script {
                let Some(request) = read_request(&mut socket, &mut buf).await else {
                    return requests;
                };
                requests.push(request);

                match step {
                    Step::Reply(bytes) => write(&mut socket, bytes).await,
                    Step::Trickle(bytes) => {
                        for byte in bytes {
                            write(&mut socket, std::slice::from_ref(byte)).await;
                            tokio::task::yield_now().await;
                        }
                    }
                    Step::Delay(delay, bytes) => {
                        time::sleep(delay).await;
                        write(&mut socket, bytes).await;
                    }
                    Step::Hang => break,
                    Step::Close => return requests,
                    Step::ReplyThenClose(bytes) => {
                        write(&mut socket, bytes).await;
                        return requests;
                    }
                }
            }

            // Drain until the client closes.
            while let Some(request) = read_request(&mut socket, &mut buf).await {
                requests.push(request);
            }
            requests
        });

        StubServer { config, handle }
    }

    /// Accept one connection and answer every request with its last argument
    /// as a bulk reply.
    pub async fn echo() -> StubServer {
        let (listener, config) = bind().await;

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            let mut requests = Vec::new();

            while let Some(request) = read_request(&mut socket, &mut buf).await {
                let last = match &request {
                    Reply::Multi(args) => args.last().cloned().unwrap_or(Reply::Nil),
                    _ => Reply::Nil,
                };
                let mut out = BytesMut::new();
                frame::encode_reply(&last, &mut out);
                write(&mut socket, &out).await;

                requests.push(request);
            }
            requests
        });

        StubServer { config, handle }
    }

    /// Every request received, decoded, once the client disconnected.
    pub async fn requests(self) -> Vec<Reply> {
        self.handle.await.unwrap()
    }
}

/// A request as the server decodes it: a multi-bulk of bulk strings.
pub fn request(args: &[&str]) -> Reply {
    Reply::Multi(
        args.iter()
            .map(|arg| Reply::Bulk(Bytes::copy_from_slice(arg.as_bytes())))
            .collect(),
    )
}

async fn bind() -> (TcpListener, Config) {
    // `RUST_LOG=credis_lib=debug cargo test` shows the client's side.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    (listener, Config::new("127.0.0.1", port))
}

async fn read_request(socket: &mut TcpStream, buf: &mut BytesMut) -> Option<Reply> {
    loop {
        if let Some(request) = frame::decode(buf).unwrap() {
            return Some(request);
        }
        match socket.read_buf(buf).await {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

async fn write(socket: &mut TcpStream, bytes: &[u8]) {
    // The client may already be gone; that is what some tests are about.
    let _ = socket.write_all(bytes).await;
    let _ = socket.flush().await;
}
