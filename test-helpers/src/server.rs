//! A minimal HTTP server answering every request with one canned reply.
//!
//! Used to drive [`fetch_core::HttpClient`] over a real socket.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// The reply a [`CannedServer`] sends.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub reason: &'static str,
    pub body: String,
    /// Wait this long after reading the request before answering.
    pub delay: Duration,
}

impl Canned {
    pub fn new(status: u16, reason: &'static str, body: &str) -> Self {
        Self {
            status,
            reason,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub struct CannedServer {
    pub port: u16,
    pub address: String,
}

/// Serve `reply` on an OS-assigned port until the runtime shuts down.
pub async fn spawn_server(reply: Canned) -> CannedServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let port = listener.local_addr().expect("No local address").port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(answer(stream, reply.clone()));
        }
    });

    CannedServer {
        port,
        address: format!("http://127.0.0.1:{}", port),
    }
}

async fn answer(mut stream: TcpStream, reply: Canned) -> std::io::Result<()> {
    // Requests in these tests carry no body; read up to the blank line.
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    tokio::time::sleep(reply.delay).await;

    let response = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        reply.status,
        reply.reason,
        reply.body.len(),
        reply.body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
