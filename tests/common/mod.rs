//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use legacy_redirect::config::{RedirectConfig, TableLocation};
use legacy_redirect::lifecycle::Shutdown;
use legacy_redirect::HttpServer;

pub const DOMAIN: &str = "https://blog.example.com";

pub const TABLE: &str = r#"{
    "posts": {
        "42": {"redir": "2016/11/18/old-post/"},
        "7": {"redir": "about/"}
    },
    "cats": {"3": {"redir": "category/news/"}},
    "authors": {"9": {"redir": "author/jane/"}}
}"#;

/// Read the request head and return its target (`/path?query`).
async fn read_target(socket: &mut TcpStream) -> String {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf)
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string()
}

/// Start a programmable backend on an ephemeral port.
///
/// The closure receives the request target and returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let target = read_target(&mut socket).await;
                        let (status, body) = f(target).await;
                        let status_text = match status {
                            200 => "200 OK",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start an origin that answers 200 with `origin saw <target>`.
pub async fn start_mock_origin() -> SocketAddr {
    start_programmable_backend(|target| async move { (200, format!("origin saw {}", target)) })
        .await
}

/// Config pointing at `origin` and a table served over HTTP from `blob`.
pub fn edge_config(origin: SocketAddr, blob: SocketAddr) -> RedirectConfig {
    let mut config = RedirectConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.origin.address = origin.to_string();
    config.redirect.default_domain = DOMAIN.to_string();
    config.redirect.fetch_timeout_ms = 2000;
    config.redirect.table = TableLocation::Url {
        url: format!("http://{}/legacy/redirects.json", blob),
    };
    config
}

/// Run the edge on an ephemeral port until `shutdown` fires.
pub async fn start_edge(config: RedirectConfig, shutdown: &Shutdown) -> SocketAddr {
    let server = HttpServer::new(config).unwrap();
    start_server(server, shutdown).await
}

pub async fn start_server(server: HttpServer, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    addr
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
