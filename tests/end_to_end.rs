//! Drives a real server over loopback TCP.

use droplet::{HttpServer, Method, Params, Router, ServerConfig};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn exchange(addr: std::net::SocketAddr, pieces: &[&[u8]]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    for piece in pieces {
        stream.write_all(piece).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn serves_requests_until_shutdown() {
    let mut router = Router::new();
    router
        .route(r"^/check/(?P<page>\d+)/$", |params: Params, _req| async move {
            Ok(format!("Your page: {}", params.get("page").unwrap_or_default()))
        })
        .unwrap()
        .register("^/sum$", &[Method::POST], |_params, req: droplet::HttpRequest| async move {
            let numbers: Vec<i64> = req.json()?;
            Ok::<_, droplet::ServerError>(json!({ "sum": numbers.iter().sum::<i64>() }))
        })
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        read_buffer_size: 8,
        ..ServerConfig::default()
    };

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let server = HttpServer::new(config, router);
        server
            .serve_with_shutdown(listener, async {
                let _ = stop_rx.await;
            })
            .await
    });

    let response = exchange(addr, &[b"GET /check/", b"42/ HTTP/1.1\r\nHo", b"st: x\r\n\r\n"]).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    assert!(response.ends_with("\r\n\r\nYour page: 42"), "{response}");

    let response = exchange(
        addr,
        &[b"POST /sum HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 9\r\n\r\n[1, ", b"2, 3]"],
    )
    .await;
    assert!(response.contains("Content-Type: application/json; charset=utf-8\r\n"), "{response}");
    assert!(response.ends_with(r#"{"sum": 6}"#), "{response}");

    let response = exchange(addr, &[b"GET /missing HTTP/1.1\r\n\r\n"]).await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"), "{response}");

    let response = exchange(addr, &[b"BREW /pot HTTP/1.1\r\n\r\n"]).await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
