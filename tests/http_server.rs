use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, http::StatusCode, routing::get};
use songbook::infra::http::{Drain, ServerLimits, serve};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

fn test_router() -> Router {
    Router::new()
        .route("/fast", get(|| async { "ok" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "late"
            }),
        )
}

async fn start(limits: ServerLimits) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<Drain>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, test_router(), limits, async move {
        let _ = stopped.await;
    }));
    (addr, stop, server)
}

fn limits(request_timeout: Duration, idle_timeout: Duration) -> ServerLimits {
    ServerLimits {
        request_timeout,
        idle_timeout,
        graceful_shutdown: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn slow_request_is_cut_off_with_request_timeout() {
    let (addr, _stop, _server) =
        start(limits(Duration::from_millis(200), Duration::from_secs(5))).await;

    let fast = reqwest::get(format!("http://{addr}/fast"))
        .await
        .expect("fast");
    assert_eq!(fast.status(), StatusCode::OK);
    assert_eq!(fast.text().await.expect("body"), "ok");

    let slow = tokio::time::timeout(
        Duration::from_secs(5),
        reqwest::get(format!("http://{addr}/slow")),
    )
    .await
    .expect("answered before the handler finished")
    .expect("slow");
    assert_eq!(slow.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn stalled_request_head_is_closed_after_idle_timeout() {
    let (addr, _stop, _server) =
        start(limits(Duration::from_secs(5), Duration::from_millis(200))).await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(b"GET /fast HTTP/1.1\r\nHost: songbook\r\n")
        .await
        .expect("partial head");
    let mut sink = Vec::new();
    let closed =
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut sink)).await;

    assert!(closed.is_ok(), "stalled connection stayed open");
}

#[tokio::test]
async fn shutdown_drains_and_stops_accepting() {
    let (addr, stop, server) =
        start(limits(Duration::from_secs(5), Duration::from_secs(5))).await;

    let response = reqwest::get(format!("http://{addr}/fast"))
        .await
        .expect("fast");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("body"), "ok");

    stop.send(()).expect("server running");
    let drain = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("serve returned")
        .expect("join");
    assert_eq!(drain, Drain::Completed);

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
