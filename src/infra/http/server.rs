//! HTTP/1 listener loop shared by the songbook server and the song-info stub.
//!
//! Every request runs under a deadline (`408 Request Timeout` when it expires).
//! A connection that sends no request head within the idle window is closed.
//! On shutdown the listener stops accepting and open connections get a bounded
//! window to finish in-flight requests.

use std::{future::Future, time::Duration};

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    server::graceful::GracefulShutdown,
    service::TowerToHyperService,
};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info, warn};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct ServerLimits {
    pub request_timeout: Duration,
    pub idle_timeout: Duration,
    pub graceful_shutdown: Duration,
}

impl From<&crate::config::ServerSettings> for ServerLimits {
    fn from(settings: &crate::config::ServerSettings) -> Self {
        Self {
            request_timeout: settings.request_timeout,
            idle_timeout: settings.idle_timeout,
            graceful_shutdown: settings.graceful_shutdown,
        }
    }
}

/// How the connection drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    Completed,
    TimedOut,
}

/// Serve `router` on `listener` until `shutdown` resolves, then drain.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    limits: ServerLimits,
    shutdown: F,
) -> Drain
where
    F: Future<Output = ()> + Send,
{
    let router = router.layer(TimeoutLayer::new(limits.request_timeout));

    let mut http = http1::Builder::new();
    http.timer(TokioTimer::new())
        .header_read_timeout(limits.idle_timeout)
        .keep_alive(true);

    let graceful = GracefulShutdown::new();
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(
                            target = "songbook::http",
                            error = %err,
                            "failed to accept connection"
                        );
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };

                let service = TowerToHyperService::new(router.clone());
                let connection =
                    graceful.watch(http.serve_connection(TokioIo::new(stream), service));
                tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        debug!(
                            target = "songbook::http",
                            peer = %peer,
                            error = %err,
                            "connection closed with error"
                        );
                    }
                });
            }
            _ = &mut shutdown => break,
        }
    }

    drop(listener);
    info!(target = "songbook::http", "listener closed; draining connections");

    tokio::select! {
        _ = graceful.shutdown() => Drain::Completed,
        _ = tokio::time::sleep(limits.graceful_shutdown) => Drain::TimedOut,
    }
}
