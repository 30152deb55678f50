//! Local stand-in for the song-info service: answers `GET /info` with synthetic details.

use std::{net::SocketAddr, process, str::FromStr, sync::Arc, time::Duration};

use clap::{Parser, builder::BoolishValueParser};
use songbook::{
    application::{
        error::AppError,
        info::{ReleaseDateSequence, SyntheticSongInfo, SystemClock},
    },
    config::{LogFormat, LoggingSettings},
    infra::{
        error::InfraError,
        http::{self, Drain, ServerLimits},
        telemetry,
    },
};
use tracing::{error, info, level_filters::LevelFilter, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(
    name = "song-info-stub",
    version,
    about = "Synthetic song-info service for local development"
)]
struct StubArgs {
    /// Address to listen on.
    #[arg(long, env = "SONG_INFO_STUB_ADDR", default_value = "127.0.0.1:8081")]
    addr: SocketAddr,

    /// Base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,

    /// Per-request timeout in seconds.
    #[arg(long = "request-timeout-seconds", default_value_t = 5)]
    request_timeout_seconds: u64,

    /// Keep-alive idle timeout in seconds.
    #[arg(long = "idle-timeout-seconds", default_value_t = 5)]
    idle_timeout_seconds: u64,

    /// Emit JSON logs.
    #[arg(long = "log-json", default_value_t = false, value_parser = BoolishValueParser::new())]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(StubArgs::parse()).await {
        eprintln!("song-info-stub: {err}");
        process::exit(1);
    }
}

async fn run(args: StubArgs) -> Result<(), AppError> {
    let level = LevelFilter::from_str(&args.log_level)
        .map_err(|err| AppError::validation(format!("invalid log level: {err}")))?;
    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    telemetry::init(&LoggingSettings { level, format })?;

    let dates = ReleaseDateSequence::new(Arc::new(SystemClock));
    let router = http::build_info_router(Arc::new(SyntheticSongInfo::new(dates)));

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(InfraError::from)?;
    info!(target = "songbook::info_stub", addr = %args.addr, "listening");

    let limits = ServerLimits {
        request_timeout: positive_seconds(args.request_timeout_seconds, "request-timeout-seconds")?,
        idle_timeout: positive_seconds(args.idle_timeout_seconds, "idle-timeout-seconds")?,
        graceful_shutdown: SHUTDOWN_GRACE,
    };
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    if http::serve(listener, router, limits, shutdown).await == Drain::TimedOut {
        warn!(target = "songbook::info_stub", "shutdown grace expired");
    }
    Ok(())
}

fn positive_seconds(value: u64, flag: &str) -> Result<Duration, AppError> {
    if value == 0 {
        return Err(AppError::validation(format!("--{flag} must be greater than zero")));
    }
    Ok(Duration::from_secs(value))
}
