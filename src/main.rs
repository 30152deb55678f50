use std::{process, sync::Arc};

use songbook::{
    application::{
        error::AppError,
        info::SongInfoProvider,
        repos::{SongsRepo, SongsWriteRepo},
        songs::SongService,
    },
    cache::{CacheConfig, HashBackend, MemoryHashBackend, RedisHashBackend, SongCache},
    config,
    infra::{
        cache_warmer::CacheWarmer,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, Drain, ServerLimits},
        info_client::HttpSongInfoClient,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::WarmCache(_) => run_warm_cache(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache_config = CacheConfig::from(&settings.cache);
    let cache = build_cache(&cache_config).await?;

    if cache_config.warm_on_startup {
        warm_cache(&repositories, &cache, &cache_config).await?;
    }

    let info: Arc<dyn SongInfoProvider> = Arc::new(
        HttpSongInfoClient::new(&settings.info_service.base_url, settings.info_service.timeout)
            .map_err(AppError::from)?,
    );
    let reader: Arc<dyn SongsRepo> = repositories.clone();
    let writer: Arc<dyn SongsWriteRepo> = repositories.clone();
    let songs = Arc::new(SongService::new(reader, writer, cache, info));

    let result = serve_http(&settings, ApiState::new(songs)).await;

    if tokio::time::timeout(settings.server.graceful_shutdown, repositories.close())
        .await
        .is_err()
    {
        warn!(
            target = "songbook::db",
            "database pool did not close in time"
        );
    }

    result
}

async fn run_warm_cache(settings: config::Settings) -> Result<(), AppError> {
    let cache_config = CacheConfig::from(&settings.cache);
    if !cache_config.uses_redis() {
        return Err(AppError::validation(
            "warm-cache needs cache.url; the in-process cache does not outlive this command",
        ));
    }

    let repositories = init_repositories(&settings).await?;
    let cache = build_cache(&cache_config).await?;
    let result = warm_cache(&repositories, &cache, &cache_config).await;
    repositories.close().await;
    result
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(
        PostgresRepositories::new(pool).with_operation_timeout(settings.database.operation_timeout),
    ))
}

async fn build_cache(config: &CacheConfig) -> Result<SongCache, AppError> {
    let backend: Arc<dyn HashBackend> = match config.url.as_deref() {
        Some(url) => {
            let redis = RedisHashBackend::connect(url)
                .await
                .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
            redis
                .ping()
                .await
                .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
            info!(target = "songbook::cache", "connected to redis");
            Arc::new(redis)
        }
        None => {
            info!(
                target = "songbook::cache",
                "no cache url configured; using in-process cache"
            );
            Arc::new(MemoryHashBackend::new())
        }
    };

    Ok(SongCache::from_config(backend, config))
}

async fn warm_cache(
    repositories: &Arc<PostgresRepositories>,
    cache: &SongCache,
    config: &CacheConfig,
) -> Result<(), AppError> {
    let reader: Arc<dyn SongsRepo> = repositories.clone();
    CacheWarmer::new(reader, cache.clone(), config.warm_concurrency)
        .warm_initial()
        .await
        .map(|_| ())
        .map_err(|err| AppError::from(InfraError::cache(format!("cache warm failed: {err}"))))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "songbook::http",
        addr = %settings.server.addr,
        "listening"
    );

    let limits = ServerLimits::from(&settings.server);
    if http::serve(listener, router, limits, shutdown_signal()).await == Drain::TimedOut {
        warn!(
            target = "songbook::http",
            grace_secs = limits.graceful_shutdown.as_secs(),
            "graceful shutdown timed out; dropping open connections"
        );
    }

    info!(target = "songbook::http", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!(target = "songbook::http", "shutdown signal received");
}
