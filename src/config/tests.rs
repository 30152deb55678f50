use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(10));
    assert_eq!(settings.server.request_timeout, Duration::from_secs(5));
    assert_eq!(settings.server.idle_timeout, Duration::from_secs(5));
    assert_eq!(settings.database.url, None);
    assert_eq!(settings.database.operation_timeout, Duration::from_secs(5));
    assert_eq!(settings.cache.url, None);
    assert_eq!(settings.cache.operation_timeout, Duration::from_millis(500));
    assert!(settings.cache.warm_on_startup);
    assert_eq!(settings.cache.warm_concurrency.get(), 8);
    assert_eq!(settings.info_service.base_url.as_str(), DEFAULT_INFO_SERVICE_URL);
}

#[test]
fn blank_cache_url_selects_memory_backend() {
    let mut raw = RawSettings::default();
    raw.cache.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.url, None);
}

#[test]
fn zero_cache_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.operation_timeout_ms = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.operation_timeout_ms",
            ..
        }
    ));
}

#[test]
fn server_timeouts_follow_overrides_and_reject_zero() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        server_request_timeout_seconds: Some(30),
        server_idle_timeout_seconds: Some(90),
        ..Default::default()
    };
    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.server.request_timeout, Duration::from_secs(30));
    assert_eq!(settings.server.idle_timeout, Duration::from_secs(90));

    let mut raw = RawSettings::default();
    raw.server.idle_timeout_seconds = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero idle timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "server.idle_timeout_seconds",
            ..
        }
    ));
}

#[test]
fn info_service_requires_http_scheme() {
    let mut raw = RawSettings::default();
    raw.info_service.base_url = Some("ftp://songs.example".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["songbook"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_warm_cache_arguments() {
    let args = CliArgs::parse_from([
        "songbook",
        "warm-cache",
        "--database-url",
        "postgres://example",
        "--cache-url",
        "redis://127.0.0.1:6379",
    ]);

    match args.command.expect("warm-cache command") {
        Command::WarmCache(warm) => {
            assert_eq!(
                warm.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(
                warm.cache.cache_url.as_deref(),
                Some("redis://127.0.0.1:6379")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "songbook",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-warm-on-startup=false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.cache_warm_on_startup, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}
