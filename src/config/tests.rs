use super::*;

fn memory_raw() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.storage.backend = Some("memory".to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = memory_raw();
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
fn defaults_match_listing_sizes() {
    let settings = Settings::from_raw(memory_raw()).expect("valid settings");
    assert_eq!(settings.listing.recent_page_size.get(), 20);
    assert_eq!(settings.listing.all_page_size.get(), 50);
    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.identity.user_header.as_str(), "x-forwarded-email");
    assert!(settings.identity.dev_user.is_none());
}

#[test]
fn postgres_backend_requires_url() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("missing url");
    assert!(matches!(err, LoadError::Invalid { key: "database.url", .. }));

    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://localhost/nib".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.storage.backend, StorageBackend::Postgres);
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.storage.backend = Some("sqlite".to_string());
    let err = Settings::from_raw(raw).expect_err("unknown backend");
    assert!(matches!(err, LoadError::Invalid { key: "storage.backend", .. }));
}

#[test]
fn zero_page_size_is_rejected() {
    let mut raw = memory_raw();
    raw.listing.recent_page_size = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "listing.recent_page_size",
            ..
        }
    ));
}

#[test]
fn blank_dev_user_is_ignored() {
    let mut raw = memory_raw();
    raw.identity.dev_user = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.identity.dev_user.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = memory_raw();
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
    let args = CliArgs::parse_from(["nib"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "nib",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--storage-backend",
        "memory",
        "--identity-dev-user",
        "dev@localhost",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.storage_backend.as_deref(), Some("memory"));
            assert_eq!(
                serve.overrides.identity_dev_user.as_deref(),
                Some("dev@localhost")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from(["nib", "migrate", "--database-url", "postgres://example"]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}
