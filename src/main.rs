use std::{process, sync::Arc};

use nib::{
    application::{
        error::AppError,
        identity::IdentityProvider,
        render::MarkdownRenderer,
        repos::{EventsRepo, PostsRepo, PostsWriteRepo, SearchIndex},
        repository::Repository,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        identity::TrustedHeaderIdentity,
        memory::MemoryRepositories,
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
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repository = match settings.storage.backend {
        config::StorageBackend::Memory => {
            warn!(
                target = "nib::serve",
                "using the in-memory backend; nothing will be persisted"
            );
            memory_repository()
        }
        config::StorageBackend::Postgres => {
            let repositories = connect_postgres(&settings).await?;
            PostgresRepositories::run_migrations(repositories.pool())
                .await
                .map_err(|err| AppError::from(InfraError::from(err)))?;
            postgres_repository(repositories)
        }
    };

    let identity: Arc<dyn IdentityProvider> = Arc::new(TrustedHeaderIdentity::new(
        settings.identity.user_header.clone(),
        settings.identity.dev_user.clone(),
    ));

    let state = HttpState {
        repository: Arc::new(repository),
        renderer: Arc::new(MarkdownRenderer::new()),
        identity,
        listing: settings.listing.clone(),
    };

    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = connect_postgres(&settings).await?;
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target = "nib::migrate", "database migrations applied");
    Ok(())
}

async fn connect_postgres(settings: &config::Settings) -> Result<PostgresRepositories, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(PostgresRepositories::new(pool))
}

fn postgres_repository(repositories: PostgresRepositories) -> Repository {
    let repositories = Arc::new(repositories);
    let posts: Arc<dyn PostsRepo> = repositories.clone();
    let writer: Arc<dyn PostsWriteRepo> = repositories.clone();
    let events: Arc<dyn EventsRepo> = repositories.clone();
    let index: Arc<dyn SearchIndex> = repositories;
    Repository::new(posts, writer, events, index)
}

fn memory_repository() -> Repository {
    let repositories = Arc::new(MemoryRepositories::new());
    let posts: Arc<dyn PostsRepo> = repositories.clone();
    let writer: Arc<dyn PostsWriteRepo> = repositories.clone();
    let events: Arc<dyn EventsRepo> = repositories.clone();
    let index: Arc<dyn SearchIndex> = repositories;
    Repository::new(posts, writer, events, index)
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "nib::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        result = &mut server => return flatten_server_result(result),
        () = shutdown_signal() => {}
    }

    info!(
        target = "nib::serve",
        timeout_secs = settings.server.graceful_shutdown.as_secs(),
        "shutting down; draining in-flight requests"
    );
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
        Ok(result) => flatten_server_result(result),
        Err(_) => {
            warn!(
                target = "nib::serve",
                "graceful shutdown timed out; aborting remaining connections"
            );
            server.abort();
            Ok(())
        }
    }
}

fn flatten_server_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "nib::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}
