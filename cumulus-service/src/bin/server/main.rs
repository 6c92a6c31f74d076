use std::sync::Arc;

use auth::Authenticator;
use cumulus_service::config::Config;
use cumulus_service::domain::account::service::AccountService;
use cumulus_service::domain::instance::service::InstanceService;
use cumulus_service::domain::reset::service::ResetService;
use cumulus_service::inbound::http::router::create_router;
use cumulus_service::inbound::http::router::AppState;
use cumulus_service::outbound::exoscale::ExoscaleProvider;
use cumulus_service::outbound::mailer::PostmarkMailer;
use cumulus_service::outbound::repositories::PostgresAccountRepository;
use cumulus_service::outbound::repositories::PostgresEventRecorder;
use cumulus_service::outbound::repositories::PostgresResetRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cumulus_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "cumulus-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        app_base_url = %config.mail.app_base_url,
        allowed_origins = ?config.cors.allowed_origins,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(config.jwt.secret.as_bytes()));
    let accounts = Arc::new(PostgresAccountRepository::new(pg_pool.clone()));
    let resets = Arc::new(PostgresResetRepository::new(pg_pool.clone()));
    let events = Arc::new(PostgresEventRecorder::new(pg_pool));
    let provider = Arc::new(ExoscaleProvider::new()?);
    let mailer = Arc::new(PostmarkMailer::new(
        config.mail.postmark_token.clone(),
        config.mail.sender.clone(),
        config.mail.app_base_url.clone(),
    )?);

    let account_service = Arc::new(AccountService::new(
        Arc::clone(&accounts),
        Arc::clone(&events),
        Arc::clone(&authenticator),
    ));
    let reset_service = Arc::new(ResetService::new(
        Arc::clone(&accounts),
        resets,
        Arc::clone(&events),
        mailer,
    ));
    let instance_service = Arc::new(InstanceService::new(accounts, provider, events));

    let state = AppState {
        accounts: account_service,
        resets: reset_service,
        instances: instance_service,
        authenticator,
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let application = create_router(state, &config.cors.allowed_origins);
    axum::serve(http_listener, application).await?;

    Ok(())
}
