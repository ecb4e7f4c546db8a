//! Life Connections HTTP server.

use std::sync::Arc;

use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use life_connections::adapters::http::{api_router, ConnectionsAppState};
use life_connections::adapters::{
    AnthropicNarrativeConfig, AnthropicNarrativeGenerator, PostgresConnectionStore,
    PostgresDomainDataSource,
};
use life_connections::application::{
    AnalyzeConnectionsConfig, AnalyzeConnectionsHandler, GetConnectionsHandler,
};
use life_connections::config::{AppConfig, NarrativeProvider};
use life_connections::ports::NarrativeGenerator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let store = Arc::new(PostgresConnectionStore::new(pool.clone()));
    let data_source = Arc::new(PostgresDomainDataSource::new(pool));

    let mut analyze_handler = AnalyzeConnectionsHandler::new(
        data_source,
        store.clone(),
        AnalyzeConnectionsConfig {
            worker_pool_size: config.analysis.worker_pool_size,
            run_timeout: config.analysis.run_timeout(),
            narrative_timeout: config.narrative.timeout(),
        },
    );
    if let Some(generator) = narrative_generator(&config)? {
        analyze_handler = analyze_handler.with_narrative_generator(generator);
    }

    let state = ConnectionsAppState {
        analyze_handler: Arc::new(analyze_handler),
        get_handler: Arc::new(GetConnectionsHandler::new(store)),
        defaults: config.analysis.to_options(),
        verbose_errors: config.features.verbose_errors,
    };

    let app = api_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "Life Connections listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.is_production() {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn narrative_generator(
    config: &AppConfig,
) -> Result<Option<Arc<dyn NarrativeGenerator>>, Box<dyn std::error::Error + Send + Sync>> {
    if !config.features.enable_narratives {
        return Ok(None);
    }
    match (&config.narrative.provider, &config.narrative.api_key) {
        (NarrativeProvider::Anthropic, Some(api_key)) => {
            use secrecy::ExposeSecret;
            let generator = AnthropicNarrativeGenerator::new(
                AnthropicNarrativeConfig::new(api_key.expose_secret().clone())
                    .with_model(config.narrative.model.clone())
                    .with_base_url(config.narrative.base_url.clone())
                    .with_timeout(config.narrative.timeout())
                    .with_max_tokens(config.narrative.max_tokens)
                    .with_max_retries(config.narrative.max_retries),
            )?;
            Ok(Some(Arc::new(generator)))
        }
        _ => {
            warn!("Narratives enabled but no provider configured; connections will carry no text");
            Ok(None)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
