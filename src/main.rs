use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use rentease::{
    AppState,
    assistant::{
        ChatGateway,
        ledger::LedgerConfig,
        store::PgQueryStore,
        synthesizer::{GeminiClient, QuerySynthesizer, TextGenerator},
    },
    config::Config,
    routes,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
#[cfg(debug_assertions)]
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn build_synthesizer(config: &Config) -> Option<QuerySynthesizer> {
    let Some(api_key) = config.gemini_api_key.clone() else {
        tracing::warn!("GOOGLE_API_KEY not set; the AI assistant is disabled");
        return None;
    };

    match GeminiClient::new(api_key, config.gemini_model.clone(), config.ai_timeout()) {
        Ok(client) => {
            tracing::info!(model = %config.gemini_model, "AI assistant enabled");
            let generator: Arc<dyn TextGenerator> = Arc::new(client);
            Some(QuerySynthesizer::new(generator))
        }
        Err(e) => {
            tracing::error!("failed to build AI client, assistant disabled: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'rentease_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");

    let store = Arc::new(PgQueryStore::new(pool.clone(), config.query_timeout_ms));
    let gateway = ChatGateway::new(
        build_synthesizer(&config),
        store.clone(),
        store,
        LedgerConfig::from(&config),
    );

    let state = AppState {
        pool,
        config: config.clone(),
        redis: Arc::new(redis_client),
        gateway: Arc::new(gateway),
    };

    let router = routes::app(state.clone());

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
