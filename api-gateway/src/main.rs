//! API gateway for the quote bridge

mod api;
mod config;
mod error;
mod ws;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use feed_engine::config::EngineConfig;
use feed_engine::source::{FeedSource, MemoryFeedSource, NullFeedSource};
use feed_engine::{HistoryConverter, StreamManager};

use crate::api::{
    history::get_history,
    status::{get_health, get_root, get_symbols, post_reconnect, post_switch_symbol},
};
use crate::config::AppConfig;
use crate::ws::handler::ws_handler;

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        api::status::get_root,
        api::status::get_health,
        api::status::get_symbols,
        api::status::post_switch_symbol,
        api::status::post_reconnect,
        api::history::get_history,
    ),
    components(
        schemas(
            api::history::HistoryQuery,
            common::model::tick::SynthesizedTick,
            common::model::tick::Side,
            common::model::tick::TickSource,
            common::model::stream::StreamMode,
        )
    ),
    tags(
        (name = "status", description = "Service status endpoints"),
        (name = "stream", description = "Stream control endpoints"),
        (name = "history", description = "Historical tick endpoints")
    ),
    info(
        title = "Quote Bridge API",
        version = "0.1.0",
        description = "Tick synthesis and broadcast service bridging a live quote feed to WebSocket subscribers"
    )
)]
struct ApiDoc;

/// Quote bridge API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address; overrides the PORT environment variable
    #[clap(short, long)]
    addr: Option<String>,

    /// Use the scripted in-memory feed instead of a real connector
    #[clap(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,feed_engine=debug")
        .expect("Invalid log filter");

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    debug!("Debug logging enabled");

    let config = AppConfig::from_env();

    let source: Arc<dyn FeedSource> = if args.demo {
        info!("Demo mode: using the scripted in-memory feed");
        Arc::new(MemoryFeedSource::new(&[
            "EURUSD", "GBPUSD", "USDJPY", "XAUUSD", "BTCUSD",
        ]))
    } else {
        Arc::new(NullFeedSource)
    };

    let manager = StreamManager::start(
        Arc::clone(&source),
        config.credentials.clone(),
        &config.default_symbol,
        EngineConfig::default(),
    )
    .await;

    let state = Arc::new(AppState {
        history: HistoryConverter::new(Arc::clone(&source), EngineConfig::default().synthesizer),
        manager: Arc::clone(&manager),
        config: config.clone(),
    });

    // Try the live feed in the background; the simulator is already
    // producing, so startup never blocks on the upstream connector
    {
        let manager = Arc::clone(&manager);
        let default_symbol = config.default_symbol.clone();
        tokio::spawn(async move {
            if !manager.start_live(&default_symbol).await {
                info!("Live feed not started; streaming simulated ticks");
            }
        });
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        .route("/", get(get_root))
        .route("/health", get(get_health))
        .route("/symbols", get(get_symbols))
        .route("/history/:symbol", get(get_history))
        .route("/switch_symbol/:symbol", post(post_switch_symbol))
        .route("/reconnect", post(post_reconnect))
        .route("/ws", get(ws_handler));

    let swagger_ui = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());

    let app = Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level)),
        )
        .with_state(state);

    let addr = args.addr.unwrap_or_else(|| format!("0.0.0.0:{}", config.port));
    let addr: std::net::SocketAddr = addr.parse().expect("Invalid address");
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    manager.shutdown().await;

    Ok(())
}

/// App state shared across handlers
pub struct AppState {
    /// Stream manager owning the producers and subscribers
    pub manager: Arc<StreamManager>,
    /// Historical tick converter
    pub history: HistoryConverter,
    /// Application configuration
    pub config: AppConfig,
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
