//! Category server - JSON API and live change stream over a `.categories/` store.

mod routes;
mod sse;
mod state;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "categories-ui")]
#[command(about = "JSON API for arranging a category tree, with change events over SSE")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Catalog root (contains .categories/)
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,
}

impl Args {
    fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// `/api/*` routes plus the `/events` stream, open to any origin.
fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::api_router())
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("categories_ui=info".parse()?)
                .add_directive("categories=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let project_dir = args
        .project_dir
        .canonicalize()
        .with_context(|| format!("resolve {}", args.project_dir.display()))?;
    let state = AppState::new(&project_dir)?;
    info!(project_dir = %project_dir.display(), "catalog opened");

    sse::start_file_watcher(state.clone());

    let listener = tokio::net::TcpListener::bind(args.addr())
        .await
        .with_context(|| format!("bind {}", args.addr()))?;
    info!(addr = %args.addr(), "listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
