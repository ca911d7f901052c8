use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use doable_agent_server::api::{self, AppState};
use doable_agent_server::config::Config;
use doable_agent_server::db;
use doable_agent_server::llm::gemini::GeminiModel;
use doable_agent_server::logger::{self, ConsoleTarget};

#[tokio::main]
async fn main() {
    Config::load_dotenv();

    let cfg = match Config::init_global() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Failed to load config: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = logger::init_logger(cfg, ConsoleTarget::Stdout) {
        eprintln!("Failed to init logger: {err}");
        std::process::exit(1);
    }

    let pool = match db::connect(&cfg.db_path).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("Failed to init database: {err}");
            std::process::exit(1);
        }
    };

    let model = match GeminiModel::from_config(cfg) {
        Ok(model) => Arc::new(model),
        Err(err) => {
            error!("Failed to init model client: {err}");
            std::process::exit(1);
        }
    };

    cfg.print();

    let app = api::router(AppState::from_config(cfg, pool, model));

    let host = cfg.host.parse().unwrap_or(IpAddr::from([0, 0, 0, 0]));
    let addr = SocketAddr::new(host, cfg.port);
    info!("Server running on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(err) => {
            error!("Failed to bind: {err}");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app);

    if let Err(err) = server.with_graceful_shutdown(shutdown_signal()).await {
        error!("Server error: {err}");
    }
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
