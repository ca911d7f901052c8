//! Doable MCP server over stdio. Stdout carries protocol frames only, so
//! console logs go to stderr.

use std::sync::Arc;

use tracing::{error, info};

use doable_agent_server::agent::assistant_agent_with_tools;
use doable_agent_server::config::Config;
use doable_agent_server::db;
use doable_agent_server::llm::gemini::GeminiModel;
use doable_agent_server::logger::{self, ConsoleTarget};
use doable_agent_server::mcp::stdio::serve_stdio;
use doable_agent_server::mcp::{doable_tools, McpServer};
use doable_agent_server::repositories::agent_sessions::SessionStore;

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

    if let Err(err) = logger::init_logger(cfg, ConsoleTarget::Stderr) {
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

    let agent = Arc::new(assistant_agent_with_tools(
        cfg,
        model,
        SessionStore::new(pool.clone()),
    ));
    let server = McpServer::new(cfg.mcp_server_name.clone(), doable_tools(agent, pool));
    info!("[MCP] {} tools registered", server.tools().list().len());

    if let Err(err) = serve_stdio(&server).await {
        error!("[MCP] server stopped: {err}");
        std::process::exit(1);
    }
}
