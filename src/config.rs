use once_cell::sync::OnceCell;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub port: u16,
    pub host: String,
    pub db_path: String,
    pub log_level: String,
    pub log_dir: String,
    pub log_max_files: String,
    pub cors_origins: Vec<String>,
    pub os_id: String,
    pub os_description: String,
    pub agent_history_limit: usize,
    pub agent_max_tool_rounds: usize,
    pub mcp_server_name: String,
    pub model_timeout_secs: u64,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    pub fn init_global() -> Result<&'static Config, String> {
        let cfg = Config::from_env();
        CONFIG.set(cfg).map_err(|_| "Config already initialized".to_string())?;
        Self::try_get().ok_or_else(|| "Config not initialized".to_string())
    }

    pub fn try_get() -> Option<&'static Config> {
        CONFIG.get()
    }

    /// Loads `DOTENV_PATH` (default `../.env`) and falls back to `./.env`.
    pub fn load_dotenv() {
        let path = std::env::var("DOTENV_PATH").unwrap_or_else(|_| "../.env".to_string());
        if dotenvy::from_path(&path).is_err() {
            dotenvy::dotenv().ok();
        }
    }

    pub fn from_env() -> Config {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let read_str = |key: &str, def: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| def.to_string())
        };
        let read_usize = |key: &str, def: usize| -> usize {
            lookup(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(def)
        };

        let port = lookup("PORT")
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(8000);
        let model_timeout_secs = lookup("MODEL_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(60);

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => vec!["*".to_string()],
        };

        Config {
            google_api_key: lookup("GOOGLE_API_KEY").unwrap_or_default(),
            gemini_base_url: read_str(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            gemini_model: read_str("GEMINI_MODEL", "gemini-2.5-flash"),
            port,
            host: read_str("HOST", "0.0.0.0"),
            db_path: read_str("DB_PATH", "my_os.db"),
            log_level: read_str("LOG_LEVEL", "info"),
            log_dir: read_str("LOG_DIR", "logs"),
            log_max_files: read_str("LOG_MAX_FILES", "7d"),
            cors_origins,
            os_id: read_str("OS_ID", "my-first-os"),
            os_description: read_str("OS_DESCRIPTION", "My first AgentOS"),
            agent_history_limit: read_usize("AGENT_HISTORY_LIMIT", 10),
            agent_max_tool_rounds: read_usize("AGENT_MAX_TOOL_ROUNDS", 5).max(1),
            mcp_server_name: read_str("MCP_SERVER_NAME", "Doable Assistant"),
            model_timeout_secs,
        }
    }

    pub fn print(&self) {
        info!("Current configuration:");
        info!("  - HOST: {}", self.host);
        info!("  - PORT: {}", self.port);
        info!("  - DB_PATH: {}", self.db_path);
        info!("  - GEMINI_BASE_URL: {}", self.gemini_base_url);
        info!("  - GEMINI_MODEL: {}", self.gemini_model);
        info!(
            "  - GOOGLE_API_KEY: {}",
            if self.google_api_key.is_empty() { "not set" } else { "set" }
        );
        info!("  - LOG_LEVEL: {}", self.log_level);
        info!("  - OS_ID: {}", self.os_id);
        info!("  - AGENT_HISTORY_LIMIT: {}", self.agent_history_limit);
        info!("  - AGENT_MAX_TOOL_ROUNDS: {}", self.agent_max_tool_rounds);
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_demo_os() {
        let cfg = Config::from_lookup(lookup_from(&[]));
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.db_path, "my_os.db");
        assert_eq!(cfg.gemini_model, "gemini-2.5-flash");
        assert_eq!(cfg.os_id, "my-first-os");
        assert_eq!(cfg.mcp_server_name, "Doable Assistant");
        assert_eq!(cfg.cors_origins, vec!["*".to_string()]);
        assert!(cfg.google_api_key.is_empty());
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("AGENT_HISTORY_LIMIT", "-3"),
            ("AGENT_MAX_TOOL_ROUNDS", "0"),
        ]));
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.agent_history_limit, 10);
        assert_eq!(cfg.agent_max_tool_rounds, 1);
    }

    #[test]
    fn splits_cors_origins() {
        let cfg = Config::from_lookup(lookup_from(&[(
            "CORS_ORIGINS",
            "http://localhost:3000, ,https://doable.ai",
        )]));
        assert_eq!(
            cfg.cors_origins,
            vec!["http://localhost:3000".to_string(), "https://doable.ai".to_string()]
        );
    }
}
