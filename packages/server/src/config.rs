//! Server configuration from environment variables
//!
//! - `ALIGNVIZ_PORT`: listen port (default 3000; `PORT` is accepted as a fallback)
//! - `ALIGNVIZ_HOST`: bind address (default `0.0.0.0`)
//! - `ALIGNVIZ_DATA_DIR`: directory holding `ai-alignment.json`, `components/`
//!   and `subcomponents/` (default `.`)
//! - `ALIGNVIZ_STATIC_DIR`: optional directory served at `/` (frontend assets)
//! - `CORS_ALLOW_ORIGIN`: single allowed origin (default: any)

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("."),
            static_dir: None,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparseable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = ["ALIGNVIZ_PORT", "PORT"]
            .iter()
            .find_map(|key| {
                let raw = lookup(key)?;
                match raw.parse::<u16>() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid {}: {}", key, raw);
                        None
                    }
                }
            })
            .unwrap_or(defaults.port);

        Self {
            host: lookup("ALIGNVIZ_HOST").unwrap_or(defaults.host),
            port,
            data_dir: lookup("ALIGNVIZ_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            static_dir: lookup("ALIGNVIZ_STATIC_DIR").map(PathBuf::from),
            cors_origin: lookup("CORS_ALLOW_ORIGIN"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
