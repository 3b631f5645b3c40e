use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Base URL of the song info API (no trailing slash)
    pub external_api_url: String,
    /// `host:port` to listen on; the host may be a name that resolves
    pub server_address: String,
    /// Overrides the migrations embedded in the binary when set
    pub migration_dir: Option<PathBuf>,
    pub database_max_connections: u32,
    /// Allowed CORS origins. A single "*" allows any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("POSTGRES_CONN")
            .ok_or_else(|| anyhow::anyhow!("POSTGRES_CONN environment variable must be set"))?;

        let external_api_url = var("EXTERNAL_API_URL")
            .ok_or_else(|| anyhow::anyhow!("EXTERNAL_API_URL environment variable must be set"))?;
        let parsed = reqwest::Url::parse(&external_api_url)
            .map_err(|e| anyhow::anyhow!("EXTERNAL_API_URL is not a valid URL: {}", e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(anyhow::anyhow!(
                "EXTERNAL_API_URL must use http or https, got '{}'",
                parsed.scheme()
            ));
        }
        let external_api_url = external_api_url.trim_end_matches('/').to_string();

        let server_address = parse_listen_address(
            &var("SERVER_ADDRESS").unwrap_or_else(|| "0.0.0.0:8081".to_string()),
        )?;

        // Accept the `file://` form used by other migration tools
        let migration_dir = var("MIGRATION_DIR").map(|dir| {
            PathBuf::from(dir.strip_prefix("file://").unwrap_or(&dir))
        });

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{}'",
                        raw
                    ))
                }
            },
            None => 10,
        };

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            database_url,
            external_api_url,
            server_address,
            migration_dir,
            database_max_connections,
            cors_origins,
        })
    }
}

/// Accepts `host:port` and `:port` (all interfaces)
fn parse_listen_address(raw: &str) -> Result<String, anyhow::Error> {
    let raw = raw.trim();
    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("SERVER_ADDRESS must be host:port, got '{}'", raw))?;

    port.parse::<u16>().map_err(|e| {
        anyhow::anyhow!("SERVER_ADDRESS has an invalid port '{}': {}", port, e)
    })?;

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok(format!("{}:{}", host, port))
}
