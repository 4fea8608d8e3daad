use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "TUMINDIG_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    pub media: MediaSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
    /// Prefix for absolute media URLs. Empty keeps them relative ("/media/...").
    pub public_url: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    /// HMAC key for bearer token digests. Rotating it logs everyone out.
    pub token_secret: String,
}

#[derive(Deserialize, Clone)]
pub struct MediaSettings {
    pub dir: String,
    pub max_bytes: usize,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars(std::env::vars());

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("server.public_url", "")?
            .set_default("database.url", "sqlite://data/tumindig.db")?
            .set_default("security.token_secret", "change_me_please")?
            .set_default("media.dir", "data/media")?
            .set_default("media.max_bytes", 5 * 1024 * 1024)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map).map_err(|e| ConfigError::Foreign(Box::new(e)))?,
                config::FileFormat::Json,
            ))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        if settings.security.token_secret == "change_me_please" {
            tracing::warn!("security.token_secret is the default value; set TUMINDIG_SECURITY__TOKEN_SECRET");
        }
        Ok(settings)
    }
}

/// `TUMINDIG_SERVER__PORT=8080` becomes `server.port = "8080"`, nested as
/// JSON objects so the config crate can merge it over the file sources.
fn collect_env_vars(vars: impl Iterator<Item = (String, String)>) -> serde_json::Value {
    let mut root: HashMap<String, HashMap<String, String>> = HashMap::new();
    for (k, v) in vars.filter(|(k, _)| k.starts_with(ENV_PREFIX)) {
        let key = k.trim_start_matches(ENV_PREFIX).to_lowercase();
        if let Some((section, field)) = key.split_once("__") {
            root.entry(section.to_string())
                .or_default()
                .insert(field.to_string(), v);
        }
    }
    serde_json::to_value(root).unwrap_or_default()
}
