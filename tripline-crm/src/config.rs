use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub hubspot: HubSpotConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HubSpotConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Private-app token. Optional at load time; any call that needs it
    /// fails with a configuration error when it is absent.
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_base_url() -> String {
    "https://api.hubapi.com".to_string()
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("TRIPLINE").separator("__"))
            .set_default("server.port", 3000)?
            .set_default("hubspot.base_url", default_base_url())?
            .build()?;

        let mut config: Self = s.try_deserialize()?;

        // The HubSpot serverless runtime exposed the token under this name;
        // honored here so existing deployments keep working.
        if config.hubspot.access_token.is_none() {
            config.hubspot.access_token = env::var("PRIVATE_APP_ACCESS_TOKEN").ok();
        }

        Ok(config)
    }
}
