use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Origin of the web front-end, used for CORS. "*" allows any origin.
    pub allowed_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("allowed_origin", "*")?
            .add_source(config::Environment::default())
            .build()?;

        config.try_deserialize()
    }
}
