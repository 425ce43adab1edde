use rehome_domain::files::{FileGate, MAX_RESPONSE_FILE_BYTES};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub log_level: String,
    pub upload_max_bytes: u64,
    pub signed_url_ttl_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("log_level", "info")?
            .set_default("upload_max_bytes", MAX_RESPONSE_FILE_BYTES)?
            .set_default("signed_url_ttl_secs", 300)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn file_gate(&self) -> FileGate {
        FileGate::new(self.upload_max_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            app_env: "test".to_string(),
            log_level: "info".to_string(),
            upload_max_bytes: 1024,
            signed_url_ttl_secs: 60,
        }
    }

    #[test]
    fn production_flag_is_case_insensitive() {
        let mut config = sample();
        assert!(!config.is_production());
        config.app_env = "Production".to_string();
        assert!(config.is_production());
    }

    #[test]
    fn file_gate_uses_the_configured_limit() {
        let gate = sample().file_gate();
        let file = rehome_domain::files::UploadFile {
            file_name: "big.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![0u8; 2048],
        };
        assert!(gate.validate(&file).is_err());
    }
}
