//! Environment-backed runtime configuration
//!
//! All knobs come from the process environment (a .env file is honored by
//! the binaries). Absent values degrade features instead of failing startup:
//! no Gemini key means template-only replies, no ASR URL means text-only
//! turns, no database URL means in-memory session checkpoints.

use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub asr_url: Option<String>,
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(8000);

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty() && key != "your_gemini_api_key_here");

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let asr_url = env::var("ASR_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let database_url = env::var("POSTGRES_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .ok()
            .filter(|url| !url.trim().is_empty());

        Self {
            port,
            gemini_api_key,
            gemini_model,
            asr_url,
            database_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        env::remove_var("PORT");
        env::remove_var("GEMINI_MODEL");
        let config = AppConfig::from_env();
        assert_eq!(config.port, 8000);
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
    }
}
