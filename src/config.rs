use std::env;
use std::path::PathBuf;

/// Runtime configuration, environment-driven. CLI flags override individual
/// fields after loading.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        }
    }
}
