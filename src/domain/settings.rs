use secrecy::SecretString;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATALOG_PATH: &str = "structured_data.json";
pub const DEFAULT_RATES_PATH: &str = "quotation_hours.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

pub fn default_output_formats() -> Vec<String> {
    vec!["json".to_string()]
}

/// What to do when two rate rows share the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRatePolicy {
    /// Keep the first row and log a warning for every later one.
    #[default]
    FirstWins,
    /// Refuse to load the table.
    Reject,
}

/// Connection settings for the chat-completion provider.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
            timeout_seconds: None,
        }
    }
}
