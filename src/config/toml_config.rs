use crate::core::ConfigProvider;
use crate::domain::settings::{
    default_output_formats, DuplicateRatePolicy, LlmSettings, DEFAULT_API_BASE,
    DEFAULT_CATALOG_PATH, DEFAULT_MODEL, DEFAULT_OUTPUT_PATH, DEFAULT_RATES_PATH,
    DEFAULT_TEMPERATURE,
};
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_output_formats, validate_path, validate_range, validate_url,
    Validate,
};
use regex::Regex;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub data: DataConfig,
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_rates_path")]
    pub rates_path: String,
    #[serde(default)]
    pub duplicate_rates: DuplicateRatePolicy,
    #[serde(default)]
    pub strict_catalog: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_output_formats")]
    pub formats: Vec<String>,
    #[serde(default)]
    pub bundle: bool,
}

fn default_catalog_path() -> String {
    DEFAULT_CATALOG_PATH.to_string()
}

fn default_rates_path() -> String {
    DEFAULT_RATES_PATH.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            rates_path: default_rates_path(),
            duplicate_rates: DuplicateRatePolicy::default(),
            strict_catalog: false,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            timeout_seconds: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            formats: default_output_formats(),
            bundle: false,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| QuoteError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| QuoteError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_file_extension("data.catalog_path", &self.data.catalog_path, &["json"])?;
        validate_file_extension("data.rates_path", &self.data.rates_path, &["csv"])?;
        validate_path("output.path", &self.output.path)?;
        validate_output_formats("output.formats", &self.output.formats)?;

        if let Some(llm) = &self.llm {
            validate_url("llm.api_base", &llm.api_base)?;
            validate_range("llm.temperature", llm.temperature, 0.0, 2.0)?;
            if llm.model.trim().is_empty() {
                return Err(QuoteError::InvalidConfigValueError {
                    field: "llm.model".to_string(),
                    value: llm.model.clone(),
                    reason: "Model name cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// 未展開的 ${VAR} 視為沒有設定金鑰
    fn resolved_api_key(&self) -> Option<SecretString> {
        let key = self.llm.as_ref()?.api_key.as_ref()?;
        if key.starts_with("${") {
            tracing::warn!("llm.api_key refers to an unset environment variable: {}", key);
            return None;
        }
        if key.is_empty() {
            return None;
        }
        Some(SecretString::from(key.clone()))
    }
}

impl ConfigProvider for TomlConfig {
    fn catalog_path(&self) -> &str {
        &self.data.catalog_path
    }

    fn rates_path(&self) -> &str {
        &self.data.rates_path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> Vec<String> {
        self.output.formats.clone()
    }

    fn bundle_output(&self) -> bool {
        self.output.bundle
    }

    fn duplicate_rate_policy(&self) -> DuplicateRatePolicy {
        self.data.duplicate_rates
    }

    fn strict_catalog(&self) -> bool {
        self.data.strict_catalog
    }

    fn llm_settings(&self) -> LlmSettings {
        let llm = self.llm.clone().unwrap_or_default();
        LlmSettings {
            api_base: llm.api_base,
            model: llm.model,
            api_key: self.resolved_api_key(),
            temperature: llm.temperature,
            timeout_seconds: llm.timeout_seconds,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
