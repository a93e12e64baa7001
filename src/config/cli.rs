use crate::config::toml_config::TomlConfig;
use crate::core::ConfigProvider;
use crate::domain::settings::{
    default_output_formats, DuplicateRatePolicy, LlmSettings, DEFAULT_API_BASE,
    DEFAULT_CATALOG_PATH, DEFAULT_MODEL, DEFAULT_OUTPUT_PATH, DEFAULT_RATES_PATH,
};
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_output_formats, validate_path,
    validate_url, Validate,
};
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use std::fmt;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Identify the components of a brief and save them for editing
    Identify(BriefArgs),
    /// Price a (possibly edited) component file
    Calculate {
        /// Path to a components JSON file written by `identify`
        #[arg(long)]
        components: String,
    },
    /// Identify, price and export in one go
    Quote(BriefArgs),
}

#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct BriefArgs {
    /// Project brief text
    #[arg(long)]
    pub brief: Option<String>,

    /// Read the project brief from a file
    #[arg(long)]
    pub brief_file: Option<String>,
}

impl BriefArgs {
    pub fn read_brief(&self) -> Result<String> {
        let brief = match (&self.brief, &self.brief_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => {
                return Err(QuoteError::MissingConfigError {
                    field: "brief".to_string(),
                })
            }
        };

        validate_non_empty_string("brief", &brief)?;
        Ok(brief)
    }
}

#[derive(Clone, Parser)]
#[command(name = "quote-estimator")]
#[command(about = "Estimate creative-project work hours from a project brief")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file; command line options override it
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Catalog of offered components (JSON)
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Hours-per-unit rate table (CSV)
    #[arg(long, global = true)]
    pub rates: Option<String>,

    #[arg(long, global = true)]
    pub output_path: Option<String>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output formats: json, csv
    #[arg(long, global = true, value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Also write quotation.zip with every artifact and a summary
    #[arg(long, global = true)]
    pub bundle: bool,

    /// Fail when the rate table repeats a key instead of keeping the first row
    #[arg(long, global = true)]
    pub reject_duplicate_rates: bool,

    /// Drop identified components that are not in the catalog
    #[arg(long, global = true)]
    pub strict_catalog: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log as JSON lines")]
    pub log_json: bool,
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("command", &self.command)
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("rates", &self.rates)
            .field("output_path", &self.output_path)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("formats", &self.formats)
            .field("bundle", &self.bundle)
            .field("reject_duplicate_rates", &self.reject_duplicate_rates)
            .field("strict_catalog", &self.strict_catalog)
            .field("verbose", &self.verbose)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl CliConfig {
    /// 命令列參數覆蓋 TOML 設定
    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(catalog) = &self.catalog {
            config.data.catalog_path = catalog.clone();
        }
        if let Some(rates) = &self.rates {
            config.data.rates_path = rates.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }
        if !self.formats.is_empty() {
            config.output.formats = self.formats.clone();
        }
        if self.bundle {
            config.output.bundle = true;
        }
        if self.reject_duplicate_rates {
            config.data.duplicate_rates = DuplicateRatePolicy::Reject;
        }
        if self.strict_catalog {
            config.data.strict_catalog = true;
        }

        let llm = config.llm.get_or_insert_with(Default::default);
        if let Some(model) = &self.model {
            llm.model = model.clone();
        }
        if let Some(api_base) = &self.api_base {
            llm.api_base = api_base.clone();
        }
        if let Some(api_key) = &self.api_key {
            llm.api_key = Some(api_key.clone());
        }
    }
}

impl ConfigProvider for CliConfig {
    fn catalog_path(&self) -> &str {
        self.catalog.as_deref().unwrap_or(DEFAULT_CATALOG_PATH)
    }

    fn rates_path(&self) -> &str {
        self.rates.as_deref().unwrap_or(DEFAULT_RATES_PATH)
    }

    fn output_path(&self) -> &str {
        self.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn output_formats(&self) -> Vec<String> {
        if self.formats.is_empty() {
            default_output_formats()
        } else {
            self.formats.clone()
        }
    }

    fn bundle_output(&self) -> bool {
        self.bundle
    }

    fn duplicate_rate_policy(&self) -> DuplicateRatePolicy {
        if self.reject_duplicate_rates {
            DuplicateRatePolicy::Reject
        } else {
            DuplicateRatePolicy::FirstWins
        }
    }

    fn strict_catalog(&self) -> bool {
        self.strict_catalog
    }

    fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_base: self.api_base.clone().unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: self.api_key.clone().map(SecretString::from),
            ..LlmSettings::default()
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_file_extension("catalog", self.catalog_path(), &["json"])?;
        validate_file_extension("rates", self.rates_path(), &["csv"])?;
        validate_path("output_path", self.output_path())?;
        validate_output_formats("formats", &self.output_formats())?;
        validate_url("api_base", &self.llm_settings().api_base)?;
        Ok(())
    }
}
