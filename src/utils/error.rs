use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Language model provider returned {status}: {body}")]
    ProviderError { status: u16, body: String },

    #[error("Could not parse model response: {message}")]
    ResponseParseError { message: String },

    #[error("Catalog error: {message}")]
    CatalogError { message: String },

    #[error("Duplicate rate row for {key} (CSV line {line})")]
    DuplicateRateKey { key: String, line: u64 },

    #[error("Component index {index} is out of range ({len} components)")]
    ComponentIndexError { index: usize, len: usize },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Provider,
    Data,
    Configuration,
    Session,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 根據錯誤嚴重程度決定退出碼，任何錯誤都不會以 0 結束
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl QuoteError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            QuoteError::ApiError(_) => ErrorCategory::Network,
            QuoteError::ProviderError { .. } | QuoteError::ResponseParseError { .. } => {
                ErrorCategory::Provider
            }
            QuoteError::CsvError(_)
            | QuoteError::SerializationError(_)
            | QuoteError::CatalogError { .. }
            | QuoteError::DuplicateRateKey { .. }
            | QuoteError::ValidationError { .. } => ErrorCategory::Data,
            QuoteError::ConfigError { .. }
            | QuoteError::MissingConfigError { .. }
            | QuoteError::InvalidConfigValueError { .. }
            | QuoteError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            QuoteError::ComponentIndexError { .. } => ErrorCategory::Session,
            QuoteError::IoError(_) | QuoteError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Provider => ErrorSeverity::Medium,
            ErrorCategory::Session => ErrorSeverity::Low,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            QuoteError::ApiError(_) => "Check network connectivity and the --api-base endpoint, then retry",
            QuoteError::ProviderError { status, .. } if *status == 401 || *status == 403 => {
                "Check that OPENAI_API_KEY is set to a valid key"
            }
            QuoteError::ProviderError { .. } => "The provider rejected the request; retry later or try another model",
            QuoteError::ResponseParseError { .. } => {
                "The model did not answer with JSON; run the identification again"
            }
            QuoteError::CatalogError { .. } => "Check that the catalog file is a JSON array of component entries",
            QuoteError::DuplicateRateKey { .. } => {
                "Remove the duplicated row from the rate table or drop --reject-duplicate-rates"
            }
            QuoteError::CsvError(_) => "Check the rate table columns and numeric values",
            QuoteError::SerializationError(_) => "Check that the JSON input is well formed",
            QuoteError::ComponentIndexError { .. } => "List the current components and pick an existing index",
            QuoteError::ConfigError { .. }
            | QuoteError::MissingConfigError { .. }
            | QuoteError::InvalidConfigValueError { .. }
            | QuoteError::ConfigValidationError { .. } => "Review the command line options and the TOML configuration",
            QuoteError::ValidationError { .. } => "Correct the input and run the command again",
            QuoteError::IoError(_) => "Check that the file exists and the output directory is writable",
            QuoteError::ZipError(_) => "Check free disk space in the output directory",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            QuoteError::ApiError(_) | QuoteError::ProviderError { .. } => {
                format!("Component identification failed: {}", self)
            }
            QuoteError::ResponseParseError { .. } => {
                "The language model answer could not be read as JSON".to_string()
            }
            QuoteError::DuplicateRateKey { key, .. } => {
                format!("The rate table defines {} more than once", key)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_severity_exits_non_zero() {
        let severities = [
            ErrorSeverity::Low,
            ErrorSeverity::Medium,
            ErrorSeverity::High,
            ErrorSeverity::Critical,
        ];
        assert!(severities.iter().all(|s| s.exit_code() != 0));

        let session_error = QuoteError::ComponentIndexError { index: 3, len: 1 };
        assert_eq!(session_error.severity(), ErrorSeverity::Low);
        assert_eq!(session_error.severity().exit_code(), 1);
        assert_eq!(ErrorSeverity::Medium.exit_code(), 2);
        assert_eq!(ErrorSeverity::Critical.exit_code(), 3);
    }

    #[test]
    fn test_provider_errors_are_retryable() {
        let err = QuoteError::ProviderError {
            status: 500,
            body: "upstream".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Provider);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_auth_failure_suggests_api_key() {
        let err = QuoteError::ProviderError {
            status: 401,
            body: String::new(),
        };
        assert!(err.recovery_suggestion().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_duplicate_rate_key_message() {
        let err = QuoteError::DuplicateRateKey {
            key: "2002/6003/15/MEDIUM".to_string(),
            line: 4,
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("2002/6003/15/MEDIUM"));
    }
}
