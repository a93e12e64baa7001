pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use adapters::{openai::OpenAiChatModel, storage::LocalStorage};
pub use core::{
    engine::{QuoteEngine, QuoteOutcome},
    identifier::LlmIdentifier,
    pipeline::EstimatorPipeline,
    rates::RateTable,
    session::QuotationSession,
};
pub use domain::catalog::Catalog;
pub use utils::error::{QuoteError, Result};
