use crate::domain::catalog::Catalog;
use crate::domain::model::{MatchedComponent, Quotation};
use crate::domain::settings::{DuplicateRatePolicy, LlmSettings};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where exported artifacts are written.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn catalog_path(&self) -> &str;
    fn rates_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> Vec<String>;
    fn bundle_output(&self) -> bool;
    fn duplicate_rate_policy(&self) -> DuplicateRatePolicy;
    fn strict_catalog(&self) -> bool;
    fn llm_settings(&self) -> LlmSettings;
}

/// A single system + user exchange that must be answered with a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Chat-completion backend. Returns the raw message text of the answer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete_json(&self, request: ChatRequest) -> Result<String>;
}

/// Selects the catalog components a brief asks for.
#[async_trait]
pub trait ComponentIdentifier: Send + Sync {
    async fn identify(&self, brief: &str, catalog: &Catalog) -> Result<Vec<MatchedComponent>>;
}

/// The identify → estimate → export stages of a quotation run.
#[async_trait]
pub trait QuotePipeline: Send + Sync {
    async fn identify(&self, brief: &str) -> Result<Vec<MatchedComponent>>;
    async fn estimate(&self, components: &[MatchedComponent]) -> Result<Quotation>;
    /// Writes the configured artifacts and returns their paths.
    async fn export(&self, quotation: &Quotation, components: &[MatchedComponent]) -> Result<Vec<String>>;
    /// Writes the editable component list and returns its path.
    async fn save_components(&self, components: &[MatchedComponent]) -> Result<String>;
}
