use crate::domain::catalog::Catalog;
use crate::domain::model::MatchedComponent;
use crate::domain::ports::{ChatModel, ChatRequest, ComponentIdentifier};
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::validate_non_empty_string;
use async_trait::async_trait;
use serde_json::Value;

pub const SYSTEM_INSTRUCTION: &str =
    "You are an AI assistant skilled in creative project management.";

const RESPONSE_EXAMPLE: &str = r#"{
    "components": [
        {
            "service_id": 2002,
            "service_name": "Digital Banner Ad Design",
            "product_id": 6003,
            "product_name": "Static Digital Banners",
            "type_of_work_id": 15,
            "type_of_work_name": "Creative Development",
            "complexity": "MEDIUM",
            "key_arts": ["Instagram Ads", "TikTok Ads", "YouTube Banners"],
            "variants": ["Athletes", "Creatives"],
            "sizes": ["1080x1080", "1080x1920", "2560x1440"]
        }
    ]
}"#;

/// Builds the user prompt: the brief, the whole catalog and the answer format.
pub fn build_prompt(brief: &str, catalog_json: &str) -> String {
    format!(
        r#"You are an expert in planning creative projects. Break the project described in the brief below into the components our company offers, so it can be quoted.

**Project brief:**
{brief}

**Components we offer:**
{catalog_json}

Select all of the offered components the brief needs, and only those.

Answer with a single JSON object with the key "components", holding an array with one object per selected component. Every object must have:
- "service_id"
- "service_name"
- "product_id"
- "product_name"
- "type_of_work_id"
- "type_of_work_name"
- "complexity"
- "key_arts": list of the creative assets to deliver
- "variants": list of the variants applied to each asset
- "sizes": list of the sizes delivered for each variant

Example answer:
{example}
"#,
        brief = brief,
        catalog_json = catalog_json,
        example = RESPONSE_EXAMPLE
    )
}

/// Reads the component list out of a model answer.
///
/// Text that is not JSON is an error. A missing `components` key means
/// nothing was identified. Entries that do not look like a component are
/// skipped.
pub fn parse_components(raw: &str) -> Result<Vec<MatchedComponent>> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| QuoteError::ResponseParseError {
            message: format!("{} (response starts with: {:?})", e, excerpt(raw, 80)),
        })?;

    let items = match value.get("components") {
        None | Some(Value::Null) => {
            tracing::warn!("Model response has no \"components\" key; no components identified");
            return Ok(Vec::new());
        }
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(QuoteError::ResponseParseError {
                message: format!("\"components\" must be an array, got {}", json_kind(other)),
            })
        }
    };

    let mut components = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match serde_json::from_value::<MatchedComponent>(item.clone()) {
            Ok(component) => components.push(component),
            Err(e) => tracing::warn!("Skipping component #{} in model response: {}", position, e),
        }
    }
    Ok(components)
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Identifies components by asking a chat model.
pub struct LlmIdentifier<M: ChatModel> {
    model: M,
    temperature: f32,
}

impl<M: ChatModel> LlmIdentifier<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl<M: ChatModel> ComponentIdentifier for LlmIdentifier<M> {
    async fn identify(&self, brief: &str, catalog: &Catalog) -> Result<Vec<MatchedComponent>> {
        validate_non_empty_string("brief", brief).map_err(|_| QuoteError::ValidationError {
            message: "the project brief is empty".to_string(),
        })?;

        let request = ChatRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(brief.trim(), &catalog.to_prompt_json()?),
            temperature: self.temperature,
        };

        tracing::info!("🔍 Identifying components against {} catalog entries", catalog.len());
        let answer = self.model.complete_json(request).await?;
        let components = parse_components(&answer)?;
        tracing::info!("✅ Identified {} components", components.len());

        Ok(components)
    }
}
