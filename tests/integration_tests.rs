use anyhow::Result;
use httpmock::prelude::*;
use quote_estimator::core::{ConfigProvider, MatchedComponent};
use quote_estimator::utils::validation::Validate;
use quote_estimator::{
    EstimatorPipeline, LlmIdentifier, LocalStorage, OpenAiChatModel, QuoteEngine, QuoteError,
    TomlConfig,
};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

const CATALOG: &str = include_str!("../data/structured_data.json");
const RATES: &str = include_str!("../data/quotation_hours.csv");

type TestEngine = QuoteEngine<EstimatorPipeline<LocalStorage, LlmIdentifier<OpenAiChatModel>>>;

/// 在暫存目錄寫入目錄檔、工時表與 TOML 設定
fn setup(temp_dir: &TempDir, api_base: &str, rates: &str, extra: &str) -> Result<TomlConfig> {
    let base = temp_dir.path().to_str().unwrap().replace('\\', "/");
    std::fs::write(temp_dir.path().join("structured_data.json"), CATALOG)?;
    std::fs::write(temp_dir.path().join("quotation_hours.csv"), rates)?;

    let config_content = format!(
        r#"
[data]
catalog_path = "{base}/structured_data.json"
rates_path = "{base}/quotation_hours.csv"
{extra}

[llm]
api_base = "{api_base}"
model = "gpt-4o"
api_key = "test-key"

[output]
path = "{base}/out"
formats = ["json", "csv"]
"#
    );

    let config_path = temp_dir.path().join("estimator.toml");
    std::fs::write(&config_path, config_content)?;

    let config = TomlConfig::from_file(&config_path)?;
    config.validate()?;
    Ok(config)
}

fn engine(config: &TomlConfig) -> Result<TestEngine> {
    let settings = config.llm_settings();
    let identifier = LlmIdentifier::new(OpenAiChatModel::new(&settings)?);
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = EstimatorPipeline::from_config(storage, identifier, config)?;
    Ok(QuoteEngine::new(pipeline))
}

fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn banner_component(complexity: &str) -> Value {
    json!({
        "service_id": 2002,
        "service_name": "Digital Banner Ad Design",
        "product_id": 6003,
        "product_name": "Static Digital Banners",
        "type_of_work_id": 15,
        "type_of_work_name": "Creative Development",
        "complexity": complexity,
        "key_arts": ["Instagram Ads", "TikTok Ads", "YouTube Banners"],
        "variants": ["Athletes", "Creatives"],
        "sizes": ["1080x1080", "1080x1920", "2560x1440"]
    })
}

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_slice(&std::fs::read(path)?)?)
}

#[tokio::test]
async fn test_quote_end_to_end() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new()?;
    let config = setup(&temp_dir, &server.url("/v1"), RATES, "")?;

    let answer = json!({ "components": [banner_component("MEDIUM")] }).to_string();
    let chat_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("Authorization", "Bearer test-key")
                .body_contains("Spring launch banners");
            then.status(200).json_body(chat_completion(&answer));
        })
        .await;

    let mut engine = engine(&config)?;
    let outcome = engine
        .run("Spring launch banners for Instagram, TikTok and YouTube")
        .await?;

    chat_mock.assert_async().await;
    assert_eq!(outcome.quotation.rows.len(), 1);
    assert_eq!(outcome.quotation.rows[0].estimate, 8.0);
    assert_eq!(outcome.outputs.len(), 3);

    let out = temp_dir.path().join("out");
    let rows = read_json(&out.join("quotation.json"))?;
    assert_eq!(rows[0]["estimate"], 8.0);
    assert_eq!(rows[0]["key_arts"], 3);
    assert_eq!(rows[0]["product_name"], "Static Digital Banners");

    let csv = std::fs::read_to_string(out.join("quotation.csv"))?;
    assert!(csv.starts_with("service_name,product_name,type_of_work_name,complexity"));

    let saved = read_json(&out.join("components.json"))?;
    assert_eq!(saved[0]["sizes"].as_array().map(Vec::len), Some(3));

    Ok(())
}

#[tokio::test]
async fn test_non_json_answer_writes_nothing() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new()?;
    let config = setup(&temp_dir, &server.url("/v1"), RATES, "")?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(chat_completion("Sure! Here are the components you asked for."));
        })
        .await;

    let mut engine = engine(&config)?;
    let err = engine.run("Two posters for the store window").await.unwrap_err();

    assert!(matches!(err, QuoteError::ResponseParseError { .. }));
    assert!(!temp_dir.path().join("out").join("quotation.json").exists());
    assert!(engine.session().quotation().is_none());

    Ok(())
}

#[tokio::test]
async fn test_missing_components_key_gives_empty_quotation() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new()?;
    let config = setup(&temp_dir, &server.url("/v1"), RATES, "")?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(chat_completion(r#"{"note": "nothing in the catalog fits"}"#));
        })
        .await;

    let mut engine = engine(&config)?;
    let outcome = engine.run("A podcast jingle").await?;

    assert!(outcome.quotation.is_empty());
    let rows = read_json(&temp_dir.path().join("out").join("quotation.json"))?;
    assert_eq!(rows, json!([]));

    Ok(())
}

#[tokio::test]
async fn test_provider_error_propagates() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new()?;
    let config = setup(&temp_dir, &server.url("/v1"), RATES, "")?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(500).body("upstream overloaded");
        })
        .await;

    let mut engine = engine(&config)?;
    let err = engine.identify("Two posters").await.unwrap_err();

    match err {
        QuoteError::ProviderError { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("overloaded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_identify_then_calculate_edited_components() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new()?;
    let config = setup(&temp_dir, &server.url("/v1"), RATES, "")?;

    let answer = json!({ "components": [banner_component("MEDIUM")] }).to_string();
    let chat_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(chat_completion(&answer));
        })
        .await;

    let path = engine(&config)?.identify("Spring banners").await?;
    assert!(path.ends_with("components.json"));

    // 使用者手動把複雜度改成 HIGH，再另外計算
    let mut components: Vec<MatchedComponent> =
        serde_json::from_slice(&std::fs::read(&path)?)?;
    components[0].complexity = "HIGH".to_string();

    let mut engine = engine(&config)?;
    let outcome = engine.calculate_components(components).await?;

    // 3 x 4.0 + 1 x 1.5 + 2 x 0.75
    assert_eq!(outcome.quotation.rows[0].estimate, 15.0);
    assert_eq!(chat_mock.hits_async().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_unpriced_component_is_reported() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new()?;
    let config = setup(&temp_dir, &server.url("/v1"), RATES, "")?;

    let mut engine = engine(&config)?;
    let components: Vec<MatchedComponent> =
        serde_json::from_value(json!([banner_component("EXTREME"), banner_component("LOW")]))?;
    let outcome = engine.calculate_components(components).await?;

    assert_eq!(outcome.quotation.rows.len(), 1);
    assert_eq!(outcome.quotation.unmatched.len(), 1);
    assert_eq!(outcome.quotation.unmatched[0].position, 0);
    assert_eq!(outcome.quotation.rows[0].estimate, 4.0);

    Ok(())
}

#[tokio::test]
async fn test_strict_catalog_drops_unknown_components() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new()?;
    let config = setup(&temp_dir, &server.url("/v1"), RATES, "strict_catalog = true")?;

    let mut unknown = banner_component("MEDIUM");
    unknown["product_id"] = json!(9999);
    let answer = json!({ "components": [unknown, banner_component("MEDIUM")] }).to_string();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(chat_completion(&answer));
        })
        .await;

    let mut engine = engine(&config)?;
    let outcome = engine.run("Banners").await?;

    assert_eq!(engine.session().components().len(), 1);
    assert_eq!(outcome.quotation.rows.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_rate_rows_rejected_when_configured() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let rates = format!("{RATES}2002,6003,15,MEDIUM,9.0,9.0,9.0\n");
    let config = setup(
        &temp_dir,
        "http://localhost:1/v1",
        &rates,
        r#"duplicate_rates = "reject""#,
    )?;

    match engine(&config) {
        Err(e) => match e.downcast_ref::<QuoteError>() {
            Some(QuoteError::DuplicateRateKey { key, line }) => {
                assert_eq!(key, "2002/6003/15/MEDIUM");
                assert_eq!(*line, 14);
            }
            other => panic!("unexpected error: {other:?}"),
        },
        Ok(_) => panic!("duplicate rate rows should be rejected"),
    }

    // 預設保留第一筆
    let temp_dir = TempDir::new()?;
    let config = setup(&temp_dir, "http://localhost:1/v1", &rates, "")?;
    let mut engine = engine(&config)?;
    let components: Vec<MatchedComponent> =
        serde_json::from_value(json!([banner_component("MEDIUM")]))?;
    let outcome = engine.calculate_components(components).await?;
    assert_eq!(outcome.quotation.rows[0].estimate, 8.0);

    Ok(())
}
