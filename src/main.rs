use clap::Parser;
use quote_estimator::config::cli::Command;
use quote_estimator::core::export::render_table;
use quote_estimator::core::{ConfigProvider, MatchedComponent};
use quote_estimator::utils::error::QuoteError;
use quote_estimator::utils::{logger, validation::Validate};
use quote_estimator::{
    CliConfig, EstimatorPipeline, LlmIdentifier, LocalStorage, OpenAiChatModel, QuoteEngine,
    QuoteOutcome, Result, TomlConfig,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting quote-estimator CLI");
    tracing::debug!("CLI config: {:?}", cli);

    let result = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(mut toml) => {
                tracing::info!("📄 Loaded configuration from {}", path);
                cli.apply_overrides(&mut toml);
                run(&cli.command, &toml).await
            }
            Err(e) => Err(e),
        },
        None => run(&cli.command, &cli).await,
    };

    if let Err(e) = result {
        exit_with(e);
    }
}

async fn run<C: ConfigProvider + Validate>(command: &Command, config: &C) -> Result<()> {
    config.validate()?;

    match command {
        Command::Identify(args) => {
            let brief = args.read_brief()?;
            let mut engine = build_engine(config, true)?;
            let path = engine.identify(&brief).await?;

            println!(
                "📝 Identified {} components",
                engine.session().components().len()
            );
            println!("📁 Edit and price them with: calculate --components {}", path);
        }
        Command::Calculate { components } => {
            let content = tokio::fs::read_to_string(components).await?;
            let components: Vec<MatchedComponent> = serde_json::from_str(&content)?;
            tracing::info!("Loaded {} components from file", components.len());

            let mut engine = build_engine(config, false)?;
            let outcome = engine.calculate_components(components).await?;
            print_outcome(&outcome);
        }
        Command::Quote(args) => {
            let brief = args.read_brief()?;
            let mut engine = build_engine(config, true)?;
            let outcome = engine.run(&brief).await?;
            print_outcome(&outcome);
        }
    }

    Ok(())
}

type CliEngine = QuoteEngine<EstimatorPipeline<LocalStorage, LlmIdentifier<OpenAiChatModel>>>;

/// `calculate` never talks to the model, so only the other commands need a key.
fn build_engine<C: ConfigProvider>(config: &C, needs_model: bool) -> Result<CliEngine> {
    let settings = config.llm_settings();
    if needs_model && settings.api_key.is_none() {
        return Err(QuoteError::MissingConfigError {
            field: "llm.api_key".to_string(),
        });
    }

    let model = OpenAiChatModel::new(&settings)?;
    let identifier = LlmIdentifier::new(model).with_temperature(settings.temperature);
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = EstimatorPipeline::from_config(storage, identifier, config)?;

    Ok(QuoteEngine::new(pipeline))
}

fn print_outcome(outcome: &QuoteOutcome) {
    println!("{}", render_table(&outcome.quotation));
    println!("✅ Quotation completed successfully!");
    for path in &outcome.outputs {
        println!("📁 {}", path);
    }
}

fn exit_with(e: QuoteError) -> ! {
    tracing::error!(
        "❌ Quotation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code());
}
