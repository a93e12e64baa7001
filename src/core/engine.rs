use crate::core::session::QuotationSession;
use crate::domain::model::{MatchedComponent, Quotation};
use crate::domain::ports::QuotePipeline;
use crate::utils::error::Result;

/// What a calculation run produced.
#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub quotation: Quotation,
    pub outputs: Vec<String>,
}

/// Drives a pipeline and keeps the session it works on.
pub struct QuoteEngine<P: QuotePipeline> {
    pipeline: P,
    session: QuotationSession,
}

impl<P: QuotePipeline> QuoteEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            session: QuotationSession::new(),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn session(&self) -> &QuotationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut QuotationSession {
        &mut self.session
    }

    /// Identifies components and saves them for editing. Returns the file path.
    pub async fn identify(&mut self, brief: &str) -> Result<String> {
        tracing::info!("Decomposing the project brief...");
        let components = self.pipeline.identify(brief).await?;
        self.session.record_identification(brief, components);

        let path = self.pipeline.save_components(self.session.components()).await?;
        tracing::info!(
            "📝 {} components saved to {}",
            self.session.components().len(),
            path
        );
        Ok(path)
    }

    /// Prices the session's current components and exports the result.
    pub async fn calculate(&mut self) -> Result<QuoteOutcome> {
        let quotation = self.pipeline.estimate(self.session.components()).await?;
        let outputs = self
            .pipeline
            .export(&quotation, self.session.components())
            .await?;
        self.session.record_quotation(quotation.clone());

        Ok(QuoteOutcome { quotation, outputs })
    }

    /// Replaces the session's components with an edited list and prices them.
    pub async fn calculate_components(&mut self, components: Vec<MatchedComponent>) -> Result<QuoteOutcome> {
        self.session.replace_components(components);
        self.calculate().await
    }

    /// Identify, calculate and export in one go.
    pub async fn run(&mut self, brief: &str) -> Result<QuoteOutcome> {
        tracing::info!("Starting quotation run...");

        let components = self.pipeline.identify(brief).await?;
        self.session.record_identification(brief, components);

        let outcome = self.calculate().await?;
        tracing::info!(
            "Quotation run finished: {:.2} hours over {} rows",
            outcome.quotation.total_hours(),
            outcome.quotation.rows.len()
        );
        Ok(outcome)
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SessionPhase;
    use crate::domain::model::QuotationRow;
    use crate::utils::error::QuoteError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records stage calls; identification fails when the brief says so.
    #[derive(Default)]
    struct RecordingPipeline {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingPipeline {
        fn component() -> MatchedComponent {
            MatchedComponent {
                service_id: 1,
                service_name: "Service".to_string(),
                product_id: 2,
                product_name: "Product".to_string(),
                type_of_work_id: 3,
                type_of_work_name: "Work".to_string(),
                complexity: "LOW".to_string(),
                key_arts: vec!["A".to_string()],
                variants: vec![],
                sizes: vec![],
            }
        }
    }

    #[async_trait]
    impl QuotePipeline for RecordingPipeline {
        async fn identify(&self, brief: &str) -> Result<Vec<MatchedComponent>> {
            self.calls.lock().unwrap().push("identify".to_string());
            if brief == "fail" {
                return Err(QuoteError::ResponseParseError {
                    message: "not json".to_string(),
                });
            }
            Ok(vec![Self::component()])
        }

        async fn estimate(&self, components: &[MatchedComponent]) -> Result<Quotation> {
            self.calls.lock().unwrap().push("estimate".to_string());
            Ok(Quotation {
                rows: components
                    .iter()
                    .map(|c| QuotationRow {
                        service_name: c.service_name.clone(),
                        product_name: c.product_name.clone(),
                        type_of_work_name: c.type_of_work_name.clone(),
                        complexity: c.complexity.clone(),
                        key_arts: c.key_arts.len(),
                        variants: 0,
                        sizes: 0,
                        estimate: 1.5,
                    })
                    .collect(),
                unmatched: vec![],
            })
        }

        async fn export(&self, _quotation: &Quotation, _components: &[MatchedComponent]) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push("export".to_string());
            Ok(vec!["out/quotation.json".to_string()])
        }

        async fn save_components(&self, _components: &[MatchedComponent]) -> Result<String> {
            self.calls.lock().unwrap().push("save_components".to_string());
            Ok("out/components.json".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_goes_through_all_stages() {
        let mut engine = QuoteEngine::new(RecordingPipeline::default());
        let outcome = engine.run("Two banners").await.unwrap();

        assert_eq!(outcome.quotation.total_hours(), 1.5);
        assert_eq!(outcome.outputs, vec!["out/quotation.json"]);
        assert_eq!(engine.session().phase(), SessionPhase::Quoted);
        assert_eq!(
            *engine.pipeline().calls.lock().unwrap(),
            vec!["identify", "estimate", "export"]
        );
    }

    #[tokio::test]
    async fn test_failed_identify_keeps_session() {
        let mut engine = QuoteEngine::new(RecordingPipeline::default());
        engine.identify("First brief").await.unwrap();
        assert_eq!(engine.session().phase(), SessionPhase::Identified);

        assert!(engine.identify("fail").await.is_err());
        assert_eq!(engine.session().brief(), Some("First brief"));
        assert_eq!(engine.session().components().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_then_calculate() {
        let mut engine = QuoteEngine::new(RecordingPipeline::default());
        engine.identify("Brief").await.unwrap();

        engine
            .session_mut()
            .add_component(RecordingPipeline::component());
        let outcome = engine.calculate().await.unwrap();
        assert_eq!(outcome.quotation.rows.len(), 2);

        let outcome = engine
            .calculate_components(vec![RecordingPipeline::component()])
            .await
            .unwrap();
        assert_eq!(outcome.quotation.rows.len(), 1);

        engine.reset();
        assert_eq!(engine.session().phase(), SessionPhase::Empty);
    }
}
