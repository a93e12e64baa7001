use crate::core::calculator::calculate_quotation;
use crate::core::rates::RateTable;
use crate::domain::catalog::Catalog;
use crate::domain::model::{MatchedComponent, Quotation};
use crate::domain::ports::ComponentIdentifier;
use crate::utils::error::{QuoteError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Identified,
    Quoted,
}

/// State of one quotation: the brief, the components being edited and the
/// last quotation computed from them.
///
/// Transitions are identify → edit → calculate, and `reset` starts over.
/// Editing the components drops a quotation computed before the edit.
#[derive(Debug, Clone, Default)]
pub struct QuotationSession {
    brief: Option<String>,
    components: Vec<MatchedComponent>,
    quotation: Option<Quotation>,
}

impl QuotationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.quotation, self.components.is_empty() && self.brief.is_none()) {
            (Some(_), _) => SessionPhase::Quoted,
            (None, true) => SessionPhase::Empty,
            (None, false) => SessionPhase::Identified,
        }
    }

    pub fn brief(&self) -> Option<&str> {
        self.brief.as_deref()
    }

    pub fn components(&self) -> &[MatchedComponent] {
        &self.components
    }

    pub fn quotation(&self) -> Option<&Quotation> {
        self.quotation.as_ref()
    }

    /// Runs the identifier. On error the session keeps what it had before.
    pub async fn identify<I>(
        &mut self,
        identifier: &I,
        catalog: &Catalog,
        brief: &str,
    ) -> Result<&[MatchedComponent]>
    where
        I: ComponentIdentifier + ?Sized,
    {
        let components = identifier.identify(brief, catalog).await?;
        self.record_identification(brief, components);
        Ok(&self.components)
    }

    pub fn record_identification(&mut self, brief: &str, components: Vec<MatchedComponent>) {
        self.brief = Some(brief.to_string());
        self.components = components;
        self.quotation = None;
    }

    pub fn add_component(&mut self, component: MatchedComponent) {
        self.components.push(component);
        self.quotation = None;
    }

    pub fn remove_component(&mut self, index: usize) -> Result<MatchedComponent> {
        self.check_index(index)?;
        self.quotation = None;
        Ok(self.components.remove(index))
    }

    pub fn update_component(&mut self, index: usize, component: MatchedComponent) -> Result<()> {
        self.check_index(index)?;
        self.components[index] = component;
        self.quotation = None;
        Ok(())
    }

    pub fn replace_components(&mut self, components: Vec<MatchedComponent>) {
        self.components = components;
        self.quotation = None;
    }

    pub fn calculate(&mut self, rates: &RateTable) -> &Quotation {
        let quotation = calculate_quotation(&self.components, rates);
        self.record_quotation(quotation)
    }

    pub fn record_quotation(&mut self, quotation: Quotation) -> &Quotation {
        self.quotation.insert(quotation)
    }

    pub fn reset(&mut self) {
        tracing::debug!("Resetting quotation session");
        *self = Self::default();
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.components.len() {
            return Err(QuoteError::ComponentIndexError {
                index,
                len: self.components.len(),
            });
        }
        Ok(())
    }
}
