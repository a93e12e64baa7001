use crate::core::calculator::calculate_quotation;
use crate::core::export;
use crate::core::rates::RateTable;
use crate::domain::catalog::Catalog;
use crate::domain::model::{MatchedComponent, Quotation};
use crate::domain::ports::{ComponentIdentifier, ConfigProvider, QuotePipeline, Storage};
use crate::domain::settings::default_output_formats;
use crate::utils::error::Result;
use std::collections::HashSet;

pub struct EstimatorPipeline<S: Storage, I: ComponentIdentifier> {
    storage: S,
    identifier: I,
    catalog: Catalog,
    rates: RateTable,
    output_path: String,
    output_formats: Vec<String>,
    bundle: bool,
    strict_catalog: bool,
}

impl<S: Storage, I: ComponentIdentifier> EstimatorPipeline<S, I> {
    pub fn new(storage: S, identifier: I, catalog: Catalog, rates: RateTable, output_path: String) -> Self {
        Self {
            storage,
            identifier,
            catalog,
            rates,
            output_path,
            output_formats: default_output_formats(),
            bundle: false,
            strict_catalog: false,
        }
    }

    /// Loads the catalog and rate table named by the configuration.
    pub fn from_config<C: ConfigProvider>(storage: S, identifier: I, config: &C) -> Result<Self> {
        let catalog = Catalog::from_path(config.catalog_path())?;
        let rates = RateTable::from_path(config.rates_path(), config.duplicate_rate_policy())?;
        tracing::info!(
            "📚 Loaded {} catalog entries and {} rate rows",
            catalog.len(),
            rates.len()
        );

        Ok(Self::new(storage, identifier, catalog, rates, config.output_path().to_string())
            .with_output_formats(config.output_formats())
            .with_bundle(config.bundle_output())
            .with_strict_catalog(config.strict_catalog()))
    }

    pub fn with_output_formats(mut self, formats: Vec<String>) -> Self {
        self.output_formats = formats;
        self
    }

    pub fn with_bundle(mut self, bundle: bool) -> Self {
        self.bundle = bundle;
        self
    }

    pub fn with_strict_catalog(mut self, strict: bool) -> Self {
        self.strict_catalog = strict;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    fn wants(&self, format: &str) -> bool {
        self.output_formats.iter().any(|f| f == format)
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<String> {
        tracing::debug!("Writing {} ({} bytes) to storage", name, data.len());
        self.storage.write_file(name, data).await?;
        Ok(format!("{}/{}", self.output_path, name))
    }
}

#[async_trait::async_trait]
impl<S: Storage, I: ComponentIdentifier> QuotePipeline for EstimatorPipeline<S, I> {
    async fn identify(&self, brief: &str) -> Result<Vec<MatchedComponent>> {
        let mut components = self.identifier.identify(brief, &self.catalog).await?;

        let mismatches = self.catalog.check(&components);
        for mismatch in &mismatches {
            tracing::warn!("⚠️ {}", mismatch);
        }

        if self.strict_catalog && !mismatches.is_empty() {
            let rejected: HashSet<usize> = mismatches.iter().map(|m| m.position).collect();
            components = components
                .into_iter()
                .enumerate()
                .filter(|(position, _)| !rejected.contains(position))
                .map(|(_, component)| component)
                .collect();
            tracing::warn!(
                "Strict catalog: dropped {} components that are not in the catalog",
                rejected.len()
            );
        }

        Ok(components)
    }

    async fn estimate(&self, components: &[MatchedComponent]) -> Result<Quotation> {
        tracing::info!("🧮 Calculating work hours for {} components", components.len());
        let quotation = calculate_quotation(components, &self.rates);

        if !quotation.unmatched.is_empty() {
            tracing::warn!(
                "{} components had no rate row and were left out",
                quotation.unmatched.len()
            );
        }
        tracing::info!(
            "✅ Quotation ready: {} rows, {:.2} hours",
            quotation.rows.len(),
            quotation.total_hours()
        );
        Ok(quotation)
    }

    async fn export(&self, quotation: &Quotation, components: &[MatchedComponent]) -> Result<Vec<String>> {
        let mut written = Vec::new();

        if self.wants("json") {
            let data = export::quotation_json(&quotation.rows)?;
            written.push(self.write(export::QUOTATION_JSON, &data).await?);
        }

        if self.wants("csv") {
            let data = export::quotation_csv(&quotation.rows)?;
            written.push(self.write(export::QUOTATION_CSV, &data).await?);
        }

        written.push(self.save_components(components).await?);

        if self.bundle {
            let data = export::bundle_zip(quotation, components)?;
            written.push(self.write(export::BUNDLE_ZIP, &data).await?);
        }

        tracing::info!("💾 Wrote {} files to {}", written.len(), self.output_path);
        Ok(written)
    }

    async fn save_components(&self, components: &[MatchedComponent]) -> Result<String> {
        let data = export::components_json(components)?;
        self.write(export::COMPONENTS_JSON, &data).await
    }
}
