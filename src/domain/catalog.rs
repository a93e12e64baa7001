use crate::domain::model::{CatalogEntry, CatalogMismatch, MatchedComponent, MismatchReason};
use crate::utils::error::{QuoteError, Result};
use serde_json::Value;
use std::path::Path;

/// The components the business can quote.
///
/// The raw document is kept as loaded so the model sees the catalog exactly as
/// it is maintained; the parsed entries are used to check what comes back.
#[derive(Debug, Clone)]
pub struct Catalog {
    raw: Value,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        tracing::debug!("Loaded catalog file {}", path.as_ref().display());
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(content)?;
        Self::from_value(raw)
    }

    /// Accepts a top-level array of entries, or an object whose values are
    /// entries or arrays of entries.
    pub fn from_value(raw: Value) -> Result<Self> {
        let mut entries = Vec::new();

        match &raw {
            Value::Array(items) => collect_entries(items, &mut entries),
            Value::Object(map) => {
                for value in map.values() {
                    match value {
                        Value::Array(items) => collect_entries(items, &mut entries),
                        Value::Object(_) => collect_entries(std::slice::from_ref(value), &mut entries),
                        _ => {}
                    }
                }
            }
            _ => {}
        }

        if entries.is_empty() {
            return Err(QuoteError::CatalogError {
                message: "no catalog entries found".to_string(),
            });
        }

        tracing::debug!("Catalog holds {} entries", entries.len());
        Ok(Self { raw, entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_prompt_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.raw)?)
    }

    /// Reports every component whose ids, or complexity, the catalog does not offer.
    pub fn check(&self, components: &[MatchedComponent]) -> Vec<CatalogMismatch> {
        components
            .iter()
            .enumerate()
            .filter_map(|(position, component)| {
                let matching: Vec<&CatalogEntry> = self
                    .entries
                    .iter()
                    .filter(|entry| {
                        entry.service_id == component.service_id
                            && entry.product_id == component.product_id
                            && entry.type_of_work_id == component.type_of_work_id
                    })
                    .collect();

                if matching.is_empty() {
                    return Some(CatalogMismatch {
                        position,
                        key: component.rate_key(),
                        reason: MismatchReason::UnknownEntry,
                    });
                }

                let mut allowed: Vec<String> = Vec::new();
                for level in matching.iter().flat_map(|entry| entry.complexity.iter()) {
                    if !allowed.contains(level) {
                        allowed.push(level.clone());
                    }
                }

                // Entries without complexity levels accept any tier.
                if allowed.is_empty() || allowed.contains(&component.complexity) {
                    None
                } else {
                    Some(CatalogMismatch {
                        position,
                        key: component.rate_key(),
                        reason: MismatchReason::ComplexityNotOffered { allowed },
                    })
                }
            })
            .collect()
    }
}

fn collect_entries(items: &[Value], entries: &mut Vec<CatalogEntry>) {
    for item in items {
        match serde_json::from_value::<CatalogEntry>(item.clone()) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::debug!("Skipping catalog item that is not an entry: {}", e),
        }
    }
}
