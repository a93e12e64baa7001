use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One orderable service/product/type-of-work combination from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub service_id: u64,
    #[serde(default)]
    pub service_name: String,
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub product_id: u64,
    #[serde(default)]
    pub product_name: String,
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub type_of_work_id: u64,
    #[serde(default)]
    pub type_of_work_name: String,
    #[serde(
        default,
        alias = "complexities",
        alias = "complexity_levels",
        deserialize_with = "one_or_many"
    )]
    pub complexity: Vec<String>,
}

/// A catalog entry selected for a brief, with the assets it has to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedComponent {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub service_id: u64,
    #[serde(default)]
    pub service_name: String,
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub product_id: u64,
    #[serde(default)]
    pub product_name: String,
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub type_of_work_id: u64,
    #[serde(default)]
    pub type_of_work_name: String,
    pub complexity: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_arts: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub variants: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sizes: Vec<String>,
}

impl MatchedComponent {
    pub fn rate_key(&self) -> RateKey {
        RateKey {
            service_id: self.service_id,
            product_id: self.product_id,
            type_of_work_id: self.type_of_work_id,
            complexity: self.complexity.clone(),
        }
    }
}

/// Lookup key into the rate table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateKey {
    pub service_id: u64,
    pub product_id: u64,
    pub type_of_work_id: u64,
    pub complexity: String,
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.service_id, self.product_id, self.type_of_work_id, self.complexity
        )
    }
}

/// Hours per unit for one rate key. Column names match the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    pub service_id: u64,
    pub product_id: u64,
    pub type_of_work_id: u64,
    pub complexity: String,
    pub hours_per_key_art: f64,
    pub hours_per_variant: f64,
    pub hours_per_resize: f64,
}

impl RateRow {
    pub fn key(&self) -> RateKey {
        RateKey {
            service_id: self.service_id,
            product_id: self.product_id,
            type_of_work_id: self.type_of_work_id,
            complexity: self.complexity.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationRow {
    pub service_name: String,
    pub product_name: String,
    pub type_of_work_name: String,
    pub complexity: String,
    pub key_arts: usize,
    pub variants: usize,
    pub sizes: usize,
    pub estimate: f64,
}

/// A component that had no rate row, with its position in the priced list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedComponent {
    pub position: usize,
    pub key: RateKey,
    pub component: MatchedComponent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Quotation {
    pub rows: Vec<QuotationRow>,
    pub unmatched: Vec<UnmatchedComponent>,
}

impl Quotation {
    pub fn total_hours(&self) -> f64 {
        self.rows.iter().map(|row| row.estimate).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchReason {
    UnknownEntry,
    ComplexityNotOffered { allowed: Vec<String> },
}

/// A returned component that does not line up with the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogMismatch {
    pub position: usize,
    pub key: RateKey,
    pub reason: MismatchReason,
}

impl fmt::Display for CatalogMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MismatchReason::UnknownEntry => {
                write!(f, "component #{} ({}) is not in the catalog", self.position, self.key)
            }
            MismatchReason::ComplexityNotOffered { allowed } => write!(
                f,
                "component #{} ({}) uses a complexity the catalog does not offer (allowed: {})",
                self.position,
                self.key,
                allowed.join(", ")
            ),
        }
    }
}

/// Written next to the quotation in the zip bundle.
#[derive(Debug, Clone, Serialize)]
pub struct QuotationSummary {
    pub generated_at: DateTime<Utc>,
    pub total_hours: f64,
    pub rows: usize,
    pub unmatched: Vec<UnmatchedComponent>,
}

impl QuotationSummary {
    pub fn from_quotation(quotation: &Quotation) -> Self {
        Self {
            generated_at: Utc::now(),
            total_hours: quotation.total_hours(),
            rows: quotation.rows.len(),
            unmatched: quotation.unmatched.clone(),
        }
    }
}

// Models sometimes quote numeric ids.
fn id_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Float(f64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Float(id) if id >= 0.0 && id.fract() == 0.0 && id <= u64::MAX as f64 => Ok(id as u64),
        RawId::Float(id) => Err(serde::de::Error::custom(format!(
            "expected a whole-number id, got {}",
            id
        ))),
        RawId::Text(text) => text.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("expected a numeric id, got '{}'", text))
        }),
    }
}

// `null` from the model means "none".
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(level) => vec![level],
        OneOrMany::Many(levels) => levels,
    })
}
