use crate::core::rates::RateTable;
use crate::domain::model::{MatchedComponent, Quotation, QuotationRow, RateRow, UnmatchedComponent};

/// Billable hours for one component.
///
/// At least one key art is always charged; the first variant and the first
/// size are part of the key-art cost, so only the extra ones add hours.
pub fn estimate_hours(component: &MatchedComponent, rate: &RateRow) -> f64 {
    let key_arts = component.key_arts.len().max(1) as f64;
    let extra_variants = component.variants.len().saturating_sub(1) as f64;
    let extra_sizes = component.sizes.len().saturating_sub(1) as f64;

    key_arts * rate.hours_per_key_art
        + extra_variants * rate.hours_per_variant
        + extra_sizes * rate.hours_per_resize
}

pub fn quotation_row(component: &MatchedComponent, rate: &RateRow) -> QuotationRow {
    QuotationRow {
        service_name: component.service_name.clone(),
        product_name: component.product_name.clone(),
        type_of_work_name: component.type_of_work_name.clone(),
        complexity: component.complexity.clone(),
        key_arts: component.key_arts.len(),
        variants: component.variants.len(),
        sizes: component.sizes.len(),
        estimate: estimate_hours(component, rate),
    }
}

fn rate_matches(rate: &RateRow, component: &MatchedComponent) -> bool {
    rate.service_id == component.service_id
        && rate.product_id == component.product_id
        && rate.type_of_work_id == component.type_of_work_id
        && rate.complexity == component.complexity
}

/// Prices each component against the first rate row with the same key.
/// Components without a rate row are left out; input order is kept.
pub fn calculate(components: &[MatchedComponent], rates: &[RateRow]) -> Vec<QuotationRow> {
    components
        .iter()
        .filter_map(|component| {
            rates
                .iter()
                .find(|rate| rate_matches(rate, component))
                .map(|rate| quotation_row(component, rate))
        })
        .collect()
}

/// Like [`calculate`], but also reports the components that could not be priced.
pub fn calculate_quotation(components: &[MatchedComponent], rates: &RateTable) -> Quotation {
    let mut quotation = Quotation::default();

    for (position, component) in components.iter().enumerate() {
        let key = component.rate_key();
        match rates.lookup(&key) {
            Some(rate) => quotation.rows.push(quotation_row(component, rate)),
            None => {
                tracing::warn!(
                    "⚠️ No rate row for component #{} ({}); it is left out of the quotation",
                    position,
                    key
                );
                quotation.unmatched.push(UnmatchedComponent {
                    position,
                    key,
                    component: component.clone(),
                });
            }
        }
    }

    tracing::debug!(
        "Priced {} of {} components, {:.2} hours",
        quotation.rows.len(),
        components.len(),
        quotation.total_hours()
    );
    quotation
}
