use crate::domain::model::{MatchedComponent, Quotation, QuotationRow, QuotationSummary};
use crate::utils::error::{QuoteError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const QUOTATION_JSON: &str = "quotation.json";
pub const QUOTATION_CSV: &str = "quotation.csv";
pub const COMPONENTS_JSON: &str = "components.json";
pub const SUMMARY_JSON: &str = "summary.json";
pub const BUNDLE_ZIP: &str = "quotation.zip";

pub fn quotation_json(rows: &[QuotationRow]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(rows)?)
}

pub fn quotation_csv(rows: &[QuotationRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| QuoteError::IoError(e.into_error()))
}

pub fn components_json(components: &[MatchedComponent]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(components)?)
}

/// Zip with the quotation in both formats, the priced components and a summary.
pub fn bundle_zip(quotation: &Quotation, components: &[MatchedComponent]) -> Result<Vec<u8>> {
    let summary = QuotationSummary::from_quotation(quotation);
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(QUOTATION_JSON, FileOptions::default())?;
    zip.write_all(&quotation_json(&quotation.rows)?)?;

    zip.start_file::<_, ()>(QUOTATION_CSV, FileOptions::default())?;
    zip.write_all(&quotation_csv(&quotation.rows)?)?;

    zip.start_file::<_, ()>(COMPONENTS_JSON, FileOptions::default())?;
    zip.write_all(&components_json(components)?)?;

    zip.start_file::<_, ()>(SUMMARY_JSON, FileOptions::default())?;
    zip.write_all(&serde_json::to_vec_pretty(&summary)?)?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Plain-text table of the quotation for the terminal.
pub fn render_table(quotation: &Quotation) -> String {
    let headers = [
        "Service",
        "Product",
        "Type of work",
        "Complexity",
        "Key arts",
        "Variants",
        "Sizes",
        "Estimate (h)",
    ];
    let body: Vec<[String; 8]> = quotation
        .rows
        .iter()
        .map(|row| {
            [
                row.service_name.clone(),
                row.product_name.clone(),
                row.type_of_work_name.clone(),
                row.complexity.clone(),
                row.key_arts.to_string(),
                row.variants.to_string(),
                row.sizes.to_string(),
                format!("{:.2}", row.estimate),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(i, (cell, width))| {
                // counts and hours are right-aligned
                if i >= 4 {
                    format!("{:>width$}", cell, width = *width)
                } else {
                    format!("{:<width$}", cell, width = *width)
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_line(headers.to_vec())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for cells in &body {
        lines.push(format_line(cells.iter().map(String::as_str).collect()));
    }
    lines.push(String::new());
    lines.push(format!("Total: {:.2} hours", quotation.total_hours()));

    for unmatched in &quotation.unmatched {
        lines.push(format!(
            "Not priced: component #{} ({}) has no rate row",
            unmatched.position, unmatched.key
        ));
    }

    lines.join("\n")
}
