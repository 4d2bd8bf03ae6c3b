//! Comma-separated import files.
//!
//! The header row must name `id` and `name`; `category` and `description`
//! are picked up when present. Column order is free and header names are
//! matched case-insensitively.

use crate::{
    error::{AppError, AppResult},
    models::ImportCandidate,
};

struct Columns {
    id: usize,
    name: usize,
    category: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_header(header: &::csv::StringRecord) -> AppResult<Self> {
        let position = |wanted: &str| {
            header
                .iter()
                .position(|h| h.trim().trim_matches('"').eq_ignore_ascii_case(wanted))
        };

        match (position("id"), position("name")) {
            (Some(id), Some(name)) => Ok(Self {
                id,
                name,
                category: position("category"),
                description: position("description"),
            }),
            _ => Err(AppError::Validation(
                "CSV must contain \"id\" and \"name\" columns.".to_string(),
            )),
        }
    }
}

/// Parse CSV text into candidates. Rows with fewer than two fields or an
/// empty id are skipped.
pub fn parse_candidates(text: &str) -> AppResult<Vec<ImportCandidate>> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(AppError::Validation("CSV file is empty".to_string()));
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Invalid CSV header: {}", e)))?
        .clone();
    let columns = Columns::from_header(&header)?;

    let mut candidates = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::Validation(format!("Invalid CSV row {}: {}", line + 2, e)))?;

        if record.len() < 2 {
            skipped += 1;
            continue;
        }

        let field = |index: usize| record.get(index).map(str::trim).unwrap_or_default();
        let optional = |index: Option<usize>| {
            index
                .map(field)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let id = field(columns.id);
        if id.is_empty() {
            skipped += 1;
            continue;
        }

        candidates.push(ImportCandidate {
            id: id.to_string(),
            name: field(columns.name).to_string(),
            category: optional(columns.category),
            description: optional(columns.description),
            maintenance_note: None,
        });
    }

    tracing::debug!(parsed = candidates.len(), skipped, "CSV parsed");
    Ok(candidates)
}
