// 📈 Listed Registry - exchange / OTC listed companies
//
// Membership is by identifier OR by registered name; registry holder
// lists only give us names, and names drift, so both sets are kept.

use crate::provider::normalize_business_id;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ListedRecord {
    #[serde(rename = "統編")]
    id: String,

    #[serde(rename = "公司名稱")]
    name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListedRegistry {
    ids: HashSet<String>,
    names: HashSet<String>,
}

impl ListedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a listed-company CSV with `統編` and `公司名稱` columns.
    ///
    /// Accepts a UTF-8 BOM on the header row.
    pub fn from_csv(csv_path: &Path) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(csv_path)
            .with_context(|| format!("Failed to open listed-company CSV: {:?}", csv_path))?;

        // Strip a BOM from the first header so column names match.
        let headers = rdr.headers()?.clone();
        let cleaned: csv::StringRecord = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}'))
            .collect();
        rdr.set_headers(cleaned);

        let mut registry = ListedRegistry::new();
        for result in rdr.deserialize() {
            let record: ListedRecord = result.context("Failed to deserialize listed-company row")?;
            registry.insert(&record.id, &record.name);
        }

        tracing::info!(count = registry.len(), "loaded listed-company registry");
        Ok(registry)
    }

    pub fn insert(&mut self, id: &str, name: &str) {
        let id = id_key(id);
        let name = name.trim();
        if !id.is_empty() {
            self.ids.insert(id);
        }
        if !name.is_empty() {
            self.names.insert(name.to_string());
        }
    }

    pub fn contains(&self, id: &str, name: &str) -> bool {
        self.ids.contains(&id_key(id)) || self.names.contains(name.trim())
    }

    pub fn len(&self) -> usize {
        self.ids.len().max(self.names.len())
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.names.is_empty()
    }
}

/// Spreadsheet exports drop leading zeros; compare ids in 8-digit form.
fn id_key(id: &str) -> String {
    normalize_business_id(id).unwrap_or_else(|| id.trim().to_string())
}

// ============================================================================
// TESTS
// ============================================================================
