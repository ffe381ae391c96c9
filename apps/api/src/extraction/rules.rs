//! Extraction rules: the selector lists that steer HTML extraction.
//!
//! Kept as data so they can be tuned through `EXTRACTION_RULES_PATH` without a redeploy.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// Case-insensitive substrings matched against `class` and `id` attributes,
    /// highest priority first.
    pub content_patterns: Vec<String>,
    /// CSS selector for the generic structural pass (document order).
    pub structural_selector: String,
    /// A matched section must have more characters than this to count.
    pub min_section_chars: usize,
    /// Results shorter than this fall back to the whole body text.
    pub min_total_chars: usize,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            content_patterns: [
                "job-description",
                "job_description",
                "jobdescription",
                "job-details",
                "job-detail",
                "jobdetail",
                "position-details",
                "position-description",
                "job-posting",
                "jobposting",
                "job-ad",
                "jobad",
                "vacancy",
                "vacancies",
                "stellenanzeige",
                "stellenbeschreibung",
                "stellenangebot",
                "ausschreibung",
                "career",
                "karriere",
                "company-profile",
                "about-us",
                "ueber-uns",
                "description",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            structural_selector: "h1, h2, h3, h4, h5, h6, p, li".to_string(),
            min_section_chars: 100,
            min_total_chars: 200,
        }
    }
}

impl ExtractionRules {
    /// Loads rules from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read extraction rules from {}", path.display()))?;
        let rules: ExtractionRules = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid extraction rules in {}", path.display()))?;
        info!(
            "Loaded {} extraction patterns from {}",
            rules.content_patterns.len(),
            path.display()
        );
        Ok(rules)
    }

    pub fn from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
