use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::site::SiteKind;

/// Named text fields pulled out of one page. Every configured field is
/// present; a rule that matched nothing yields `""` and is listed in
/// `missing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    kind: SiteKind,
    fields: IndexMap<String, String>,
    missing: Vec<String>,
}

impl ExtractedRecord {
    pub(crate) fn new(
        kind: SiteKind,
        fields: IndexMap<String, String>,
        missing: Vec<String>,
    ) -> Self {
        Self {
            kind,
            fields,
            missing,
        }
    }

    pub fn kind(&self) -> SiteKind {
        self.kind
    }

    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|value| value.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUrl {
    pub url: String,
    pub site: SiteKind,
}

/// One successfully processed item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub index: usize,
    pub sources: Vec<SourceUrl>,
    pub fields: IndexMap<String, String>,
    pub generated_description: String,
    pub generated_at: String,
}
