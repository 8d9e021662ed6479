use std::collections::HashMap;

use crate::generate::{DEFAULT_MODEL, SYSTEM_INSTRUCTION, SamplingConfig};
use crate::registry::{SiteProfile, SiteRegistry};
use crate::site::SiteKind;

/// Everything one batch run needs to know besides its input and its
/// collaborators. Built per run and handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct Session {
    pub registry: SiteRegistry,
    /// Replaces a profile's default template for one site kind.
    pub templates: HashMap<SiteKind, String>,
    pub system_instruction: String,
    pub model: String,
    /// Overrides every profile's `max_output_tokens` when set.
    pub max_output_tokens: Option<u32>,
    /// Fetch companion review pages for profiles that declare one.
    pub companion_reviews: bool,
    pub wrap_html_fence: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            registry: SiteRegistry::default(),
            templates: HashMap::new(),
            system_instruction: SYSTEM_INSTRUCTION.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            max_output_tokens: None,
            companion_reviews: true,
            wrap_html_fence: false,
        }
    }
}

impl Session {
    pub fn template_for<'a>(&'a self, profile: &'a SiteProfile) -> &'a str {
        self.templates
            .get(&profile.kind)
            .map(String::as_str)
            .unwrap_or(profile.default_template)
    }

    pub fn sampling_for(&self, profile: &SiteProfile) -> SamplingConfig {
        SamplingConfig::new(
            self.model.clone(),
            self.max_output_tokens.unwrap_or(profile.max_output_tokens),
        )
    }
}
