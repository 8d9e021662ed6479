use indexmap::IndexMap;

use crate::extract::{self, REVIEW_SEPARATOR};
use crate::fetch::{FetchError, Fetcher};
use crate::formats::{ExtractedRecord, ResultRecord, SourceUrl};
use crate::generate::{self, GenerationError, GenerationRequest, Generator};
use crate::pairing::{self, LengthMismatchError, UrlPair};
use crate::registry::SiteProfile;
use crate::session::Session;
use crate::site::{self, Classification, SiteKind};
use crate::template::{self, TemplateError};
use crate::throttle::RateLimiter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInput {
    Single(Vec<String>),
    Paired(Vec<UrlPair>),
}

impl BatchInput {
    /// Pairs the lists up front so that a length mismatch rejects the batch
    /// before anything is fetched.
    pub fn paired(
        primary: Vec<String>,
        secondary: Vec<String>,
    ) -> Result<Self, LengthMismatchError> {
        pairing::pair(primary, secondary).map(BatchInput::Paired)
    }

    pub fn len(&self) -> usize {
        match self {
            BatchInput::Single(urls) => urls.len(),
            BatchInput::Paired(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn items(&self) -> Vec<Vec<String>> {
        match self {
            BatchInput::Single(urls) => urls.iter().map(|url| vec![url.clone()]).collect(),
            BatchInput::Paired(pairs) => pairs
                .iter()
                .map(|pair| vec![pair.primary.clone(), pair.secondary.clone()])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
}

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("unrecognized site: {url}")]
    Classification { url: String },
    #[error("no site profile registered for {0}")]
    Unsupported(SiteKind),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no fields could be extracted from {url}")]
    EmptyExtraction { url: String },
    #[error("template: {0}")]
    Template(#[from] TemplateError),
    #[error("generation: {0}")]
    Generation(#[from] GenerationError),
}

#[derive(Debug)]
pub struct ItemFailure {
    pub index: usize,
    pub urls: Vec<String>,
    pub error: ItemError,
}

#[derive(Debug)]
pub struct BatchReport {
    pub state: BatchState,
    pub total: usize,
    pub results: Vec<ResultRecord>,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

/// Receives progress while a batch runs. Every method defaults to a no-op.
pub trait BatchObserver {
    fn item_started(&mut self, _index: usize, _total: usize, _urls: &[String]) {}
    fn item_succeeded(&mut self, _record: &ResultRecord) {}
    fn item_failed(&mut self, _failure: &ItemFailure) {}
    fn progress(&mut self, _processed: usize, _total: usize) {}
}

/// Reports progress through `tracing`.
#[derive(Debug, Default)]
pub struct LogObserver;

impl BatchObserver for LogObserver {
    fn item_started(&mut self, index: usize, total: usize, urls: &[String]) {
        tracing::info!(item = index + 1, total, urls = ?urls, "processing");
    }

    fn item_succeeded(&mut self, record: &ResultRecord) {
        tracing::info!(
            item = record.index + 1,
            chars = record.generated_description.chars().count(),
            "description generated"
        );
    }

    fn item_failed(&mut self, failure: &ItemFailure) {
        tracing::error!(item = failure.index + 1, urls = ?failure.urls, error = %failure.error, "item skipped");
    }

    fn progress(&mut self, processed: usize, total: usize) {
        let percent = if total == 0 {
            100
        } else {
            processed * 100 / total
        };
        tracing::info!(processed, total, percent, "progress");
    }
}

/// Runs Extract -> Fill -> Generate over the input strictly in order. An item
/// that fails at any stage is reported and skipped; the batch carries on.
pub struct Batch<'a> {
    session: &'a Session,
    fetcher: &'a dyn Fetcher,
    generator: &'a dyn Generator,
    limiter: RateLimiter,
    state: BatchState,
}

impl<'a> Batch<'a> {
    pub fn new(
        session: &'a Session,
        fetcher: &'a dyn Fetcher,
        generator: &'a dyn Generator,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            session,
            fetcher,
            generator,
            limiter,
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub async fn run(
        &mut self,
        input: &BatchInput,
        observer: &mut dyn BatchObserver,
    ) -> anyhow::Result<BatchReport> {
        if self.state != BatchState::Idle {
            anyhow::bail!("batch already started (state: {:?})", self.state);
        }
        self.state = BatchState::Running;

        let items = input.items();
        let total = items.len();
        let mut results = Vec::new();
        let mut failures = Vec::new();

        for (index, urls) in items.into_iter().enumerate() {
            observer.item_started(index, total, &urls);

            match self.process(index, &urls).await {
                Ok(record) => {
                    observer.item_succeeded(&record);
                    results.push(record);
                }
                Err(error) => {
                    let failure = ItemFailure {
                        index,
                        urls,
                        error,
                    };
                    observer.item_failed(&failure);
                    failures.push(failure);
                }
            }

            observer.progress(index + 1, total);
        }

        self.state = BatchState::Completed;
        tracing::info!(
            total,
            succeeded = results.len(),
            failed = failures.len(),
            "batch completed"
        );

        Ok(BatchReport {
            state: self.state,
            total,
            results,
            failures,
        })
    }

    async fn process(&mut self, index: usize, urls: &[String]) -> Result<ResultRecord, ItemError> {
        let sources = urls
            .iter()
            .map(|url| classify_url(url))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(primary_source) = sources.first() else {
            return Err(ItemError::Classification { url: String::new() });
        };
        let primary_profile = self.profile(primary_source.site)?;

        let mut records = Vec::with_capacity(sources.len() * 2);
        for (idx, source) in sources.iter().enumerate() {
            let profile = self.profile(source.site)?;
            let record = match self.fetch_and_extract(&source.url, profile).await {
                Ok(record) => record,
                // A paired page that only leads to its companion's reviews may
                // be unreachable itself.
                Err(err) if idx > 0 && self.uses_companion(profile) => {
                    tracing::warn!(url = %source.url, %err, "paired fetch failed; continuing with its companion");
                    extract::extract(profile.kind, profile.rules, "")
                }
                Err(err) => return Err(err.into()),
            };
            if idx == 0 && record.is_empty() {
                return Err(ItemError::EmptyExtraction {
                    url: source.url.clone(),
                });
            }
            if record.is_partial() {
                tracing::warn!(url = %source.url, missing = ?record.missing(), "partial extraction");
            }
            records.push(record);

            if let Some(companion) = self.companion_record(&source.url, profile).await? {
                records.push(companion);
            }
        }

        let context = merge_records(&records);
        let template = self.session.template_for(primary_profile);
        let filled = template::fill(template, &context)?;

        let request = GenerationRequest {
            system: self.session.system_instruction.clone(),
            user_messages: build_user_messages(primary_profile, &context, filled),
            sampling: self.session.sampling_for(primary_profile),
        };
        let raw = self.generator.generate(&request).await?;

        let mut generated = generate::markdown_remnants_to_html(&raw);
        if self.session.wrap_html_fence {
            generated = generate::wrap_html_fence(&generated);
        }

        Ok(ResultRecord {
            index,
            sources,
            fields: context,
            generated_description: generated,
            generated_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn profile(&self, kind: SiteKind) -> Result<&'a SiteProfile, ItemError> {
        let session: &'a Session = self.session;
        session
            .registry
            .get(kind)
            .ok_or(ItemError::Unsupported(kind))
    }

    async fn fetch_and_extract(
        &mut self,
        url: &str,
        profile: &SiteProfile,
    ) -> Result<ExtractedRecord, FetchError> {
        self.limiter.acquire(url).await;
        let page = self.fetcher.fetch(url).await?;
        Ok(extract::extract(profile.kind, profile.rules, &page.html))
    }

    fn uses_companion(&self, profile: &SiteProfile) -> bool {
        self.session.companion_reviews && profile.companion.is_some()
    }

    /// A failed companion fetch leaves the companion's fields empty.
    async fn companion_record(
        &mut self,
        url: &str,
        profile: &SiteProfile,
    ) -> Result<Option<ExtractedRecord>, ItemError> {
        let Some(companion) = profile.companion.filter(|_| self.uses_companion(profile)) else {
            return Ok(None);
        };
        let Some(companion_url) = companion.url_for(url) else {
            return Ok(None);
        };
        let companion_profile = self.profile(companion.kind)?;

        let record = match self
            .fetch_and_extract(&companion_url, companion_profile)
            .await
        {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(url = %companion_url, %err, "companion fetch failed; continuing without it");
                extract::extract(companion.kind, companion_profile.rules, "")
            }
        };
        Ok(Some(record))
    }
}

fn classify_url(url: &str) -> Result<SourceUrl, ItemError> {
    match site::classify(url) {
        Classification::Site(site) => Ok(SourceUrl {
            url: url.to_owned(),
            site,
        }),
        Classification::Unrecognized => Err(ItemError::Classification {
            url: url.to_owned(),
        }),
    }
}

/// The first record's fields unprefixed, then every record's fields under
/// `<site prefix>_<field>`.
pub fn merge_records(records: &[ExtractedRecord]) -> IndexMap<String, String> {
    let mut context = IndexMap::new();
    if let Some(primary) = records.first() {
        for (field, value) in primary.fields() {
            context.insert(field.clone(), value.clone());
        }
    }
    for record in records {
        let prefix = record.kind().field_prefix();
        for (field, value) in record.fields() {
            let key = format!("{prefix}_{field}");
            // Two records of the same site: keep the first non-empty value.
            match context.get(&key) {
                Some(existing) if !existing.is_empty() => {}
                _ => {
                    context.insert(key, value.clone());
                }
            }
        }
    }
    context
}

fn build_user_messages(
    profile: &SiteProfile,
    context: &IndexMap<String, String>,
    filled: String,
) -> Vec<String> {
    let mut messages = Vec::new();
    if profile.send_source_content {
        let title = context.get("title").map(String::as_str).unwrap_or("");
        let description = context.get("description").map(String::as_str).unwrap_or("");
        messages.push(format!(
            "Oto tytuł i aktualny opis książki:\n{title}\n{description}\n"
        ));

        let mut reviews: Vec<&str> = Vec::new();
        for (key, value) in context {
            let is_review_field = key == "reviews" || key.ends_with("_reviews");
            if is_review_field && !value.trim().is_empty() && !reviews.contains(&value.as_str()) {
                reviews.push(value.as_str());
            }
        }
        if !reviews.is_empty() {
            messages.push(format!(
                "Oto autentyczne opinie czytelników o tej książce:\n{}",
                reviews.join(REVIEW_SEPARATOR)
            ));
        }
    }
    messages.push(filled);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldRule;

    const TITLE_DESC: &[FieldRule] = &[
        FieldRule::first("title", "h1"),
        FieldRule::first("description", "div.d"),
    ];
    const REVIEWS: &[FieldRule] = &[FieldRule::first("reviews", "p.r")];

    #[test]
    fn merge_records_exposes_primary_unprefixed_and_all_prefixed() {
        let bookland = extract::extract(
            SiteKind::Bookland,
            TITLE_DESC,
            r#"<h1>Tytuł</h1><div class="d">Opis</div>"#,
        );
        let lubimy = extract::extract(SiteKind::LubimyCzytac, REVIEWS, r#"<p class="r">Opinia</p>"#);

        let context = merge_records(&[bookland, lubimy]);
        let keys = context.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(
            keys,
            [
                "title",
                "description",
                "bookland_title",
                "bookland_description",
                "lubimy_reviews"
            ]
        );
        assert_eq!(context["lubimy_reviews"], "Opinia");
        assert_eq!(context["title"], "Tytuł");
    }

    #[test]
    fn source_content_messages_include_reviews_once() {
        let registry = crate::registry::SiteRegistry::default();
        let Some(bookland) = registry.get(SiteKind::Bookland) else {
            panic!("bookland profile");
        };
        let mut context = IndexMap::new();
        context.insert("title".to_owned(), "T".to_owned());
        context.insert("description".to_owned(), "D".to_owned());
        context.insert("lubimy_reviews".to_owned(), "R".to_owned());
        context.insert("tania_reviews".to_owned(), "R".to_owned());

        let messages = build_user_messages(bookland, &context, "PROMPT".to_owned());
        assert_eq!(
            messages,
            [
                "Oto tytuł i aktualny opis książki:\nT\nD\n",
                "Oto autentyczne opinie czytelników o tej książce:\nR",
                "PROMPT",
            ]
        );
    }

    #[test]
    fn plain_profiles_send_only_the_filled_template() {
        let registry = crate::registry::SiteRegistry::default();
        let Some(lubimy) = registry.get(SiteKind::LubimyCzytac) else {
            panic!("lubimyczytac profile");
        };
        let messages = build_user_messages(lubimy, &IndexMap::new(), "PROMPT".to_owned());
        assert_eq!(messages, ["PROMPT"]);
    }

    #[test]
    fn paired_input_rejects_length_mismatch() {
        let err = BatchInput::paired(
            vec!["https://bookland.com.pl/1".to_owned()],
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err.left, 1);
        assert_eq!(err.right, 0);
    }
}
