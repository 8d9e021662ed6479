use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::cli::{ClassifyArgs, ExtractArgs};
use crate::extract;
use crate::fetch::{Fetcher as _, HttpFetcher};
use crate::registry::SiteRegistry;
use crate::site::{self, Classification};
use crate::template;

pub fn classify(args: ClassifyArgs) -> anyhow::Result<()> {
    let urls = crate::run::read_url_list(Path::new(&args.urls))?;
    for url in urls {
        println!("{url}\t{}", site::classify(&url));
    }
    Ok(())
}

pub async fn extract(args: ExtractArgs) -> anyhow::Result<()> {
    let Classification::Site(kind) = site::classify(&args.url) else {
        anyhow::bail!("unrecognized site: {}", args.url);
    };
    let registry = SiteRegistry::default();
    let profile = registry
        .get(kind)
        .ok_or_else(|| anyhow::anyhow!("no site profile registered for {kind}"))?;

    let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout_secs))
        .context("build page fetcher")?;
    let page = fetcher.fetch(&args.url).await?;
    let record = extract::extract(kind, profile.rules, &page.html);

    let json = serde_json::to_string_pretty(&record).context("serialize extracted record")?;
    println!("{json}");
    Ok(())
}

pub fn templates() {
    let registry = SiteRegistry::default();
    for profile in registry.profiles() {
        let fields = profile.fields().collect::<Vec<_>>();
        let placeholders = template::placeholders(profile.default_template);
        println!("== {} ({})", profile.kind, profile.kind.patterns().join(", "));
        println!("fields: {}", fields.join(", "));
        println!(
            "merged as: {}",
            fields
                .iter()
                .map(|field| format!("{}_{field}", profile.kind.field_prefix()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("placeholders: {}", placeholders.join(", "));
        println!("max output tokens: {}", profile.max_output_tokens);
        println!();
        println!("{}", profile.default_template);
        println!();
    }
}
