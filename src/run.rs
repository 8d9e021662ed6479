use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::batch::{Batch, BatchInput, LogObserver};
use crate::cli::{LlmEngine, RunArgs};
use crate::export;
use crate::fetch::HttpFetcher;
use crate::generate::{DEFAULT_MODEL, Generator, NoopGenerator, OpenAiGenerator};
use crate::openai;
use crate::pairing;
use crate::session::Session;
use crate::site::{self, SiteKind};
use crate::throttle::RateLimiter;

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let input = load_input(&args.urls, args.paired_urls.as_deref())?;
    if input.is_empty() {
        anyhow::bail!("no URLs found in {}", args.urls);
    }

    let out_path = PathBuf::from(&args.out);
    if out_path.exists() && !args.force {
        anyhow::bail!(
            "output already exists: {} (use --force to overwrite)",
            out_path.display()
        );
    }

    let session = build_session(&args).context("build session")?;

    if !args.yes {
        print_plan(&input);
        eprintln!(
            "{} item(s) planned; re-run with --yes to start the batch",
            input.len()
        );
        return Ok(());
    }

    let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout_secs))
        .context("build page fetcher")?;
    let generator = build_generator(&args).context("build generator")?;
    let limiter = RateLimiter::new(Duration::from_millis(args.delay_ms));

    tracing::info!(
        items = input.len(),
        engine = ?args.engine,
        model = %session.model,
        delay_ms = args.delay_ms,
        out = %out_path.display(),
        "batch start"
    );

    let mut batch = Batch::new(&session, &fetcher, generator.as_ref(), limiter);
    let report = batch.run(&input, &mut LogObserver).await?;

    for failure in &report.failures {
        eprintln!(
            "item {} failed ({}): {}",
            failure.index + 1,
            failure.urls.join(" | "),
            failure.error
        );
    }

    if !report.has_results() {
        println!("no results");
        return Ok(());
    }

    export::write_csv_file(&out_path, &report.results, args.force)?;
    println!(
        "wrote {} of {} item(s) to {}",
        report.results.len(),
        report.total,
        out_path.display()
    );

    Ok(())
}

/// Reads the URL list(s). Two lists are paired here, before anything is
/// fetched, so a length mismatch rejects the whole batch.
pub fn load_input(urls_path: &str, paired_path: Option<&str>) -> anyhow::Result<BatchInput> {
    let primary = read_url_list(Path::new(urls_path))?;
    match paired_path {
        Some(path) => {
            let secondary = read_url_list(Path::new(path))?;
            BatchInput::paired(primary, secondary).context("pair URL lists")
        }
        None => Ok(BatchInput::Single(primary)),
    }
}

pub fn read_url_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read URL list: {}", path.display()))?;
    Ok(pairing::parse_url_list(&text))
}

fn build_session(args: &RunArgs) -> anyhow::Result<Session> {
    let mut session = Session {
        model: args
            .openai_model
            .clone()
            .or_else(|| std::env::var("BOOKBLURB_OPENAI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
        max_output_tokens: args.max_output_tokens,
        companion_reviews: !args.no_companion_reviews,
        wrap_html_fence: args.wrap_html_fence,
        ..Session::default()
    };

    for spec in &args.templates {
        let (kind, path) = parse_template_arg(spec)?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read template for {kind}: {}", path.display()))?;
        if text.trim().is_empty() {
            anyhow::bail!("template for {kind} is empty: {}", path.display());
        }
        tracing::info!(site = %kind, path = %path.display(), "template override");
        session.templates.insert(kind, text);
    }

    Ok(session)
}

fn parse_template_arg(spec: &str) -> anyhow::Result<(SiteKind, PathBuf)> {
    let (kind, path) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("--template must be KIND=PATH, got: {spec}"))?;
    let kind = kind.parse::<SiteKind>()?;
    if path.trim().is_empty() {
        anyhow::bail!("--template {kind}= is missing a path");
    }
    Ok((kind, PathBuf::from(path.trim())))
}

fn build_generator(args: &RunArgs) -> anyhow::Result<Box<dyn Generator>> {
    match args.engine {
        LlmEngine::Noop => Ok(Box::new(NoopGenerator)),
        LlmEngine::Openai => {
            let base_url = args
                .openai_base_url
                .clone()
                .or_else(|| std::env::var("BOOKBLURB_OPENAI_BASE_URL").ok())
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_owned());
            let generator = OpenAiGenerator::from_env(
                &base_url,
                Duration::from_secs(args.openai_timeout_secs),
            )?;
            Ok(Box::new(generator))
        }
    }
}

fn print_plan(input: &BatchInput) {
    for (index, urls) in input.items().iter().enumerate() {
        let routed = urls
            .iter()
            .map(|url| format!("{}\t{url}", site::classify(url)))
            .collect::<Vec<_>>()
            .join("\t");
        println!("{}\t{routed}", index + 1);
    }
}
