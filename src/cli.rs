use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::fetch::DEFAULT_TIMEOUT;
use crate::throttle::DEFAULT_MIN_INTERVAL;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract, generate and export descriptions for a URL list.
    Run(RunArgs),
    /// Print the site kind each URL is routed to.
    Classify(ClassifyArgs),
    /// Fetch one page and print the extracted fields as JSON.
    Extract(ExtractArgs),
    /// Print each site kind's fields and default prompt template.
    Templates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmEngine {
    /// Echo the filled prompt instead of calling a model.
    Noop,
    Openai,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// File with one URL per line.
    #[arg(long)]
    pub urls: String,

    /// Second URL file, paired with `--urls` line by line.
    #[arg(long)]
    pub paired_urls: Option<String>,

    /// Output CSV path.
    #[arg(long)]
    pub out: String,

    /// Overwrite `--out` if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Replace a site's prompt template (repeatable).
    #[arg(long = "template", value_name = "KIND=PATH")]
    pub templates: Vec<String>,

    #[arg(long, value_enum, default_value_t = LlmEngine::Openai)]
    pub engine: LlmEngine,

    /// Minimum delay between requests to the same host.
    #[arg(long, default_value_t = DEFAULT_MIN_INTERVAL.as_millis() as u64)]
    pub delay_ms: u64,

    /// Page fetch timeout.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Model name (default: `BOOKBLURB_OPENAI_MODEL` or gpt-4o-mini).
    #[arg(long)]
    pub openai_model: Option<String>,

    /// API base URL (default: `BOOKBLURB_OPENAI_BASE_URL` or the public API).
    #[arg(long)]
    pub openai_base_url: Option<String>,

    #[arg(long, default_value_t = 300)]
    pub openai_timeout_secs: u64,

    /// Override every site's max output tokens.
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// Skip companion review pages (e.g. taniaksiazka -> lubimyczytac).
    #[arg(long, default_value_t = false)]
    pub no_companion_reviews: bool,

    /// Wrap each generated description in a ```html fence.
    #[arg(long, default_value_t = false)]
    pub wrap_html_fence: bool,

    /// Start the batch. Without it the plan is printed and nothing is fetched.
    #[arg(long, short = 'y', default_value_t = false)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// File with one URL per line.
    #[arg(long)]
    pub urls: String,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[arg(long)]
    pub url: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}
