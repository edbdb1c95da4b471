//! company-scrape command line
//!
//! Exit codes: 0 when the page(s) were scraped and written, 1 when a landmark never
//! appeared, the required field was missing, or any other error aborted the run.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, builder::PossibleValuesParser};
use company_scrape::{
    BrowserSession, BrowserSource, ConnectionOptions, LaunchOptions, Pipeline, RevealConfig, Schema,
    config::Config,
    extract::{Extractor, PageSnapshot},
    output::JsonSink,
    presets, targets,
};
use std::{path::PathBuf, process::ExitCode, time::Duration};

#[derive(Parser)]
#[command(name = "company-scrape")]
#[command(version)]
#[command(about = "Scrape company profile and directory pages with a headless browser", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file (default: ./company-scrape.toml if present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape a single page and write one JSON object
    Run {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Page URL (default: the schema's URL)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Id substituted into the schema's URL template
        #[arg(long, value_name = "ID", conflicts_with = "url")]
        id: Option<String>,

        #[command(flatten)]
        browser: BrowserArgs,

        #[command(flatten)]
        reveal: RevealArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Scrape many pages with one browser and write a JSON array
    Batch {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Comma-separated ids substituted into the URL template
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        ids: Vec<String>,

        /// File with one id per line
        #[arg(long, value_name = "FILE")]
        ids_file: Option<PathBuf>,

        /// File with target URLs (JSON array or one per line)
        #[arg(long, value_name = "FILE")]
        urls_file: Option<PathBuf>,

        /// URL template for ids (default: the schema's URL)
        #[arg(long, value_name = "TEMPLATE")]
        url_template: Option<String>,

        /// Stop after this many targets
        #[arg(long, value_name = "N")]
        max_targets: Option<usize>,

        /// Pause between targets in milliseconds (default: 1000)
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        #[command(flatten)]
        browser: BrowserArgs,

        #[command(flatten)]
        reveal: RevealArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Extract fields from a saved HTML file without a browser
    Extract {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Saved HTML document
        #[arg(long, value_name = "FILE")]
        html: PathBuf,

        /// URL the document was captured from, for resolving relative links
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Output file (default: print to stdout)
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List built-in schemas, or print one as TOML
    Presets {
        /// Preset to print
        #[arg(value_parser = PossibleValuesParser::new(presets::NAMES.iter().copied()))]
        name: Option<String>,
    },
}

#[derive(Args)]
struct SchemaArgs {
    /// Built-in schema
    #[arg(long, value_parser = PossibleValuesParser::new(presets::NAMES.iter().copied()), required_unless_present = "schema")]
    preset: Option<String>,

    /// Schema file (TOML)
    #[arg(long, value_name = "FILE", conflicts_with = "preset")]
    schema: Option<PathBuf>,
}

impl SchemaArgs {
    fn load(&self) -> anyhow::Result<Schema> {
        match (&self.preset, &self.schema) {
            (_, Some(path)) => Schema::load(path).with_context(|| format!("Failed to load schema {}", path.display())),
            (Some(name), None) => Ok(presets::by_name(name)?),
            (None, None) => bail!("Either --preset or --schema is required"),
        }
    }
}

#[derive(Args)]
struct BrowserArgs {
    /// Launch browser with a visible window
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Disable the Chrome sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Page load timeout in seconds
    #[arg(long, value_name = "SECS")]
    navigation_timeout_secs: Option<u64>,

    /// Seconds to wait for network activity to settle after each load (0 skips the wait)
    #[arg(long, value_name = "SECS")]
    network_idle_secs: Option<u64>,

    /// WebSocket endpoint of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,
}

impl BrowserArgs {
    fn session(&self, config: &Config) -> anyhow::Result<BrowserSession> {
        if let Some(options) = self.connection_options(config) {
            return Ok(BrowserSession::connect(options)?);
        }

        let mut options = config.launch_options(LaunchOptions::default());
        if self.headed {
            options.headless = false;
        }
        if let Some(path) = &self.chrome_path {
            options.chrome_path = Some(path.clone());
        }
        if self.no_sandbox {
            options.sandbox = false;
        }
        if let Some(secs) = self.navigation_timeout_secs {
            options.navigation_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.network_idle_secs {
            options.network_idle_timeout = Duration::from_secs(secs);
        }

        Ok(BrowserSession::launch(options)?)
    }

    /// Options for attaching to `--ws-endpoint`, if one was given
    fn connection_options(&self, config: &Config) -> Option<ConnectionOptions> {
        let mut options = ConnectionOptions::new(self.ws_endpoint.clone()?);
        if let Some(secs) = self.navigation_timeout_secs.or(config.navigation_timeout_secs) {
            options = options.timeout(secs.saturating_mul(1000));
        }
        if let Some(secs) = self.network_idle_secs.or(config.network_idle_timeout_secs) {
            options = options.network_idle_timeout(Duration::from_secs(secs));
        }
        Some(options)
    }
}

#[derive(Args)]
struct RevealArgs {
    /// Pixels scrolled per tick (default: 100)
    #[arg(long, value_name = "PX")]
    step_size: Option<u64>,

    /// Milliseconds between ticks (default: 100)
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Fail if the page has not stopped growing after this many ticks
    #[arg(long, value_name = "N")]
    max_ticks: Option<u64>,

    /// Fail if the page has not stopped growing after this many seconds
    #[arg(long, value_name = "SECS")]
    max_duration_secs: Option<u64>,
}

impl RevealArgs {
    /// Schema policy, then config file, then flags
    fn resolve(&self, schema: &Schema, config: &Config) -> RevealConfig {
        let mut reveal = config.reveal_config(schema.reveal_config.clone().unwrap_or_default());
        if let Some(step) = self.step_size {
            reveal.step_size = step;
        }
        if let Some(ms) = self.poll_interval_ms {
            reveal.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ticks) = self.max_ticks {
            reveal.max_ticks = Some(ticks);
        }
        if let Some(secs) = self.max_duration_secs {
            reveal.max_duration = Some(Duration::from_secs(secs));
        }
        reveal
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (default: config file, then the schema's output)
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Append to an existing JSON array, skipping records already present
    #[arg(long)]
    merge: bool,
}

impl OutputArgs {
    fn sink(&self, schema: &Schema, config: &Config) -> anyhow::Result<JsonSink> {
        let path = self
            .output
            .clone()
            .or_else(|| config.output.clone())
            .or_else(|| schema.output.clone())
            .context("No output file: pass --output or set `output` in the schema")?;

        Ok(JsonSink::new(path).merge(self.merge).dedupe_key(schema.dedupe_key.clone()))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run { schema, url, id, browser, reveal, output } => {
            let schema = schema.load()?;
            let url = match (url, id, &schema.url) {
                (Some(url), _, _) => targets::normalize_url(&url),
                (None, Some(id), Some(template)) => targets::normalize_url(&targets::expand_template(template, &id)),
                (None, None, Some(url)) if !url.contains(targets::ID_PLACEHOLDER) => url.clone(),
                (None, None, Some(_)) => bail!("Schema '{}' needs --id or --url", schema.name),
                (None, _, None) => bail!("Schema '{}' has no default URL; pass --url", schema.name),
            };

            let sink = output.sink(&schema, &config)?;
            let pipeline = Pipeline::new(schema.clone())?.reveal_config(reveal.resolve(&schema, &config))?;
            let source = BrowserSource::new(browser.session(&config)?);

            let record = pipeline.run(source, &url)?;
            sink.write_record(&record)?;
        }

        Command::Batch {
            schema,
            ids,
            ids_file,
            urls_file,
            url_template,
            max_targets,
            delay_ms,
            browser,
            reveal,
            output,
        } => {
            let schema = schema.load()?;

            let mut ids = ids;
            if let Some(path) = &ids_file {
                ids.extend(targets::load_list(path)?);
            }

            let mut urls = Vec::new();
            if !ids.is_empty() {
                let template = url_template
                    .as_ref()
                    .or(schema.url.as_ref())
                    .context("No URL template: pass --url-template or set `url` in the schema")?;
                urls.extend(targets::from_ids(template, &ids));
            }
            if let Some(path) = &urls_file {
                urls.extend(targets::load_list(path)?.iter().map(|url| targets::normalize_url(url)));
            }
            let urls = targets::dedupe_and_limit(urls, max_targets);
            if urls.is_empty() {
                bail!("No targets: pass --ids, --ids-file or --urls-file");
            }

            let delay = delay_ms
                .map(Duration::from_millis)
                .or(config.batch_delay())
                .unwrap_or(Duration::from_secs(1));
            let sink = output.sink(&schema, &config)?;
            let pipeline = Pipeline::new(schema.clone())?
                .reveal_config(reveal.resolve(&schema, &config))?
                .batch_delay(delay);
            let source = BrowserSource::new(browser.session(&config)?);

            let report = pipeline.run_batch(source, &urls);
            if report.records.is_empty() {
                bail!("All {} targets failed", report.attempted());
            }

            let written = sink.write_records(&report.records)?;
            log::info!(
                "Wrote {} records to {} ({} targets failed)",
                written,
                sink.path().display(),
                report.failures.len()
            );
        }

        Command::Extract { schema, html, url, output } => {
            let schema = schema.load()?;
            let page = PageSnapshot::from_file(&html, url.as_deref())?;
            let record = Extractor::new(schema)?.extract(&page)?;

            match output {
                Some(path) => JsonSink::new(path).write_record(&record)?,
                None => println!("{}", serde_json::to_string_pretty(&record)?),
            }
        }

        Command::Presets { name } => match name {
            Some(name) => {
                let schema = presets::by_name(&name)?;
                print!("{}", toml::to_string_pretty(&schema)?);
            }
            None => {
                for name in presets::NAMES {
                    let schema = presets::by_name(name)?;
                    println!("{:<14} {}", name, schema.description.as_deref().unwrap_or(""));
                }
            }
        },
    }

    Ok(())
}
