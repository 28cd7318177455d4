use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use palimpsest_core::{
    Analyzer, ArchiveClient, Collector, FetchConfig, Sampling, ScanConfig, ScanConfigBuilder, SnapshotEntry,
    SnapshotRecord, Timestamp, extract_taglines, fetch_file, fetch_stdin, fetch_url, html_to_text, load_existing,
    load_texts, sample, write_reports,
};
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library modules that drown out collection progress at debug level.
const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "html5ever", "selectors", "lol_html"];

/// Track how a website's content changed across web archive captures
#[derive(Parser, Debug)]
#[command(name = "palimpsest")]
#[command(author = "Palimpsest Contributors")]
#[command(version)]
#[command(about = "Track how a website's content changed across web archive captures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    overrides: ConfigArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze existing snapshots, collecting them first when none are usable
    Run {
        /// Collect again even if a usable index exists
        #[arg(long)]
        refresh: bool,
    },
    /// List, sample, download and normalize captures, then write the index
    Collect,
    /// Compare consecutive snapshots and write the report tables
    Analyze,
    /// Print the normalized text of one page
    Normalize {
        /// URL to fetch, local HTML file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Print the extracted taglines as JSON instead
        #[arg(long)]
        taglines: bool,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Sample a "timestamp location" listing down to one capture per period
    Sample {
        /// Listing file, or "-" for stdin
        #[arg(value_name = "INPUT", default_value = "-")]
        input: String,
    },
}

/// Settings that override the config file.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// JSON config file (default: the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where snapshots and the index are stored
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Where report tables are written
    #[arg(long, global = true, value_name = "DIR")]
    reports_dir: Option<PathBuf>,

    /// Site whose pages are tracked
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// First day of the capture window (YYYYMMDD)
    #[arg(long, global = true, value_name = "DATE")]
    from: Option<String>,

    /// Last day of the capture window (YYYYMMDD)
    #[arg(long, global = true, value_name = "DATE")]
    to: Option<String>,

    /// Path to track; repeat for several (replaces the configured list)
    #[arg(long = "path", global = true, value_name = "PATH")]
    paths: Vec<String>,

    /// Sampling mode (all, yearly, quarterly, monthly)
    #[arg(long, global = true, value_name = "MODE", value_parser = parse_sampling)]
    sampling: Option<Sampling>,

    /// Textual distance at or above which a change is significant
    #[arg(long, global = true, value_name = "NUM")]
    threshold: Option<f64>,

    /// Keyword registry JSON file
    #[arg(long, global = true, value_name = "FILE")]
    keywords: Option<PathBuf>,

    /// Pause after each download, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    delay_ms: Option<u64>,

    /// IANA timezone for local timestamps
    #[arg(long, global = true, value_name = "TZ")]
    timezone: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Custom User-Agent for HTTP requests
    #[arg(long, global = true, value_name = "UA")]
    user_agent: Option<String>,
}

fn parse_sampling(s: &str) -> Result<Sampling, String> {
    s.parse().map_err(|e: palimpsest_core::PalimpsestError| e.to_string())
}

impl ConfigArgs {
    /// Loads the config file and layers the command-line overrides on top.
    fn resolve(&self) -> anyhow::Result<ScanConfig> {
        let base = ScanConfig::load(self.config.as_deref()).context("Failed to load config")?;
        let mut builder = ScanConfigBuilder::from_config(base);

        if let Some(v) = &self.data_dir {
            builder = builder.data_dir(v.clone());
        }
        if let Some(v) = &self.reports_dir {
            builder = builder.reports_dir(v.clone());
        }
        if let Some(v) = &self.base_url {
            builder = builder.base_url(v.clone());
        }
        if let Some(v) = &self.from {
            builder = builder.start(v.clone());
        }
        if let Some(v) = &self.to {
            builder = builder.end(v.clone());
        }
        if !self.paths.is_empty() {
            builder = builder.paths(self.paths.clone());
        }
        if let Some(v) = self.sampling {
            builder = builder.sampling(v);
        }
        if let Some(v) = self.threshold {
            builder = builder.significant_change(v);
        }
        if let Some(v) = &self.keywords {
            builder = builder.keywords_file(Some(v.clone()));
        }
        if let Some(v) = self.delay_ms {
            builder = builder.request_delay_ms(v);
        }
        if let Some(v) = &self.timezone {
            builder = builder.timezone(v.clone());
        }
        if let Some(v) = self.timeout {
            builder = builder.timeout(v);
        }
        if let Some(v) = &self.user_agent {
            builder = builder.user_agent(v.clone());
        }

        Ok(builder.build())
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = String::from(if verbose { "debug" } else { "info" });
        for module in NOISY_MODULES {
            directives.push_str(&format!(",{}=warn", module));
        }
        EnvFilter::new(directives)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    if let Err(e) = run(cli).await {
        echo::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run { refresh } => {
            let config = validated(&cli.overrides)?;
            let existing = if refresh { None } else { load_existing(&config.data_dir) };
            let records = match existing {
                Some(records) => {
                    echo::print_info(&format!("Reusing {} indexed snapshots", records.len()));
                    records
                }
                None => collect(&config, cli.verbose).await?,
            };
            analyze(&config, records, cli.verbose)
        }
        Command::Collect => {
            let config = validated(&cli.overrides)?;
            collect(&config, cli.verbose).await.map(|_| ())
        }
        Command::Analyze => {
            let config = validated(&cli.overrides)?;
            let Some(records) = load_existing(&config.data_dir) else {
                bail!(
                    "No usable snapshot index in {}; run `palimpsest collect` first",
                    config.data_dir.display()
                );
            };
            analyze(&config, records, cli.verbose)
        }
        Command::Normalize { input, taglines, output } => {
            let config = cli.overrides.resolve()?;
            normalize(&config, &input, taglines, output, cli.verbose).await
        }
        Command::Sample { input } => {
            let config = cli.overrides.resolve()?;
            sample_listing(config.sampling, &input)
        }
    }
}

fn validated(overrides: &ConfigArgs) -> anyhow::Result<ScanConfig> {
    let config = overrides.resolve()?;
    config.validate().context("Invalid configuration")?;
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

async fn collect(config: &ScanConfig, verbose: bool) -> anyhow::Result<Vec<SnapshotRecord>> {
    if verbose {
        echo::print_step(1, 2, &format!("Collecting {} paths from {}", config.paths.len(), config.base_url));
    }
    let started = Instant::now();

    let client = ArchiveClient::new(FetchConfig::from(config)).context("Failed to build HTTP client")?;
    let records = Collector::new(client, config.clone()).collect().await.context("Collection failed")?;

    if verbose {
        echo::print_timing("Collection", started.elapsed());
    }
    if records.is_empty() {
        echo::print_warning("No snapshots were collected");
    } else {
        echo::print_success(&format!(
            "Collected {} snapshots into {}",
            records.len(),
            config.data_dir.display().bright_white()
        ));
    }
    Ok(records)
}

fn analyze(config: &ScanConfig, records: Vec<SnapshotRecord>, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        echo::print_step(2, 2, &format!("Analyzing {} snapshots", records.len()));
    }
    let started = Instant::now();

    let registry = config.keyword_registry().context("Failed to load keyword registry")?;
    let snapshots = load_texts(records).context("Failed to read snapshot text")?;
    let analyzer = Analyzer::new(registry, config.magnitude).with_timezone(config.timezone.clone());
    let analysis = analyzer.analyze(&snapshots);

    let generated_at = chrono::Local::now().fixed_offset();
    let written = write_reports(&config.reports_dir, &analysis, config.significant_change, generated_at)
        .context("Failed to write reports")?;

    if verbose {
        echo::print_timing("Analysis", started.elapsed());
    }
    echo::print_summary(&analysis.summary(config.significant_change));
    echo::print_reports(&written);
    Ok(())
}

async fn normalize(
    config: &ScanConfig, input: &str, taglines: bool, output: Option<PathBuf>, verbose: bool,
) -> anyhow::Result<()> {
    let html = if input == "-" {
        fetch_stdin().context("Failed to read from stdin")?
    } else if input.starts_with("http://") || input.starts_with("https://") {
        if verbose {
            echo::print_info(&format!("Fetching {}", input.bright_white().underline()));
        }
        fetch_url(input, &FetchConfig::from(config)).await.context("Failed to fetch URL")?
    } else {
        fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?
    };

    let rendered = if taglines {
        let mut json = serde_json::to_string_pretty(&extract_taglines(&html)).context("Failed to encode taglines")?;
        json.push('\n');
        json
    } else {
        let source = if input == "-" { "stdin" } else { input };
        let mut text = html_to_text(source, &html);
        text.push('\n');
        text
    };

    match output {
        Some(path) => {
            fs::write(&path, rendered).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn sample_listing(mode: Sampling, input: &str) -> anyhow::Result<()> {
    let listing = if input == "-" {
        fetch_stdin().context("Failed to read from stdin")?
    } else {
        fetch_file(input).with_context(|| format!("Failed to read listing: {}", input))?
    };

    let mut entries = Vec::new();
    for (n, line) in listing.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(raw_ts), Some(location)) = (fields.next(), fields.next()) else {
            echo::print_warning(&format!("line {}: expected \"timestamp location\"", n + 1));
            continue;
        };
        match Timestamp::parse(raw_ts) {
            Ok(timestamp) => entries.push(SnapshotEntry::new(timestamp, location)),
            Err(e) => echo::print_warning(&format!("line {}: {}", n + 1, e)),
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entry in sample(&entries, mode) {
        writeln!(out, "{} {}", entry.timestamp, entry.location).context("Failed to write output")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_layer_on_defaults() {
        let cli = Cli::parse_from([
            "palimpsest",
            "analyze",
            "--path",
            "/",
            "--path",
            "/about/",
            "--sampling",
            "yearly",
            "--threshold",
            "0.2",
            "--config",
            "/nonexistent/palimpsest.json",
        ]);
        assert!(cli.overrides.resolve().is_err());

        let cli =
            Cli::parse_from(["palimpsest", "--path", "/", "--path", "/about/", "--sampling", "yearly", "analyze"]);
        let config = cli.overrides.resolve().unwrap();
        assert_eq!(config.paths, vec!["/".to_string(), "/about/".to_string()]);
        assert_eq!(config.sampling, Sampling::Yearly);
    }

    #[test]
    fn test_parse_sampling_rejects_unknown() {
        assert!(parse_sampling("weekly").is_err());
        assert_eq!(parse_sampling("quarterly").unwrap(), Sampling::Quarterly);
    }
}
