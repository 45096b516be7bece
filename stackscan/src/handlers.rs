use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use stackscan_core::collect::{
    CollectOptions, CollectProgressCallback, DEFAULT_PAGES, DEFAULT_PAUSE_MS, DEFAULT_PER_PAGE,
    StackTally, execute_collect,
};
use stackscan_core::keywords::{DEFAULT_KEYWORDS, KeywordDictionary, KeywordError};
use stackscan_core::report::{
    DEFAULT_TOP, ReportFormat, ReportPaths, generate_top_table, summary_rows, write_reports,
};
use stackscan_fetcher::client::DEFAULT_TIMEOUT_SECS;
use stackscan_fetcher::{ClientConfig, VacancyClient};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/stackscan/";
pub const KEYWORDS_FILE: &str = "keywords.json";

/// Where the keyword dictionary of a run came from
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordSource {
    File(PathBuf),
    Builtin,
}

impl std::fmt::Display for KeywordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywordSource::File(path) => write!(f, "{}", path.display()),
            KeywordSource::Builtin => write!(f, "built-in"),
        }
    }
}

/// Everything `scan` needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub client: ClientConfig,
    pub collect: CollectOptions,
    pub keywords: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub format: ReportFormat,
    pub top: usize,
}

pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn installed_keywords_path(config_dir: &str) -> PathBuf {
    expand_path(config_dir).join(KEYWORDS_FILE)
}

/// Explicit file first, then the `init` location, then the built-in dictionary.
pub fn resolve_keywords(
    explicit: Option<&PathBuf>,
    installed: &Path,
) -> Result<(KeywordDictionary, KeywordSource), KeywordError> {
    if let Some(path) = explicit {
        let dictionary = KeywordDictionary::load(path)?;
        return Ok((dictionary, KeywordSource::File(path.clone())));
    }

    if installed.exists() {
        let dictionary = KeywordDictionary::load(installed)?;
        return Ok((dictionary, KeywordSource::File(installed.to_path_buf())));
    }

    Ok((KeywordDictionary::builtin()?, KeywordSource::Builtin))
}

/// Split repeated and comma-separated area ids, dropping blanks and repeats.
pub fn parse_areas<'a, I>(values: I) -> Result<Vec<String>, String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut areas: Vec<String> = Vec::new();
    for value in values {
        for area in value.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            if !areas.iter().any(|existing| existing == area) {
                areas.push(area.to_string());
            }
        }
    }

    if areas.is_empty() {
        return Err("At least one --area is required".to_string());
    }
    Ok(areas)
}

/// Write the built-in dictionary into `config_dir`.
pub fn install_keywords(config_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(config_dir)?;
    let path = config_dir.join(KEYWORDS_FILE);
    fs::write(&path, DEFAULT_KEYWORDS)?;
    Ok(path)
}

/// `quiet` comes from the top-level matches.
pub fn scan_settings(args: &ArgMatches, quiet: bool) -> anyhow::Result<ScanSettings> {
    let text = args
        .get_one::<String>("text")
        .ok_or_else(|| anyhow!("--text is required"))?;
    let areas = parse_areas(args.get_many::<String>("area").into_iter().flatten())
        .map_err(|e| anyhow!(e))?;
    let pages = *args.get_one::<u32>("pages").unwrap_or(&DEFAULT_PAGES);
    let per_page = *args.get_one::<u32>("per-page").unwrap_or(&DEFAULT_PER_PAGE);
    let experience = args
        .get_one::<String>("experience")
        .ok_or_else(|| anyhow!("--experience is required"))?;
    let pause = *args.get_one::<u64>("pause").unwrap_or(&DEFAULT_PAUSE_MS);
    let timeout = *args.get_one::<u64>("timeout").unwrap_or(&DEFAULT_TIMEOUT_SECS);
    let api_url = args
        .get_one::<Url>("api-url")
        .ok_or_else(|| anyhow!("--api-url is required"))?;
    let user_agent = args
        .get_one::<String>("user-agent")
        .ok_or_else(|| anyhow!("--user-agent is required"))?;
    let output_dir = args
        .get_one::<String>("output-dir")
        .map(|dir| expand_path(dir))
        .unwrap_or_else(|| PathBuf::from("."));
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Csv);
    let top = *args.get_one::<usize>("top").unwrap_or(&DEFAULT_TOP);
    let show_progress_bars = !quiet && !args.get_flag("no-progress");

    Ok(ScanSettings {
        client: ClientConfig::default()
            .with_api_url(api_url.as_str())
            .with_user_agent(user_agent.as_str())
            .with_timeout(Duration::from_secs(timeout)),
        collect: CollectOptions {
            query: text.clone(),
            areas,
            pages,
            per_page,
            experience: experience.clone(),
            pause: Duration::from_millis(pause),
            show_progress_bars,
        },
        keywords: args
            .get_one::<PathBuf>("keywords")
            .map(|p| expand_path(&p.to_string_lossy())),
        output_dir,
        format,
        top,
    })
}

pub fn print_banner() {
    println!(
        "{} {}",
        "stackscan".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    println!("{}", "what the job market is asking for".bright_black());
    println!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    let _ = io::stdout().flush();
    let mut response = String::new();
    if io::stdin().read_line(&mut response).is_err() {
        return String::new();
    }
    response.trim().to_lowercase()
}

pub fn handle_init(args: &ArgMatches) {
    let config_dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_DIR);
    let force = args.get_flag("force");
    let config_dir = expand_path(config_dir);
    let keywords_path = config_dir.join(KEYWORDS_FILE);

    println!(
        "{} Target: {}",
        "→".blue(),
        keywords_path.display().to_string().bright_white()
    );

    if keywords_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A keyword dictionary already exists and will be overwritten.");
        let response = print_prompt("Do you want to continue? [y/N]:");
        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return;
        }
    }

    match install_keywords(&config_dir) {
        Ok(path) => {
            let entries = KeywordDictionary::from_json(DEFAULT_KEYWORDS)
                .map(|d| d.len())
                .unwrap_or(0);
            println!(
                "{} Keyword dictionary installed: {} ({} tokens)",
                "✓".green().bold(),
                path.display().to_string().bright_white(),
                entries.to_string().cyan()
            );
            println!(
                "{} Edit it to add technologies; `stackscan scan` picks it up automatically.",
                "ℹ".blue()
            );
        }
        Err(e) => {
            eprintln!(
                "{} Failed to write {}: {}",
                "✗".red().bold(),
                keywords_path.display(),
                e
            );
            std::process::exit(1);
        }
    }
}

pub fn handle_keywords(args: &ArgMatches) {
    let installed = installed_keywords_path(DEFAULT_CONFIG_DIR);
    let explicit = args.get_one::<PathBuf>("keywords");
    let (dictionary, source) = match resolve_keywords(explicit, &installed) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let groups = dictionary.grouped();
    println!(
        "{} {} tokens, {} technologies ({})",
        "✓".green().bold(),
        dictionary.len().to_string().cyan(),
        groups.len().to_string().cyan(),
        source
    );
    println!();
    for (label, tokens) in groups {
        println!("  {:<24} {}", label.bright_white().bold(), tokens.join(", "));
    }
}

pub async fn handle_scan(args: &ArgMatches, quiet: bool) {
    let settings = match scan_settings(args, quiet) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_scan(settings, quiet).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_scan(settings: ScanSettings, quiet: bool) -> anyhow::Result<()> {
    let installed = installed_keywords_path(DEFAULT_CONFIG_DIR);
    let (dictionary, source) = resolve_keywords(settings.keywords.as_ref(), &installed)
        .context("Failed to load keyword dictionary")?;
    debug!(%source, tokens = dictionary.len(), "keyword dictionary loaded");
    let client =
        VacancyClient::new(settings.client.clone()).context("Failed to create HTTP client")?;

    if !quiet {
        print_divider();
        println!("Query:    {}", settings.collect.query.bright_white());
        println!("Areas:    {}", settings.collect.areas.join(", "));
        println!(
            "Pages:    {} x {} per page",
            settings.collect.pages, settings.collect.per_page
        );
        println!("Keywords: {} tokens ({})", dictionary.len(), source);
        print_divider();
        println!();
    }

    let progress_callback: Option<CollectProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            if msg.starts_with("fail:") {
                println!("{}", msg.yellow());
            } else {
                println!("{}", msg);
            }
        }))
    };

    let tally = execute_collect(
        &client,
        &dictionary,
        settings.collect.clone(),
        progress_callback,
    )
    .await;

    info!(
        rows = tally.rows().len(),
        failures = tally.failures().len(),
        "collection finished"
    );
    print_top(&tally, settings.top);

    let paths = write_reports(&tally, &settings.output_dir, settings.format).with_context(|| {
        format!(
            "Failed to write reports to {}",
            settings.output_dir.display()
        )
    })?;
    print_run_summary(&tally, &paths);
    Ok(())
}

fn print_top(tally: &StackTally, top: usize) {
    let rows = summary_rows(tally);
    println!();
    println!(
        "{}",
        format!("TOP {} technologies (by number of vacancies):", top)
            .bright_white()
            .bold()
    );
    print!("{}", generate_top_table(&rows, top));
}

fn print_run_summary(tally: &StackTally, paths: &ReportPaths) {
    println!();
    println!(
        "{} {} vacancies processed, {} failed, {} technologies",
        "✓".green().bold(),
        tally.rows().len().to_string().cyan(),
        tally.failures().len().to_string().yellow(),
        tally.counts().len().to_string().cyan()
    );
    if let Some(duration) = tally.duration() {
        println!("{} Took {}s", "→".blue(), duration.num_seconds());
    }
    println!(
        "{} Summary:  {}",
        "✓".green().bold(),
        paths.summary.display().to_string().bright_white()
    );
    println!(
        "{} Detailed: {}",
        "✓".green().bold(),
        paths.detailed.display().to_string().bright_white()
    );
}
