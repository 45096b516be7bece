use crate::keywords::KeywordDictionary;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use stackscan_fetcher::{SearchQuery, VacancyClient, VacancySummary};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_QUERY: &str = "программист";
pub const DEFAULT_AREA: &str = "72";
pub const DEFAULT_PAGES: u32 = 7;
pub const DEFAULT_PER_PAGE: u32 = 50;
pub const DEFAULT_EXPERIENCE: &str = "noExperience";
pub const DEFAULT_PAUSE_MS: u64 = 500;

/// Options for configuring a collect run
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub query: String,
    pub areas: Vec<String>,
    pub pages: u32,
    pub per_page: u32,
    pub experience: String,
    /// Fixed sleep after every processed vacancy
    pub pause: Duration,
    pub show_progress_bars: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            areas: vec![DEFAULT_AREA.to_string()],
            pages: DEFAULT_PAGES,
            per_page: DEFAULT_PER_PAGE,
            experience: DEFAULT_EXPERIENCE.to_string(),
            pause: Duration::from_millis(DEFAULT_PAUSE_MS),
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting collect progress
pub type CollectProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// One processed vacancy.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyRow {
    pub vacancy: String,
    pub city: String,
    pub url: String,
    pub stacks: BTreeSet<String>,
}

impl VacancyRow {
    pub fn stacks_joined(&self) -> String {
        self.stacks
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectFailure {
    Vacancy { id: String, error: String },
    Page { area: String, page: u32, error: String },
}

impl std::fmt::Display for CollectFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectFailure::Vacancy { id, error } => write!(f, "fail: {} {}", id, error),
            CollectFailure::Page { area, page, error } => {
                write!(f, "fail: area={} page={} {}", area, page, error)
            }
        }
    }
}

/// Everything a run accumulates: per-label vacancy counts, detailed rows and failures.
#[derive(Debug, Clone)]
pub struct StackTally {
    counts: BTreeMap<String, usize>,
    rows: Vec<VacancyRow>,
    failures: Vec<CollectFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for StackTally {
    fn default() -> Self {
        Self::new()
    }
}

impl StackTally {
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
            rows: Vec::new(),
            failures: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record a processed vacancy. Each label counts once per vacancy,
    /// whatever its number of matching tokens.
    pub fn record<I, S>(&mut self, summary: &VacancySummary, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stacks: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        for stack in &stacks {
            *self.counts.entry(stack.clone()).or_insert(0) += 1;
        }
        self.rows.push(VacancyRow {
            vacancy: summary.name.clone(),
            city: summary.area.name.clone(),
            url: summary.alternate_url.clone(),
            stacks,
        });
    }

    pub fn record_failure(&mut self, failure: CollectFailure) {
        self.failures.push(failure);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn rows(&self) -> &[VacancyRow] {
        &self.rows
    }

    pub fn failures(&self) -> &[CollectFailure] {
        &self.failures
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

/// Walk every (area, page), fetch each vacancy's text, match keywords and tally.
///
/// Never fails as a whole: a failing page or vacancy is logged, recorded in the
/// tally and skipped.
pub async fn execute_collect(
    client: &VacancyClient,
    dictionary: &KeywordDictionary,
    options: CollectOptions,
    progress_callback: Option<CollectProgressCallback>,
) -> StackTally {
    let CollectOptions {
        query,
        areas,
        pages,
        per_page,
        experience,
        pause,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting collection...");
        Some(pb)
    } else {
        None
    };

    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            match progress_bar {
                Some(ref pb) => pb.suspend(|| callback(msg)),
                None => callback(msg),
            }
        }
    };

    let mut tally = StackTally::new();
    info!(
        "Collecting '{}' in {} area(s), {} page(s) of {}",
        query,
        areas.len(),
        pages,
        per_page
    );

    for area in &areas {
        for page in 0..pages {
            report(format!("[area={}] fetch page {}", area, page));

            let search = SearchQuery {
                text: query.clone(),
                area: area.clone(),
                page,
                per_page,
                experience: experience.clone(),
            };

            let listing = match client.fetch_page(&search).await {
                Ok(listing) => listing,
                Err(e) => {
                    debug!("Page {} of area {} failed: {}", page, area, e);
                    let failure = CollectFailure::Page {
                        area: area.clone(),
                        page,
                        error: e.to_string(),
                    };
                    report(failure.to_string());
                    tally.record_failure(failure);
                    continue;
                }
            };

            for item in &listing.items {
                match process_vacancy(client, dictionary, item).await {
                    Ok((summary, labels)) => {
                        tally.record(&summary, labels);
                        if let Some(ref pb) = progress_bar {
                            pb.set_message(format!(
                                "{} vacancies processed, {} failed",
                                tally.rows().len(),
                                tally.failures().len()
                            ));
                        }
                        tokio::time::sleep(pause).await;
                    }
                    Err(e) => {
                        let id = VacancySummary::item_id(item);
                        debug!("Vacancy {} failed: {}", id, e);
                        let failure = CollectFailure::Vacancy {
                            id,
                            error: e.to_string(),
                        };
                        report(failure.to_string());
                        tally.record_failure(failure);
                    }
                }
            }

            if !listing.has_more_after(page) {
                info!("Area {} exhausted after page {}", area, page);
                break;
            }
        }
    }

    tally.finish();
    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Collection complete! {} vacancies processed",
            tally.rows().len()
        ));
    }
    info!(
        "Collected {} vacancies, {} failures, {} distinct stacks",
        tally.rows().len(),
        tally.failures().len(),
        tally.counts().len()
    );

    tally
}

async fn process_vacancy(
    client: &VacancyClient,
    dictionary: &KeywordDictionary,
    item: &serde_json::Value,
) -> stackscan_fetcher::error::Result<(VacancySummary, Vec<String>)> {
    let summary = VacancySummary::from_item(item)?;
    let url = client.detail_url(&summary.id)?;
    let text = client.fetch_description(&url).await?;
    let hits = dictionary.match_text(&text);
    Ok((summary, hits.into_keys().collect()))
}
