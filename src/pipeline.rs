// src/pipeline.rs
//! One pipeline run: fetch → (classify) → dedupe → score → rank → bucket.
//!
//! Markets and papers run as two independent stages over their own sources.
//! Per-query fetch failures are absorbed by the scheduler; nothing in a run
//! fails after configuration has been accepted, except persistence
//! (`RunOutput::persist`).

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::analyze::{MarketScorer, PaperScorer};
use crate::classify::TopicClassifier;
use crate::config::PipelineConfig;
use crate::credentials::{Credentials, SCOPUS, SEMANTIC_SCHOLAR};
use crate::error::{ConfigError, PipelineError};
use crate::ingest::providers::{
    http_client, polymarket, scopus, semantic_scholar, PolymarketAdapter, ScopusAdapter,
    SemanticScholarAdapter,
};
use crate::ingest::scheduler::{FetchFailure, ProviderGate};
use crate::ingest::{ensure_metrics_described, FetchJob, FetchOutcome, FetchScheduler, RecordSource};
use crate::record::{MarketFields, PaperFields, Record};
use crate::report::{
    build_report, market_buckets, paper_buckets, write_outputs, OutputPaths, RawSnapshot, Report,
    ReportInput, RunReport,
};

/// Counts for one stage of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvent {
    pub stage: &'static str,
    pub category: &'static str,
    pub count_in: usize,
    pub count_out: usize,
    pub failures: usize,
}

/// Stage events in emission order. Each event is also logged on target `pipeline`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Telemetry {
    pub events: Vec<StageEvent>,
}

impl Telemetry {
    fn record(&mut self, ev: StageEvent) {
        info!(
            target: "pipeline",
            stage = ev.stage,
            category = ev.category,
            count_in = ev.count_in,
            count_out = ev.count_out,
            failures = ev.failures,
            "stage complete"
        );
        self.events.push(ev);
    }

    pub fn find(&self, stage: &str, category: &str) -> Option<&StageEvent> {
        self.events
            .iter()
            .find(|e| e.stage == stage && e.category == category)
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub raw: RawSnapshot,
    pub report: RunReport,
    pub telemetry: Telemetry,
}

impl RunOutput {
    /// Write the run artifacts into `dir` and record a `persist` event:
    /// raw records in, ranked records out.
    pub fn persist(&mut self, dir: &Path) -> Result<OutputPaths, PipelineError> {
        let count_in = self.raw.markets.len() + self.raw.papers.len();
        let count_out = self.report.markets.as_ref().map_or(0, |r| r.ranked.len())
            + self.report.papers.as_ref().map_or(0, |r| r.ranked.len());
        let res = write_outputs(dir, &self.raw, &self.report);
        self.telemetry.record(StageEvent {
            stage: "persist",
            category: "all",
            count_in,
            count_out: if res.is_ok() { count_out } else { 0 },
            failures: usize::from(res.is_err()),
        });
        res
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    scheduler: FetchScheduler,
    markets: Option<Arc<dyn RecordSource<MarketFields>>>,
    papers: Vec<Arc<dyn RecordSource<PaperFields>>>,
}

impl Pipeline {
    /// Bare pipeline without sources; see `with_market_source` / `with_paper_source`.
    pub fn new(config: PipelineConfig, scheduler: FetchScheduler) -> Self {
        Self {
            config,
            scheduler,
            markets: None,
            papers: Vec::new(),
        }
    }

    /// Wire the HTTP adapters and per-provider gates from config.
    ///
    /// Credentials are resolved only when the paper stage is enabled, and a
    /// missing key fails here, before any request is made.
    pub fn from_config(config: PipelineConfig, creds: &Credentials) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = http_client(&config.fetch)?;
        let policy = config.dedup.policy();
        let p = &config.providers;

        let scheduler = FetchScheduler::from_config(&config.fetch)
            .with_gate(polymarket::NAME, ProviderGate::from_config(&p.polymarket))
            .with_gate(
                semantic_scholar::NAME,
                ProviderGate::from_config(&p.semantic_scholar),
            )
            .with_gate(scopus::NAME, ProviderGate::from_config(&p.scopus));

        let mut papers: Vec<Arc<dyn RecordSource<PaperFields>>> = Vec::new();
        if config.papers.enabled {
            let ss_key = creds.require(SEMANTIC_SCHOLAR)?;
            let scopus_key = creds.require(SCOPUS)?;
            papers.push(Arc::new(
                SemanticScholarAdapter::new(
                    p.semantic_scholar.base_url.clone(),
                    client.clone(),
                    ss_key,
                    policy,
                )
                .with_abstract_chars(config.papers.abstract_chars),
            ));
            papers.push(Arc::new(
                ScopusAdapter::new(p.scopus.base_url.clone(), client.clone(), scopus_key, policy)
                    .with_abstract_chars(config.papers.abstract_chars),
            ));
        }

        let markets: Option<Arc<dyn RecordSource<MarketFields>>> = if config.markets.enabled {
            Some(Arc::new(
                PolymarketAdapter::new(p.polymarket.base_url.clone(), client, policy)
                    .with_description_chars(config.markets.description_chars),
            ))
        } else {
            None
        };

        Ok(Self {
            config,
            scheduler,
            markets,
            papers,
        })
    }

    pub fn with_market_source(mut self, source: Arc<dyn RecordSource<MarketFields>>) -> Self {
        self.markets = Some(source);
        self
    }

    /// Paper sources are queried in registration order for every query.
    pub fn with_paper_source(mut self, source: Arc<dyn RecordSource<PaperFields>>) -> Self {
        self.papers.push(source);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn limit_for(&self, source: &str) -> usize {
        self.config
            .providers
            .get(source)
            .map(|p| p.limit)
            .unwrap_or(usize::MAX)
    }

    pub async fn run(&self) -> RunOutput {
        ensure_metrics_described();
        let generated_at = Utc::now();
        let mut telemetry = Telemetry::default();
        let mut failures: Vec<FetchFailure> = Vec::new();

        let (raw_markets, markets) = match (&self.markets, self.config.markets.enabled) {
            (Some(src), true) => {
                let (raw, report) = self
                    .run_markets(src.clone(), generated_at, &mut telemetry, &mut failures)
                    .await;
                (raw, Some(report))
            }
            _ => (Vec::new(), None),
        };

        let (raw_papers, papers) = if self.config.papers.enabled && !self.papers.is_empty() {
            let (raw, report) = self
                .run_papers(generated_at, &mut telemetry, &mut failures)
                .await;
            (raw, Some(report))
        } else {
            (Vec::new(), None)
        };

        RunOutput {
            raw: RawSnapshot {
                fetched_at: generated_at,
                markets: raw_markets,
                papers: raw_papers,
                failures,
            },
            report: RunReport {
                generated_at,
                markets,
                papers,
            },
            telemetry,
        }
    }

    async fn run_markets(
        &self,
        src: Arc<dyn RecordSource<MarketFields>>,
        generated_at: DateTime<Utc>,
        telemetry: &mut Telemetry,
        failures: &mut Vec<FetchFailure>,
    ) -> (Vec<Record<MarketFields>>, Report<MarketFields>) {
        let cfg = &self.config;
        let limit = self.limit_for(src.name());
        let jobs = vec![FetchJob::new(src, cfg.markets.query.clone(), "all", limit)];
        let (fetched, failed) = self.fetch(jobs, "markets", telemetry, failures).await;

        let classifier = TopicClassifier::new(&cfg.markets.topics);
        let (classified, unclassified) = classifier.apply(fetched.clone());
        counter!("pipeline_unclassified_total").increment(unclassified as u64);
        telemetry.record(StageEvent {
            stage: "classify",
            category: "markets",
            count_in: fetched.len(),
            count_out: classified.len(),
            failures: 0,
        });

        let groups = classifier
            .topic_names()
            .map(|name| {
                let members = classified
                    .iter()
                    .filter(|r| r.fields.topics.iter().any(|t| t == name))
                    .cloned()
                    .collect();
                (name.to_string(), members)
            })
            .collect();

        let candidates = classified.len();
        let report = build_report(
            &MarketScorer::new(cfg.scoring.market.weights),
            &market_buckets(&cfg.scoring.market.thresholds),
            generated_at,
            ReportInput {
                fetched: fetched.clone(),
                unclassified,
                candidates: classified,
                groups,
                failed_queries: failed,
            },
        );
        self.record_ranking("markets", candidates, &report, telemetry);
        (fetched, report)
    }

    async fn run_papers(
        &self,
        generated_at: DateTime<Utc>,
        telemetry: &mut Telemetry,
        failures: &mut Vec<FetchFailure>,
    ) -> (Vec<Record<PaperFields>>, Report<PaperFields>) {
        let cfg = &self.config;

        // concept → query → source
        let mut jobs = Vec::new();
        for concept in &cfg.papers.concepts {
            for query in &concept.queries {
                for src in &self.papers {
                    let limit = self.limit_for(src.name());
                    jobs.push(FetchJob::new(
                        src.clone(),
                        query.clone(),
                        concept.name.clone(),
                        limit,
                    ));
                }
            }
        }
        let (fetched, failed) = self.fetch(jobs, "papers", telemetry, failures).await;

        let groups = cfg
            .papers
            .concepts
            .iter()
            .map(|c| {
                let members = fetched
                    .iter()
                    .filter(|r| r.provenance.concept == c.name)
                    .cloned()
                    .collect();
                (c.name.clone(), members)
            })
            .collect();

        let report = build_report(
            &PaperScorer::new(cfg.scoring.paper),
            &paper_buckets(&cfg.scoring.paper.thresholds),
            generated_at,
            ReportInput {
                fetched: fetched.clone(),
                unclassified: 0,
                candidates: fetched.clone(),
                groups,
                failed_queries: failed,
            },
        );
        self.record_ranking("papers", fetched.len(), &report, telemetry);
        (fetched, report)
    }

    /// Run jobs and merge records in job order. Returns (records, failed job count).
    async fn fetch<F: Send + 'static>(
        &self,
        jobs: Vec<FetchJob<F>>,
        category: &'static str,
        telemetry: &mut Telemetry,
        failures: &mut Vec<FetchFailure>,
    ) -> (Vec<Record<F>>, usize) {
        let job_count = jobs.len();
        let outcomes: Vec<FetchOutcome<F>> = self.scheduler.run(jobs).await;

        let mut failed = 0usize;
        let mut records = Vec::new();
        for outcome in outcomes {
            if let Some(f) = outcome.failure() {
                failed += 1;
                failures.push(f);
            }
            records.extend(outcome.records);
        }
        telemetry.record(StageEvent {
            stage: "fetch",
            category,
            count_in: job_count,
            count_out: records.len(),
            failures: failed,
        });
        (records, failed)
    }

    fn record_ranking<F>(
        &self,
        category: &'static str,
        candidates: usize,
        report: &Report<F>,
        telemetry: &mut Telemetry,
    ) {
        let s = &report.summary;
        counter!("pipeline_dedup_dropped_total").increment(s.duplicates as u64);
        telemetry.record(StageEvent {
            stage: "dedupe",
            category,
            count_in: candidates,
            count_out: s.unique,
            failures: 0,
        });
        telemetry.record(StageEvent {
            stage: "score",
            category,
            count_in: s.unique,
            count_out: s.ranked,
            failures: 0,
        });
        telemetry.record(StageEvent {
            stage: "bucket",
            category,
            count_in: s.ranked,
            count_out: report.buckets.iter().map(|b| b.records.len()).sum(),
            failures: 0,
        });
        for b in &report.buckets {
            info!(
                target: "pipeline",
                category,
                bucket = %b.name,
                count = b.records.len(),
                "bucket"
            );
        }
    }
}
