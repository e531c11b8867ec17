// src/ingest/scheduler.rs
//! Bounded-concurrency fetch scheduler.
//!
//! Every job is spawned up front. Each provider has its own gate (concurrency
//! cap + start-time pacer) and a global semaphore caps requests in flight.
//! The provider permit is taken first, so jobs queued behind a busy provider
//! never hold global slots.
//! Outcomes are collected by awaiting the join handles in job order, so the
//! merged record order is fixed by the job list and never by completion order.

use metrics::{counter, histogram};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

use crate::config::{FetchConfig, ProviderConfig};
use crate::error::FetchError;
use crate::ingest::types::RecordSource;
use crate::record::Record;

/// Minimum spacing between successive request starts for one provider.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Mutex::new(None),
        }
    }

    /// Wait for the next free slot. Waiters are served in lock order.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut next = self.next.lock().await;
        if let Some(at) = *next {
            tokio::time::sleep_until(at).await;
        }
        *next = Some(Instant::now() + self.interval);
    }
}

#[derive(Debug)]
pub struct ProviderGate {
    permits: Semaphore,
    pacer: Pacer,
}

impl ProviderGate {
    pub fn new(max_concurrent: usize, pacing: Duration) -> Self {
        Self {
            permits: Semaphore::new(max_concurrent.max(1)),
            pacer: Pacer::new(pacing),
        }
    }

    pub fn from_config(cfg: &ProviderConfig) -> Self {
        Self::new(cfg.max_concurrent, Duration::from_millis(cfg.pacing_ms))
    }
}

/// One query against one source, under one concept.
pub struct FetchJob<F> {
    pub source: Arc<dyn RecordSource<F>>,
    pub query: String,
    pub concept: String,
    pub limit: usize,
}

impl<F> FetchJob<F> {
    pub fn new(
        source: Arc<dyn RecordSource<F>>,
        query: impl Into<String>,
        concept: impl Into<String>,
        limit: usize,
    ) -> Self {
        Self {
            source,
            query: query.into(),
            concept: concept.into(),
            limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FetchFailure {
    pub source: String,
    pub concept: String,
    pub query: String,
    pub error: String,
}

/// Result of one job. Failed jobs carry zero records and the error text.
#[derive(Debug)]
pub struct FetchOutcome<F> {
    pub source: &'static str,
    pub concept: String,
    pub query: String,
    pub records: Vec<Record<F>>,
    pub error: Option<String>,
}

impl<F> FetchOutcome<F> {
    pub fn failure(&self) -> Option<FetchFailure> {
        self.error.as_ref().map(|e| FetchFailure {
            source: self.source.to_string(),
            concept: self.concept.clone(),
            query: self.query.clone(),
            error: e.clone(),
        })
    }
}

pub struct FetchScheduler {
    in_flight: Arc<Semaphore>,
    timeout: Duration,
    gates: HashMap<&'static str, Arc<ProviderGate>>,
}

impl FetchScheduler {
    pub fn new(max_in_flight: usize, timeout: Duration) -> Self {
        Self {
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
            timeout,
            gates: HashMap::new(),
        }
    }

    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self::new(cfg.max_in_flight, Duration::from_secs(cfg.timeout_secs))
    }

    /// Register a gate for a provider name. Ungated providers only share the global cap.
    pub fn with_gate(mut self, provider: &'static str, gate: ProviderGate) -> Self {
        self.gates.insert(provider, Arc::new(gate));
        self
    }

    /// Run all jobs; the returned outcomes are in job order.
    pub async fn run<F: Send + 'static>(&self, jobs: Vec<FetchJob<F>>) -> Vec<FetchOutcome<F>> {
        super::ensure_metrics_described();

        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let source_name = job.source.name();
            let concept = job.concept.clone();
            let query = job.query.clone();
            let in_flight = self.in_flight.clone();
            let gate = self.gates.get(source_name).cloned();
            let timeout = self.timeout;

            let handle = tokio::spawn(async move {
                let _provider = match &gate {
                    Some(g) => Some(g.permits.acquire().await),
                    None => None,
                };
                let _global = in_flight.acquire_owned().await;
                if let Some(g) = &gate {
                    g.pacer.wait().await;
                }

                let t0 = std::time::Instant::now();
                let res = tokio::time::timeout(
                    timeout,
                    job.source.collect(&job.query, job.limit, &job.concept),
                )
                .await;
                histogram!("pipeline_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

                match res {
                    Ok(r) => r,
                    Err(_) => Err(FetchError::Timeout {
                        ms: timeout.as_millis() as u64,
                    }),
                }
            });
            handles.push((source_name, concept, query, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (source, concept, query, handle) in handles {
            let res = match handle.await {
                Ok(r) => r,
                Err(e) => Err(FetchError::Task(e.to_string())),
            };
            let outcome = match res {
                Ok(records) => {
                    counter!("pipeline_records_fetched_total").increment(records.len() as u64);
                    tracing::debug!(
                        target: "pipeline",
                        provider = source,
                        %concept,
                        %query,
                        records = records.len(),
                        "query ok"
                    );
                    FetchOutcome {
                        source,
                        concept,
                        query,
                        records,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        target: "pipeline",
                        provider = source,
                        %concept,
                        %query,
                        error = %e,
                        "query failed; continuing with zero results"
                    );
                    counter!("pipeline_query_failures_total").increment(1);
                    FetchOutcome {
                        source,
                        concept,
                        query,
                        records: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}
