// src/report/mod.rs
//! Ranking, bucketing and the report model.
//!
//! Everything here consumes scored records by value or shared reference and
//! never mutates a record once it has been scored.

pub mod markdown;
pub mod persist;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analyze::market::{MSS, RDS, UI, VPDI};
use crate::analyze::scoring::{score_all, ScoredRecord, Scorer};
use crate::analyze::weights::{MarketThresholds, PaperThresholds};
use crate::dedup::dedupe;
use crate::ingest::scheduler::FetchFailure;
use crate::record::{MarketFields, PaperFields, Record};

pub use markdown::render_markdown;
pub use persist::{write_outputs, OutputPaths};

/// Sort by composite, descending. Stable: equal scores keep input order.
pub fn rank<F>(mut records: Vec<ScoredRecord<F>>) -> Vec<ScoredRecord<F>> {
    records.sort_by(|a, b| b.composite.total_cmp(&a.composite));
    records
}

type Predicate<F> = Box<dyn Fn(&ScoredRecord<F>) -> bool + Send + Sync>;

/// Named boolean filter over one scored record.
pub struct BucketRule<F> {
    pub name: &'static str,
    pub title: &'static str,
    predicate: Predicate<F>,
}

impl<F> BucketRule<F> {
    pub fn new(
        name: &'static str,
        title: &'static str,
        predicate: impl Fn(&ScoredRecord<F>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            title,
            predicate: Box::new(predicate),
        }
    }

    pub fn matches(&self, record: &ScoredRecord<F>) -> bool {
        (self.predicate)(record)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bucket<F> {
    pub name: String,
    pub title: String,
    pub records: Vec<ScoredRecord<F>>,
}

/// Apply every rule independently; a record may land in several buckets.
/// Bucket members keep the order of `ranked`.
pub fn bucket<F: Clone>(ranked: &[ScoredRecord<F>], rules: &[BucketRule<F>]) -> Vec<Bucket<F>> {
    rules
        .iter()
        .map(|rule| Bucket {
            name: rule.name.to_string(),
            title: rule.title.to_string(),
            records: ranked.iter().filter(|r| rule.matches(r)).cloned().collect(),
        })
        .collect()
}

pub fn market_buckets(t: &MarketThresholds) -> Vec<BucketRule<MarketFields>> {
    let t = *t;
    vec![
        BucketRule::new("rapid_shifts", "Rapid shifts", move |r: &ScoredRecord<MarketFields>| {
            r.signal(RDS) > t.rapid_shift_rds
        }),
        BucketRule::new("contested", "Contested markets", move |r: &ScoredRecord<MarketFields>| {
            r.signal(VPDI) > t.contested_vpdi && r.signal(MSS) > t.significant_mss
        }),
        BucketRule::new("high_uncertainty", "High uncertainty", move |r: &ScoredRecord<MarketFields>| {
            r.signal(UI) > t.uncertain_ui && r.signal(MSS) > t.significant_mss
        }),
    ]
}

pub fn paper_buckets(t: &PaperThresholds) -> Vec<BucketRule<PaperFields>> {
    let t = *t;
    let cited = move |f: &PaperFields| f.citations >= t.high_citation;
    let recent = move |f: &PaperFields| f.year.is_some_and(|y| y >= t.recent_year);
    vec![
        BucketRule::new("high_citation", "High citation", move |r: &ScoredRecord<PaperFields>| {
            cited(&r.record.fields)
        }),
        BucketRule::new("recent", "Recent", move |r: &ScoredRecord<PaperFields>| {
            recent(&r.record.fields)
        }),
        BucketRule::new("high_impact", "High impact (cited or recent)", move |r: &ScoredRecord<PaperFields>| {
            cited(&r.record.fields) || recent(&r.record.fields)
        }),
    ]
}

/// Records fetched under one concept (or tagged with one topic), ranked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group<F> {
    pub name: String,
    pub records: Vec<ScoredRecord<F>>,
}

/// Dedupe within the group, score, rank.
pub fn group<S: Scorer>(scorer: &S, name: &str, records: Vec<Record<S::Fields>>) -> Group<S::Fields> {
    let (unique, _) = dedupe(records);
    Group {
        name: name.to_string(),
        records: rank(score_all(scorer, unique)),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Records normalized from provider responses, before any filtering.
    pub fetched: usize,
    /// Markets dropped because no topic matched (always 0 for papers).
    pub unclassified: usize,
    pub duplicates: usize,
    pub unique: usize,
    pub ranked: usize,
    /// Ranked (post-dedup) records per provider.
    pub by_source: BTreeMap<String, usize>,
    pub bucket_counts: BTreeMap<String, usize>,
    pub failed_queries: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report<F> {
    pub category: String,
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub ranked: Vec<ScoredRecord<F>>,
    pub buckets: Vec<Bucket<F>>,
    pub groups: Vec<Group<F>>,
}

/// What one category stage hands to `build_report`.
#[derive(Debug)]
pub struct ReportInput<F> {
    /// All normalized records in merge order (before classification and dedup).
    pub fetched: Vec<Record<F>>,
    pub unclassified: usize,
    /// Records entering dedup, in merge order.
    pub candidates: Vec<Record<F>>,
    /// (group name, members before dedup) in config order.
    pub groups: Vec<(String, Vec<Record<F>>)>,
    pub failed_queries: usize,
}

pub fn build_report<S>(
    scorer: &S,
    rules: &[BucketRule<S::Fields>],
    generated_at: DateTime<Utc>,
    input: ReportInput<S::Fields>,
) -> Report<S::Fields>
where
    S: Scorer,
    S::Fields: Clone,
{
    let (unique, duplicates) = dedupe(input.candidates);
    let ranked = rank(score_all(scorer, unique));
    let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
    for r in &ranked {
        *by_source.entry(r.record.provenance.source.clone()).or_default() += 1;
    }
    let buckets = bucket(&ranked, rules);
    let groups = input
        .groups
        .into_iter()
        .map(|(name, members)| group(scorer, &name, members))
        .collect();

    let summary = Summary {
        fetched: input.fetched.len(),
        unclassified: input.unclassified,
        duplicates,
        unique: ranked.len(),
        ranked: ranked.len(),
        by_source,
        bucket_counts: buckets
            .iter()
            .map(|b| (b.name.clone(), b.records.len()))
            .collect(),
        failed_queries: input.failed_queries,
    };

    Report {
        category: scorer.category().to_string(),
        generated_at,
        summary,
        ranked,
        buckets,
        groups,
    }
}

/// Contents of `signal_report.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub markets: Option<Report<MarketFields>>,
    pub papers: Option<Report<PaperFields>>,
}

/// Contents of `raw_data.json`: every normalized record in merge order, pre-dedup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub markets: Vec<Record<MarketFields>>,
    pub papers: Vec<Record<PaperFields>>,
    pub failures: Vec<FetchFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::scoring::Signal;
    use crate::record::{Identity, Provenance};

    fn scored(label: &str, composite: f64) -> ScoredRecord<()> {
        ScoredRecord {
            record: Record {
                identity: Identity::External(label.into()),
                label: label.into(),
                fields: (),
                provenance: Provenance {
                    source: "t".into(),
                    concept: "c".into(),
                    query: "q".into(),
                },
            },
            signals: vec![Signal::new("X", composite)],
            composite,
        }
    }

    #[test]
    fn rank_is_stable_and_descending() {
        let input = vec![
            scored("A", 0.2),
            scored("B", 0.9),
            scored("C", 0.9),
            scored("D", 0.1),
        ];
        let labels: Vec<_> = rank(input).into_iter().map(|r| r.record.label).collect();
        assert_eq!(labels, vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn records_may_land_in_several_buckets() {
        let ranked = vec![scored("A", 0.8), scored("B", 0.4)];
        let rules = vec![
            BucketRule::new("hot", "Hot", |r: &ScoredRecord<()>| r.signal("X") > 0.5),
            BucketRule::new("any", "Any", |_: &ScoredRecord<()>| true),
        ];
        let out = bucket(&ranked, &rules);
        assert_eq!(out[0].records.len(), 1);
        assert_eq!(out[1].records.len(), 2);
        assert_eq!(out[1].records[0].record.label, "A");
    }

    #[test]
    fn paper_buckets_use_thresholds() {
        let rules = paper_buckets(&PaperThresholds::default());
        let mut r = ScoredRecord {
            record: Record {
                identity: Identity::External("10.1/x".into()),
                label: "x".into(),
                fields: PaperFields {
                    citations: 50,
                    year: Some(2019),
                    ..PaperFields::default()
                },
                provenance: Provenance {
                    source: "t".into(),
                    concept: "c".into(),
                    query: "q".into(),
                },
            },
            signals: vec![],
            composite: 0.0,
        };
        let hits: Vec<_> = rules.iter().map(|b| b.matches(&r)).collect();
        assert_eq!(hits, vec![true, false, true]);
        r.record.fields.citations = 3;
        r.record.fields.year = Some(2023);
        let hits: Vec<_> = rules.iter().map(|b| b.matches(&r)).collect();
        assert_eq!(hits, vec![false, true, true]);
    }
}
