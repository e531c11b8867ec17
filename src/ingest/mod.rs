// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

pub use scheduler::{FetchJob, FetchOutcome, FetchScheduler};
pub use types::{RecordSource, SourceAdapter};

/// One-time metrics registration (so series show up in any installed recorder).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "pipeline_records_fetched_total",
            "Records normalized from provider responses."
        );
        describe_counter!(
            "pipeline_query_failures_total",
            "Provider queries that failed and contributed zero records."
        );
        describe_counter!(
            "pipeline_dedup_dropped_total",
            "Records dropped as duplicates of an earlier identity."
        );
        describe_counter!(
            "pipeline_unclassified_total",
            "Markets dropped because no topic keyword matched."
        );
        describe_histogram!("pipeline_fetch_ms", "Provider fetch time in milliseconds.");
    });
}

/// Normalize provider text: decode entities, strip tags, fold typographic quotes,
/// collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (abstracts sometimes carry <jats:p> etc.)
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Keep at most `max` chars (char-boundary safe, no marker).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
