// src/report/markdown.rs
//! Narrative rendering of a `RunReport` as markdown.
//!
//! Layout per category: summary counts, a top-N table, top-N lists per bucket
//! and per group. Papers additionally get a BibTeX block.

use std::collections::HashMap;
use std::fmt::{self, Write};

use super::{Bucket, Report, RunReport};
use crate::analyze::market;
use crate::analyze::scoring::ScoredRecord;
use crate::record::{MarketFields, PaperFields};

pub const LABEL_MAX_CHARS: usize = 60;
pub const AUTHORS_MAX_CHARS: usize = 30;
pub const VENUE_MAX_CHARS: usize = 25;
/// Author names listed before "et al.".
pub const AUTHORS_MAX_COUNT: usize = 3;

pub const TOP_MARKETS: usize = 20;
pub const TOP_PAPERS: usize = 30;
pub const TOP_PER_LIST: usize = 10;
pub const BIBTEX_ENTRIES: usize = 20;

const ELLIPSIS: &str = "...";

/// Cut to `max` chars: `max - 3` chars of text plus "...". Shorter input is
/// returned unchanged.
pub fn truncate_label(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Make text safe for a table cell: escape pipes, flatten newlines.
pub fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn cell(s: &str, max: usize) -> String {
    escape_cell(&truncate_label(s, max))
}

/// "A, B, C et al." for more than `AUTHORS_MAX_COUNT` names.
pub fn format_authors(authors: &[String]) -> String {
    if authors.is_empty() {
        return "Unknown".to_string();
    }
    let shown = authors
        .iter()
        .take(AUTHORS_MAX_COUNT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > AUTHORS_MAX_COUNT {
        format!("{shown} et al.")
    } else {
        shown
    }
}

fn title_case_name(name: &str) -> String {
    name.replace('_', " ").to_uppercase()
}

fn year_or_unknown(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "?".into())
}

pub fn render_markdown(run: &RunReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_run(&mut out, run);
    out
}

fn write_run(out: &mut String, run: &RunReport) -> fmt::Result {
    writeln!(out, "# Signal Report")?;
    writeln!(out, "*Generated: {}*", run.generated_at.to_rfc3339())?;
    writeln!(out)?;
    if let Some(m) = &run.markets {
        write_markets(out, m)?;
    }
    if let Some(p) = &run.papers {
        write_papers(out, p)?;
    }
    if run.markets.is_none() && run.papers.is_none() {
        writeln!(out, "*No categories were enabled for this run.*")?;
    }
    Ok(())
}

fn write_summary<F>(out: &mut String, report: &Report<F>) -> fmt::Result {
    let s = &report.summary;
    writeln!(out, "### Summary")?;
    writeln!(out, "- **Fetched:** {}", s.fetched)?;
    if s.unclassified > 0 {
        writeln!(out, "- **Unclassified (dropped):** {}", s.unclassified)?;
    }
    writeln!(out, "- **Duplicates dropped:** {}", s.duplicates)?;
    writeln!(out, "- **Ranked:** {}", s.ranked)?;
    for (source, n) in &s.by_source {
        writeln!(out, "  - {source}: {n}")?;
    }
    for (bucket, n) in &s.bucket_counts {
        writeln!(out, "- **{}:** {n}", title_case_name(bucket))?;
    }
    if s.failed_queries > 0 {
        writeln!(out, "- **Failed queries:** {}", s.failed_queries)?;
    }
    writeln!(out)
}

fn write_markets(out: &mut String, report: &Report<MarketFields>) -> fmt::Result {
    writeln!(out, "## Markets")?;
    writeln!(out)?;
    write_summary(out, report)?;

    writeln!(out, "### Top {TOP_MARKETS} markets by signal strength")?;
    writeln!(out)?;
    write!(out, "| # | Score |")?;
    for name in market::SIGNALS {
        write!(out, " {name} |")?;
    }
    writeln!(out, " Market |")?;
    write!(out, "|---|-------|")?;
    for _ in market::SIGNALS {
        write!(out, "------|")?;
    }
    writeln!(out, "--------|")?;
    for (i, r) in report.ranked.iter().take(TOP_MARKETS).enumerate() {
        write!(out, "| {} | {:.2} |", i + 1, r.composite)?;
        for name in market::SIGNALS {
            write!(out, " {:.2} |", r.signal(name))?;
        }
        writeln!(out, " {} |", cell(&r.record.label, LABEL_MAX_CHARS))?;
    }
    writeln!(out)?;

    for b in &report.buckets {
        write_market_bucket(out, b)?;
    }

    if !report.groups.is_empty() {
        writeln!(out, "### Markets by topic")?;
        writeln!(out)?;
        for g in &report.groups {
            writeln!(out, "#### {}", title_case_name(&g.name))?;
            writeln!(out)?;
            if g.records.is_empty() {
                writeln!(out, "*No markets matched*")?;
                writeln!(out)?;
                continue;
            }
            for (i, r) in g.records.iter().take(TOP_PER_LIST).enumerate() {
                writeln!(
                    out,
                    "{}. **{}** ({:.2})",
                    i + 1,
                    truncate_label(&r.record.label, LABEL_MAX_CHARS),
                    r.composite
                )?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn market_tag(r: &ScoredRecord<MarketFields>, bucket: &str) -> String {
    let f = &r.record.fields;
    let pct = |x: Option<f64>, digits: usize| match x {
        Some(v) if v != 0.0 => format!("{:.*}%", digits, v * 100.0),
        _ => "?".to_string(),
    };
    if bucket == "rapid_shifts" {
        pct(f.one_day_price_change, 1)
    } else {
        pct(f.mid_price, 0)
    }
}

fn write_market_bucket(out: &mut String, b: &Bucket<MarketFields>) -> fmt::Result {
    writeln!(out, "### {} ({})", b.title, b.records.len())?;
    writeln!(out)?;
    for r in b.records.iter().take(TOP_PER_LIST) {
        writeln!(
            out,
            "- [{}] {}",
            market_tag(r, &b.name),
            truncate_label(&r.record.label, LABEL_MAX_CHARS)
        )?;
    }
    writeln!(out)
}

fn write_papers(out: &mut String, report: &Report<PaperFields>) -> fmt::Result {
    writeln!(out, "## Papers")?;
    writeln!(out)?;
    write_summary(out, report)?;

    writeln!(out, "### Top {TOP_PAPERS} papers")?;
    writeln!(out)?;
    writeln!(out, "| # | Score | Title | Authors | Year | Citations | Venue |")?;
    writeln!(out, "|---|-------|-------|---------|------|-----------|-------|")?;
    for (i, r) in report.ranked.iter().take(TOP_PAPERS).enumerate() {
        let f = &r.record.fields;
        writeln!(
            out,
            "| {} | {:.2} | {} | {} | {} | {} | {} |",
            i + 1,
            r.composite,
            cell(&r.record.label, LABEL_MAX_CHARS),
            cell(&format_authors(&f.authors), AUTHORS_MAX_CHARS),
            year_or_unknown(f.year),
            f.citations,
            cell(f.venue.as_deref().unwrap_or(""), VENUE_MAX_CHARS),
        )?;
    }
    writeln!(out)?;

    for b in &report.buckets {
        writeln!(out, "### {} ({})", b.title, b.records.len())?;
        writeln!(out)?;
        for r in b.records.iter().take(TOP_PER_LIST) {
            writeln!(
                out,
                "- {} ({}, {} citations)",
                truncate_label(&r.record.label, LABEL_MAX_CHARS),
                year_or_unknown(r.record.fields.year),
                r.record.fields.citations
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "### Papers by concept")?;
    writeln!(out)?;
    for g in &report.groups {
        writeln!(out, "#### {}", title_case_name(&g.name))?;
        writeln!(out)?;
        if g.records.is_empty() {
            writeln!(out, "*No papers found*")?;
            writeln!(out)?;
            continue;
        }
        for (i, r) in g.records.iter().take(TOP_PER_LIST).enumerate() {
            let f = &r.record.fields;
            writeln!(out, "{}. **{}** ({})", i + 1, r.record.label, year_or_unknown(f.year))?;
            writeln!(out, "   - Authors: {}", format_authors(&f.authors))?;
            writeln!(
                out,
                "   - Citations: {} | Venue: {}",
                f.citations,
                f.venue.as_deref().unwrap_or("Unknown")
            )?;
            if let Some(doi) = &f.doi {
                writeln!(out, "   - DOI: {doi}")?;
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "### BibTeX export (top {BIBTEX_ENTRIES})")?;
    writeln!(out)?;
    writeln!(out, "```bibtex")?;
    out.push_str(&bibtex(&report.ranked[..report.ranked.len().min(BIBTEX_ENTRIES)]));
    writeln!(out, "```")
}

fn bib_value(s: &str) -> String {
    s.replace(['{', '}'], "")
}

/// `@article` entries keyed by first-author surname letters plus year.
/// Repeated keys get an `a`, `b`, ... suffix.
pub fn bibtex(papers: &[ScoredRecord<PaperFields>]) -> String {
    let mut out = String::new();
    let mut used: HashMap<String, usize> = HashMap::new();
    for r in papers {
        let f = &r.record.fields;
        let surname: String = f
            .authors
            .first()
            .and_then(|a| a.split_whitespace().last())
            .unwrap_or("")
            .chars()
            .filter(char::is_ascii_alphabetic)
            .collect();
        let surname = if surname.is_empty() {
            "Unknown".to_string()
        } else {
            surname
        };
        let base = format!(
            "{surname}{}",
            f.year.map(|y| y.to_string()).unwrap_or_else(|| "nd".into())
        );
        let n = used.entry(base.clone()).or_insert(0);
        let key = if *n == 0 {
            base.clone()
        } else {
            // 1 -> 'a', 2 -> 'b', ...
            let suffix = char::from(b'a' + ((*n - 1) % 26) as u8);
            format!("{base}{suffix}")
        };
        *n += 1;

        let _ = writeln!(
            out,
            "@article{{{key},\n  title = {{{}}},\n  author = {{{}}},\n  year = {{{}}},\n  journal = {{{}}},\n  doi = {{{}}}\n}}\n",
            bib_value(&r.record.label),
            bib_value(&f.authors.join(" and ")),
            f.year.map(|y| y.to_string()).unwrap_or_else(|| "n.d.".into()),
            bib_value(f.venue.as_deref().unwrap_or("")),
            bib_value(f.doi.as_deref().unwrap_or("N/A")),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Identity, Provenance, Record};

    fn paper(title: &str, authors: &[&str], year: Option<i32>) -> ScoredRecord<PaperFields> {
        ScoredRecord {
            record: Record {
                identity: Identity::Fallback(title.to_lowercase()),
                label: title.into(),
                fields: PaperFields {
                    authors: authors.iter().map(|a| a.to_string()).collect(),
                    year,
                    ..PaperFields::default()
                },
                provenance: Provenance {
                    source: "t".into(),
                    concept: "c".into(),
                    query: "q".into(),
                },
            },
            signals: vec![],
            composite: 0.5,
        }
    }

    #[test]
    fn long_label_truncates_to_exact_width() {
        let label = "x".repeat(200);
        let t = truncate_label(&label, LABEL_MAX_CHARS);
        assert_eq!(t.chars().count(), 60);
        assert!(t.ends_with("..."));
        assert_eq!(&t[..57], &label[..57]);
        assert_eq!(truncate_label("short", LABEL_MAX_CHARS), "short");
        assert_eq!(truncate_label(&"y".repeat(60), LABEL_MAX_CHARS).len(), 60);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let t = truncate_label(&"é".repeat(40), 25);
        assert_eq!(t.chars().count(), 25);
    }

    #[test]
    fn cells_escape_pipes() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
    }

    #[test]
    fn authors_collapse_to_et_al() {
        let a: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_authors(&a), "A, B, C et al.");
        assert_eq!(format_authors(&a[..2]), "A, B");
        assert_eq!(format_authors(&[]), "Unknown");
    }

    #[test]
    fn bibtex_keys_are_unique() {
        let out = bibtex(&[
            paper("One", &["Jane Smith"], Some(2020)),
            paper("Two", &["John Smith"], Some(2020)),
            paper("Three", &[], None),
        ]);
        assert!(out.contains("@article{Smith2020,"));
        assert!(out.contains("@article{Smith2020a,"));
        assert!(out.contains("@article{Unknownnd,"));
        assert!(out.contains("year = {n.d.}"));
    }
}
