// src/dedup.rs
//! First-seen-wins deduplication by identity key.
//!
//! The key is the record's `Identity`: the provider's external id when present,
//! else the truncated normalized title (see `record::title_key`). Later
//! duplicates are dropped whole; fields are never merged. Records with a blank
//! fallback key are always kept.

use std::collections::HashSet;

use crate::record::{Identity, Record};

/// Returns (unique records in first-seen order, dropped count).
pub fn dedupe<F>(records: Vec<Record<F>>) -> (Vec<Record<F>>, usize) {
    let mut seen: HashSet<Identity> = HashSet::with_capacity(records.len());
    let mut keep = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for r in records {
        if r.identity.is_blank() || seen.insert(r.identity.clone()) {
            keep.push(r);
        } else {
            dropped += 1;
        }
    }
    (keep, dropped)
}
