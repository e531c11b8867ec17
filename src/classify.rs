//! # Topic Classification
//!
//! Assigns markets to configured topics by case-insensitive keyword
//! substring match over question + description. A market may match several
//! topics; the first matching topic (config order) becomes its primary concept.

use crate::config::KeywordGroup;
use crate::record::{MarketFields, Record};

/// Lowercased keyword lists, built once per run.
#[derive(Debug, Clone)]
pub struct TopicClassifier {
    topics: Vec<(String, Vec<String>)>,
}

impl TopicClassifier {
    pub fn new(groups: &[KeywordGroup]) -> Self {
        let topics = groups
            .iter()
            .map(|g| {
                let kws = g
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (g.name.clone(), kws)
            })
            .collect();
        Self { topics }
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|(n, _)| n.as_str())
    }

    /// All topics whose keyword list hits `text`, in config order.
    pub fn classify(&self, text: &str) -> Vec<String> {
        let hay = text.to_lowercase();
        self.topics
            .iter()
            .filter(|(_, kws)| kws.iter().any(|k| hay.contains(k.as_str())))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Tag each market with its topics and drop the ones matching nothing.
    /// Returns (kept, dropped_count).
    pub fn apply(&self, records: Vec<Record<MarketFields>>) -> (Vec<Record<MarketFields>>, usize) {
        let mut dropped = 0usize;
        let mut kept = Vec::with_capacity(records.len());
        for mut r in records {
            let text = format!(
                "{} {}",
                r.label,
                r.fields.description.as_deref().unwrap_or_default()
            );
            let topics = self.classify(&text);
            match topics.first() {
                Some(primary) => {
                    r.provenance.concept = primary.clone();
                    r.fields.topics = topics;
                    kept.push(r);
                }
                None => dropped += 1,
            }
        }
        (kept, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_topics;
    use crate::record::{Identity, Provenance};

    fn market(q: &str) -> Record<MarketFields> {
        Record {
            identity: Identity::External(q.into()),
            label: q.into(),
            fields: MarketFields::default(),
            provenance: Provenance {
                source: "t".into(),
                concept: "all".into(),
                query: "active".into(),
            },
        }
    }

    #[test]
    fn matches_are_case_insensitive_and_ordered() {
        let c = TopicClassifier::new(&default_topics());
        assert_eq!(
            c.classify("Will TRUMP impose a tariff before the Fed meets?"),
            vec!["politics".to_string(), "economy".to_string()]
        );
        assert_eq!(c.classify("Bitcoin above 100k?"), vec!["economy".to_string()]);
        assert!(c.classify("Who wins the Super Bowl?").is_empty());
    }

    #[test]
    fn apply_drops_unmatched_and_sets_primary_concept() {
        let c = TopicClassifier::new(&default_topics());
        let (kept, dropped) = c.apply(vec![
            market("Will inflation exceed 3%?"),
            market("Oscars best picture?"),
            market("Senate passes the budget?"),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].provenance.concept, "economy");
        assert_eq!(kept[1].provenance.concept, "politics");
        assert_eq!(kept[1].fields.topics, vec!["politics".to_string()]);
    }
}
