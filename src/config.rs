// src/config.rs
//! Pipeline configuration: topic keywords, queries grouped by concept,
//! provider endpoints and pacing, dedup strictness, scoring weights.
//!
//! Loaded once at startup and passed into the pipeline; nothing here is
//! runtime-tunable during a run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::weights::ScoringConfig;
use crate::error::ConfigError;
use crate::record::IdentityPolicy;

pub const ENV_CONFIG_PATH: &str = "SIGNAL_SCOUT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub output: OutputConfig,
    pub fetch: FetchConfig,
    pub providers: ProvidersConfig,
    pub markets: MarketsConfig,
    pub papers: PapersConfig,
    pub dedup: DedupConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound on requests in flight across all providers.
    pub max_in_flight: usize,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            timeout_secs: 20,
            connect_timeout_secs: 5,
            user_agent: concat!("signal-scout/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Minimum interval between successive request starts.
    pub pacing_ms: u64,
    pub max_concurrent: usize,
    /// Result limit requested per query.
    pub limit: usize,
}

/// A provider table as written in TOML; unset keys keep that provider's defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderOverlay {
    base_url: Option<String>,
    pacing_ms: Option<u64>,
    max_concurrent: Option<usize>,
    limit: Option<usize>,
}

impl ProviderOverlay {
    fn apply(self, base: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            base_url: self.base_url.unwrap_or(base.base_url),
            pacing_ms: self.pacing_ms.unwrap_or(base.pacing_ms),
            max_concurrent: self.max_concurrent.unwrap_or(base.max_concurrent),
            limit: self.limit.unwrap_or(base.limit),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProvidersOverlay {
    polymarket: ProviderOverlay,
    semantic_scholar: ProviderOverlay,
    scopus: ProviderOverlay,
}

impl From<ProvidersOverlay> for ProvidersConfig {
    fn from(o: ProvidersOverlay) -> Self {
        let d = ProvidersConfig::default();
        Self {
            polymarket: o.polymarket.apply(d.polymarket),
            semantic_scholar: o.semantic_scholar.apply(d.semantic_scholar),
            scopus: o.scopus.apply(d.scopus),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProvidersOverlay")]
pub struct ProvidersConfig {
    pub polymarket: ProviderConfig,
    pub semantic_scholar: ProviderConfig,
    pub scopus: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            polymarket: ProviderConfig {
                base_url: "https://gamma-api.polymarket.com".into(),
                pacing_ms: 0,
                max_concurrent: 1,
                limit: 500,
            },
            semantic_scholar: ProviderConfig {
                base_url: "https://api.semanticscholar.org".into(),
                pacing_ms: 200,
                max_concurrent: 1,
                limit: 15,
            },
            scopus: ProviderConfig {
                base_url: "https://api.elsevier.com".into(),
                pacing_ms: 300,
                max_concurrent: 1,
                limit: 10,
            },
        }
    }
}

impl ProvidersConfig {
    /// Provider settings by adapter name.
    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "polymarket" => Some(&self.polymarket),
            "semantic_scholar" => Some(&self.semantic_scholar),
            "scopus" => Some(&self.scopus),
            _ => None,
        }
    }
}

/// Named keyword list (topic or concept).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptQueries {
    pub name: String,
    pub queries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketsConfig {
    pub enabled: bool,
    /// Logical query name recorded in provenance.
    pub query: String,
    pub description_chars: usize,
    pub topics: Vec<KeywordGroup>,
}

impl Default for MarketsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query: "active".into(),
            description_chars: 300,
            topics: default_topics(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PapersConfig {
    pub enabled: bool,
    pub abstract_chars: usize,
    pub concepts: Vec<ConceptQueries>,
}

impl Default for PapersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            abstract_chars: 500,
            concepts: default_concepts(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub title_key_chars: usize,
    pub strict_titles: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        let p = IdentityPolicy::default();
        Self {
            title_key_chars: p.title_key_chars,
            strict_titles: p.strict_titles,
        }
    }
}

impl DedupConfig {
    pub fn policy(&self) -> IdentityPolicy {
        IdentityPolicy {
            title_key_chars: self.title_key_chars,
            strict_titles: self.strict_titles,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str, origin: &Path) -> Result<Self, ConfigError> {
        let cfg: PipelineConfig = toml::from_str(s).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.max_in_flight == 0 {
            return Err(ConfigError::invalid("fetch.max_in_flight", "must be >= 1"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::invalid("fetch.timeout_secs", "must be >= 1"));
        }
        for (name, p) in [
            ("providers.polymarket", &self.providers.polymarket),
            ("providers.semantic_scholar", &self.providers.semantic_scholar),
            ("providers.scopus", &self.providers.scopus),
        ] {
            if p.limit == 0 {
                return Err(ConfigError::invalid(format!("{name}.limit"), "must be >= 1"));
            }
            if p.max_concurrent == 0 {
                return Err(ConfigError::invalid(
                    format!("{name}.max_concurrent"),
                    "must be >= 1",
                ));
            }
            if p.base_url.trim().is_empty() {
                return Err(ConfigError::invalid(format!("{name}.base_url"), "is empty"));
            }
        }
        if !self.dedup.strict_titles && self.dedup.title_key_chars == 0 {
            return Err(ConfigError::invalid(
                "dedup.title_key_chars",
                "must be >= 1 unless strict_titles is set",
            ));
        }
        self.scoring.validate()
    }
}

/// Load config from an explicit TOML path.
pub fn load_config_from(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    PipelineConfig::from_toml_str(&content, path)
}

/// Load config using env var + fallbacks:
/// 1) $SIGNAL_SCOUT_CONFIG (must exist)
/// 2) config/pipeline.toml
/// 3) built-in seed
pub fn load_config_default() -> Result<PipelineConfig, ConfigError> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(ConfigError::MissingFile { path: pb });
        }
        return load_config_from(&pb);
    }
    let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_p.exists() {
        return load_config_from(&default_p);
    }
    Ok(PipelineConfig::default())
}

fn group(name: &str, keywords: &[&str]) -> KeywordGroup {
    KeywordGroup {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn concept(name: &str, queries: &[&str]) -> ConceptQueries {
    ConceptQueries {
        name: name.to_string(),
        queries: queries.iter().map(|q| q.to_string()).collect(),
    }
}

/// Built-in topic keywords for market classification.
pub fn default_topics() -> Vec<KeywordGroup> {
    vec![
        group(
            "politics",
            &[
                "trump", "biden", "congress", "senate", "house", "republican", "democrat",
                "election", "president", "governor", "midterm", "impeach", "veto",
                "supreme court", "legislation", "policy", "tariff", "immigration",
                "deportation", "executive order", "cabinet", "federal", "approval",
            ],
        ),
        group(
            "economy",
            &[
                "fed", "interest rate", "inflation", "recession", "gdp", "unemployment",
                "stock", "sp500", "s&p", "nasdaq", "bitcoin", "crypto", "treasury",
                "debt ceiling", "deficit", "trade", "economy",
            ],
        ),
    ]
}

/// Built-in literature queries grouped by concept.
pub fn default_concepts() -> Vec<ConceptQueries> {
    vec![
        concept(
            "information_cascade",
            &[
                "information cascade political behavior",
                "informational cascades elections voting",
                "Bikhchandani Hirshleifer Welch cascade",
            ],
        ),
        concept(
            "threshold_models",
            &[
                "threshold model collective behavior Granovetter",
                "collective action threshold tipping point",
            ],
        ),
        concept(
            "elite_mass_opinion",
            &[
                "elite mass opinion divergence",
                "Zaller public opinion formation",
                "opinion leaders political influence",
            ],
        ),
        concept(
            "prediction_markets",
            &[
                "prediction markets election forecasting accuracy",
                "betting markets polls comparison",
                "political prediction markets efficiency",
            ],
        ),
        concept(
            "rational_inattention",
            &[
                "rational inattention theory political",
                "information cost attention allocation",
                "Sims rational inattention",
            ],
        ),
        concept(
            "cognitive_labor",
            &[
                "cognitive labor information discovery",
                "information acquisition cost political",
                "attention allocation political information",
            ],
        ),
        concept(
            "framing_effects",
            &[
                "framing effects political opinion",
                "Chong Druckman framing",
                "media framing public opinion",
            ],
        ),
        concept(
            "diffusion_innovations",
            &[
                "diffusion innovations political Rogers",
                "opinion diffusion social networks",
                "political information spread",
            ],
        ),
        concept(
            "google_trends_elections",
            &[
                "Google Trends election prediction",
                "search data political forecasting",
                "online search behavior voting",
            ],
        ),
        concept(
            "multi_agent_forecasting",
            &[
                "multi-agent system forecasting",
                "LLM agent political analysis",
                "ensemble prediction political",
            ],
        ),
        concept(
            "opinion_shift_detection",
            &[
                "opinion shift detection time series",
                "attitude change measurement",
                "public opinion dynamics",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let s = r#"
[fetch]
max_in_flight = 2

[providers.scopus]
base_url = "http://localhost:9"
limit = 5

[[papers.concepts]]
name = "only"
queries = ["q1", "q2"]
"#;
        let cfg = PipelineConfig::from_toml_str(s, Path::new("inline.toml")).unwrap();
        assert_eq!(cfg.fetch.max_in_flight, 2);
        assert_eq!(cfg.fetch.timeout_secs, 20);
        assert_eq!(cfg.providers.scopus.limit, 5);
        assert_eq!(cfg.providers.scopus.base_url, "http://localhost:9");
        assert_eq!(cfg.providers.scopus.pacing_ms, 300);
        assert_eq!(cfg.providers.scopus.max_concurrent, 1);
        assert_eq!(cfg.providers.semantic_scholar.pacing_ms, 200);
        assert_eq!(cfg.papers.concepts.len(), 1);
        assert_eq!(cfg.markets.topics.len(), 2);
    }

    #[test]
    fn pacing_only_provider_table_keeps_url_and_limit() {
        let s = "[providers.semantic_scholar]\npacing_ms = 1000\n";
        let cfg = PipelineConfig::from_toml_str(s, Path::new("inline.toml")).unwrap();
        let ss = &cfg.providers.semantic_scholar;
        assert_eq!(ss.pacing_ms, 1000);
        assert_eq!(ss.base_url, "https://api.semanticscholar.org");
        assert_eq!(ss.limit, 15);
        assert_eq!(cfg.providers.scopus, ProvidersConfig::default().scopus);
    }

    #[test]
    fn zero_in_flight_is_invalid() {
        let s = "[fetch]\nmax_in_flight = 0\n";
        let err = PipelineConfig::from_toml_str(s, Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        // No files → built-in seed
        let cfg = load_config_default().unwrap();
        assert_eq!(cfg, PipelineConfig::default());

        // Env path wins
        let p = tmp.path().join("custom.toml");
        fs::write(&p, "[dedup]\nstrict_titles = true\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg = load_config_default().unwrap();
        assert!(cfg.dedup.strict_titles);

        // Env path pointing nowhere is an error
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml"));
        assert!(matches!(
            load_config_default(),
            Err(ConfigError::MissingFile { .. })
        ));
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
