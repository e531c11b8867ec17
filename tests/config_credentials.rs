// tests/config_credentials.rs
use std::fs;

use signal_scout::config::{load_config_from, PipelineConfig};
use signal_scout::credentials::{Credentials, ENV_SECRETS_PATH};
use signal_scout::pipeline::Pipeline;
use signal_scout::ConfigError;

#[test]
fn missing_credentials_fail_before_any_fetch() {
    let cfg = PipelineConfig::default();
    let err = Pipeline::from_config(cfg, &Credentials::new(Some("ss".into()), None))
        .err()
        .expect("missing scopus key must fail");
    match err {
        ConfigError::MissingCredential { provider, .. } => assert_eq!(provider, "scopus"),
        other => panic!("unexpected error: {other}"),
    }
}

#[serial_test::serial]
#[test]
fn missing_secrets_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var(ENV_SECRETS_PATH, dir.path().join("absent.json"));
    let err = Credentials::load_default().unwrap_err();
    std::env::remove_var(ENV_SECRETS_PATH);
    assert!(matches!(err, ConfigError::MissingFile { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn shipped_config_parses() {
    let cfg = load_config_from(std::path::Path::new("config/pipeline.toml")).expect("shipped config");
    assert_eq!(cfg.providers.semantic_scholar.pacing_ms, 200);
    assert_eq!(cfg.providers.scopus.pacing_ms, 300);
    assert!(!cfg.papers.concepts.is_empty());
    assert!(!cfg.markets.topics.is_empty());
}

#[test]
fn bad_toml_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("bad.toml");
    fs::write(&p, "[fetch\nmax_in_flight = ").unwrap();
    assert!(matches!(
        load_config_from(&p),
        Err(ConfigError::Parse { .. })
    ));

    fs::write(&p, "[scoring.market.weights]\nrds = -0.5\n").unwrap();
    assert!(matches!(
        load_config_from(&p),
        Err(ConfigError::Invalid { .. })
    ));
}
