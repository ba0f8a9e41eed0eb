use std::collections::HashMap;
use std::time::Duration;

use bastion_core::config::*;
use bastion_core::errors::ConfigError;
use proptest::prelude::*;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = BastionConfig::from_toml("").unwrap();

    // Scheduler defaults
    assert_eq!(config.scheduler.max_concurrent_tasks, 8);
    assert_eq!(config.scheduler.ingestion_interval_secs, 21_600);
    assert_eq!(config.scheduler.health_interval_secs, 3_600);
    assert_eq!(config.scheduler.cleanup_interval_secs, 1_800);

    // Router defaults
    assert_eq!(config.router.adapter_timeout_seconds, 300.0);
    assert_eq!(config.router.relevance_threshold, 0.3);
    assert_eq!(config.router.fallback_adapter, "general_reasoning");

    // Retrieval defaults
    assert_eq!(config.retrieval.chunk_size, 1_000);
    assert_eq!(config.retrieval.chunk_overlap, 200);
    assert_eq!(config.retrieval.similarity_threshold, 0.7);
    assert_eq!(config.retrieval.max_results, 5);

    // Embedding defaults
    assert_eq!(config.embedding.provider, "hashed");
    assert_eq!(config.embedding.dimensions, 384);

    // Storage defaults to in-memory
    assert!(config.storage.db_path.is_none());

    // Adapters default to no backend
    assert_eq!(config.adapters.pentest_reasoning.backend, BackendKind::None);
    assert!(config.adapters.knowledge.enabled);

    config.validate().unwrap();
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[router]
relevance_threshold = 0.5

[retrieval]
chunk_size = 400
chunk_overlap = 50

[adapters.tool_execution]
backend = "command"
program = "bastion-recon"
args = ["--json"]
extra_triggers = ["masscan"]
"#;
    let config = BastionConfig::from_toml(toml).unwrap();
    assert_eq!(config.router.relevance_threshold, 0.5);
    assert_eq!(config.retrieval.chunk_size, 400);
    // Non-overridden fields keep defaults
    assert_eq!(config.retrieval.max_results, 5);
    assert_eq!(config.router.adapter_timeout_seconds, 300.0);

    let tools = &config.adapters.tool_execution;
    assert_eq!(tools.backend, BackendKind::Command);
    assert_eq!(tools.program.as_deref(), Some("bastion-recon"));
    assert_eq!(tools.args, vec!["--json".to_string()]);
    assert_eq!(tools.extra_triggers, vec!["masscan".to_string()]);
    assert_eq!(tools.health_path, "/health");
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = BastionConfig::from_toml("[router\nrelevance_threshold = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn missing_file_is_reported() {
    let err = BastionConfig::from_file(std::path::Path::new("/nonexistent/bastion.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn env_overrides_take_precedence() {
    let env: HashMap<&str, &str> = [
        ("BASTION_MAX_CONCURRENT_TASKS", "2"),
        ("BASTION_ADAPTER_TIMEOUT_SECONDS", "1.5"),
        ("BASTION_CHUNK_SIZE", "not-a-number"),
        ("BASTION_DB_PATH", "/var/lib/bastion/bastion.db"),
    ]
    .into_iter()
    .collect();

    let mut config = BastionConfig::default();
    config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.scheduler.max_concurrent_tasks, 2);
    assert_eq!(config.router.adapter_timeout_seconds, 1.5);
    // Unparseable values leave the default in place.
    assert_eq!(config.retrieval.chunk_size, 1_000);
    assert_eq!(
        config.storage.db_path.as_deref(),
        Some("/var/lib/bastion/bastion.db")
    );
}

fn invalid_field(config: &BastionConfig) -> String {
    match config.validate() {
        Err(ConfigError::ValidationFailed { field, .. }) => field,
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn validation_rejects_out_of_range_values() {
    let mut config = BastionConfig::default();
    config.router.relevance_threshold = 1.5;
    assert_eq!(invalid_field(&config), "router.relevance_threshold");

    let mut config = BastionConfig::default();
    config.retrieval.chunk_overlap = config.retrieval.chunk_size;
    assert_eq!(invalid_field(&config), "retrieval.chunk_overlap");

    let mut config = BastionConfig::default();
    config.scheduler.max_concurrent_tasks = 0;
    assert_eq!(invalid_field(&config), "scheduler.max_concurrent_tasks");

    let mut config = BastionConfig::default();
    config.session.phase_timeout_seconds = 0.0;
    assert_eq!(invalid_field(&config), "session.phase_timeout_seconds");

    let mut config = BastionConfig::default();
    config.embedding.provider = "http".into();
    assert_eq!(invalid_field(&config), "embedding.endpoint");

    let mut config = BastionConfig::default();
    config.embedding.dimensions = 4;
    assert_eq!(invalid_field(&config), "embedding.dimensions");
}

#[test]
fn from_file_applies_and_validates() {
    let dir = std::env::temp_dir().join(format!("bastion-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bastion.toml");
    std::fs::write(&path, "[retrieval]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();

    let err = BastionConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));

    std::fs::write(&path, "[retrieval]\nchunk_size = 100\nchunk_overlap = 20\n").unwrap();
    let config = BastionConfig::from_file(&path).unwrap();
    assert_eq!(config.retrieval.chunk_size, 100);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unbounded_timeouts_are_rejected() {
    let config = BastionConfig::from_toml("[router]\nadapter_timeout_seconds = inf").unwrap();
    assert_eq!(invalid_field(&config), "router.adapter_timeout_seconds");
    // Accessors clamp instead of panicking.
    assert_eq!(
        config.router.adapter_timeout(),
        Duration::from_secs_f64(defaults::MAX_TIMEOUT_SECS)
    );

    let config = BastionConfig::from_toml("[session]\nphase_timeout_seconds = nan").unwrap();
    assert_eq!(invalid_field(&config), "session.phase_timeout_seconds");
    assert_eq!(
        config.session.phase_timeout(),
        Duration::from_secs_f64(defaults::MAX_TIMEOUT_SECS)
    );

    let mut config = BastionConfig::default();
    config.router.adapter_timeout_seconds = 1e30;
    assert_eq!(invalid_field(&config), "router.adapter_timeout_seconds");

    let mut config = BastionConfig::default();
    config.session.phase_timeout_seconds = -5.0;
    assert_eq!(invalid_field(&config), "session.phase_timeout_seconds");
    assert_eq!(config.session.phase_timeout(), Duration::ZERO);

    let mut config = BastionConfig::default();
    config.router.adapter_timeout_seconds = defaults::MAX_TIMEOUT_SECS;
    config.validate().unwrap();
}

// ── Properties ──

proptest! {
    #[test]
    fn timeout_accessors_never_panic(secs in any::<f64>()) {
        let mut config = BastionConfig::default();
        config.router.adapter_timeout_seconds = secs;
        config.session.phase_timeout_seconds = secs;
        let cap = Duration::from_secs_f64(defaults::MAX_TIMEOUT_SECS);
        prop_assert!(config.router.adapter_timeout() <= cap);
        prop_assert!(config.session.phase_timeout() <= cap);

        let in_range = secs.is_finite() && secs > 0.0 && secs <= defaults::MAX_TIMEOUT_SECS;
        prop_assert_eq!(config.validate().is_ok(), in_range);
    }

    #[test]
    fn valid_toml_values_survive_loading(
        timeout in 0.001f64..86_400.0,
        threshold in 0.0f64..=1.0,
        chunk_size in 2usize..5_000,
        overlap_ratio in 0.0f64..1.0,
        max_tasks in 1usize..64,
    ) {
        let overlap = ((chunk_size as f64) * overlap_ratio) as usize % chunk_size;
        let toml = format!(
            "[scheduler]\nmax_concurrent_tasks = {max_tasks}\n\
             [router]\nadapter_timeout_seconds = {timeout:?}\nrelevance_threshold = {threshold:?}\n\
             [retrieval]\nchunk_size = {chunk_size}\nchunk_overlap = {overlap}\n"
        );
        let config = BastionConfig::from_toml(&toml).unwrap();
        prop_assert!(config.validate().is_ok());
        prop_assert_eq!(config.scheduler.max_concurrent_tasks, max_tasks);
        prop_assert_eq!(config.router.adapter_timeout_seconds, timeout);
        prop_assert_eq!(config.router.relevance_threshold, threshold);
        prop_assert_eq!(config.retrieval.chunk_overlap, overlap);
    }
}
