// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Volley configuration system.

use figment::Jail;
use serial_test::serial;
use volley_config::diagnostic::ConfigError;
use volley_config::model::PacingMode;
use volley_config::{load_and_validate_str, load_config, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_volley_config() {
    let toml = r#"
[engine]
log_level = "debug"

[storage]
database_path = "/tmp/volley-test.db"
wal_mode = false

[queue]
database_path = "/tmp/volley-queue.db"
queue_name = "whatsapp_campaigns"
prefetch = 1
lease_secs = 120
poll_interval_ms = 250
reconnect_interval_secs = 5

[worker]
concurrency = 3
pacing = "per_campaign"
skip_already_attempted = true

[gateway]
text_timeout_secs = 10
media_timeout_secs = 30
typing_delay_ms = 1200
presence = "composing"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.engine.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/volley-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(
        config.queue.resolved_database_path(&config.storage),
        "/tmp/volley-queue.db"
    );
    assert_eq!(config.queue.queue_name, "whatsapp_campaigns");
    assert_eq!(config.queue.lease_secs, 120);
    assert_eq!(config.worker.concurrency, 3);
    assert_eq!(config.worker.pacing, PacingMode::PerCampaign);
    assert!(config.worker.skip_already_attempted);
    assert_eq!(config.gateway.presence, "composing");
}

#[test]
fn empty_toml_uses_documented_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    assert_eq!(config.engine.log_level, "info");
    assert_eq!(config.queue.queue_name, "campaign_dispatch");
    assert_eq!(config.queue.prefetch, 1);
    assert_eq!(config.queue.lease_secs, 300);
    assert_eq!(config.queue.reconnect_interval_secs, 5);
    assert_eq!(config.worker.concurrency, 1);
    assert_eq!(config.worker.pacing, PacingMode::Blocking);
    assert!(!config.worker.skip_already_attempted);
    assert_eq!(config.gateway.text_timeout_secs, 10);
    assert_eq!(config.gateway.media_timeout_secs, 30);
    assert!(config.storage.database_path.ends_with("volley.db"));
    assert_eq!(
        config.queue.resolved_database_path(&config.storage),
        config.storage.database_path
    );
}

#[test]
fn unknown_field_produces_suggestion() {
    let toml = r#"
[queue]
prefech = 2
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "prefech");
            assert_eq!(suggestion.as_deref(), Some("prefetch"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[worker]
concurrency = "many"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(
        matches!(errors[0], ConfigError::InvalidType { .. }),
        "got: {errors:?}"
    );
}

#[test]
fn unknown_pacing_mode_is_rejected() {
    let toml = r#"
[worker]
pacing = "turbo"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn semantic_validation_runs_after_deserialization() {
    let toml = r#"
[queue]
prefetch = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("prefetch 0 is invalid");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
#[serial]
fn env_vars_override_files() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "volley.toml",
            r#"
[queue]
prefetch = 2
queue_name = "from_file"
"#,
        )?;
        jail.set_env("VOLLEY_QUEUE_PREFETCH", "4");
        jail.set_env("VOLLEY_QUEUE_DATABASE_PATH", "/tmp/broker.db");
        jail.set_env("VOLLEY_WORKER_SKIP_ALREADY_ATTEMPTED", "true");

        let config = load_config()?;
        assert_eq!(config.queue.prefetch, 4);
        assert_eq!(config.queue.queue_name, "from_file");
        assert_eq!(config.queue.database_path.as_deref(), Some("/tmp/broker.db"));
        assert!(config.worker.skip_already_attempted);
        Ok(())
    });
}
