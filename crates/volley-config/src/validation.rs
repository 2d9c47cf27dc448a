// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::VolleyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Longest pacing delay a job can carry: one message per minute.
const MAX_PACING_DELAY_SECS: u64 = 60;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &VolleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.engine.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "engine.log_level `{}` is not one of {}",
            config.engine.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if let Some(path) = &config.queue.database_path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "queue.database_path must not be empty when set",
        ));
    }

    if config.queue.queue_name.trim().is_empty() {
        errors.push(ConfigError::validation("queue.queue_name must not be empty"));
    }

    if config.queue.prefetch == 0 {
        errors.push(ConfigError::validation("queue.prefetch must be at least 1"));
    }

    // The worker renews a job's lease when it starts on it, so the lease has
    // to outlive one dispatch plus its pacing hold.
    let hold_secs = config
        .gateway
        .media_timeout_secs
        .max(config.gateway.text_timeout_secs)
        .saturating_add(MAX_PACING_DELAY_SECS);
    if config.queue.lease_secs == 0 {
        errors.push(ConfigError::validation("queue.lease_secs must be at least 1"));
    } else if config.queue.lease_secs <= hold_secs {
        errors.push(ConfigError::validation(format!(
            "queue.lease_secs ({}) must exceed the longest time one job is held ({hold_secs}s: \
             gateway timeout plus a {MAX_PACING_DELAY_SECS}s pacing delay)",
            config.queue.lease_secs
        )));
    }

    if config.queue.poll_interval_ms == 0 {
        errors.push(ConfigError::validation(
            "queue.poll_interval_ms must be at least 1",
        ));
    }

    if config.queue.reconnect_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "queue.reconnect_interval_secs must be at least 1",
        ));
    }

    if config.worker.concurrency == 0 {
        errors.push(ConfigError::validation(
            "worker.concurrency must be at least 1",
        ));
    }

    if config.gateway.text_timeout_secs == 0 || config.gateway.media_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "gateway timeouts must be at least 1 second",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&VolleyConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = VolleyConfig::default();
        config.queue.prefetch = 0;
        config.worker.concurrency = 0;
        config.engine.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "got: {errors:?}");
    }

    #[test]
    fn lease_must_outlive_one_held_job() {
        let mut config = VolleyConfig::default();
        config.gateway.media_timeout_secs = 30;
        config.queue.lease_secs = 90;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("queue.lease_secs"), "got: {errors:?}");

        config.queue.lease_secs = 91;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_queue_path_override_is_rejected() {
        let mut config = VolleyConfig::default();
        config.queue.database_path = Some("  ".into());
        assert!(validate_config(&config).is_err());
    }
}
