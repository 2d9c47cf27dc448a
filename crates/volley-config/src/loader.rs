// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./volley.toml` > `~/.config/volley/volley.toml` >
//! `/etc/volley/volley.toml`, with `VOLLEY_*` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VolleyConfig;

/// Config sections that environment variables may address.
const SECTIONS: &[&str] = &["engine", "storage", "queue", "worker", "gateway"];

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/volley/volley.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = "volley.toml";

/// Per-user configuration file under the XDG config directory.
pub fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("volley").join("volley.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/volley/volley.toml`
/// 3. `~/.config/volley/volley.toml`
/// 4. `./volley.toml`
/// 5. `VOLLEY_*` environment variables
pub fn load_config() -> Result<VolleyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<VolleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VolleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VolleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VolleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(VolleyConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// `VOLLEY_QUEUE_DATABASE_PATH` maps to `queue.database_path`.
///
/// Only the leading section name is turned into a dot, so keys that contain
/// underscores stay intact.
fn env_provider() -> Env {
    Env::prefixed("VOLLEY_").map(|key| env_key_to_path(key.as_str()).into())
}

pub(crate) fn env_key_to_path(key: &str) -> String {
    SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|field| format!("{section}.{field}"))
        })
        .unwrap_or_else(|| key.to_string())
}
