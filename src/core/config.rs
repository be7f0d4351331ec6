//! Layered configuration
//!
//! Later layers override earlier ones:
//! 1. built-in defaults
//! 2. user config (`<config dir>/psvt/config.yaml`)
//! 3. project config (`.psvt/config.yaml`)
//! 4. environment (`PSVT_USER`, `PSVT_LOG`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::policy::StatusPolicy;
use crate::core::project::Project;
use crate::core::team::{Role, Session, TeamRoster};

/// Workflow settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Refuse backward moves out of a terminal stage
    pub lock_terminal: bool,

    /// Create revision O1 alongside every new workflow entity
    pub initial_revision: bool,

    /// Role for users missing from the roster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_role: Option<Role>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            lock_terminal: false,
            initial_revision: true,
            default_role: None,
        }
    }
}

impl WorkflowConfig {
    pub fn policy(&self) -> StatusPolicy {
        StatusPolicy::new(self.lock_terminal)
    }
}

/// Effective configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Username to act as
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// tracing filter directive, e.g. `info` or `psvt=debug`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    pub workflow: WorkflowConfig,
}

impl Config {
    /// Load configuration for the project containing the current directory, if any
    pub fn load() -> Self {
        let project = Project::discover().ok();
        Self::load_for(project.as_ref())
    }

    /// Load configuration for a specific project
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut merged = serde_yml::Value::Mapping(serde_yml::Mapping::new());

        if let Some(path) = user_config_path() {
            merge_file(&mut merged, &path);
        }
        if let Some(project) = project {
            merge_file(&mut merged, &project.config_path());
        }

        let mut config: Config = serde_yml::from_value(merged).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid configuration, using defaults");
            Config::default()
        });

        if let Some(user) = env_non_empty("PSVT_USER") {
            config.user = Some(user);
        }
        if let Some(level) = env_non_empty("PSVT_LOG") {
            config.log_level = Some(level);
        }
        config
    }

    /// Username to attribute actions to
    pub fn username(&self) -> String {
        self.user
            .clone()
            .or_else(|| env_non_empty("USER"))
            .or_else(|| env_non_empty("USERNAME"))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Resolve the acting session from the roster
    ///
    /// Users not in the roster get `workflow.default_role`, falling back to
    /// viewer when a roster exists and engineer when none does.
    pub fn session(&self, roster: Option<&TeamRoster>) -> Session {
        let username = self.username();
        let role = roster
            .and_then(|r| r.find(&username))
            .map(|m| m.role)
            .or(self.workflow.default_role)
            .unwrap_or(if roster.is_some() {
                Role::Viewer
            } else {
                Role::Engineer
            });
        Session::new(username, role)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "psvt").map(|dirs| dirs.config_dir().join("config.yaml"))
}

fn merge_file(base: &mut serde_yml::Value, path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    match serde_yml::from_str::<serde_yml::Value>(&content) {
        Ok(layer) => merge_values(base, layer),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable config"),
    }
}

/// Deep-merge `layer` into `base`; mappings merge key by key, anything else replaces
fn merge_values(base: &mut serde_yml::Value, layer: serde_yml::Value) {
    match (base, layer) {
        (serde_yml::Value::Mapping(base_map), serde_yml::Value::Mapping(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        // An empty file parses as null; keep what we have
        (_, serde_yml::Value::Null) => {}
        (base, layer) => *base = layer,
    }
}
