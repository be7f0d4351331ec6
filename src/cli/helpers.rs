//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};

use crate::core::identity::{EntityId, RevisionId};
use crate::core::{Config, Project, Session, TeamRoster, WorkflowController, YamlStore};

/// Everything a mutating command needs
pub struct Context {
    pub project: Project,
    pub config: Config,
    pub session: Session,
    pub controller: WorkflowController<YamlStore>,
}

impl Context {
    /// Discover the project and resolve the acting user
    pub fn load() -> Result<Self> {
        let project = Project::discover()?;
        let config = Config::load_for(Some(&project));
        let roster = TeamRoster::load(&project)?;
        let session = config.session(roster.as_ref());
        tracing::debug!(user = %session.user_id, role = %session.role, "resolved session");

        let store = YamlStore::new(project.root());
        let controller = WorkflowController::new(store, config.workflow.clone());
        Ok(Self {
            project,
            config,
            session,
            controller,
        })
    }
}

pub fn parse_entity_id(s: &str) -> Result<EntityId> {
    Ok(s.parse::<EntityId>()?)
}

pub fn parse_revision_id(s: &str) -> Result<RevisionId> {
    Ok(s.parse::<RevisionId>()?)
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Ask for confirmation on a terminal; `yes` skips the prompt
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}
